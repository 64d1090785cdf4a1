//! Tests for the command/response channel against scripted children.

#![cfg(unix)]

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use wallet_cli_driver::driver::{
    CommandChannel, DrainConfig, Transcript, WalletProcess, WalletProcessBuilder,
};

/// Echo server: answers `echo:<line>` per line, exits on `exit`.
const ECHO_SCRIPT: &str = r#"while IFS= read -r line; do
  case "$line" in
    exit) exit 0 ;;
    *) printf 'echo:%s\n' "$line" ;;
  esac
done"#;

fn test_drain_config() -> DrainConfig {
    DrainConfig {
        first_read_timeout: Duration::from_secs(5),
        quiescence_window: Duration::from_millis(100),
        chunk_size: 1 << 16,
    }
}

fn spawn_scripted(script: &str) -> (WalletProcess, CommandChannel, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let builder = WalletProcessBuilder::new()
        .network("")
        .extra_args(["-c", script]);
    let mut process =
        WalletProcess::spawn(Path::new("/bin/sh"), &builder, Stdio::null()).unwrap();
    let stdin = process.take_stdin().unwrap();
    let stdout = process.take_stdout().unwrap();
    let transcript = Transcript::create_in(dir.path()).unwrap();
    let channel = CommandChannel::new(stdin, stdout, test_drain_config(), transcript);
    (process, channel, dir)
}

#[tokio::test]
async fn responses_come_back_in_request_order() {
    let (mut process, mut channel, _dir) = spawn_scripted(ECHO_SCRIPT);

    assert_eq!(channel.send("one").await.unwrap(), "echo:one");
    assert_eq!(channel.send("two").await.unwrap(), "echo:two");
    assert_eq!(channel.send("three").await.unwrap(), "echo:three");

    channel.send("exit").await.unwrap();
    process.wait().await.unwrap();
}

#[tokio::test]
async fn free_form_argument_round_trips_unmodified() {
    let (mut process, mut channel, _dir) = spawn_scripted(ECHO_SCRIPT);

    let data = "address-deposit-data \"hello wallet world\"";
    let response = channel.send(data).await.unwrap();
    assert_eq!(response, format!("echo:{data}"));

    channel.send("exit").await.unwrap();
    process.wait().await.unwrap();
}

#[tokio::test]
async fn exit_after_child_death_drains_to_empty() {
    let (mut process, mut channel, _dir) = spawn_scripted(ECHO_SCRIPT);

    // First exit terminates the child; the drain sees EOF, not an error.
    assert_eq!(channel.send("exit").await.unwrap(), "");
    process.wait().await.unwrap();
}

#[tokio::test]
async fn transcript_records_writes_and_reads() {
    let (mut process, mut channel, _dir) = spawn_scripted(ECHO_SCRIPT);

    channel.send("address-new").await.unwrap();
    let transcript_path = channel.transcript_path().to_path_buf();
    channel.send("exit").await.unwrap();
    process.wait().await.unwrap();

    let content = std::fs::read_to_string(&transcript_path).unwrap();
    assert!(content.contains("writing command: address-new\n"));
    assert!(content.contains("echo:address-new"));
}

#[tokio::test]
async fn multi_line_response_is_accumulated() {
    let script = r#"while IFS= read -r line; do
  case "$line" in
    exit) exit 0 ;;
    *) printf 'line one\nline two\nline three\n' ;;
  esac
done"#;
    let (mut process, mut channel, _dir) = spawn_scripted(script);

    let response = channel.send("account-utxos").await.unwrap();
    assert_eq!(response, "line one\nline two\nline three");

    channel.send("exit").await.unwrap();
    process.wait().await.unwrap();
}
