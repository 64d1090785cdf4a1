//! Tests for wallet process spawning and control.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use wallet_cli_driver::driver::{SpawnError, WalletProcess, WalletProcessBuilder};

#[test]
fn builder_default_is_regtest_only() {
    let args = WalletProcessBuilder::new().build_args();
    assert_eq!(args, vec!["regtest".to_string()]);
}

#[test]
fn builder_connection_arguments_in_order() {
    let args = WalletProcessBuilder::new()
        .network("regtest")
        .rpc_address("127.0.0.1:13030")
        .cookie_file("/tmp/datadir/.cookie")
        .extra_args(["--wallet-file", "w1"])
        .build_args();

    assert_eq!(
        args,
        vec![
            "regtest".to_string(),
            "--rpc-address".to_string(),
            "127.0.0.1:13030".to_string(),
            "--rpc-cookie-file".to_string(),
            "/tmp/datadir/.cookie".to_string(),
            "--wallet-file".to_string(),
            "w1".to_string(),
        ]
    );
}

#[test]
fn builder_empty_network_is_omitted() {
    let args = WalletProcessBuilder::new().network("").build_args();
    assert!(args.is_empty());
}

#[test]
fn builder_is_clone() {
    let builder = WalletProcessBuilder::new().rpc_address("127.0.0.1:13030");
    let cloned = builder.clone();
    assert_eq!(builder.build_args(), cloned.build_args());
}

#[cfg(unix)]
#[tokio::test]
async fn spawn_missing_binary_is_not_found() {
    let builder = WalletProcessBuilder::new();
    let result = WalletProcess::spawn(
        Path::new("/nonexistent/test_wallet"),
        &builder,
        Stdio::null(),
    );
    assert!(matches!(result, Err(SpawnError::NotFound)));
}

#[cfg(unix)]
#[tokio::test]
async fn spawn_and_wait_for_exit() {
    let builder = WalletProcessBuilder::new().network("");
    let mut process =
        WalletProcess::spawn(Path::new("/bin/true"), &builder, Stdio::null()).unwrap();
    let status = process.wait().await.unwrap();
    assert!(status.success());
}

#[cfg(unix)]
#[tokio::test]
async fn graceful_terminate_is_bounded() {
    let builder = WalletProcessBuilder::new().network("");
    // cat blocks on its piped stdin until signalled.
    let mut process =
        WalletProcess::spawn(Path::new("/bin/cat"), &builder, Stdio::null()).unwrap();
    assert!(process.id().is_some());

    process
        .graceful_terminate(Duration::from_secs(5))
        .await
        .unwrap();
}

#[cfg(unix)]
#[tokio::test]
async fn graceful_terminate_after_exit_is_ok() {
    let builder = WalletProcessBuilder::new().network("");
    let mut process =
        WalletProcess::spawn(Path::new("/bin/true"), &builder, Stdio::null()).unwrap();
    process.wait().await.unwrap();

    // Already exited: termination must still succeed.
    process
        .graceful_terminate(Duration::from_secs(1))
        .await
        .unwrap();
}
