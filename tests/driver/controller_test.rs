//! End-to-end tests for the wallet controller against a stub wallet.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::time::Duration;

use wallet_cli_driver::config::DriverConfig;
use wallet_cli_driver::driver::{UtxoOutpoint, WalletController, WalletProcessBuilder};

/// Stub wallet: answers a fixed vocabulary with wallet-shaped prose,
/// ignores its connection arguments, exits on `exit`.
const STUB_WALLET: &str = r#"#!/bin/sh
while IFS= read -r line; do
  cmd="${line%% *}"
  case "$cmd" in
    exit)
      exit 0
      ;;
    wallet-create)
      printf 'New wallet created successfully\n'
      ;;
    wallet-show-seed-phrase)
      printf 'The wallet doesn%s have a seed phrase stored\n' "'t"
      ;;
    node-best-block-height)
      printf '42\n'
      ;;
    account-utxos)
      printf 'UtxoOutPoint{ Id<Transaction>{0xAB12}, index: 3 }\n'
      printf 'UtxoOutPoint{ Id<Transaction>{0xCD34}, index: 0 }\n'
      ;;
    staking-list-created-block-ids)
      printf '[(1000, deadbeef)]\n'
      ;;
    token-issue-new)
      printf 'Coin selection error: not enough funds\n'
      ;;
    delegation-list-ids)
      printf 'No delegations found\n'
      ;;
    address-send)
      printf 'The transaction was submitted successfully: %s\n' "$line"
      ;;
    *)
      printf 'Unknown command\n'
      ;;
  esac
done
"#;

fn write_stub(dir: &tempfile::TempDir) -> PathBuf {
    let path = dir.path().join("stub_wallet.sh");
    std::fs::write(&path, STUB_WALLET).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

fn test_config(dir: &tempfile::TempDir) -> DriverConfig {
    DriverConfig {
        read_timeout_ms: 5_000,
        quiescence_window_ms: 100,
        log_dir: Some(dir.path().to_path_buf()),
        ..DriverConfig::default()
    }
}

fn start_stub(dir: &tempfile::TempDir) -> WalletController {
    let stub = write_stub(dir);
    let builder = WalletProcessBuilder::new()
        .rpc_address("127.0.0.1:13030")
        .cookie_file(dir.path().join(".cookie"));
    WalletController::start(&stub, &builder, &test_config(dir)).unwrap()
}

#[tokio::test]
async fn create_wallet_returns_confirmation_prose() {
    let dir = tempfile::tempdir().unwrap();
    let mut controller = start_stub(&dir);

    let response = controller
        .create_wallet(&dir.path().join("wallet"))
        .await
        .unwrap();
    assert!(response.starts_with("New wallet created"));

    controller.stop().await;
}

#[tokio::test]
async fn seed_phrase_absent_is_none_not_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut controller = start_stub(&dir);

    assert_eq!(controller.show_seed_phrase().await.unwrap(), None);

    controller.stop().await;
}

#[tokio::test]
async fn list_utxos_parses_typed_outpoints() {
    let dir = tempfile::tempdir().unwrap();
    let mut controller = start_stub(&dir);

    let utxos = controller.list_utxos("", "", &[]).await.unwrap();
    assert_eq!(
        utxos,
        vec![
            UtxoOutpoint {
                tx_id: "AB12".to_string(),
                index: 3
            },
            UtxoOutpoint {
                tx_id: "CD34".to_string(),
                index: 0
            },
        ]
    );

    controller.stop().await;
}

#[tokio::test]
async fn created_blocks_parse_height_and_id() {
    let dir = tempfile::tempdir().unwrap();
    let mut controller = start_stub(&dir);

    let blocks = controller.list_created_blocks_ids().await.unwrap();
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].block_id, "deadbeef");
    assert_eq!(blocks[0].block_height, "1000");

    controller.stop().await;
}

#[tokio::test]
async fn failed_token_issuance_returns_diagnostic_text() {
    let dir = tempfile::tempdir().unwrap();
    let mut controller = start_stub(&dir);

    let (token_id, diagnostic) = controller
        .issue_new_token("XXXX", 2, "http://uri", "rmt1qaddr", "unlimited", "freezable")
        .await
        .unwrap();
    assert_eq!(token_id, None);
    assert_eq!(
        diagnostic.as_deref(),
        Some("Coin selection error: not enough funds")
    );

    controller.stop().await;
}

#[tokio::test]
async fn empty_delegation_list_is_empty_not_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut controller = start_stub(&dir);

    assert!(controller.list_delegation_ids().await.unwrap().is_empty());

    controller.stop().await;
}

#[tokio::test]
async fn selected_utxos_render_in_command_line() {
    let dir = tempfile::tempdir().unwrap();
    let mut controller = start_stub(&dir);

    let utxo = UtxoOutpoint {
        tx_id: "ab12".to_string(),
        index: 1,
    };
    let response = controller
        .send_to_address("rmt1qaddr", 100, &[utxo])
        .await
        .unwrap();
    assert!(response.contains("address-send rmt1qaddr 100 tx(ab12,1)"));

    controller.stop().await;
}

#[tokio::test]
async fn stop_after_child_already_exited_does_not_hang() {
    let dir = tempfile::tempdir().unwrap();
    let mut controller = start_stub(&dir);

    // Kill the child via its own exit path first.
    controller.send_command("exit").await.unwrap();

    // stop() sends exit again into a dead pipe and must still return.
    tokio::time::timeout(Duration::from_secs(30), controller.stop())
        .await
        .expect("stop must terminate within the bound");
}

#[tokio::test]
async fn diagnostic_files_persist_after_stop() {
    let dir = tempfile::tempdir().unwrap();
    let mut controller = start_stub(&dir);

    controller.get_best_block_height().await.unwrap();
    let transcript = controller.transcript_path().to_path_buf();
    let stderr_log = controller.stderr_log_path().to_path_buf();
    controller.stop().await;

    assert!(transcript.exists());
    assert!(stderr_log.exists());
    let content = std::fs::read_to_string(&transcript).unwrap();
    assert!(content.contains("writing command: node-best-block-height\n"));
    assert!(content.contains("42"));
}
