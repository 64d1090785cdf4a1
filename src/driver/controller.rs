//! High-level command API over a supervised wallet session.
//!
//! One controller owns one wallet child, its command channel and the two
//! diagnostic sinks. Every method encodes one command line, sends it through
//! the channel and, where the response has a predictable shape, parses it
//! into typed records. Semantic failures come back as prose (or `None`), so
//! tests can assert on the exact wording; only transport failures are hard
//! errors.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use crate::config::DriverConfig;

use super::channel::{ChannelError, CommandChannel};
use super::parse::{self, ResponseParser};
use super::process::{SpawnError, WalletProcess, WalletProcessBuilder};
use super::records::{CreatedBlockInfo, DelegationData, PoolData, UtxoOutpoint};
use super::transcript::{stderr_sink, Transcript};

/// Reserved command that asks the wallet to exit. Always the last command
/// sent in a session.
const EXIT_COMMAND: &str = "exit";

/// Bound on waiting for the child to exit during teardown.
const STOP_TIMEOUT: Duration = Duration::from_secs(10);

/// Error type for controller operations.
#[derive(thiserror::Error, Debug)]
pub enum ControllerError {
    /// Failed to spawn the wallet process.
    #[error("Failed to spawn wallet: {0}")]
    Spawn(#[from] SpawnError),

    /// Transport failure on the command channel.
    #[error(transparent)]
    Channel(#[from] ChannelError),

    /// A response pattern failed to compile.
    #[error("Invalid response pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Failed to create a diagnostic sink.
    #[error("Failed to create capture file: {0}")]
    Io(#[from] std::io::Error),

    /// The child's stdin or stdout pipe was unavailable after spawn.
    #[error("Wallet process streams unavailable")]
    StreamUnavailable,

    /// A response expected to be hex was not.
    #[error("Invalid hex in response: {0}")]
    Hex(#[from] hex::FromHexError),
}

/// A supervised wallet CLI session.
///
/// Exactly one per driver instance; methods take `&mut self`, so concurrent
/// callers must hold their own exclusive reference (in practice each test
/// gets its own session).
#[derive(Debug)]
pub struct WalletController {
    process: WalletProcess,
    channel: CommandChannel,
    parser: ResponseParser,
    stderr_log: PathBuf,
}

impl WalletController {
    /// Spawn a wallet child and attach the session resources: piped
    /// stdin/stdout, a raw-stderr capture file and a command/response
    /// transcript, both created in the configured log directory.
    ///
    /// # Errors
    ///
    /// Returns `ControllerError` if a sink cannot be created, the process
    /// fails to spawn, or its pipes are unavailable.
    pub fn start(
        binary: &Path,
        builder: &WalletProcessBuilder,
        config: &DriverConfig,
    ) -> Result<Self, ControllerError> {
        let log_dir = config.log_dir();
        let (stderr_file, stderr_log) = stderr_sink(&log_dir)?;
        let transcript = Transcript::create_in(&log_dir)?;

        tracing::info!(
            binary = %binary.display(),
            transcript = %transcript.path().display(),
            stderr = %stderr_log.display(),
            "starting wallet session"
        );

        let mut process = WalletProcess::spawn(binary, builder, Stdio::from(stderr_file))?;
        let stdin = process
            .take_stdin()
            .ok_or(ControllerError::StreamUnavailable)?;
        let stdout = process
            .take_stdout()
            .ok_or(ControllerError::StreamUnavailable)?;

        Ok(Self {
            process,
            channel: CommandChannel::new(stdin, stdout, config.drain_config(), transcript),
            parser: ResponseParser::new()?,
            stderr_log,
        })
    }

    /// Send the exit command and wait for the child to go away.
    ///
    /// Best-effort on every step: a closed stdin or an already-exited child
    /// is logged, not raised, and the wait is bounded by a SIGTERM/SIGKILL
    /// escalation. The capture files are flushed per record, so they are
    /// complete whichever path teardown takes.
    pub async fn stop(mut self) {
        tracing::debug!("exiting wallet");
        if let Err(err) = self.channel.send(EXIT_COMMAND).await {
            tracing::warn!(error = %err, "exit command failed, terminating");
        }
        if let Err(err) = self.process.graceful_terminate(STOP_TIMEOUT).await {
            tracing::warn!(error = %err, "wallet did not terminate cleanly");
        }
    }

    /// Path of the command/response transcript file.
    #[must_use]
    pub fn transcript_path(&self) -> &Path {
        self.channel.transcript_path()
    }

    /// Path of the raw stderr capture file.
    #[must_use]
    pub fn stderr_log_path(&self) -> &Path {
        &self.stderr_log
    }

    /// Send a raw command line and return the trimmed response text.
    ///
    /// # Errors
    ///
    /// Returns `ControllerError::Channel` on transport failure.
    pub async fn send_command(&mut self, command: &str) -> Result<String, ControllerError> {
        Ok(self.channel.send(command).await?)
    }

    async fn send_tokens(&mut self, tokens: &[&str]) -> Result<String, ControllerError> {
        self.send_command(&join_tokens(tokens)).await
    }

    // wallet lifecycle

    /// Create a new wallet file, storing its seed phrase.
    pub async fn create_wallet(&mut self, wallet_file: &Path) -> Result<String, ControllerError> {
        let path = wallet_file.display().to_string();
        self.send_tokens(&["wallet-create", &path, "store-seed-phrase"])
            .await
    }

    /// Recreate a wallet file from a mnemonic.
    pub async fn recover_wallet(
        &mut self,
        wallet_file: &Path,
        mnemonic: &str,
    ) -> Result<String, ControllerError> {
        let path = wallet_file.display().to_string();
        let quoted = quoted(mnemonic);
        self.send_tokens(&["wallet-create", &path, "store-seed-phrase", &quoted])
            .await
    }

    /// Open an existing wallet file.
    pub async fn open_wallet(&mut self, wallet_file: &Path) -> Result<String, ControllerError> {
        let path = wallet_file.display().to_string();
        self.send_tokens(&["wallet-open", &path]).await
    }

    /// Close the currently open wallet.
    pub async fn close_wallet(&mut self) -> Result<String, ControllerError> {
        self.send_command("wallet-close").await
    }

    /// Show the stored seed phrase, or `None` if the wallet has none stored.
    pub async fn show_seed_phrase(&mut self) -> Result<Option<String>, ControllerError> {
        let output = self.send_command("wallet-show-seed-phrase").await?;
        Ok(parse::seed_phrase(&output))
    }

    /// Encrypt the wallet's private keys with a password.
    pub async fn encrypt_private_keys(&mut self, password: &str) -> Result<String, ControllerError> {
        self.send_tokens(&["wallet-encrypt-private-keys", password])
            .await
    }

    /// Unlock previously encrypted private keys.
    pub async fn unlock_private_keys(&mut self, password: &str) -> Result<String, ControllerError> {
        self.send_tokens(&["wallet-unlock-private-keys", password])
            .await
    }

    /// Lock the encrypted private keys.
    pub async fn lock_private_keys(&mut self) -> Result<String, ControllerError> {
        self.send_command("wallet-lock-private-keys").await
    }

    /// Remove private key encryption entirely.
    pub async fn remove_private_keys_encryption(&mut self) -> Result<String, ControllerError> {
        self.send_command("wallet-disable-private-keys-encryption")
            .await
    }

    /// Change the lookahead size; reducing it needs explicit confirmation.
    pub async fn set_lookahead_size(
        &mut self,
        size: u32,
        force_reduce: bool,
    ) -> Result<String, ControllerError> {
        let size = size.to_string();
        let confirm = if force_reduce {
            "i-know-what-i-am-doing"
        } else {
            ""
        };
        self.send_tokens(&["wallet-set-lookahead-size", &size, confirm])
            .await
    }

    /// Rescan the blockchain from genesis.
    pub async fn rescan(&mut self) -> Result<String, ControllerError> {
        self.send_command("wallet-rescan").await
    }

    /// Sync the wallet with the node's tip.
    pub async fn sync(&mut self) -> Result<String, ControllerError> {
        self.send_command("wallet-sync").await
    }

    // node queries

    /// Best block height known to the node.
    pub async fn get_best_block_height(&mut self) -> Result<String, ControllerError> {
        self.send_command("node-best-block-height").await
    }

    /// Best block id known to the node.
    pub async fn get_best_block(&mut self) -> Result<String, ControllerError> {
        self.send_command("node-best-block-id").await
    }

    /// Submit a raw transaction to the node.
    pub async fn submit_transaction(&mut self, transaction: &str) -> Result<String, ControllerError> {
        self.send_tokens(&["node-submit-transaction", transaction])
            .await
    }

    // accounts and addresses

    /// Create a new account, optionally named.
    pub async fn create_new_account(&mut self, name: &str) -> Result<String, ControllerError> {
        self.send_tokens(&["account-create", name]).await
    }

    /// Select the account subsequent commands operate on.
    pub async fn select_account(&mut self, account_index: u32) -> Result<String, ControllerError> {
        let index = account_index.to_string();
        self.send_tokens(&["account-select", &index]).await
    }

    /// Issue a new receiving address.
    pub async fn new_address(&mut self) -> Result<String, ControllerError> {
        self.send_command("address-new").await
    }

    /// Issue a new public key, with the leading key-kind byte stripped.
    ///
    /// # Errors
    ///
    /// Returns `ControllerError::Hex` if the response is not a hex string.
    pub async fn new_public_key(&mut self) -> Result<Vec<u8>, ControllerError> {
        let output = self.send_command("address-new-public-key").await?;
        let mut bytes = hex::decode(output)?;
        if !bytes.is_empty() {
            bytes.remove(0);
        }
        Ok(bytes)
    }

    /// Show addresses and their usage state.
    pub async fn get_addresses_usage(&mut self) -> Result<String, ControllerError> {
        self.send_command("address-show").await
    }

    /// Account balance for the given lock state and UTXO states.
    pub async fn get_balance(
        &mut self,
        with_locked: &str,
        utxo_states: &[&str],
    ) -> Result<String, ControllerError> {
        let states = utxo_states.join(" ");
        self.send_tokens(&["account-balance", with_locked, &states])
            .await
    }

    /// List the account's spendable outputs as typed outpoints.
    pub async fn list_utxos(
        &mut self,
        utxo_types: &str,
        with_locked: &str,
        utxo_states: &[&str],
    ) -> Result<Vec<UtxoOutpoint>, ControllerError> {
        let states = utxo_states.join(" ");
        let output = self
            .send_tokens(&["account-utxos", utxo_types, with_locked, &states])
            .await?;
        Ok(self.parser.utxo_outpoints(&output))
    }

    // transactions

    /// Send coins to an address, optionally from selected UTXOs.
    pub async fn send_to_address(
        &mut self,
        address: &str,
        amount: u64,
        selected_utxos: &[UtxoOutpoint],
    ) -> Result<String, ControllerError> {
        let amount = amount.to_string();
        let utxos = selected_utxos
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        self.send_tokens(&["address-send", address, &amount, &utxos])
            .await
    }

    /// Fetch a wallet transaction by id.
    pub async fn get_transaction(&mut self, tx_id: &str) -> Result<String, ControllerError> {
        self.send_tokens(&["transaction-get", tx_id]).await
    }

    /// Fetch the signed raw encoding of a wallet transaction.
    pub async fn get_raw_signed_transaction(
        &mut self,
        tx_id: &str,
    ) -> Result<String, ControllerError> {
        self.send_tokens(&["transaction-get-signed-raw", tx_id]).await
    }

    /// Sign a raw transaction with the account's keys.
    pub async fn sign_raw_transaction(
        &mut self,
        transaction: &str,
    ) -> Result<String, ControllerError> {
        self.send_tokens(&["account-sign-raw-transaction", transaction])
            .await
    }

    /// List ids of transactions not yet confirmed or abandoned.
    pub async fn list_pending_transactions(&mut self) -> Result<Vec<String>, ControllerError> {
        let output = self.send_command("transaction-list-pending").await?;
        Ok(self.parser.pending_transaction_ids(&output))
    }

    /// Abandon an unconfirmed transaction, releasing its inputs.
    pub async fn abandon_transaction(&mut self, tx_id: &str) -> Result<String, ControllerError> {
        self.send_tokens(&["transaction-abandon", tx_id]).await
    }

    /// Deposit arbitrary data on chain.
    pub async fn deposit_data(&mut self, data: &str) -> Result<String, ControllerError> {
        let quoted = quoted(data);
        self.send_tokens(&["address-deposit-data", &quoted]).await
    }

    // tokens and NFTs

    /// Issue a new fungible token.
    ///
    /// On success returns `(Some(token_id), None)`; on semantic failure
    /// `(None, Some(full_response_text))` so the caller can assert on the
    /// diagnostic prose.
    #[allow(clippy::too_many_arguments)]
    pub async fn issue_new_token(
        &mut self,
        token_ticker: &str,
        number_of_decimals: u8,
        metadata_uri: &str,
        destination_address: &str,
        token_supply: &str,
        is_freezable: &str,
    ) -> Result<(Option<String>, Option<String>), ControllerError> {
        let ticker = quoted(token_ticker);
        let decimals = quoted(&number_of_decimals.to_string());
        let uri = quoted(metadata_uri);
        let output = self
            .send_tokens(&[
                "token-issue-new",
                &ticker,
                &decimals,
                &uri,
                destination_address,
                token_supply,
                is_freezable,
            ])
            .await?;
        match parse::issued_token_id(&output) {
            Some(token_id) => Ok((Some(token_id), None)),
            None => Ok((None, Some(output))),
        }
    }

    /// Mint more of a token's supply to an address.
    pub async fn mint_tokens(
        &mut self,
        token_id: &str,
        address: &str,
        amount: u64,
    ) -> Result<String, ControllerError> {
        let amount = amount.to_string();
        self.send_tokens(&["token-mint", token_id, address, &amount])
            .await
    }

    /// Burn part of a token's circulating supply.
    pub async fn unmint_tokens(
        &mut self,
        token_id: &str,
        amount: u64,
    ) -> Result<String, ControllerError> {
        let amount = amount.to_string();
        self.send_tokens(&["token-unmint", token_id, &amount]).await
    }

    /// Lock a token's supply permanently.
    pub async fn lock_token_supply(&mut self, token_id: &str) -> Result<String, ControllerError> {
        self.send_tokens(&["token-lock-supply", token_id]).await
    }

    /// Freeze all operations on a token.
    pub async fn freeze_token(
        &mut self,
        token_id: &str,
        is_unfreezable: &str,
    ) -> Result<String, ControllerError> {
        self.send_tokens(&["token-freeze", token_id, is_unfreezable])
            .await
    }

    /// Unfreeze a frozen token.
    pub async fn unfreeze_token(&mut self, token_id: &str) -> Result<String, ControllerError> {
        self.send_tokens(&["token-unfreeze", token_id]).await
    }

    /// Hand a token's authority to a new address.
    pub async fn change_token_authority(
        &mut self,
        token_id: &str,
        new_authority: &str,
    ) -> Result<String, ControllerError> {
        self.send_tokens(&["token-change-authority", token_id, new_authority])
            .await
    }

    /// Send tokens to an address. The amount is passed through verbatim so
    /// callers can use decimal notation.
    pub async fn send_tokens_to_address(
        &mut self,
        token_id: &str,
        address: &str,
        amount: &str,
    ) -> Result<String, ControllerError> {
        self.send_tokens(&["token-send", token_id, address, amount])
            .await
    }

    /// Issue a new NFT; `None` means issuance failed and the prose went to
    /// the error log.
    #[allow(clippy::too_many_arguments)]
    pub async fn issue_new_nft(
        &mut self,
        destination_address: &str,
        media_hash: &str,
        name: &str,
        description: &str,
        ticker: &str,
        creator: &str,
        icon_uri: &str,
        media_uri: &str,
        additional_metadata_uri: &str,
    ) -> Result<Option<String>, ControllerError> {
        let output = self
            .send_tokens(&[
                "token-nft-issue-new",
                destination_address,
                media_hash,
                name,
                description,
                ticker,
                creator,
                icon_uri,
                media_uri,
                additional_metadata_uri,
            ])
            .await?;
        let nft_id = parse::issued_nft_id(&output);
        if nft_id.is_none() {
            tracing::error!(response = %output, "NFT issuance failed");
        }
        Ok(nft_id)
    }

    // staking

    /// Create a staking pool.
    pub async fn create_stake_pool(
        &mut self,
        amount: u64,
        cost_per_block: u64,
        margin_ratio_per_thousand: f64,
        decommission_addr: &str,
    ) -> Result<String, ControllerError> {
        let amount = amount.to_string();
        let cost = cost_per_block.to_string();
        let margin = margin_ratio_per_thousand.to_string();
        self.send_tokens(&[
            "staking-create-pool",
            &amount,
            &cost,
            &margin,
            decommission_addr,
        ])
        .await
    }

    /// Decommission a pool, returning its stake.
    pub async fn decommission_stake_pool(&mut self, pool_id: &str) -> Result<String, ControllerError> {
        self.send_tokens(&["staking-decommission-pool", pool_id])
            .await
    }

    /// Produce a partially signed decommission request for a pool.
    pub async fn decommission_stake_pool_request(
        &mut self,
        pool_id: &str,
    ) -> Result<String, ControllerError> {
        self.send_tokens(&["staking-decommission-pool-request", pool_id])
            .await
    }

    /// List the account's staking pools as typed records.
    pub async fn list_pool_ids(&mut self) -> Result<Vec<PoolData>, ControllerError> {
        let output = self.send_command("staking-list-pool-ids").await?;
        tracing::info!(pools = %output, "listed pools");
        Ok(self.parser.pools(&output))
    }

    /// List blocks produced by this wallet's staking.
    pub async fn list_created_blocks_ids(
        &mut self,
    ) -> Result<Vec<CreatedBlockInfo>, ControllerError> {
        let output = self.send_command("staking-list-created-block-ids").await?;
        tracing::info!(blocks = %output, "listed created blocks");
        Ok(self.parser.created_blocks(&output))
    }

    /// Start staking with the account's pools.
    pub async fn start_staking(&mut self) -> Result<String, ControllerError> {
        self.send_command("staking-start").await
    }

    /// Stop staking.
    pub async fn stop_staking(&mut self) -> Result<String, ControllerError> {
        self.send_command("staking-stop").await
    }

    /// Show VRF public keys and their usage state.
    pub async fn get_vrf_addresses_usage(&mut self) -> Result<String, ControllerError> {
        self.send_command("staking-show-vrf-public-keys").await
    }

    /// Show the legacy VRF key of the account.
    pub async fn get_legacy_vrf_public_key(&mut self) -> Result<String, ControllerError> {
        self.send_command("staking-show-legacy-vrf-key").await
    }

    // delegations

    /// Create a delegation to a pool; returns the new delegation id, or
    /// `None` if the wallet rejected the command.
    pub async fn create_delegation(
        &mut self,
        address: &str,
        pool_id: &str,
    ) -> Result<Option<String>, ControllerError> {
        let output = self
            .send_tokens(&["delegation-create", address, pool_id])
            .await?;
        Ok(self.parser.delegation_id(&output))
    }

    /// Add stake to an existing delegation.
    pub async fn stake_delegation(
        &mut self,
        amount: u64,
        delegation_id: &str,
    ) -> Result<String, ControllerError> {
        let amount = amount.to_string();
        self.send_tokens(&["delegation-stake", &amount, delegation_id])
            .await
    }

    /// List the account's delegations as typed records.
    pub async fn list_delegation_ids(&mut self) -> Result<Vec<DelegationData>, ControllerError> {
        let output = self.send_command("delegation-list-ids").await?;
        Ok(self.parser.delegations(&output))
    }
}

/// Join non-empty tokens with single spaces; optional arguments render as
/// empty strings and disappear instead of leaving double spaces.
fn join_tokens(tokens: &[&str]) -> String {
    tokens
        .iter()
        .filter(|token| !token.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Wrap a free-form string argument in the double quotes the wallet's line
/// parser expects.
fn quoted(value: &str) -> String {
    format!("\"{value}\"")
}
