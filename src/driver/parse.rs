//! Pattern-based extraction of typed records from wallet responses.
//!
//! The wallet answers in human-readable prose, so these parsers scan for
//! fixed textual shapes rather than decoding a structured format. They are
//! total: malformed or empty input degrades to an empty list or `None`,
//! never an error, so tests can assert on failure prose directly.

use regex::Regex;

use super::records::{CreatedBlockInfo, DelegationData, PoolData, UtxoOutpoint};

/// Leading phrase of a successful seed phrase query.
const SEED_PHRASE_PREFIX: &str = "The stored seed phrase is";
/// Leading phrase of a successful token issuance.
const TOKEN_ISSUED_PREFIX: &str = "A new token has been issued with ID";
/// Leading phrase of a successful NFT issuance.
const NFT_ISSUED_PREFIX: &str = "A new NFT has been issued with ID";

/// Compiled pattern table for all wallet response shapes.
///
/// Compiled once per session; construction only fails if a pattern in this
/// file is invalid.
#[derive(Debug, Clone)]
pub struct ResponseParser {
    utxo_outpoint: Regex,
    pool: Regex,
    delegation: Regex,
    delegation_id: Regex,
    created_block: Regex,
    pending_tx: Regex,
}

impl ResponseParser {
    /// Compile the pattern table.
    ///
    /// # Errors
    ///
    /// Returns `regex::Error` if any pattern fails to compile.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            utxo_outpoint: Regex::new(
                r"UtxoOutPoint\s*\{[^}]*Id<Transaction>\{0x([^}]*)\}[^}]*index:\s*(\d+)",
            )?,
            // "heigh" is what the wallet actually prints.
            pool: Regex::new(
                r"Pool Id: ([a-zA-Z0-9]+), Balance: (\d+), Creation Block heigh: (\d+), timestamp: (\d+), staker ([a-zA-Z0-9]+), decommission_key ([a-zA-Z0-9]+), vrf_public_key ([a-zA-Z0-9]+)",
            )?,
            delegation: Regex::new(r"Delegation Id: ([a-zA-Z0-9]+), Balance: (\d+)")?,
            delegation_id: Regex::new(r"Delegation id: ([a-zA-Z0-9]+)")?,
            created_block: Regex::new(r"\((\d+),\s*([0-9a-fA-F]+)\)")?,
            pending_tx: Regex::new(r"id: Id<Transaction>\{0x([^}]*)\}")?,
        })
    }

    /// Extract every `UtxoOutPoint{ Id<Transaction>{0x..}, index: n }` in the
    /// response, in order of appearance.
    #[must_use]
    pub fn utxo_outpoints(&self, output: &str) -> Vec<UtxoOutpoint> {
        self.utxo_outpoint
            .captures_iter(output)
            .filter_map(|caps| {
                let index = caps[2].parse().ok()?;
                Some(UtxoOutpoint {
                    tx_id: caps[1].trim().to_string(),
                    index,
                })
            })
            .collect()
    }

    /// Extract every staking pool line from a `staking-list-pool-ids` response.
    #[must_use]
    pub fn pools(&self, output: &str) -> Vec<PoolData> {
        self.pool
            .captures_iter(output)
            .filter_map(|caps| {
                Some(PoolData {
                    pool_id: caps[1].to_string(),
                    balance: caps[2].to_string(),
                    creation_block_height: caps[3].parse().ok()?,
                    timestamp: caps[4].parse().ok()?,
                    staker: caps[5].to_string(),
                    decommission_key: caps[6].to_string(),
                    vrf_public_key: caps[7].to_string(),
                })
            })
            .collect()
    }

    /// Extract every `Delegation Id: .., Balance: ..` pair.
    #[must_use]
    pub fn delegations(&self, output: &str) -> Vec<DelegationData> {
        self.delegation
            .captures_iter(output)
            .map(|caps| DelegationData {
                delegation_id: caps[1].to_string(),
                balance: caps[2].to_string(),
            })
            .collect()
    }

    /// Extract the delegation id from a `delegation-create` confirmation.
    #[must_use]
    pub fn delegation_id(&self, output: &str) -> Option<String> {
        self.delegation_id
            .captures(output)
            .map(|caps| caps[1].to_string())
    }

    /// Extract every `(<height>, <hex-id>)` pair from a
    /// `staking-list-created-block-ids` response.
    #[must_use]
    pub fn created_blocks(&self, output: &str) -> Vec<CreatedBlockInfo> {
        self.created_block
            .captures_iter(output)
            .map(|caps| CreatedBlockInfo {
                block_id: caps[2].to_string(),
                block_height: caps[1].to_string(),
            })
            .collect()
    }

    /// Extract every pending transaction id.
    #[must_use]
    pub fn pending_transaction_ids(&self, output: &str) -> Vec<String> {
        self.pending_tx
            .captures_iter(output)
            .map(|caps| caps[1].to_string())
            .collect()
    }
}

/// Extract the quoted mnemonic from a `wallet-show-seed-phrase` response.
///
/// Returns `None` when the wallet has no stored seed phrase, which it reports
/// in prose without the success prefix.
#[must_use]
pub fn seed_phrase(output: &str) -> Option<String> {
    if !output.starts_with(SEED_PHRASE_PREFIX) {
        return None;
    }
    let first = output.find('"')?;
    let last = output.rfind('"')?;
    if last > first {
        Some(output[first + 1..last].to_string())
    } else {
        None
    }
}

/// Extract the token id from a `token-issue-new` response.
#[must_use]
pub fn issued_token_id(output: &str) -> Option<String> {
    extract_issued_id(output, TOKEN_ISSUED_PREFIX)
}

/// Extract the NFT id from a `token-nft-issue-new` response.
#[must_use]
pub fn issued_nft_id(output: &str) -> Option<String> {
    extract_issued_id(output, NFT_ISSUED_PREFIX)
}

fn extract_issued_id(output: &str, prefix: &str) -> Option<String> {
    if !output.starts_with(prefix) {
        return None;
    }
    let (_, id) = output.split_once(':')?;
    Some(id.trim().to_string())
}
