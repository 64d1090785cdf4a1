//! Typed records extracted from wallet responses.
//!
//! Every record is a plain value derived from one response string; equality
//! is field equality and nothing here is cached across queries.

/// A spendable output, identified by transaction id and output index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UtxoOutpoint {
    /// Hex transaction id, without the `0x` prefix.
    pub tx_id: String,
    /// Output index within the transaction.
    pub index: u32,
}

impl std::fmt::Display for UtxoOutpoint {
    /// Renders the form the wallet accepts back as a selected-UTXO argument.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tx({},{})", self.tx_id, self.index)
    }
}

/// Snapshot of a staking pool at query time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolData {
    pub pool_id: String,
    pub balance: String,
    pub creation_block_height: i64,
    pub timestamp: i64,
    pub staker: String,
    pub decommission_key: String,
    pub vrf_public_key: String,
}

/// A delegation and its current balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegationData {
    pub delegation_id: String,
    pub balance: String,
}

/// A block produced by the wallet's staking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedBlockInfo {
    pub block_id: String,
    pub block_height: String,
}
