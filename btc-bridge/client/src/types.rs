use alloy_primitives::{Address, B256, U64};
use bitcoin::{Amount, ScriptBuf, Txid};
use btc_bridge_types::L2ToL1Log;
use serde::{Deserialize, Serialize};

/// Receipt of the transaction that carried a deposit to L2, with the logs
/// the L2 emitted for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    pub block_number: Option<U64>,
    pub l1_batch_number: Option<U64>,
    pub l1_batch_tx_index: Option<U64>,
    #[serde(default)]
    pub l2_to_l1_logs: Vec<L2ToL1LogEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct L2ToL1LogEntry {
    pub block_number: Option<U64>,
    pub l1_batch_number: Option<U64>,
    pub transaction_hash: B256,
    pub transaction_index: U64,
    pub tx_index_in_l1_batch: Option<U64>,
    pub shard_id: U64,
    pub is_service: bool,
    pub sender: Address,
    pub key: B256,
    pub value: B256,
    pub log_index: U64,
}

impl L2ToL1LogEntry {
    /// Leaf committed to the L2 to L1 log tree for this entry.
    pub fn leaf(&self) -> L2ToL1Log {
        L2ToL1Log {
            l2_shard_id: self.shard_id.saturating_to::<u8>(),
            is_service: self.is_service,
            tx_number_in_block: self
                .tx_index_in_l1_batch
                .unwrap_or(self.transaction_index)
                .saturating_to::<u16>(),
            sender: self.sender,
            key: self.key,
            value: self.value,
        }
    }
}

/// Status of a transaction as reported by `zks_getTransactionDetails`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransactionStatus {
    Pending,
    Included,
    Verified,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDetails {
    pub status: TransactionStatus,
    pub is_l1_originated: bool,
    pub initiator_address: Address,
    pub eth_commit_tx_hash: Option<B256>,
    pub eth_execute_tx_hash: Option<B256>,
}

/// Merkle path of a log leaf up to the batch root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct L2ToL1LogProof {
    pub proof: Vec<B256>,
    /// Position of the leaf in the batch tree.
    pub id: u32,
    pub root: B256,
}

/// Entry of the L1 node's `listunspent` answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Utxo {
    pub txid: Txid,
    pub vout: u32,
    pub address: Option<String>,
    pub script_pub_key: ScriptBuf,
    #[serde(with = "bitcoin::amount::serde::as_btc")]
    pub amount: Amount,
    pub confirmations: u32,
    #[serde(default)]
    pub spendable: bool,
}
