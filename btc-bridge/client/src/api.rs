use alloy_primitives::{Bytes, B256};
use bitcoin::Txid;
use jsonrpsee::{core::RpcResult, proc_macros::rpc};

use crate::types::{L2ToL1LogProof, TransactionDetails, TransactionReceipt, Utxo};

/// Methods of the L2 node used by the bridge client.
#[rpc(client)]
pub trait BridgeL2Api {
    #[method(name = "eth_sendRawTransaction")]
    async fn send_raw_transaction(&self, raw: Bytes) -> RpcResult<B256>;

    #[method(name = "eth_getTransactionReceipt")]
    async fn get_transaction_receipt(&self, tx_hash: B256)
        -> RpcResult<Option<TransactionReceipt>>;

    #[method(name = "zks_getTransactionDetails")]
    async fn get_transaction_details(
        &self,
        tx_hash: B256,
    ) -> RpcResult<Option<TransactionDetails>>;

    #[method(name = "zks_getL2ToL1LogProof")]
    async fn get_l2_to_l1_log_proof(
        &self,
        tx_hash: B256,
        log_index: u64,
    ) -> RpcResult<Option<L2ToL1LogProof>>;
}

/// Subset of the bitcoind wallet RPC the deposit flow needs.
#[rpc(client)]
pub trait BitcoinApi {
    #[method(name = "sendrawtransaction")]
    async fn send_raw_transaction(&self, hex: String) -> RpcResult<Txid>;

    #[method(name = "listunspent")]
    async fn list_unspent(
        &self,
        min_conf: u32,
        max_conf: u32,
        addresses: Vec<String>,
    ) -> RpcResult<Vec<Utxo>>;
}
