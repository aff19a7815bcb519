use std::sync::Arc;

use alloy_primitives::{hex, Bytes, B256};
use async_trait::async_trait;
use bitcoin::Txid;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use tracing::{debug, info};

use crate::{
    error::RpcError,
    tracker::PriorityOpStatus,
    types::{L2ToL1LogProof, TransactionDetails, TransactionReceipt, TransactionStatus, Utxo},
    BitcoinApiClient, BridgeL2ApiClient,
};

/// `listunspent` upper confirmation bound used by bitcoind when none is given.
const MAX_CONFIRMATIONS: u32 = 9_999_999;

/// L2 capabilities the bridge core consumes.
#[async_trait]
pub trait L2Rpc: Send + Sync {
    /// Broadcasts a serialized envelope and returns the hash the node computed.
    async fn send_raw_transaction(&self, raw: Bytes) -> Result<B256, RpcError>;

    async fn transaction_receipt(
        &self,
        tx_hash: B256,
    ) -> Result<Option<TransactionReceipt>, RpcError>;

    async fn priority_op_status(&self, l2_tx_hash: B256) -> Result<PriorityOpStatus, RpcError>;

    async fn l2_to_l1_log_proof(
        &self,
        tx_hash: B256,
        log_index: u64,
    ) -> Result<Option<L2ToL1LogProof>, RpcError>;
}

/// L1 capabilities: broadcast and the external UTXO source.
#[async_trait]
pub trait L1Rpc: Send + Sync {
    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<Txid, RpcError>;

    async fn list_unspent(
        &self,
        address: &bitcoin::Address,
        min_conf: u32,
    ) -> Result<Vec<Utxo>, RpcError>;
}

#[async_trait]
impl<T: L2Rpc + ?Sized> L2Rpc for Arc<T> {
    async fn send_raw_transaction(&self, raw: Bytes) -> Result<B256, RpcError> {
        (**self).send_raw_transaction(raw).await
    }

    async fn transaction_receipt(
        &self,
        tx_hash: B256,
    ) -> Result<Option<TransactionReceipt>, RpcError> {
        (**self).transaction_receipt(tx_hash).await
    }

    async fn priority_op_status(&self, l2_tx_hash: B256) -> Result<PriorityOpStatus, RpcError> {
        (**self).priority_op_status(l2_tx_hash).await
    }

    async fn l2_to_l1_log_proof(
        &self,
        tx_hash: B256,
        log_index: u64,
    ) -> Result<Option<L2ToL1LogProof>, RpcError> {
        (**self).l2_to_l1_log_proof(tx_hash, log_index).await
    }
}

#[async_trait]
impl<T: L1Rpc + ?Sized> L1Rpc for Arc<T> {
    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<Txid, RpcError> {
        (**self).send_raw_transaction(raw).await
    }

    async fn list_unspent(
        &self,
        address: &bitcoin::Address,
        min_conf: u32,
    ) -> Result<Vec<Utxo>, RpcError> {
        (**self).list_unspent(address, min_conf).await
    }
}

/// Maps the node's transaction details onto the priority operation status.
/// A missing transaction is `NotFound`, never an error.
pub fn priority_op_status(details: Option<&TransactionDetails>) -> PriorityOpStatus {
    match details.map(|details| details.status) {
        None => PriorityOpStatus::NotFound,
        Some(TransactionStatus::Pending) => PriorityOpStatus::Processing,
        Some(TransactionStatus::Included) => PriorityOpStatus::Committed,
        Some(TransactionStatus::Verified) => PriorityOpStatus::Finalized,
        Some(TransactionStatus::Failed) => PriorityOpStatus::Failed,
    }
}

/// jsonrpsee client for the L2 node.
#[derive(Debug, Clone)]
pub struct L2Provider {
    client: HttpClient,
}

impl L2Provider {
    pub fn new(url: impl AsRef<str>) -> Result<Self, RpcError> {
        let url = url.as_ref();
        info!(%url, "Connecting to L2 node");
        let client = HttpClientBuilder::default().build(url)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl L2Rpc for L2Provider {
    async fn send_raw_transaction(&self, raw: Bytes) -> Result<B256, RpcError> {
        Ok(BridgeL2ApiClient::send_raw_transaction(&self.client, raw).await?)
    }

    async fn transaction_receipt(
        &self,
        tx_hash: B256,
    ) -> Result<Option<TransactionReceipt>, RpcError> {
        Ok(self.client.get_transaction_receipt(tx_hash).await?)
    }

    async fn priority_op_status(&self, l2_tx_hash: B256) -> Result<PriorityOpStatus, RpcError> {
        let details = self.client.get_transaction_details(l2_tx_hash).await?;
        if let Some(details) = &details {
            if !details.is_l1_originated {
                return Err(RpcError::invalid_response(
                    "zks_getTransactionDetails",
                    format!("{l2_tx_hash} is not an l1 originated transaction"),
                ));
            }
        }
        Ok(priority_op_status(details.as_ref()))
    }

    async fn l2_to_l1_log_proof(
        &self,
        tx_hash: B256,
        log_index: u64,
    ) -> Result<Option<L2ToL1LogProof>, RpcError> {
        Ok(self.client.get_l2_to_l1_log_proof(tx_hash, log_index).await?)
    }
}

/// jsonrpsee client for the bitcoind wallet.
#[derive(Debug, Clone)]
pub struct L1Provider {
    client: HttpClient,
}

impl L1Provider {
    pub fn new(url: impl AsRef<str>) -> Result<Self, RpcError> {
        let url = url.as_ref();
        info!(%url, "Connecting to L1 node");
        let client = HttpClientBuilder::default().build(url)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl L1Rpc for L1Provider {
    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<Txid, RpcError> {
        let txid = BitcoinApiClient::send_raw_transaction(&self.client, hex::encode(raw)).await?;
        debug!(%txid, "Broadcast l1 transaction");
        Ok(txid)
    }

    async fn list_unspent(
        &self,
        address: &bitcoin::Address,
        min_conf: u32,
    ) -> Result<Vec<Utxo>, RpcError> {
        let utxos = self
            .client
            .list_unspent(min_conf, MAX_CONFIRMATIONS, vec![address.to_string()])
            .await?;
        Ok(utxos)
    }
}
