use alloy_primitives::B256;
use btc_bridge_types::EncodingError;
use thiserror::Error;

/// Transport or payload failure of a remote call. Never retried by the
/// caller that received it.
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("rpc transport: {0}")]
    Transport(#[from] jsonrpsee::core::client::Error),
    #[error("unexpected `{method}` response: {reason}")]
    InvalidResponse {
        method: &'static str,
        reason: String,
    },
}

impl RpcError {
    pub fn invalid_response(method: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            method,
            reason: reason.into(),
        }
    }
}

/// Failure reported by an external coin selection routine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct SelectionError(pub String);

impl SelectionError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

#[derive(Error, Debug)]
pub enum DepositError {
    #[error("utxo selection failed: {0}")]
    SelectionFailed(String),
    #[error("unsupported address kind for {0}")]
    UnsupportedAddressKind(String),
    #[error("signing key does not control {0}")]
    KeyAddressMismatch(String),
    #[error("input {index} is not spendable by the signing key")]
    ForeignInput { index: usize },
    #[error("bridge address is not valid for {0}")]
    InvalidBridgeAddress(bitcoin::Network),
    #[error("invalid destination `{0}`: expected 20 hex encoded bytes")]
    InvalidDestination(String),
    #[error("script: {0}")]
    Script(#[from] bitcoin::script::PushBytesError),
    #[error("sighash for input {input}: {reason}")]
    Sighash { input: usize, reason: String },
    #[error(transparent)]
    Network(#[from] RpcError),
}

/// Point of the priority operation lifecycle an error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TrackerStage {
    Locate,
    Commit,
    Finalize,
    Confirm,
}

impl std::fmt::Display for TrackerStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stage = match self {
            TrackerStage::Locate => "locate",
            TrackerStage::Commit => "commit",
            TrackerStage::Finalize => "finalize",
            TrackerStage::Confirm => "confirm",
        };
        f.write_str(stage)
    }
}

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("{stage}: {source}")]
    Network {
        stage: TrackerStage,
        #[source]
        source: RpcError,
    },
    #[error("no receipt for l1 transaction {l1_tx}")]
    ReceiptNotFound { l1_tx: B256 },
    #[error("no priority operation log at index {index}, receipt has {eligible}")]
    NoMatchingLog { index: u64, eligible: usize },
    #[error("l1 transaction {l1_tx} is not mined yet")]
    LogNotMined { l1_tx: B256 },
    #[error("no inclusion proof for log {log_index} of {tx_hash}")]
    ProofUnavailable { tx_hash: B256, log_index: u64 },
    #[error("priority operation {l2_tx_hash} failed on l2")]
    PriorityOpFailed { l2_tx_hash: B256 },
    #[error("tracking cancelled during {stage}")]
    Cancelled { stage: TrackerStage },
    #[error("priority operation has not been located yet")]
    NotLocated,
}

impl TrackerError {
    pub(crate) fn network(stage: TrackerStage) -> impl FnOnce(RpcError) -> Self {
        move |source| Self::Network { stage, source }
    }
}

#[derive(Error, Debug)]
pub enum SignerError {
    #[error("void signer for {0} cannot sign")]
    VoidSigner(alloy_primitives::Address),
    #[error("envelope is from {actual}, signer is {expected}")]
    FromMismatch {
        expected: alloy_primitives::Address,
        actual: alloy_primitives::Address,
    },
    #[error("signing failed: {0}")]
    Signing(#[from] alloy_signer::Error),
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    /// The node computed a different hash than the local codec. The
    /// serialization diverged from the remote verifier.
    #[error("node reported hash {remote}, expected {local}")]
    ProtocolMismatch { local: B256, remote: B256 },
    #[error(transparent)]
    Network(#[from] RpcError),
}
