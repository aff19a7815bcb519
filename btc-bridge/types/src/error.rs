use thiserror::Error;

use crate::transaction::EnvelopeKind;

/// Failure to compute the versioned hash of a contract bytecode.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid bytecode length {len}: {reason}")]
pub struct HashError {
    pub len: usize,
    pub reason: &'static str,
}

impl HashError {
    pub(crate) fn invalid_length(len: usize, reason: &'static str) -> Self {
        Self { len, reason }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DerivationError {
    #[error("bytecode hash must be 32 bytes, got {0}")]
    InvalidDigestLength(usize),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedReason {
    #[error("empty input")]
    Empty,
    #[error("unknown type discriminant {0:#04x}")]
    UnknownDiscriminant(u8),
    #[error("expected {expected} list fields, found {actual}")]
    FieldCount { expected: usize, actual: usize },
    #[error("{0} trailing bytes after envelope")]
    TrailingBytes(usize),
    #[error("invalid `{0}` field")]
    InvalidField(&'static str),
    #[error("rlp: {0}")]
    Rlp(alloy_rlp::Error),
}

impl From<alloy_rlp::Error> for MalformedReason {
    fn from(err: alloy_rlp::Error) -> Self {
        Self::Rlp(err)
    }
}

/// Local, never retried failures of the transaction codec.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("envelope has no chain id")]
    MissingChainId,
    #[error("{0:?} envelope requires a `from` address")]
    MissingFrom(EnvelopeKind),
    #[error("custom signature is present but empty; omit it to leave the envelope unsigned")]
    EmptySignaturePlaceholder,
    #[error("{0:?} envelope hash requires a signature")]
    MissingSignature(EnvelopeKind),
    #[error("{0:?} envelope cannot carry an eip712 extension")]
    UnexpectedExtension(EnvelopeKind),
    #[error("signature must be 65 bytes, got {0}")]
    InvalidSignatureLength(usize),
    #[error("invalid signature recovery id {0}")]
    InvalidRecoveryId(u8),
    #[error("chain id {0} does not fit an eip155 `v`")]
    ChainIdOverflow(u64),
    #[error("factory dependency: {0}")]
    InvalidBytecode(#[from] HashError),
    #[error("malformed {kind} envelope: {reason}")]
    MalformedEnvelope {
        kind: &'static str,
        reason: MalformedReason,
    },
}

impl EncodingError {
    pub(crate) fn malformed(kind: &'static str, reason: impl Into<MalformedReason>) -> Self {
        Self::MalformedEnvelope {
            kind,
            reason: reason.into(),
        }
    }
}
