use alloy_primitives::{keccak256, Bytes, B256};

use super::{eip1559_tx, eip712_tx, legacy_tx, EnvelopeKind, EthSignature, TransactionEnvelope};
use crate::error::EncodingError;

/// Canonical wire encoding of `envelope`, signed with `signature` when one is
/// given.
///
/// Bridge-aware envelopes place the signature in the `v`/`r`/`s` positions and
/// keep their custom signature in its own field. Without a signature those
/// positions hold `chainId, 0x, 0x`.
pub fn serialize(
    envelope: &TransactionEnvelope,
    signature: Option<&EthSignature>,
) -> Result<Bytes, EncodingError> {
    let encoded = match envelope.kind {
        EnvelopeKind::Legacy => legacy_tx::encode(envelope, signature)?,
        EnvelopeKind::Eip1559 => eip1559_tx::encode(envelope, signature)?,
        EnvelopeKind::Eip712 => eip712_tx::encode(envelope, signature)?,
    };
    Ok(encoded.into())
}

/// Hash a node reports for the envelope once it is broadcast.
///
/// A bridge-aware envelope hashes its typed-data digest together with the
/// signature bytes: its own custom signature when it carries one, the
/// external `signature` otherwise. The other kinds hash their signed wire
/// encoding.
pub fn signing_hash(
    envelope: &TransactionEnvelope,
    signature: Option<&EthSignature>,
) -> Result<B256, EncodingError> {
    match envelope.kind {
        EnvelopeKind::Eip712 => {
            let meta = envelope.meta()?.unwrap_or_default();
            let signature_bytes = match (&meta.custom_signature, signature) {
                (Some(custom), _) if custom.is_empty() => {
                    return Err(EncodingError::EmptySignaturePlaceholder)
                }
                (Some(custom), _) => custom.clone(),
                (None, Some(signature)) => signature.to_bytes(),
                (None, None) => return Err(EncodingError::MissingSignature(envelope.kind)),
            };

            let mut preimage = [0u8; 64];
            preimage[..32].copy_from_slice(envelope.typed_data_hash()?.as_slice());
            preimage[32..].copy_from_slice(keccak256(&signature_bytes).as_slice());
            Ok(keccak256(preimage))
        }
        EnvelopeKind::Legacy | EnvelopeKind::Eip1559 => {
            let signature = signature.ok_or(EncodingError::MissingSignature(envelope.kind))?;
            Ok(keccak256(serialize(envelope, Some(signature))?))
        }
    }
}

/// Envelope ready for broadcast, with its wire bytes and the hash the
/// network is expected to report for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedEnvelope {
    envelope: TransactionEnvelope,
    signature: Option<EthSignature>,
    hash: B256,
    raw: Bytes,
}

impl SignedEnvelope {
    pub fn new(
        envelope: TransactionEnvelope,
        signature: Option<EthSignature>,
    ) -> Result<Self, EncodingError> {
        let envelope = envelope.populated();
        let hash = signing_hash(&envelope, signature.as_ref())?;
        let raw = serialize(&envelope, signature.as_ref())?;
        Ok(Self {
            envelope,
            signature,
            hash,
            raw,
        })
    }

    /// Inverse of [`SignedEnvelope::raw`]. Fails when the bytes carry no
    /// signature at all.
    pub fn decode(raw: &[u8]) -> Result<Self, EncodingError> {
        let (envelope, signature) = super::parse(raw)?;
        Self::new(envelope, signature)
    }

    pub fn envelope(&self) -> &TransactionEnvelope {
        &self.envelope
    }

    pub fn signature(&self) -> Option<&EthSignature> {
        self.signature.as_ref()
    }

    pub fn hash(&self) -> B256 {
        self.hash
    }

    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    pub fn into_raw(self) -> Bytes {
        self.raw
    }
}
