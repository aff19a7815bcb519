use alloy_primitives::{Address, B256};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use btc_bridge_types::{EnvelopeKind, EthSignature, SignedEnvelope, TransactionEnvelope};
use tracing::{error, info};

use crate::{error::SignerError, provider::L2Rpc};

/// Account an envelope is sent from.
///
/// `Void` only knows its address. It can populate and hash envelopes but
/// refuses to sign them.
#[derive(Debug, Clone)]
pub enum EnvelopeSigner {
    Local(PrivateKeySigner),
    Void(Address),
}

impl EnvelopeSigner {
    pub fn address(&self) -> Address {
        match self {
            EnvelopeSigner::Local(signer) => signer.address(),
            EnvelopeSigner::Void(address) => *address,
        }
    }

    /// Fills `from`, signs the payload hash and attaches the signature.
    ///
    /// A bridge-aware envelope carries the signature as its custom signature,
    /// the other kinds in their `v`/`r`/`s` fields.
    pub fn sign_envelope(
        &self,
        envelope: TransactionEnvelope,
    ) -> Result<SignedEnvelope, SignerError> {
        let address = self.address();
        let mut envelope = envelope.populated();
        match envelope.from {
            Some(from) if from != address => {
                return Err(SignerError::FromMismatch {
                    expected: address,
                    actual: from,
                })
            }
            _ => envelope.from = Some(address),
        }

        let EnvelopeSigner::Local(signer) = self else {
            return Err(SignerError::VoidSigner(address));
        };

        let payload = envelope.signature_payload_hash()?;
        let signature = signer.sign_hash_sync(&payload)?;
        let signature = EthSignature::from_bytes(&signature.as_bytes())?;

        let signed = match envelope.kind {
            EnvelopeKind::Eip712 => {
                let mut meta = envelope.meta()?.unwrap_or_default().into_owned();
                meta.custom_signature = Some(signature.to_bytes());
                envelope.extension = Some(meta);
                SignedEnvelope::new(envelope, None)?
            }
            EnvelopeKind::Legacy | EnvelopeKind::Eip1559 => {
                SignedEnvelope::new(envelope, Some(signature))?
            }
        };
        Ok(signed)
    }

    /// Signs and broadcasts `envelope`. The node must report the hash the
    /// codec computed locally.
    pub async fn send_transaction<P: L2Rpc + ?Sized>(
        &self,
        l2: &P,
        envelope: TransactionEnvelope,
    ) -> Result<B256, SignerError> {
        let signed = self.sign_envelope(envelope)?;
        let local = signed.hash();
        let remote = l2.send_raw_transaction(signed.into_raw()).await?;
        if remote != local {
            error!(%local, %remote, "Node hashed the transaction differently");
            return Err(SignerError::ProtocolMismatch { local, remote });
        }
        info!(tx_hash = %local, from = %self.address(), "Sent transaction");
        Ok(local)
    }
}
