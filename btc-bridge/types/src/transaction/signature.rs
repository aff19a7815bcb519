use alloy_primitives::{Bytes, U256};

use crate::error::EncodingError;

pub const SIGNATURE_LENGTH: usize = 65;

/// Recoverable secp256k1 signature over an envelope's signature payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EthSignature {
    pub r: U256,
    pub s: U256,
    pub y_parity: bool,
}

impl EthSignature {
    pub fn new(r: U256, s: U256, y_parity: bool) -> Self {
        Self { r, s, y_parity }
    }

    /// Parses `r || s || v`. Both raw parities and the `27`/`28` form are
    /// accepted for `v`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EncodingError> {
        if bytes.len() != SIGNATURE_LENGTH {
            return Err(EncodingError::InvalidSignatureLength(bytes.len()));
        }
        let y_parity = match bytes[64] {
            0 | 27 => false,
            1 | 28 => true,
            v => return Err(EncodingError::InvalidRecoveryId(v)),
        };
        Ok(Self {
            r: U256::from_be_slice(&bytes[..32]),
            s: U256::from_be_slice(&bytes[32..64]),
            y_parity,
        })
    }

    /// `r || s || v` with `v = 27 + parity`.
    pub fn as_bytes(&self) -> [u8; SIGNATURE_LENGTH] {
        let mut bytes = [0u8; SIGNATURE_LENGTH];
        bytes[..32].copy_from_slice(&self.r.to_be_bytes::<32>());
        bytes[32..64].copy_from_slice(&self.s.to_be_bytes::<32>());
        bytes[64] = 27 + self.y_parity as u8;
        bytes
    }

    pub fn to_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(&self.as_bytes())
    }

    /// EIP-155 `v` of a legacy envelope signed for `chain_id`.
    pub(crate) fn eip155_v(&self, chain_id: u64) -> Result<u64, EncodingError> {
        chain_id
            .checked_mul(2)
            .and_then(|v| v.checked_add(35 + self.y_parity as u64))
            .ok_or(EncodingError::ChainIdOverflow(chain_id))
    }
}
