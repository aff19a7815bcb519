mod envelope;
pub use envelope::*;

mod signature;
pub use signature::*;

mod legacy_tx;
mod eip1559_tx;
mod eip712_tx;

mod decoder;
pub use decoder::*;

mod signed;
pub use signed::*;

use alloy_primitives::{Address, Bytes};

/// Type discriminant of an envelope on the wire. Legacy envelopes carry no
/// discriminant byte; their RLP list header starts at `0xc0` or above.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[repr(u8)]
pub enum EnvelopeKind {
    Legacy = 0x00,
    Eip1559 = 0x02,
    Eip712 = 0x71,
}

impl EnvelopeKind {
    pub fn name(&self) -> &'static str {
        match self {
            EnvelopeKind::Legacy => "legacy",
            EnvelopeKind::Eip1559 => "eip1559",
            EnvelopeKind::Eip712 => "eip712",
        }
    }
}

#[derive(thiserror::Error, Debug)]
#[error("invalid envelope type {0:#04x}")]
pub struct InvalidEnvelopeKind(pub u8);

impl TryFrom<u8> for EnvelopeKind {
    type Error = InvalidEnvelopeKind;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(Self::Legacy),
            0x02 => Ok(Self::Eip1559),
            0x71 => Ok(Self::Eip712),
            _ => Err(InvalidEnvelopeKind(value)),
        }
    }
}

/// `to` is the empty string for contract creation and the 20 address bytes
/// otherwise.
pub(crate) fn encode_optional_address(address: Option<Address>) -> Bytes {
    address
        .map(|address| Bytes::copy_from_slice(address.as_slice()))
        .unwrap_or_default()
}

/// Inverse of [`encode_optional_address`]. `None` for any other length.
pub(crate) fn decode_optional_address(bytes: &[u8]) -> Option<Option<Address>> {
    match bytes.len() {
        0 => Some(None),
        20 => Some(Some(Address::from_slice(bytes))),
        _ => None,
    }
}
