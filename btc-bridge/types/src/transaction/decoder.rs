use alloy_rlp::Header;

use super::{
    eip1559_tx::{self, EIP1559_SIGNED_FIELD_COUNT, EIP1559_UNSIGNED_FIELD_COUNT},
    eip712_tx::{self, EIP712_FIELD_COUNT},
    legacy_tx::{self, LEGACY_FIELD_COUNT},
    EnvelopeKind, EthSignature, TransactionEnvelope,
};
use crate::error::{EncodingError, MalformedReason};

/// First byte of any RLP list header. Legacy envelopes start here, typed
/// envelopes start with their discriminant.
const RLP_LIST_OFFSET: u8 = 0xc0;

/// Shape of the RLP list an envelope is encoded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RlpListShape {
    /// Number of top level items in the list.
    pub fields: usize,
    /// Header and payload length of the list.
    pub encoded_len: usize,
}

/// Counts the top level items of the RLP list at the start of `buf` without
/// decoding them.
pub(crate) fn rlp_list_shape(buf: &[u8]) -> Result<RlpListShape, alloy_rlp::Error> {
    let mut cursor = buf;
    let header = Header::decode(&mut cursor)?;
    if !header.list {
        return Err(alloy_rlp::Error::UnexpectedString);
    }
    let header_len = buf.len() - cursor.len();

    let mut payload = cursor
        .get(..header.payload_length)
        .ok_or(alloy_rlp::Error::InputTooShort)?;
    let mut fields = 0;
    while !payload.is_empty() {
        let item = Header::decode(&mut payload)?;
        payload = payload
            .get(item.payload_length..)
            .ok_or(alloy_rlp::Error::InputTooShort)?;
        fields += 1;
    }

    Ok(RlpListShape {
        fields,
        encoded_len: header_len + header.payload_length,
    })
}

/// Parses a wire envelope into the envelope and, when present, the signature
/// carried in its `v`/`r`/`s` positions.
pub fn parse(bytes: &[u8]) -> Result<(TransactionEnvelope, Option<EthSignature>), EncodingError> {
    let first = *bytes
        .first()
        .ok_or(EncodingError::malformed("envelope", MalformedReason::Empty))?;

    let (kind, body) = if first >= RLP_LIST_OFFSET {
        (EnvelopeKind::Legacy, bytes)
    } else {
        match EnvelopeKind::try_from(first) {
            Ok(kind @ (EnvelopeKind::Eip1559 | EnvelopeKind::Eip712)) => (kind, &bytes[1..]),
            _ => {
                return Err(EncodingError::malformed(
                    "envelope",
                    MalformedReason::UnknownDiscriminant(first),
                ))
            }
        }
    };
    let malformed = |reason: MalformedReason| EncodingError::malformed(kind.name(), reason);

    let shape = rlp_list_shape(body).map_err(|err| malformed(err.into()))?;
    if shape.encoded_len != body.len() {
        return Err(malformed(MalformedReason::TrailingBytes(
            body.len() - shape.encoded_len,
        )));
    }

    let expected = match kind {
        EnvelopeKind::Legacy => LEGACY_FIELD_COUNT,
        EnvelopeKind::Eip712 => EIP712_FIELD_COUNT,
        EnvelopeKind::Eip1559 if shape.fields == EIP1559_UNSIGNED_FIELD_COUNT => {
            EIP1559_UNSIGNED_FIELD_COUNT
        }
        EnvelopeKind::Eip1559 => EIP1559_SIGNED_FIELD_COUNT,
    };
    if shape.fields != expected {
        return Err(malformed(MalformedReason::FieldCount {
            expected,
            actual: shape.fields,
        }));
    }

    let mut list = body;
    match kind {
        EnvelopeKind::Legacy => legacy_tx::decode(&mut list),
        EnvelopeKind::Eip712 => eip712_tx::decode(&mut list),
        EnvelopeKind::Eip1559 => {
            let header = Header::decode(&mut list).map_err(|err| malformed(err.into()))?;
            let mut payload = &list[..header.payload_length];
            eip1559_tx::decode_fields(&mut payload, shape.fields)
        }
    }
}
