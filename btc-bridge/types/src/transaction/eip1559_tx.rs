use alloy_primitives::{Bytes, U256};
use alloy_rlp::{Decodable, Encodable, Header};

use super::{
    decode_optional_address, encode_optional_address, EnvelopeKind, EthSignature,
    TransactionEnvelope,
};
use crate::error::{EncodingError, MalformedReason};

pub(crate) const EIP1559_UNSIGNED_FIELD_COUNT: usize = 9;
pub(crate) const EIP1559_SIGNED_FIELD_COUNT: usize = 12;

fn malformed(reason: impl Into<MalformedReason>) -> EncodingError {
    EncodingError::malformed(EnvelopeKind::Eip1559.name(), reason)
}

pub(crate) fn encode(
    envelope: &TransactionEnvelope,
    signature: Option<&EthSignature>,
) -> Result<Vec<u8>, EncodingError> {
    let chain_id = envelope.chain_id()?;
    envelope.meta()?;

    let to = encode_optional_address(envelope.to);
    let access_list: Vec<Bytes> = Vec::new();

    // rlp([
    //     chainId,
    //     nonce,
    //     maxPriorityFeePerGas,
    //     maxFeePerGas,
    //     gasLimit,
    //     to,
    //     value,
    //     data,
    //     accessList,
    //     yParity, r, s  (signed only)
    // ])
    let unsigned: [&dyn Encodable; EIP1559_UNSIGNED_FIELD_COUNT] = [
        &chain_id,
        &envelope.nonce,
        &envelope.max_priority_fee_per_gas,
        &envelope.max_fee_per_gas,
        &envelope.gas_limit,
        &to,
        &envelope.value,
        &envelope.data,
        &access_list,
    ];
    let mut to_encode = unsigned.to_vec();
    if let Some(signature) = signature {
        let signature_fields: [&dyn Encodable; 3] =
            [&signature.y_parity, &signature.r, &signature.s];
        to_encode.extend(signature_fields);
    }

    let mut out = vec![EnvelopeKind::Eip1559 as u8];
    alloy_rlp::encode_list::<_, dyn Encodable>(&to_encode, &mut out);
    Ok(out)
}

/// Decodes the fields of the list payload. `field_count` has already been
/// checked to be one of the two valid counts.
pub(crate) fn decode_fields(
    payload: &mut &[u8],
    field_count: usize,
) -> Result<(TransactionEnvelope, Option<EthSignature>), EncodingError> {
    let chain_id = u64::decode(payload).map_err(malformed)?;
    let nonce = U256::decode(payload).map_err(malformed)?;
    let max_priority_fee_per_gas = U256::decode(payload).map_err(malformed)?;
    let max_fee_per_gas = U256::decode(payload).map_err(malformed)?;
    let gas_limit = U256::decode(payload).map_err(malformed)?;
    let to = Bytes::decode(payload).map_err(malformed)?;
    let value = U256::decode(payload).map_err(malformed)?;
    let data = Bytes::decode(payload).map_err(malformed)?;

    let access_list = Header::decode(payload).map_err(malformed)?;
    if !access_list.list || access_list.payload_length != 0 {
        return Err(malformed(MalformedReason::InvalidField("accessList")));
    }

    let signature = if field_count == EIP1559_SIGNED_FIELD_COUNT {
        let y_parity = match u8::decode(payload).map_err(malformed)? {
            0 => false,
            1 => true,
            _ => return Err(malformed(MalformedReason::InvalidField("yParity"))),
        };
        let r = U256::decode(payload).map_err(malformed)?;
        let s = U256::decode(payload).map_err(malformed)?;
        Some(EthSignature::new(r, s, y_parity))
    } else {
        None
    };

    let envelope = TransactionEnvelope {
        kind: EnvelopeKind::Eip1559,
        chain_id: Some(chain_id),
        nonce,
        to: decode_optional_address(&to)
            .ok_or(malformed(MalformedReason::InvalidField("to")))?,
        from: None,
        value,
        data,
        gas_limit,
        max_fee_per_gas,
        max_priority_fee_per_gas,
        extension: None,
    };
    Ok((envelope, signature))
}
