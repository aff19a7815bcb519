use alloy_primitives::{Bytes, U256};
use alloy_rlp::{Decodable, Encodable};

use super::{
    decode_optional_address, encode_optional_address, EnvelopeKind, EthSignature,
    TransactionEnvelope,
};
use crate::error::{EncodingError, MalformedReason};

pub(crate) const LEGACY_FIELD_COUNT: usize = 9;

/// `rlp([nonce, gasPrice, gasLimit, to, value, data, v, r, s])`.
///
/// Unsigned envelopes encode the EIP-155 signing payload (`v = chainId`,
/// `r = s = 0`). Signed ones carry `v = chainId * 2 + 35 + yParity`.
#[derive(Debug, Clone, PartialEq, alloy_rlp::RlpEncodable, alloy_rlp::RlpDecodable)]
pub(crate) struct RlpLegacyTransaction {
    pub nonce: U256,
    pub gas_price: U256,
    pub gas_limit: U256,
    pub to: Bytes,
    pub value: U256,
    pub data: Bytes,
    pub v: u64,
    pub r: U256,
    pub s: U256,
}

fn malformed(reason: impl Into<MalformedReason>) -> EncodingError {
    EncodingError::malformed(EnvelopeKind::Legacy.name(), reason)
}

pub(crate) fn encode(
    envelope: &TransactionEnvelope,
    signature: Option<&EthSignature>,
) -> Result<Vec<u8>, EncodingError> {
    let chain_id = envelope.chain_id()?;
    envelope.meta()?;

    let (v, r, s) = match signature {
        Some(signature) => (signature.eip155_v(chain_id)?, signature.r, signature.s),
        None => (chain_id, U256::ZERO, U256::ZERO),
    };
    let fields = RlpLegacyTransaction {
        nonce: envelope.nonce,
        gas_price: envelope.max_fee_per_gas,
        gas_limit: envelope.gas_limit,
        to: encode_optional_address(envelope.to),
        value: envelope.value,
        data: envelope.data.clone(),
        v,
        r,
        s,
    };

    let mut out = Vec::with_capacity(fields.length());
    fields.encode(&mut out);
    Ok(out)
}

pub(crate) fn decode(
    list: &mut &[u8],
) -> Result<(TransactionEnvelope, Option<EthSignature>), EncodingError> {
    let fields = RlpLegacyTransaction::decode(list).map_err(malformed)?;
    let to = decode_optional_address(&fields.to)
        .ok_or(malformed(MalformedReason::InvalidField("to")))?;

    let (chain_id, signature) = if fields.r.is_zero() && fields.s.is_zero() {
        (fields.v, None)
    } else if fields.v >= 35 {
        let y_parity = (fields.v - 35) % 2 == 1;
        (
            (fields.v - 35) / 2,
            Some(EthSignature::new(fields.r, fields.s, y_parity)),
        )
    } else {
        // pre EIP-155 signatures carry no chain id
        return Err(malformed(MalformedReason::InvalidField("v")));
    };

    let envelope = TransactionEnvelope {
        kind: EnvelopeKind::Legacy,
        chain_id: Some(chain_id),
        nonce: fields.nonce,
        to,
        from: None,
        value: fields.value,
        data: fields.data,
        gas_limit: fields.gas_limit,
        max_fee_per_gas: fields.gas_price,
        max_priority_fee_per_gas: fields.gas_price,
        extension: None,
    };
    Ok((envelope, signature))
}
