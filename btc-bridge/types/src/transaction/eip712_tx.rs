use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_rlp::{Decodable, Encodable};

use super::{
    decode_optional_address, encode_optional_address, EnvelopeKind, EthSignature,
    PaymasterParams, TransactionEnvelope,
};
use crate::{
    error::{EncodingError, MalformedReason},
    Eip712Meta,
};

pub(crate) const EIP712_FIELD_COUNT: usize = 16;

/// RLP encoded portion of a bridge-aware envelope. The field order is fixed
/// by the remote verifier:
///
/// ```text
/// rlp([
///     nonce,
///     maxPriorityFeePerGas,
///     maxFeePerGas,
///     gasLimit,
///     to,
///     value,
///     data,
///     yParity | chainId,
///     r | 0x,
///     s | 0x,
///     chainId,
///     from,
///     gasPerPubdataByteLimit,
///     factoryDeps,
///     customSignature,
///     paymasterParams,
/// ])
/// ```
#[derive(Debug, Clone, PartialEq, alloy_rlp::RlpEncodable, alloy_rlp::RlpDecodable)]
pub(crate) struct RlpEip712Transaction {
    pub nonce: U256,
    pub max_priority_fee_per_gas: U256,
    pub max_fee_per_gas: U256,
    pub gas_limit: U256,
    pub to: Bytes,
    pub value: U256,
    pub data: Bytes,
    pub v: u64,
    pub r: U256,
    pub s: U256,
    pub chain_id: u64,
    pub from: Address,
    pub gas_per_pubdata: U256,
    pub factory_deps: Vec<B256>,
    pub custom_signature: Bytes,
    /// `[]` or `[paymaster, paymasterInput]`.
    pub paymaster_params: Vec<Bytes>,
}

fn malformed(reason: impl Into<MalformedReason>) -> EncodingError {
    EncodingError::malformed(EnvelopeKind::Eip712.name(), reason)
}

impl RlpEip712Transaction {
    pub(crate) fn from_envelope(
        envelope: &TransactionEnvelope,
        signature: Option<&EthSignature>,
    ) -> Result<Self, EncodingError> {
        let chain_id = envelope.chain_id()?;
        let from = envelope
            .from
            .ok_or(EncodingError::MissingFrom(EnvelopeKind::Eip712))?;
        let meta = envelope.meta()?.unwrap_or_default().into_owned();

        let custom_signature = match meta.custom_signature {
            Some(signature) if signature.is_empty() => {
                return Err(EncodingError::EmptySignaturePlaceholder)
            }
            Some(signature) => signature,
            None => Bytes::new(),
        };
        let (v, r, s) = match signature {
            Some(signature) => (signature.y_parity as u64, signature.r, signature.s),
            None => (chain_id, U256::ZERO, U256::ZERO),
        };
        let paymaster_params = match meta.paymaster_params {
            Some(params) => vec![
                Bytes::copy_from_slice(params.paymaster.as_slice()),
                params.paymaster_input,
            ],
            None => Vec::new(),
        };

        Ok(Self {
            nonce: envelope.nonce,
            max_priority_fee_per_gas: envelope.max_priority_fee_per_gas,
            max_fee_per_gas: envelope.max_fee_per_gas,
            gas_limit: envelope.gas_limit,
            to: encode_optional_address(envelope.to),
            value: envelope.value,
            data: envelope.data.clone(),
            v,
            r,
            s,
            chain_id,
            from,
            gas_per_pubdata: meta.gas_per_pubdata,
            factory_deps: meta.factory_deps,
            custom_signature,
            paymaster_params,
        })
    }

    pub(crate) fn into_envelope(
        self,
    ) -> Result<(TransactionEnvelope, Option<EthSignature>), EncodingError> {
        let to = decode_optional_address(&self.to)
            .ok_or(malformed(MalformedReason::InvalidField("to")))?;

        let signature = if self.r.is_zero() && self.s.is_zero() {
            None
        } else {
            let y_parity = match self.v {
                0 => false,
                1 => true,
                _ => return Err(malformed(MalformedReason::InvalidField("v"))),
            };
            Some(EthSignature::new(self.r, self.s, y_parity))
        };

        let paymaster_params = match self.paymaster_params.as_slice() {
            [] => None,
            [paymaster, input] if paymaster.len() == 20 => Some(PaymasterParams {
                paymaster: Address::from_slice(paymaster),
                paymaster_input: input.clone(),
            }),
            _ => return Err(malformed(MalformedReason::InvalidField("paymasterParams"))),
        };

        let custom_signature = (!self.custom_signature.is_empty()).then_some(self.custom_signature);

        let envelope = TransactionEnvelope {
            kind: EnvelopeKind::Eip712,
            chain_id: Some(self.chain_id),
            nonce: self.nonce,
            to,
            from: Some(self.from),
            value: self.value,
            data: self.data,
            gas_limit: self.gas_limit,
            max_fee_per_gas: self.max_fee_per_gas,
            max_priority_fee_per_gas: self.max_priority_fee_per_gas,
            extension: Some(Eip712Meta {
                gas_per_pubdata: self.gas_per_pubdata,
                factory_deps: self.factory_deps,
                custom_signature,
                paymaster_params,
            }),
        };
        Ok((envelope, signature))
    }
}

pub(crate) fn encode(
    envelope: &TransactionEnvelope,
    signature: Option<&EthSignature>,
) -> Result<Vec<u8>, EncodingError> {
    let fields = RlpEip712Transaction::from_envelope(envelope, signature)?;
    let mut out = Vec::with_capacity(1 + fields.length());
    out.push(EnvelopeKind::Eip712 as u8);
    fields.encode(&mut out);
    Ok(out)
}

/// Decodes the RLP list following the type byte.
pub(crate) fn decode(
    list: &mut &[u8],
) -> Result<(TransactionEnvelope, Option<EthSignature>), EncodingError> {
    RlpEip712Transaction::decode(list)
        .map_err(malformed)?
        .into_envelope()
}
