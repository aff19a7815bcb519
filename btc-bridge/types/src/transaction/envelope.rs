use std::borrow::Cow;

use alloy_dyn_abi::TypedData;
use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_sol_types::Eip712Domain;

use super::{serialize, EnvelopeKind};
use crate::{
    error::{EncodingError, HashError},
    hash::{self, bytecode_hash, eip712_domain},
    DEFAULT_GAS_PER_PUBDATA_LIMIT,
};

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymasterParams {
    pub paymaster: Address,
    pub paymaster_input: Bytes,
}

/// Bridge-aware fields only carried by [`EnvelopeKind::Eip712`] envelopes.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Eip712Meta {
    pub gas_per_pubdata: U256,
    /// Bytecode hashes of the contracts the transaction may deploy.
    pub factory_deps: Vec<B256>,
    /// `None` leaves the envelope unsigned. `Some` must not be empty.
    pub custom_signature: Option<Bytes>,
    pub paymaster_params: Option<PaymasterParams>,
}

impl Default for Eip712Meta {
    fn default() -> Self {
        Self {
            gas_per_pubdata: U256::from(DEFAULT_GAS_PER_PUBDATA_LIMIT),
            factory_deps: Vec::new(),
            custom_signature: None,
            paymaster_params: None,
        }
    }
}

impl Eip712Meta {
    /// Appends the bytecode hash of every raw bytecode to `factory_deps`.
    pub fn with_factory_dep_bytecodes<B: AsRef<[u8]>>(
        mut self,
        bytecodes: &[B],
    ) -> Result<Self, HashError> {
        for bytecode in bytecodes {
            self.factory_deps.push(bytecode_hash(bytecode.as_ref())?);
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionEnvelope {
    pub kind: EnvelopeKind,
    pub chain_id: Option<u64>,
    pub nonce: U256,
    pub to: Option<Address>,
    /// Only part of the wire format for [`EnvelopeKind::Eip712`]. The other
    /// kinds recover the sender from their signature.
    pub from: Option<Address>,
    pub value: U256,
    pub data: Bytes,
    pub gas_limit: U256,
    pub max_fee_per_gas: U256,
    /// Legacy envelopes have a single gas price. They keep it in
    /// `max_fee_per_gas` and mirror it here.
    pub max_priority_fee_per_gas: U256,
    pub extension: Option<Eip712Meta>,
}

impl TransactionEnvelope {
    pub fn new(kind: EnvelopeKind) -> Self {
        Self {
            kind,
            chain_id: None,
            nonce: U256::ZERO,
            to: None,
            from: None,
            value: U256::ZERO,
            data: Bytes::new(),
            gas_limit: U256::ZERO,
            max_fee_per_gas: U256::ZERO,
            max_priority_fee_per_gas: U256::ZERO,
            extension: None,
        }
    }

    pub fn builder(kind: EnvelopeKind) -> TransactionEnvelopeBuilder {
        TransactionEnvelopeBuilder::new(kind)
    }

    pub fn chain_id(&self) -> Result<u64, EncodingError> {
        self.chain_id.ok_or(EncodingError::MissingChainId)
    }

    /// Extension used for hashing and encoding. Bridge-aware envelopes
    /// without one get [`Eip712Meta::default`].
    pub fn meta(&self) -> Result<Option<Cow<'_, Eip712Meta>>, EncodingError> {
        match (self.kind, &self.extension) {
            (EnvelopeKind::Eip712, Some(meta)) => Ok(Some(Cow::Borrowed(meta))),
            (EnvelopeKind::Eip712, None) => Ok(Some(Cow::Owned(Eip712Meta::default()))),
            (kind, Some(_)) => Err(EncodingError::UnexpectedExtension(kind)),
            (_, None) => Ok(None),
        }
    }

    /// Defaulting pass: fills every field the wire format always carries.
    pub fn populated(mut self) -> Self {
        match self.kind {
            EnvelopeKind::Eip712 => {
                self.extension.get_or_insert_with(Eip712Meta::default);
            }
            EnvelopeKind::Legacy => {
                self.max_priority_fee_per_gas = self.max_fee_per_gas;
            }
            EnvelopeKind::Eip1559 => {}
        }
        self
    }

    /// Typed-data projection of the envelope. This is the one place that
    /// decides what an absent field hashes as: missing addresses become the
    /// zero address, missing byte strings and lists become empty, and
    /// `gasPerPubdataByteLimit` is zero for every kind but
    /// [`EnvelopeKind::Eip712`].
    pub fn sign_input(&self) -> Result<hash::Transaction, EncodingError> {
        let meta = self.meta()?;
        let (gas_per_pubdata, factory_deps, paymaster, paymaster_input) = match meta.as_deref() {
            Some(meta) => {
                let (paymaster, input) = meta
                    .paymaster_params
                    .as_ref()
                    .map(|params| (params.paymaster, params.paymaster_input.clone()))
                    .unwrap_or_default();
                (meta.gas_per_pubdata, meta.factory_deps.clone(), paymaster, input)
            }
            None => (U256::ZERO, Vec::new(), Address::ZERO, Bytes::new()),
        };

        Ok(hash::Transaction {
            txType: U256::from(self.kind as u8),
            from: address_word(self.from.unwrap_or_default()),
            to: address_word(self.to.unwrap_or_default()),
            gasLimit: self.gas_limit,
            gasPerPubdataByteLimit: gas_per_pubdata,
            maxFeePerGas: self.max_fee_per_gas,
            maxPriorityFeePerGas: self.max_priority_fee_per_gas,
            paymaster: address_word(paymaster),
            nonce: self.nonce,
            value: self.value,
            data: self.data.clone(),
            factoryDeps: factory_deps,
            paymasterInput: paymaster_input,
        })
    }

    pub fn eip712_domain(&self) -> Result<Eip712Domain, EncodingError> {
        Ok(eip712_domain(self.chain_id()?))
    }

    pub fn typed_data_hash(&self) -> Result<B256, EncodingError> {
        Ok(hash::typed_data_hash(
            &self.eip712_domain()?,
            &self.sign_input()?,
        ))
    }

    /// Dynamic typed data, suitable for an `eth_signTypedData_v4` request to
    /// an external wallet.
    pub fn typed_data(&self) -> Result<TypedData, EncodingError> {
        Ok(TypedData::from_struct(
            &self.sign_input()?,
            Some(self.eip712_domain()?),
        ))
    }

    /// Digest a key signs for this envelope.
    pub fn signature_payload_hash(&self) -> Result<B256, EncodingError> {
        match self.kind {
            EnvelopeKind::Eip712 => self.typed_data_hash(),
            EnvelopeKind::Legacy | EnvelopeKind::Eip1559 => Ok(keccak256(serialize(self, None)?)),
        }
    }
}

fn address_word(address: Address) -> U256 {
    U256::from_be_slice(address.as_slice())
}

#[derive(Clone, Debug)]
pub struct TransactionEnvelopeBuilder {
    envelope: TransactionEnvelope,
}

impl TransactionEnvelopeBuilder {
    pub fn new(kind: EnvelopeKind) -> Self {
        Self {
            envelope: TransactionEnvelope::new(kind),
        }
    }

    pub fn chain_id(mut self, chain_id: u64) -> Self {
        self.envelope.chain_id = Some(chain_id);
        self
    }

    pub fn nonce(mut self, nonce: impl Into<U256>) -> Self {
        self.envelope.nonce = nonce.into();
        self
    }

    pub fn to(mut self, to: Address) -> Self {
        self.envelope.to = Some(to);
        self
    }

    pub fn from(mut self, from: Address) -> Self {
        self.envelope.from = Some(from);
        self
    }

    pub fn value(mut self, value: impl Into<U256>) -> Self {
        self.envelope.value = value.into();
        self
    }

    pub fn data(mut self, data: impl Into<Bytes>) -> Self {
        self.envelope.data = data.into();
        self
    }

    pub fn gas_limit(mut self, gas_limit: impl Into<U256>) -> Self {
        self.envelope.gas_limit = gas_limit.into();
        self
    }

    pub fn max_fee_per_gas(mut self, max_fee_per_gas: impl Into<U256>) -> Self {
        self.envelope.max_fee_per_gas = max_fee_per_gas.into();
        self
    }

    pub fn max_priority_fee_per_gas(mut self, max_priority_fee_per_gas: impl Into<U256>) -> Self {
        self.envelope.max_priority_fee_per_gas = max_priority_fee_per_gas.into();
        self
    }

    pub fn extension(mut self, extension: Eip712Meta) -> Self {
        self.envelope.extension = Some(extension);
        self
    }

    pub fn build(self) -> TransactionEnvelope {
        self.envelope.populated()
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{address, bytes};

    use super::*;

    fn transfer() -> TransactionEnvelopeBuilder {
        TransactionEnvelope::builder(EnvelopeKind::Eip712)
            .chain_id(270)
            .nonce(U256::from(3u64))
            .to(address!("a61464658afeaf65cccaafd3a512b69a83b77618"))
            .from(address!("36615cf349d7f6344891b1e7ca7c72883f5dc049"))
            .value(U256::from(7_000_000u64))
            .gas_limit(U256::from(1_000_000u64))
            .max_fee_per_gas(U256::from(250_000_000u64))
    }

    #[test]
    fn test_typed_data_hash_substitutes_zero_values() -> eyre::Result<()> {
        let mut sparse = transfer().build();
        sparse.to = None;
        sparse.extension = None;

        let mut explicit = sparse.clone();
        explicit.to = Some(Address::ZERO);
        explicit.extension = Some(Eip712Meta {
            paymaster_params: Some(PaymasterParams {
                paymaster: Address::ZERO,
                paymaster_input: Bytes::new(),
            }),
            ..Default::default()
        });

        assert_eq!(sparse.typed_data_hash()?, explicit.typed_data_hash()?);
        Ok(())
    }

    #[test]
    fn test_typed_data_hash_depends_on_every_field() -> eyre::Result<()> {
        let base = transfer().build();
        let hash = base.typed_data_hash()?;

        let mut changed = base.clone();
        changed.data = bytes!("deadbeef");
        assert_ne!(hash, changed.typed_data_hash()?);

        let mut changed = base.clone();
        changed.chain_id = Some(300);
        assert_ne!(hash, changed.typed_data_hash()?);

        let mut changed = base.clone();
        changed.extension = Some(Eip712Meta {
            factory_deps: vec![B256::repeat_byte(1)],
            ..Default::default()
        });
        assert_ne!(hash, changed.typed_data_hash()?);
        Ok(())
    }

    #[test]
    fn test_dynamic_typed_data_matches_static_hash() -> eyre::Result<()> {
        let envelope = transfer()
            .extension(Eip712Meta {
                factory_deps: vec![B256::repeat_byte(0xab)],
                paymaster_params: Some(PaymasterParams {
                    paymaster: Address::repeat_byte(0x22),
                    paymaster_input: bytes!("8c5a3445"),
                }),
                ..Default::default()
            })
            .data(bytes!("a9059cbb"))
            .build();

        let typed_data = envelope.typed_data()?;
        assert_eq!(typed_data.eip712_signing_hash()?, envelope.typed_data_hash()?);
        Ok(())
    }

    #[test]
    fn test_default_gas_per_pubdata_only_for_eip712() -> eyre::Result<()> {
        let eip712 = transfer().build().sign_input()?;
        assert_eq!(eip712.gasPerPubdataByteLimit, U256::from(50_000));

        let mut legacy = transfer().build();
        legacy.kind = EnvelopeKind::Legacy;
        legacy.extension = None;
        assert_eq!(legacy.sign_input()?.gasPerPubdataByteLimit, U256::ZERO);

        legacy.extension = Some(Eip712Meta::default());
        assert_eq!(
            legacy.sign_input(),
            Err(EncodingError::UnexpectedExtension(EnvelopeKind::Legacy))
        );
        Ok(())
    }

    #[test]
    fn test_missing_chain_id() {
        let mut envelope = transfer().build();
        envelope.chain_id = None;
        assert_eq!(
            envelope.typed_data_hash(),
            Err(EncodingError::MissingChainId)
        );
    }

    #[test]
    fn test_factory_dep_bytecodes() -> eyre::Result<()> {
        let meta = Eip712Meta::default().with_factory_dep_bytecodes(&[[7u8; 32], [8u8; 32]])?;
        assert_eq!(meta.factory_deps.len(), 2);
        assert_eq!(meta.factory_deps[0], bytecode_hash(&[7u8; 32])?);

        assert!(Eip712Meta::default()
            .with_factory_dep_bytecodes(&[[7u8; 31]])
            .is_err());
        Ok(())
    }
}
