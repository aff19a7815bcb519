//! Assembly of the L1 transaction that moves funds into the bridge.
//!
//! Coin selection is not done here. A [`UtxoSelector`] hands back a
//! [`FundedCandidate`] and [`DepositBuilder::build`] appends the bridge output
//! and the destination marker, signs every input and serializes the result.

use std::fmt::Display;

use alloy_primitives::Address;
use bitcoin::{
    absolute::LockTime,
    address::{NetworkChecked, NetworkUnchecked},
    consensus,
    ecdsa,
    hashes::Hash,
    key::{CompressedPublicKey, TapTweak},
    script::{Builder, PushBytesBuf},
    secp256k1::{All, Keypair, Message, Secp256k1},
    sighash::{EcdsaSighashType, Prevouts, SighashCache, TapSighashType},
    taproot,
    transaction::Version,
    AddressType, Amount, Network, OutPoint, PrivateKey, PublicKey, ScriptBuf, Sequence,
    Transaction, TxIn, TxOut, Txid, Witness,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::{
    error::{DepositError, RpcError, SelectionError},
    provider::L1Rpc,
    types::Utxo,
};

/// What the user asked for: `amount` to arrive at `destination` on L2.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositIntent {
    pub destination: Address,
    pub amount: Amount,
    /// Opaque tag forwarded to the selection routine.
    pub selection_strategy: String,
}

impl DepositIntent {
    /// Parses a hex destination, with or without `0x`.
    pub fn new(destination: &str, amount: Amount) -> Result<Self, DepositError> {
        let stripped = destination.strip_prefix("0x").unwrap_or(destination);
        let bytes = hex::decode(stripped)
            .map_err(|_| DepositError::InvalidDestination(destination.to_string()))?;
        if bytes.len() != 20 {
            return Err(DepositError::InvalidDestination(destination.to_string()));
        }
        Ok(Self {
            destination: Address::from_slice(&bytes),
            amount,
            selection_strategy: String::from("default"),
        })
    }

    pub fn with_selection_strategy(mut self, strategy: impl Into<String>) -> Self {
        self.selection_strategy = strategy.into();
        self
    }
}

/// An input picked by the selection routine, with the output it spends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundedInput {
    pub outpoint: OutPoint,
    pub prevout: TxOut,
}

impl From<&Utxo> for FundedInput {
    fn from(utxo: &Utxo) -> Self {
        Self {
            outpoint: OutPoint::new(utxo.txid, utxo.vout),
            prevout: TxOut {
                value: utxo.amount,
                script_pubkey: utxo.script_pub_key.clone(),
            },
        }
    }
}

/// Result of coin selection: inputs, optional change and the fee they leave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundedCandidate {
    pub inputs: Vec<FundedInput>,
    pub change: Option<TxOut>,
    pub fee: Amount,
}

impl FundedCandidate {
    fn input_total(&self) -> Option<Amount> {
        self.inputs
            .iter()
            .try_fold(Amount::ZERO, |total, input| total.checked_add(input.prevout.value))
    }
}

/// External coin selection.
pub trait UtxoSelector: Send + Sync {
    fn select(
        &self,
        intent: &DepositIntent,
        utxos: Vec<Utxo>,
    ) -> Result<FundedCandidate, SelectionError>;
}

/// Outputs of `address` with at least `min_conf` confirmations that the node
/// can spend.
pub async fn spendable_utxos<L: L1Rpc + ?Sized>(
    l1: &L,
    address: &bitcoin::Address,
    min_conf: u32,
) -> Result<Vec<Utxo>, DepositError> {
    let utxos: Vec<Utxo> = l1
        .list_unspent(address, min_conf)
        .await?
        .into_iter()
        .filter(|utxo| utxo.spendable)
        .collect();
    debug!(count = utxos.len(), "Listed unspent outputs");
    Ok(utxos)
}

/// Lists the spendable outputs of `address` and lets `selector` fund `intent`.
#[instrument(
    skip_all,
    fields(%address, amount = %intent.amount, strategy = %intent.selection_strategy)
)]
pub async fn fund_deposit<L, S>(
    l1: &L,
    selector: &S,
    intent: &DepositIntent,
    address: &bitcoin::Address,
    min_conf: u32,
) -> Result<FundedCandidate, DepositError>
where
    L: L1Rpc + ?Sized,
    S: UtxoSelector + ?Sized,
{
    let utxos = spendable_utxos(l1, address, min_conf).await?;
    selector
        .select(intent, utxos)
        .map_err(|e| DepositError::SelectionFailed(e.to_string()))
}

/// Script kinds a deposit can be signed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AddressKind {
    P2wpkh,
    P2tr,
    P2pkh,
    P2shP2wpkh,
}

/// A private key bound to the address whose outputs it spends.
#[derive(Debug, Clone)]
pub struct L1SigningKey {
    key: PrivateKey,
    public_key: PublicKey,
    kind: AddressKind,
    script_pubkey: ScriptBuf,
}

impl L1SigningKey {
    pub fn from_address(
        key: PrivateKey,
        address: &bitcoin::Address<NetworkChecked>,
    ) -> Result<Self, DepositError> {
        let kind = match address.address_type() {
            Some(AddressType::P2wpkh) => AddressKind::P2wpkh,
            Some(AddressType::P2tr) => AddressKind::P2tr,
            Some(AddressType::P2pkh) => AddressKind::P2pkh,
            Some(AddressType::P2sh) => AddressKind::P2shP2wpkh,
            _ => return Err(DepositError::UnsupportedAddressKind(address.to_string())),
        };

        let secp = Secp256k1::new();
        let public_key = key.public_key(&secp);
        let script_pubkey = address.script_pubkey();
        let expected = match kind {
            AddressKind::P2pkh => Some(ScriptBuf::new_p2pkh(&public_key.pubkey_hash())),
            AddressKind::P2wpkh => CompressedPublicKey::try_from(public_key)
                .ok()
                .map(|pk| ScriptBuf::new_p2wpkh(&pk.wpubkey_hash())),
            AddressKind::P2shP2wpkh => CompressedPublicKey::try_from(public_key).ok().map(|pk| {
                let redeem_script = ScriptBuf::new_p2wpkh(&pk.wpubkey_hash());
                ScriptBuf::new_p2sh(&redeem_script.script_hash())
            }),
            AddressKind::P2tr => {
                let (internal_key, _) = public_key.inner.x_only_public_key();
                Some(ScriptBuf::new_p2tr(&secp, internal_key, None))
            }
        };
        if expected.as_ref() != Some(&script_pubkey) {
            // a script hash only reveals its kind through the key it nests
            let address = address.to_string();
            return Err(match kind {
                AddressKind::P2shP2wpkh => DepositError::UnsupportedAddressKind(address),
                _ => DepositError::KeyAddressMismatch(address),
            });
        }

        Ok(Self {
            key,
            public_key,
            kind,
            script_pubkey,
        })
    }

    pub fn kind(&self) -> AddressKind {
        self.kind
    }

    pub fn script_pubkey(&self) -> &ScriptBuf {
        &self.script_pubkey
    }

    fn sign_ecdsa(&self, secp: &Secp256k1<All>, digest: [u8; 32]) -> ecdsa::Signature {
        let message = Message::from_digest(digest);
        ecdsa::Signature::sighash_all(secp.sign_ecdsa(&message, &self.key.inner))
    }

    /// `script_sig` and witness spending input `index`.
    fn unlock(
        &self,
        secp: &Secp256k1<All>,
        cache: &mut SighashCache<&Transaction>,
        index: usize,
        prevouts: &[TxOut],
    ) -> Result<(ScriptBuf, Witness), DepositError> {
        let value = prevouts
            .get(index)
            .map(|prevout| prevout.value)
            .ok_or_else(|| sighash_error(index)("missing prevout"))?;

        match self.kind {
            AddressKind::P2wpkh => {
                let sighash = cache
                    .p2wpkh_signature_hash(index, &self.script_pubkey, value, EcdsaSighashType::All)
                    .map_err(sighash_error(index))?;
                let signature = self.sign_ecdsa(secp, sighash.to_byte_array());
                Ok((ScriptBuf::new(), Witness::p2wpkh(&signature, &self.public_key.inner)))
            }
            AddressKind::P2shP2wpkh => {
                let compressed = CompressedPublicKey(self.public_key.inner);
                let redeem_script = ScriptBuf::new_p2wpkh(&compressed.wpubkey_hash());
                let sighash = cache
                    .p2wpkh_signature_hash(index, &redeem_script, value, EcdsaSighashType::All)
                    .map_err(sighash_error(index))?;
                let signature = self.sign_ecdsa(secp, sighash.to_byte_array());
                let script_sig = Builder::new()
                    .push_slice(PushBytesBuf::try_from(redeem_script.to_bytes())?)
                    .into_script();
                Ok((script_sig, Witness::p2wpkh(&signature, &self.public_key.inner)))
            }
            AddressKind::P2pkh => {
                let sighash = cache
                    .legacy_signature_hash(
                        index,
                        &self.script_pubkey,
                        EcdsaSighashType::All.to_u32(),
                    )
                    .map_err(sighash_error(index))?;
                let signature = self.sign_ecdsa(secp, sighash.to_byte_array());
                let script_sig = Builder::new()
                    .push_slice(PushBytesBuf::try_from(signature.to_vec())?)
                    .push_key(&self.public_key)
                    .into_script();
                Ok((script_sig, Witness::new()))
            }
            AddressKind::P2tr => {
                let sighash = cache
                    .taproot_key_spend_signature_hash(
                        index,
                        &Prevouts::All(prevouts),
                        TapSighashType::Default,
                    )
                    .map_err(sighash_error(index))?;
                let keypair = Keypair::from_secret_key(secp, &self.key.inner)
                    .tap_tweak(secp, None)
                    .to_inner();
                let message = Message::from_digest(sighash.to_byte_array());
                let signature = taproot::Signature {
                    signature: secp.sign_schnorr_no_aux_rand(&message, &keypair),
                    sighash_type: TapSighashType::Default,
                };
                Ok((ScriptBuf::new(), Witness::p2tr_key_spend(&signature)))
            }
        }
    }
}

fn sighash_error<E: Display>(input: usize) -> impl FnOnce(E) -> DepositError {
    move |e| DepositError::Sighash {
        input,
        reason: e.to_string(),
    }
}

/// Signed deposit ready for broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedL1Transaction {
    txid: Txid,
    raw: Vec<u8>,
}

impl SignedL1Transaction {
    pub fn txid(&self) -> Txid {
        self.txid
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Hands the transaction to the L1 node. The node must report the txid
    /// computed locally.
    pub async fn broadcast<L: L1Rpc + ?Sized>(self, l1: &L) -> Result<Txid, DepositError> {
        let txid = l1.send_raw_transaction(&self.raw).await?;
        if txid != self.txid {
            return Err(RpcError::invalid_response(
                "sendrawtransaction",
                format!("node reported txid {txid}, expected {}", self.txid),
            )
            .into());
        }
        info!(%txid, "Deposit broadcast");
        Ok(txid)
    }
}

/// Builds deposits paying into one bridge address.
#[derive(Debug, Clone)]
pub struct DepositBuilder {
    bridge_address: bitcoin::Address<NetworkUnchecked>,
}

impl DepositBuilder {
    pub fn new(bridge_address: bitcoin::Address<NetworkUnchecked>) -> Self {
        Self { bridge_address }
    }

    /// Outputs are, in order: the bridge output carrying `intent.amount`, the
    /// zero value marker holding the destination bytes, then the change.
    #[instrument(
        skip_all,
        fields(amount = %intent.amount, destination = %intent.destination, %network)
    )]
    pub fn build(
        &self,
        candidate: FundedCandidate,
        intent: &DepositIntent,
        network: Network,
        key: &L1SigningKey,
    ) -> Result<SignedL1Transaction, DepositError> {
        let bridge_address = self
            .bridge_address
            .clone()
            .require_network(network)
            .map_err(|_| DepositError::InvalidBridgeAddress(network))?;

        if candidate.inputs.is_empty() {
            return Err(DepositError::SelectionFailed("candidate has no inputs".into()));
        }
        if let Some(index) = candidate
            .inputs
            .iter()
            .position(|input| input.prevout.script_pubkey != key.script_pubkey)
        {
            return Err(DepositError::ForeignInput { index });
        }

        let change_value = candidate.change.as_ref().map_or(Amount::ZERO, |c| c.value);
        let available = candidate
            .input_total()
            .ok_or_else(|| DepositError::SelectionFailed("input total overflows".into()))?;
        let required = intent
            .amount
            .checked_add(candidate.fee)
            .and_then(|sum| sum.checked_add(change_value))
            .ok_or_else(|| DepositError::SelectionFailed("output total overflows".into()))?;
        if available < required {
            return Err(DepositError::SelectionFailed(format!(
                "inputs cover {available}, deposit needs {required}"
            )));
        }
        if available > required {
            return Err(DepositError::SelectionFailed(format!(
                "{} left over without a change output",
                available - required
            )));
        }

        let marker = TxOut {
            value: Amount::ZERO,
            script_pubkey: ScriptBuf::new_op_return(PushBytesBuf::try_from(
                intent.destination.to_vec(),
            )?),
        };
        let mut output = vec![
            TxOut {
                value: intent.amount,
                script_pubkey: bridge_address.script_pubkey(),
            },
            marker,
        ];
        output.extend(candidate.change);

        let mut tx = Transaction {
            version: Version::TWO,
            lock_time: LockTime::ZERO,
            input: candidate
                .inputs
                .iter()
                .map(|input| TxIn {
                    previous_output: input.outpoint,
                    script_sig: ScriptBuf::new(),
                    sequence: Sequence::ENABLE_RBF_NO_LOCKTIME,
                    witness: Witness::new(),
                })
                .collect(),
            output,
        };

        let secp = Secp256k1::new();
        let prevouts: Vec<TxOut> = candidate
            .inputs
            .into_iter()
            .map(|input| input.prevout)
            .collect();
        let unlocks = {
            let mut cache = SighashCache::new(&tx);
            (0..prevouts.len())
                .map(|index| key.unlock(&secp, &mut cache, index, &prevouts))
                .collect::<Result<Vec<_>, _>>()?
        };
        for (input, (script_sig, witness)) in tx.input.iter_mut().zip(unlocks) {
            input.script_sig = script_sig;
            input.witness = witness;
        }

        let txid = tx.compute_txid();
        let raw = consensus::encode::serialize(&tx);
        info!(%txid, kind = ?key.kind, size = raw.len(), "Built deposit transaction");

        Ok(SignedL1Transaction { txid, raw })
    }
}
