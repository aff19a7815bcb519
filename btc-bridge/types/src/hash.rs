use alloy_primitives::{eip191_hash_message, keccak256, Address, B256};
use alloy_sol_types::{sol, Eip712Domain, SolStruct};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::{error::HashError, L1_MESSENGER_ADDRESS};

/// Largest bytecode that still fits the 16-bit word count of a versioned hash.
pub const MAX_BYTECODE_LEN_BYTES: usize = ((1 << 16) - 1) * 32;

/// First two bytes of every bytecode hash.
pub const BYTECODE_HASH_VERSION: [u8; 2] = [1, 0];

pub const EIP712_DOMAIN_NAME: &str = "zkSync";
pub const EIP712_DOMAIN_VERSION: &str = "2";

/// Packed size of an [`L2ToL1Log`] leaf.
pub const L2_TO_L1_LOG_SERIALIZE_SIZE: usize = 88;

sol! {
    /// Signable projection of a transaction envelope. Addresses are widened
    /// to `uint256` the same way the remote verifier does.
    #[allow(missing_docs)]
    #[derive(Debug, PartialEq, Eq, Serialize)]
    struct Transaction {
        uint256 txType;
        uint256 from;
        uint256 to;
        uint256 gasLimit;
        uint256 gasPerPubdataByteLimit;
        uint256 maxFeePerGas;
        uint256 maxPriorityFeePerGas;
        uint256 paymaster;
        uint256 nonce;
        uint256 value;
        bytes data;
        bytes32[] factoryDeps;
        bytes paymasterInput;
    }
}

/// Domain separator used for every envelope hashed on `chain_id`.
pub fn eip712_domain(chain_id: u64) -> Eip712Domain {
    Eip712Domain::new(
        Some(EIP712_DOMAIN_NAME.into()),
        Some(EIP712_DOMAIN_VERSION.into()),
        Some(alloy_primitives::U256::from(chain_id)),
        None,
        None,
    )
}

/// `keccak256(0x1901 || domainSeparator || hashStruct(value))`.
pub fn typed_data_hash<T: SolStruct>(domain: &Eip712Domain, value: &T) -> B256 {
    value.eip712_signing_hash(domain)
}

/// EIP-191 personal message hash.
pub fn message_hash(message: impl AsRef<[u8]>) -> B256 {
    eip191_hash_message(message)
}

/// Versioned hash of a contract bytecode.
///
/// The layout is `version (2 bytes) || word count (2 bytes, big endian) ||
/// sha256(bytecode)[4..]`. The bytecode must be made of an odd number of
/// 32-byte words and may not exceed [`MAX_BYTECODE_LEN_BYTES`].
pub fn bytecode_hash(bytecode: &[u8]) -> Result<B256, HashError> {
    let len = bytecode.len();
    if len % 32 != 0 {
        return Err(HashError::invalid_length(
            len,
            "length in bytes must be divisible by 32",
        ));
    }
    if len > MAX_BYTECODE_LEN_BYTES {
        return Err(HashError::invalid_length(
            len,
            "bytecode exceeds the maximum length",
        ));
    }
    let words = len / 32;
    if words % 2 == 0 {
        return Err(HashError::invalid_length(
            len,
            "length in 32-byte words must be odd",
        ));
    }

    let mut hash: [u8; 32] = Sha256::digest(bytecode).into();
    hash[..2].copy_from_slice(&BYTECODE_HASH_VERSION);
    // words <= u16::MAX is guaranteed by the max length check
    hash[2..4].copy_from_slice(&(words as u16).to_be_bytes());
    Ok(B256::from(hash))
}

/// Leaf of the L2 to L1 log tree. Both priority operation receipts and user
/// messages are committed in this form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct L2ToL1Log {
    /// Always 0.
    pub l2_shard_id: u8,
    /// Always `true`.
    pub is_service: bool,
    pub tx_number_in_block: u16,
    pub sender: Address,
    pub key: B256,
    pub value: B256,
}

impl L2ToL1Log {
    /// Solidity `abi.encodePacked` of the log fields.
    pub fn encode(&self) -> [u8; L2_TO_L1_LOG_SERIALIZE_SIZE] {
        let mut buffer = [0u8; L2_TO_L1_LOG_SERIALIZE_SIZE];
        buffer[0] = self.l2_shard_id;
        buffer[1] = self.is_service as u8;
        buffer[2..4].copy_from_slice(&self.tx_number_in_block.to_be_bytes());
        buffer[4..24].copy_from_slice(self.sender.as_slice());
        buffer[24..56].copy_from_slice(self.key.as_slice());
        buffer[56..88].copy_from_slice(self.value.as_slice());
        buffer
    }

    pub fn hash(&self) -> B256 {
        keccak256(self.encode())
    }
}

/// Hash of the log leaf emitted when `sender` publishes `message` from the
/// transaction at `tx_index_in_block`.
///
/// The message enters the leaf through its keccak digest, which commits to
/// both its length and its bytes.
pub fn l2_to_l1_message_hash(sender: Address, message: &[u8], tx_index_in_block: u16) -> B256 {
    L2ToL1Log {
        l2_shard_id: 0,
        is_service: true,
        tx_number_in_block: tx_index_in_block,
        sender: L1_MESSENGER_ADDRESS,
        key: sender.into_word(),
        value: keccak256(message),
    }
    .hash()
}
