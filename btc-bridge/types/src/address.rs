use std::sync::LazyLock;

use alloy_primitives::{keccak256, Address, B256, U256};

use crate::{
    error::{DerivationError, HashError},
    hash::bytecode_hash,
    L1_TO_L2_ALIAS_OFFSET,
};

static CREATE2_PREFIX: LazyLock<B256> = LazyLock::new(|| keccak256("zksyncCreate2"));

/// Address of a contract deployed by `sender` at `nonce`: the low 20 bytes of
/// `keccak256(rlp([sender, nonce]))`.
pub fn create_address(sender: Address, nonce: u64) -> Address {
    sender.create(nonce)
}

/// Address of a contract deployed through the salted deployer path.
///
/// `keccak256(keccak256("zksyncCreate2") || pad32(sender) || salt ||
/// bytecodeHash || keccak256(input))`, truncated to its low 20 bytes.
pub fn create2_address(
    sender: Address,
    bytecode_hash: &[u8],
    salt: B256,
    input: &[u8],
) -> Result<Address, DerivationError> {
    let bytecode_hash = B256::try_from(bytecode_hash)
        .map_err(|_| DerivationError::InvalidDigestLength(bytecode_hash.len()))?;
    Ok(derive_create2(sender, bytecode_hash, salt, input))
}

/// Same as [`create2_address`] for a raw bytecode that still has to be hashed.
pub fn create2_address_from_bytecode(
    sender: Address,
    bytecode: &[u8],
    salt: B256,
    input: &[u8],
) -> Result<Address, HashError> {
    Ok(derive_create2(sender, bytecode_hash(bytecode)?, salt, input))
}

fn derive_create2(sender: Address, bytecode_hash: B256, salt: B256, input: &[u8]) -> Address {
    let mut preimage = Vec::with_capacity(32 * 5);
    preimage.extend_from_slice(CREATE2_PREFIX.as_slice());
    preimage.extend_from_slice(sender.into_word().as_slice());
    preimage.extend_from_slice(salt.as_slice());
    preimage.extend_from_slice(bytecode_hash.as_slice());
    preimage.extend_from_slice(keccak256(input).as_slice());

    Address::from_word(keccak256(preimage))
}

fn address_to_u256(address: Address) -> U256 {
    U256::from_be_slice(address.as_slice())
}

fn u256_to_address(value: U256) -> Address {
    Address::from_word(B256::from(value.to_be_bytes::<32>()))
}

/// L2 sender seen for a transaction initiated by the L1 contract `address`.
pub fn apply_l1_to_l2_alias(address: Address) -> Address {
    u256_to_address(address_to_u256(address).wrapping_add(address_to_u256(L1_TO_L2_ALIAS_OFFSET)))
}

/// Inverse of [`apply_l1_to_l2_alias`].
pub fn undo_l1_to_l2_alias(address: Address) -> Address {
    u256_to_address(address_to_u256(address).wrapping_sub(address_to_u256(L1_TO_L2_ALIAS_OFFSET)))
}
