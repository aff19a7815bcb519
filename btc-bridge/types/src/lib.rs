//! Wire formats and hash domains shared by every part of the bridge client.
//!
//! Nothing in this crate performs I/O. Everything here is a pure function of
//! its inputs and can be called from any signer or runtime.

pub mod address;
pub mod error;
pub mod hash;
pub mod transaction;

pub use address::*;
pub use error::*;
pub use hash::{
    bytecode_hash, eip712_domain, l2_to_l1_message_hash, message_hash, typed_data_hash, L2ToL1Log,
};
pub use transaction::*;

mod constants {
    use alloy_primitives::{address, Address};

    /// Sender of the receipt log that links an L1 deposit to its L2 priority
    /// operation.
    pub const BOOTLOADER_FORMAL_ADDRESS: Address =
        address!("0000000000000000000000000000000000008001");

    pub const CONTRACT_DEPLOYER_ADDRESS: Address =
        address!("0000000000000000000000000000000000008006");

    /// System contract publishing user messages to L1.
    pub const L1_MESSENGER_ADDRESS: Address = address!("0000000000000000000000000000000000008008");

    /// Offset added to L1 contract addresses when they act on L2.
    pub const L1_TO_L2_ALIAS_OFFSET: Address =
        address!("1111000000000000000000000000000000001111");

    pub const DEFAULT_GAS_PER_PUBDATA_LIMIT: u64 = 50_000;
    pub const REQUIRED_L1_TO_L2_GAS_PER_PUBDATA_LIMIT: u64 = 800;
}
pub use constants::*;
