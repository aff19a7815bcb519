use std::path::PathBuf;

use alloy_primitives::{Address, B256};
use clap::{Parser, Subcommand};

use crate::LogFormat;

/// Bridge client CLI args
#[derive(Parser, Debug)]
#[command(name = "btc-bridge", version, about)]
pub struct BridgeArgs {
    #[arg(
        long = "log-format",
        value_name = "FORMAT",
        default_value_t = LogFormat::Terminal,
        global = true
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Follow a deposit until its priority operation is finalized on L2.
    Track {
        /// Path to the config toml file
        #[arg(long)]
        config: PathBuf,

        #[arg(long = "l1-tx", value_name = "HASH")]
        l1_tx: B256,

        /// Which priority operation log of the receipt to follow.
        #[arg(long, default_value_t = 0)]
        log_index: u64,

        /// L2 address encoded in the deposit's marker output.
        #[arg(long)]
        destination: Option<Address>,
    },
    /// Print the spendable outputs of an L1 address as json, the input of an
    /// external coin selection.
    ListUnspent {
        /// Path to the config toml file
        #[arg(long)]
        config: PathBuf,

        #[arg(long)]
        address: String,
    },
    /// Sign a funded deposit candidate and broadcast it to the L1 node.
    Deposit {
        /// Path to the config toml file
        #[arg(long)]
        config: PathBuf,

        /// File holding the WIF encoded key of `address`.
        #[arg(long = "key-file", value_name = "PATH")]
        key_file: PathBuf,

        /// L1 address the candidate's inputs belong to.
        #[arg(long)]
        address: String,

        /// Funded candidate json produced by coin selection.
        #[arg(long, value_name = "PATH")]
        candidate: PathBuf,

        /// L2 address credited with the deposit.
        #[arg(long)]
        destination: String,

        #[arg(long = "amount-sat", value_name = "SATOSHIS")]
        amount_sat: u64,

        /// Print the signed transaction instead of broadcasting it.
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the versioned hash of a raw bytecode file.
    BytecodeHash {
        #[arg(long)]
        file: PathBuf,
    },
}
