use std::path::Path;

use alloy_primitives::{Address, B256};
use bitcoin::{address::NetworkUnchecked, Amount, PrivateKey};
use btc_bridge_client::{
    deposit::{spendable_utxos, DepositBuilder, DepositIntent, FundedCandidate, L1SigningKey},
    init_tracing, load_bridge_config,
    provider::{L1Provider, L2Provider},
    tracker::PriorityOpTracker,
    BridgeArgs, BridgeConfig, Command,
};
use btc_bridge_types::bytecode_hash;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Arguments of the `deposit` subcommand.
struct DepositArgs<'a> {
    key_file: &'a Path,
    address: &'a str,
    candidate: &'a Path,
    destination: &'a str,
    amount: Amount,
    dry_run: bool,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let args = BridgeArgs::parse();
    init_tracing(args.log_format)?;

    match args.command {
        Command::Track {
            config,
            l1_tx,
            log_index,
            destination,
        } => track(&config, l1_tx, log_index, destination).await,
        Command::ListUnspent { config, address } => {
            let config = load_bridge_config(&config)?;
            let address = l1_address(&config, &address)?;
            let l1 = L1Provider::new(&config.l1_rpc_url)?;
            let utxos = spendable_utxos(&l1, &address, config.min_confirmations).await?;
            println!("{}", serde_json::to_string_pretty(&utxos)?);
            Ok(())
        }
        Command::Deposit {
            config,
            key_file,
            address,
            candidate,
            destination,
            amount_sat,
            dry_run,
        } => {
            let config = load_bridge_config(&config)?;
            let args = DepositArgs {
                key_file: &key_file,
                address: &address,
                candidate: &candidate,
                destination: &destination,
                amount: Amount::from_sat(amount_sat),
                dry_run,
            };
            deposit(&config, args).await
        }
        Command::BytecodeHash { file } => {
            let bytecode = std::fs::read(&file)?;
            println!("{}", bytecode_hash(&bytecode)?);
            Ok(())
        }
    }
}

fn l1_address(config: &BridgeConfig, address: &str) -> eyre::Result<bitcoin::Address> {
    let address: bitcoin::Address<NetworkUnchecked> = address.parse()?;
    Ok(address.require_network(config.network)?)
}

async fn deposit(config: &BridgeConfig, args: DepositArgs<'_>) -> eyre::Result<()> {
    let bridge_address = config.bridge_address()?;
    let address = l1_address(config, args.address)?;
    let key = PrivateKey::from_wif(std::fs::read_to_string(args.key_file)?.trim())?;
    let key = L1SigningKey::from_address(key, &address)?;

    let candidate: FundedCandidate =
        serde_json::from_str(&std::fs::read_to_string(args.candidate)?)?;
    let intent = DepositIntent::new(args.destination, args.amount)?;
    let signed = DepositBuilder::new(bridge_address.as_unchecked().clone()).build(
        candidate,
        &intent,
        config.network,
        &key,
    )?;

    if args.dry_run {
        println!("{}", hex::encode(signed.raw()));
        return Ok(());
    }
    let l1 = L1Provider::new(&config.l1_rpc_url)?;
    let txid = signed.broadcast(&l1).await?;
    println!("{txid}");
    Ok(())
}

async fn track(
    config_path: &Path,
    l1_tx: B256,
    log_index: u64,
    destination: Option<Address>,
) -> eyre::Result<()> {
    let config = load_bridge_config(config_path)?;
    let l2 = L2Provider::new(&config.l2_rpc_url)?;

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received ctrl-c, cancelling");
            ctrl_c.cancel();
        }
    });

    let mut tracker =
        PriorityOpTracker::new(l2, l1_tx, config.tracker_config()).with_log_index(log_index);
    if let Some(destination) = destination {
        tracker = tracker.with_destination(destination);
    }

    match tracker.track(cancel).await {
        Ok(record) => {
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
        Err(e) => {
            error!(error = %e, %l1_tx, "Tracking failed");
            Err(e.into())
        }
    }
}
