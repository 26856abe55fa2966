//! Bite keeper for Single Collateral Dai global shutdown.
//!
//! Watches the Tub contract block by block. While the ledger is live every
//! cycle is a no-op; once it has been caged the keeper runs one full
//! liquidation sweep and exits. The sweep is exhaustive by default, or uses
//! the BiteCdps batch contract with candidates from the cup index.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::{mpsc, oneshot};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use keeper_api::CupIndexClient;
use keeper_chain::{BiteCdps, BlockWatcher, TransactionSender, Tub, Vox};
use keeper_core::{BatchSubmitter, BiteKeeper, CandidateSource, KeeperConfig};

/// Environment variable names.
mod env {
    pub const RPC_URL: &str = "RPC_URL";
    pub const WS_URL: &str = "WS_URL";
    pub const PRIVATE_KEY: &str = "PRIVATE_KEY";
    pub const TUB_ADDRESS: &str = "TUB_ADDRESS";
    pub const BITE_CDPS_ADDRESS: &str = "BITE_CDPS_ADDRESS";
    pub const GRAPHQL_URL: &str = "GRAPHQL_URL";
    pub const CHAIN_ID: &str = "CHAIN_ID";
}

const DEFAULT_GRAPHQL_URL: &str = "https://sai-mainnet.makerfoundation.com/v1";

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,keeper_core=debug,keeper_chain=debug")),
        )
        .init();

    info!("Starting bite keeper");

    let config = load_env_config()?;
    let keeper_config = KeeperConfig::from_env()?;
    keeper_config.log_config();

    let tub = Arc::new(Tub::new(&config.rpc_url, config.tub_address));
    let vox_address = tub.vox().await?;
    let vox = Arc::new(Vox::new(&config.rpc_url, vox_address));
    info!(tub = %config.tub_address, vox = %vox_address, "Ledger contracts resolved");

    let sender = Arc::new(TransactionSender::new(
        &config.private_key,
        &config.rpc_url,
        config.chain_id,
        keeper_config.gas.build_pricer(),
        keeper_config.rebroadcast_interval(),
        keeper_config.submit_deadline(),
    )?);
    info!(
        address = %sender.address,
        gas_strategy = sender.gas_strategy(),
        "Transaction sender initialized"
    );

    // Indexed mode engages iff a BiteCdps address is configured
    let (source, bitecdps) = match config.bitecdps_address {
        Some(address) => {
            let index = Arc::new(CupIndexClient::with_timeout(
                &config.graphql_url,
                Duration::from_secs(keeper_config.rpc_timeout_secs),
            ));
            info!(bitecdps = %address, index = index.url(), "Running in indexed mode");
            (
                CandidateSource::Indexed {
                    index,
                    top: keeper_config.top,
                },
                Some(BiteCdps::new(address)),
            )
        }
        None => {
            info!("Running in exhaustive mode");
            (CandidateSource::Exhaustive { tub: tub.clone() }, None)
        }
    };

    let submitter = BatchSubmitter::new(sender, keeper_config.chunks);
    let mut keeper = BiteKeeper::new(tub, vox, source, bitecdps, submitter);

    let (blocks_tx, blocks_rx) = mpsc::channel(16);
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let watcher = BlockWatcher::new(&config.ws_url);
    let watcher_handle = tokio::spawn(watcher.run(blocks_tx, shutdown_rx));

    keeper.run(blocks_rx, shutdown_tx).await?;

    // Give the watcher a moment to wind down before the process exits
    let _ = tokio::time::timeout(Duration::from_secs(5), watcher_handle).await;
    Ok(())
}

/// Endpoints, account material, and contract addresses from the environment.
struct EnvConfig {
    rpc_url: String,
    ws_url: String,
    private_key: String,
    tub_address: alloy::primitives::Address,
    bitecdps_address: Option<alloy::primitives::Address>,
    graphql_url: String,
    chain_id: u64,
}

fn load_env_config() -> Result<EnvConfig> {
    let get_env = |name: &str| -> Result<String> {
        std::env::var(name).map_err(|_| anyhow::anyhow!("Missing env var: {}", name))
    };

    let get_address = |name: &str| -> Result<alloy::primitives::Address> {
        get_env(name)?
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid address for {}: {}", name, e))
    };

    Ok(EnvConfig {
        rpc_url: get_env(env::RPC_URL).unwrap_or_else(|_| "http://localhost:8545".to_string()),
        ws_url: get_env(env::WS_URL).unwrap_or_else(|_| "ws://localhost:8546".to_string()),
        private_key: get_env(env::PRIVATE_KEY)?,
        tub_address: get_address(env::TUB_ADDRESS)?,
        bitecdps_address: std::env::var(env::BITE_CDPS_ADDRESS)
            .ok()
            .map(|s| {
                s.parse()
                    .map_err(|e| anyhow::anyhow!("Invalid address for BITE_CDPS_ADDRESS: {}", e))
            })
            .transpose()?,
        graphql_url: get_env(env::GRAPHQL_URL).unwrap_or_else(|_| DEFAULT_GRAPHQL_URL.to_string()),
        chain_id: get_env(env::CHAIN_ID)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1),
    })
}
