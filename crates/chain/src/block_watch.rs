//! WebSocket new-block watcher driving the keeper's check cycle.

use alloy::providers::{Provider, ProviderBuilder, WsConnect};
use anyhow::Result;
use futures::StreamExt;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Subscribes to new block headers and forwards block numbers to the keeper.
///
/// The watcher runs until the subscription ends, the receiver side is
/// dropped, or the keeper fires the shutdown signal (which it does after a
/// completed sweep).
pub struct BlockWatcher {
    ws_url: String,
}

impl BlockWatcher {
    pub fn new(ws_url: impl Into<String>) -> Self {
        Self {
            ws_url: ws_url.into(),
        }
    }

    /// Forward new block numbers into `blocks` until `shutdown` fires.
    pub async fn run(
        self,
        blocks: mpsc::Sender<u64>,
        mut shutdown: oneshot::Receiver<()>,
    ) -> Result<()> {
        info!(ws_url = %self.ws_url, "Subscribing to new block headers");

        let ws = WsConnect::new(&self.ws_url);
        let provider = ProviderBuilder::new().on_ws(ws).await?;
        let sub = provider.subscribe_blocks().await?;
        let mut stream = sub.into_stream();
        info!("Block subscription established");

        loop {
            tokio::select! {
                header = stream.next() => {
                    let Some(header) = header else {
                        warn!("Block subscription ended");
                        return Ok(());
                    };
                    debug!(block = header.number, "New block");
                    if blocks.send(header.number).await.is_err() {
                        debug!("Keeper dropped the block channel, stopping watcher");
                        return Ok(());
                    }
                }
                _ = &mut shutdown => {
                    info!("Block watcher shutting down");
                    return Ok(());
                }
            }
        }
    }
}
