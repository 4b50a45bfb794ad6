use std::{sync::Arc, time::Duration};

use alloy::primitives::{utils::format_ether, U256};
use colored::Colorize;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{
    chain::{NetworkId, NetworkRegistry},
    client::ChainClient,
};

pub const REFRESH_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceCell {
    Pending,
    Amount(U256),
    Error,
    NoRpc,
}

/// Last known wallet balance per network. Display state only.
#[derive(Debug)]
pub struct BalanceBoard {
    cells: Mutex<Vec<(NetworkId, BalanceCell)>>,
}

impl Default for BalanceBoard {
    fn default() -> Self {
        Self {
            cells: Mutex::new(
                NetworkId::ALL
                    .iter()
                    .map(|id| (*id, BalanceCell::Pending))
                    .collect(),
            ),
        }
    }
}

impl BalanceBoard {
    /// Re-reads every network. A failing network is marked and skipped.
    pub async fn refresh<C: ChainClient + ?Sized>(&self, registry: &NetworkRegistry, client: &C) {
        let mut cells = Vec::with_capacity(NetworkId::ALL.len());
        for network in registry.iter() {
            let cell = if network.rpc_url.is_none() {
                BalanceCell::NoRpc
            } else {
                match client.balance(network).await {
                    Ok(balance) => BalanceCell::Amount(balance),
                    Err(err) => {
                        tracing::debug!(network = %network.id, %err, "balance query failed");
                        BalanceCell::Error
                    }
                }
            };
            cells.push((network.id, cell));
        }
        *self.cells.lock() = cells;
    }

    pub fn get(&self, id: NetworkId) -> BalanceCell {
        self.cells
            .lock()
            .iter()
            .find(|(network, _)| *network == id)
            .map(|(_, cell)| *cell)
            .unwrap_or(BalanceCell::Pending)
    }

    /// One `name: value` line per network.
    pub fn render(&self) -> Vec<String> {
        self.cells
            .lock()
            .iter()
            .map(|(id, cell)| {
                let value = match cell {
                    BalanceCell::Pending => "...".normal(),
                    BalanceCell::Amount(wei) => format!("{} ETH", ether_5dp(*wei)).green(),
                    BalanceCell::Error => "Error".red(),
                    BalanceCell::NoRpc => "No RPC".yellow(),
                };
                format!("{id}: {value}")
            })
            .collect()
    }
}

fn ether_5dp(wei: U256) -> String {
    let ether: f64 = format_ether(wei).parse().unwrap_or_default();
    format!("{ether:.5}")
}

/// Refreshes `board` every `interval` until `stop` fires.
pub fn spawn_refresher<C: ChainClient>(
    board: Arc<BalanceBoard>,
    registry: Arc<NetworkRegistry>,
    client: Arc<C>,
    interval: Duration,
    stop: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick fires immediately; startup already did a refresh.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = stop.cancelled() => break,
                _ = ticker.tick() => {
                    board.refresh(&registry, client.as_ref()).await;
                    tracing::debug!("balances refreshed");
                }
            }
        }
    })
}
