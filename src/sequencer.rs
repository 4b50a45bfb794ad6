//! The auto-bridge loop.
//!
//! A [`BridgeController`] owns the only run state in the process. Starting a
//! run flips it from idle to running under a lock, so at most one run exists
//! at a time; every exit path of the loop flips it back.

use std::{fmt, sync::Arc};

use parking_lot::Mutex;
use rand::{rngs::StdRng, SeedableRng};
use tokio::{sync::watch, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::{
    activity::ActivityLog,
    balances::BalanceBoard,
    calls::{sample_duration, short_hex, BridgeCall, BridgeMode, TransferAmount, INTER_CYCLE_DELAY},
    chain::{BridgePair, Network, NetworkRegistry},
    client::{BridgeReceipt, ChainClient},
    error::BridgeError,
    wait::{wait_cancellable, WaitOutcome},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Idle,
    Running,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Idle => f.write_str("Idle"),
            RunStatus::Running => f.write_str("Running"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StartError {
    #[error("bridge operation already in progress")]
    AlreadyRunning,
    #[error("cycle count must be positive")]
    NoCycles,
}

/// Point-in-time view of the active run for the status panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSnapshot {
    pub mode: BridgeMode,
    pub pair: BridgePair,
    pub current_cycle: u32,
    pub total_cycles: u32,
    pub cancel_requested: bool,
}

#[derive(Debug)]
struct ActiveRun {
    mode: BridgeMode,
    pair: BridgePair,
    current_cycle: u32,
    total_cycles: u32,
    cancel: CancellationToken,
}

#[derive(Debug, Default)]
enum RunState {
    #[default]
    Idle,
    Running(ActiveRun),
}

/// One bridge call attempt, successful or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub cycle: u32,
    pub pair: BridgePair,
    pub amount: TransferAmount,
    pub outcome: Result<BridgeReceipt, BridgeError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEnd {
    /// All requested cycles ran.
    Completed,
    /// Stopped by the user.
    Cancelled,
    /// An attempt failed; the remaining cycles were skipped.
    Failed,
    /// Another run was active, nothing happened.
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub attempts: Vec<Attempt>,
    pub end: RunEnd,
}

impl RunReport {
    fn rejected() -> Self {
        Self {
            attempts: Vec::new(),
            end: RunEnd::Rejected,
        }
    }
}

pub struct BridgeController<C> {
    registry: Arc<NetworkRegistry>,
    client: Arc<C>,
    log: Arc<ActivityLog>,
    balances: Arc<BalanceBoard>,
    rng: Mutex<StdRng>,
    state: Mutex<RunState>,
    status: watch::Sender<RunStatus>,
}

impl<C: ChainClient> BridgeController<C> {
    pub fn new(
        registry: Arc<NetworkRegistry>,
        client: Arc<C>,
        log: Arc<ActivityLog>,
        balances: Arc<BalanceBoard>,
    ) -> Self {
        Self {
            registry,
            client,
            log,
            balances,
            rng: Mutex::new(StdRng::from_entropy()),
            state: Mutex::new(RunState::Idle),
            status: watch::Sender::new(RunStatus::Idle),
        }
    }

    /// Makes amounts and delays reproducible.
    pub fn with_seed(self, seed: u64) -> Self {
        *self.rng.lock() = StdRng::seed_from_u64(seed);
        self
    }

    pub fn status(&self) -> RunStatus {
        match *self.state.lock() {
            RunState::Idle => RunStatus::Idle,
            RunState::Running(_) => RunStatus::Running,
        }
    }

    /// Notified when a run starts and again once it has finished, after the
    /// final balance refresh.
    pub fn subscribe(&self) -> watch::Receiver<RunStatus> {
        self.status.subscribe()
    }

    pub fn snapshot(&self) -> Option<RunSnapshot> {
        match &*self.state.lock() {
            RunState::Idle => None,
            RunState::Running(run) => Some(RunSnapshot {
                mode: run.mode,
                pair: run.pair,
                current_cycle: run.current_cycle,
                total_cycles: run.total_cycles,
                cancel_requested: run.cancel.is_cancelled(),
            }),
        }
    }

    /// Asks the active run to stop at its next wait or cycle boundary.
    /// Returns whether a run was active.
    pub fn cancel(&self) -> bool {
        let active = match &*self.state.lock() {
            RunState::Running(run) => {
                run.cancel.cancel();
                true
            }
            RunState::Idle => false,
        };
        if active {
            self.log.warning("Stop signal sent. Finishing current step...");
        } else {
            self.log.info("No operation currently running.");
        }
        active
    }

    /// Starts a run in the background.
    pub fn start(
        self: &Arc<Self>,
        mode: BridgeMode,
        pair: BridgePair,
        total_cycles: u32,
    ) -> Result<JoinHandle<RunReport>, StartError> {
        let cancel = self.begin(mode, pair, total_cycles)?;
        let this = Arc::clone(self);
        Ok(tokio::spawn(async move {
            this.drive(mode, pair, total_cycles, cancel).await
        }))
    }

    /// Runs to completion on the current task. Rejected (and a no-op) when
    /// another run is active.
    pub async fn run_auto_bridge(
        &self,
        mode: BridgeMode,
        pair: BridgePair,
        total_cycles: u32,
    ) -> RunReport {
        match self.begin(mode, pair, total_cycles) {
            Ok(cancel) => self.drive(mode, pair, total_cycles, cancel).await,
            Err(_) => RunReport::rejected(),
        }
    }

    fn begin(
        &self,
        mode: BridgeMode,
        pair: BridgePair,
        total_cycles: u32,
    ) -> Result<CancellationToken, StartError> {
        let mut state = self.state.lock();
        if matches!(*state, RunState::Running(_)) {
            drop(state);
            self.log.warning("Bridge operation already in progress.");
            return Err(StartError::AlreadyRunning);
        }
        if total_cycles == 0 {
            drop(state);
            self.log
                .error("Invalid input. Please enter a positive number.");
            return Err(StartError::NoCycles);
        }
        let cancel = CancellationToken::new();
        *state = RunState::Running(ActiveRun {
            mode,
            pair,
            current_cycle: 0,
            total_cycles,
            cancel: cancel.clone(),
        });
        drop(state);
        self.status.send_replace(RunStatus::Running);
        Ok(cancel)
    }

    async fn drive(
        &self,
        mode: BridgeMode,
        pair: BridgePair,
        total_cycles: u32,
        cancel: CancellationToken,
    ) -> RunReport {
        let span = tracing::info_span!("bridge_run", %mode, %pair, total_cycles);
        let report = self
            .cycles(mode, pair, total_cycles, &cancel)
            .instrument(span)
            .await;

        *self.state.lock() = RunState::Idle;
        self.balances
            .refresh(&self.registry, self.client.as_ref())
            .await;
        self.log
            .success(format!("Automated {mode} operation finished."));
        self.status.send_replace(RunStatus::Idle);
        tracing::info!(end = ?report.end, attempts = report.attempts.len(), "bridge run ended");
        report
    }

    async fn cycles(
        &self,
        mode: BridgeMode,
        mut pair: BridgePair,
        total_cycles: u32,
        cancel: &CancellationToken,
    ) -> RunReport {
        self.log.system(format!(
            "Starting {mode}: {} <-> {} ({total_cycles} cycles)",
            pair.source, pair.destination
        ));

        let mut attempts = Vec::new();
        let mut end = RunEnd::Completed;
        for cycle in 1..=total_cycles {
            if cancel.is_cancelled() {
                self.log.warning(format!("{mode} operation stopped by user."));
                end = RunEnd::Cancelled;
                break;
            }
            self.set_progress(cycle, pair);

            let amount = TransferAmount::sample(&mut *self.rng.lock(), mode);
            self.log
                .system(format!("--- {mode} cycle {cycle}/{total_cycles} ---"));
            self.balances
                .refresh(&self.registry, self.client.as_ref())
                .await;

            let outcome = self.attempt(mode, pair, amount).await;
            let succeeded = outcome.is_ok();
            attempts.push(Attempt {
                cycle,
                pair,
                amount,
                outcome,
            });
            if !succeeded {
                self.log.error(format!("Stopping {mode} due to tx failure."));
                end = RunEnd::Failed;
                break;
            }

            let settle = sample_duration(&mut *self.rng.lock(), &mode.settle_range());
            self.log.system(format!(
                "Waiting {} mins for {mode} completion...",
                (settle.as_secs_f64() / 60.0).round()
            ));
            if wait_cancellable(settle, cancel).await == WaitOutcome::Cancelled {
                self.log.warning(format!("{mode} operation stopped by user."));
                end = RunEnd::Cancelled;
                break;
            }

            pair = pair.rotate();

            if cycle < total_cycles {
                let delay = sample_duration(&mut *self.rng.lock(), &INTER_CYCLE_DELAY);
                self.log.system(format!(
                    "Delaying {}s before next cycle...",
                    delay.as_secs_f64().round()
                ));
                if wait_cancellable(delay, cancel).await == WaitOutcome::Cancelled {
                    self.log.warning(format!("{mode} operation stopped by user."));
                    end = RunEnd::Cancelled;
                    break;
                }
            }
        }

        RunReport { attempts, end }
    }

    fn set_progress(&self, cycle: u32, pair: BridgePair) {
        if let RunState::Running(run) = &mut *self.state.lock() {
            run.current_cycle = cycle;
            run.pair = pair;
        }
    }

    /// One balance-checked bridge call. Every failure is logged here.
    async fn attempt(
        &self,
        mode: BridgeMode,
        pair: BridgePair,
        amount: TransferAmount,
    ) -> Result<BridgeReceipt, BridgeError> {
        let (source, destination) = self.registry.pair(pair);
        self.log.bridge(format!(
            "Bridging {amount} ETH from {} to {}",
            source.name(),
            destination.name()
        ));

        let result = self.bridge(mode, source, destination, amount).await;
        match &result {
            Ok(receipt) => self.log.success(format!(
                "Bridge tx successful on {}! Gas used: {}",
                source.name(),
                receipt.gas_used
            )),
            Err(BridgeError::InsufficientBalance { .. }) => self.log.error(format!(
                "Insufficient balance on {}. Required: {amount} ETH",
                source.name()
            )),
            Err(BridgeError::Reverted { .. }) => {
                self.log
                    .error(format!("Bridge tx failed on {}", source.name()))
            }
            Err(BridgeError::Chain(err)) => self
                .log
                .error(format!("Bridge error on {}: {err}", source.name())),
        }
        result
    }

    async fn bridge(
        &self,
        mode: BridgeMode,
        source: &Network,
        destination: &Network,
        amount: TransferAmount,
    ) -> Result<BridgeReceipt, BridgeError> {
        let available = self.client.balance(source).await?;
        if available < amount.wei() {
            return Err(BridgeError::InsufficientBalance {
                network: source.id,
                required: amount.wei(),
                available,
            });
        }

        let call = BridgeCall::for_mode(mode, self.client.address(), source, destination, amount);
        self.log
            .system(format!("Submitting transaction to {} bridge...", source.name()));
        let pending = self.client.submit(source, &call).await?;
        self.log.bridge(format!(
            "{mode} tx sent: {}",
            short_hex(&pending.hash.to_string())
        ));

        let receipt = pending.confirm().await?;
        if receipt.success {
            Ok(receipt)
        } else {
            Err(BridgeError::Reverted {
                network: source.id,
                hash: receipt.hash,
            })
        }
    }
}
