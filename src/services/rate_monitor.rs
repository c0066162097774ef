//! Exchange Rate Monitor
//!
//! Fetches the USD to local-currency rate once at start and then on a fixed
//! interval. A failed fetch never clears the last good rate; it only flips
//! the status. Calculations read whatever is current.

use crate::sources::RateSource;
use crate::types::{RateState, RateStatus};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Periodically refreshed exchange rate shared with the calculator.
pub struct ExchangeRateMonitor {
    source: Arc<dyn RateSource>,
    refresh_interval: Duration,
    state: RwLock<RateState>,
    /// Every refresh outcome is published here
    updates_tx: broadcast::Sender<RateState>,
    /// Shutdown signal sender
    shutdown_tx: broadcast::Sender<()>,
}

impl ExchangeRateMonitor {
    /// Create a monitor; nothing is fetched until [`refresh`](Self::refresh)
    /// or [`spawn`](Self::spawn).
    pub fn new(source: Arc<dyn RateSource>, refresh_interval: Duration) -> Arc<Self> {
        let (updates_tx, _) = broadcast::channel(16);
        let (shutdown_tx, _) = broadcast::channel(1);
        let state = RateState::new(source.currency());

        Arc::new(Self {
            source,
            refresh_interval,
            state: RwLock::new(state),
            updates_tx,
            shutdown_tx,
        })
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> RateState {
        self.state.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Last successfully fetched rate.
    pub fn current_rate(&self) -> Option<f64> {
        self.state.read().unwrap_or_else(|e| e.into_inner()).rate
    }

    /// Receive every refresh outcome from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<RateState> {
        self.updates_tx.subscribe()
    }

    /// Fetch once and fold the outcome into the shared state.
    pub async fn refresh(&self) -> RateState {
        self.update(|state| state.status = RateStatus::Loading);

        let outcome = self.source.fetch_rate().await;

        let snapshot = self.update(|state| match outcome {
            Ok(rate) if rate.is_finite() && rate > 0.0 => {
                state.rate = Some(rate);
                state.status = RateStatus::Success;
                state.updated_at = Some(chrono::Utc::now());
            }
            Ok(rate) => {
                state.status = RateStatus::Error(format!("invalid rate {}", rate));
            }
            Err(e) => {
                state.status = RateStatus::Error(e.to_string());
            }
        });

        match &snapshot.status {
            RateStatus::Success => debug!(
                "{} USD->{} rate now {:?}",
                self.source.name(),
                snapshot.currency,
                snapshot.rate
            ),
            RateStatus::Error(msg) => warn!(
                "Failed to fetch USD->{} rate from {}: {} (keeping {:?})",
                snapshot.currency,
                self.source.name(),
                msg,
                snapshot.rate
            ),
            RateStatus::Loading => {}
        }

        if self.updates_tx.send(snapshot.clone()).is_err() {
            debug!("No subscribers for rate update");
        }

        snapshot
    }

    /// Refresh immediately, then every `refresh_interval`, on the tokio
    /// runtime until [`stop`](Self::stop).
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> {
        // Subscribe before spawning so an early stop() is not missed.
        let shutdown_rx = self.shutdown_tx.subscribe();
        let monitor = Arc::clone(self);
        tokio::spawn(async move { monitor.run_until(shutdown_rx).await })
    }

    /// Signal a running loop to exit.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(());
    }

    async fn run_until(&self, mut shutdown_rx: broadcast::Receiver<()>) {
        info!(
            "Starting {} rate refresh every {}s",
            self.source.name(),
            self.refresh_interval.as_secs()
        );

        let mut ticker = interval(self.refresh_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.refresh().await;
                }
                _ = shutdown_rx.recv() => {
                    info!("Rate monitor received shutdown signal");
                    break;
                }
            }
        }
    }

    fn update(&self, f: impl FnOnce(&mut RateState)) -> RateState {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        f(&mut state);
        state.clone()
    }
}
