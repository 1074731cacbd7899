//! Scheduler
//!
//! Fires a cycle immediately, then on a fixed interval until stopped. A tick
//! that finds a cycle still in flight is skipped, never run alongside it.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify, RwLock};
use tokio::time::MissedTickBehavior;

use super::engine::{BuybackEngine, CycleOutcome, EngineError};
use super::feed::EventFeed;
use crate::domain::{EngineRuntimeState, EngineStatus};

/// What one tick did
#[derive(Debug)]
pub enum TickOutcome {
    /// Another cycle held the state
    Skipped,
    Ran(Result<CycleOutcome, EngineError>),
}

#[derive(Clone)]
pub struct Scheduler {
    engine: Arc<BuybackEngine>,
    state: Arc<Mutex<EngineRuntimeState>>,
    feed: Arc<EventFeed>,
    poll_interval: Duration,
    is_running: Arc<RwLock<bool>>,
    shutdown: Arc<Notify>,
}

impl Scheduler {
    pub fn new(engine: Arc<BuybackEngine>, feed: Arc<EventFeed>, poll_interval: Duration) -> Self {
        Self {
            engine,
            state: Arc::new(Mutex::new(EngineRuntimeState::new())),
            feed,
            poll_interval,
            is_running: Arc::new(RwLock::new(false)),
            shutdown: Arc::new(Notify::new()),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn feed(&self) -> &Arc<EventFeed> {
        &self.feed
    }

    /// Run until `stop` is called
    pub async fn run(&self) {
        *self.is_running.write().await = true;

        tracing::info!(
            "Scheduler started - mode: {}, poll interval: {:?}",
            self.engine.settings().mode,
            self.poll_interval
        );

        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        while *self.is_running.read().await {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = self.shutdown.notified() => break,
            }
            if !*self.is_running.read().await {
                break;
            }
            self.tick().await;
        }

        *self.is_running.write().await = false;
        tracing::info!("Scheduler stopped");
    }

    /// Evaluate one cycle under the single-flight guard
    pub async fn tick(&self) -> TickOutcome {
        let mut state = match self.state.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                tracing::debug!("Cycle still in flight, skipping tick");
                return TickOutcome::Skipped;
            }
        };

        let now = Utc::now();
        let result = self.engine.evaluate_cycle(&mut state, now).await;

        match &result {
            Ok(outcome) => {
                if let Err(e) = self.feed.publish(outcome.events()).await {
                    tracing::warn!("Failed to record events: {}", e);
                }
            }
            Err(e @ EngineError::SlippageExceeded(_)) => {
                tracing::warn!("Cycle aborted: {}", e);
            }
            Err(e @ EngineError::TransientOracle(_)) => {
                tracing::warn!("Poll failed, retrying next tick: {}", e);
            }
            Err(e) => {
                tracing::error!("Cycle aborted: {}", e);
            }
        }

        let status = self
            .engine
            .status(&state, now, self.feed.len().await)
            .await;
        if let Err(e) = self.feed.update_status(status).await {
            tracing::warn!("Failed to write status: {}", e);
        }

        TickOutcome::Ran(result)
    }

    /// Stop the loop once the in-flight cycle (if any) returns
    pub async fn stop(&self) {
        *self.is_running.write().await = false;
        self.shutdown.notify_one();
        tracing::info!("Stop signal sent to scheduler");
    }

    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    /// Copy of the runtime state; waits for an in-flight cycle
    pub async fn state(&self) -> EngineRuntimeState {
        self.state.lock().await.clone()
    }

    /// Fresh status snapshot; waits for an in-flight cycle
    pub async fn status(&self) -> EngineStatus {
        let state = self.state.lock().await;
        self.engine
            .status(&state, Utc::now(), self.feed.len().await)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::engine::EngineSettings;
    use crate::config::ExecutionMode;
    use crate::ports::mocks::{MockBalanceOracle, MockMarketOracle, MockSwapGateway};

    fn scheduler(balance: MockBalanceOracle, gateway: MockSwapGateway) -> Scheduler {
        let settings = EngineSettings {
            token_mint: "TideMint".to_string(),
            lp_pair: Some("RayPair".to_string()),
            accumulator_wallet: "Accumulator".to_string(),
            trigger_threshold_sol: 2.5,
            cooldown_seconds: 300,
            buyback_pct: 60.0,
            lp_add_pct: 40.0,
            max_slippage_bps: 500,
            call_timeout: Duration::from_secs(5),
            execution_timeout: Duration::from_secs(5),
            mode: ExecutionMode::Simulate,
        };
        let engine = BuybackEngine::new(
            settings,
            Arc::new(balance),
            Arc::new(MockMarketOracle::graduated("RayPair")),
            Arc::new(gateway),
        );
        Scheduler::new(
            Arc::new(engine),
            Arc::new(EventFeed::new()),
            Duration::from_millis(20),
        )
    }

    #[tokio::test]
    async fn test_tick_publishes_events_and_status() {
        let sched = scheduler(MockBalanceOracle::new(3.0), MockSwapGateway::new());

        let outcome = sched.tick().await;
        assert!(matches!(outcome, TickOutcome::Ran(Ok(CycleOutcome::Completed(_)))));
        assert_eq!(sched.feed().len().await, 2);

        let status = sched.feed().latest_status().await.unwrap();
        assert_eq!(status.cycle_count, 1);
        assert_eq!(status.total_events_count, 2);
        assert!(status.cooldown_remaining > 0);

        // Second tick inside the cooldown changes nothing
        let outcome = sched.tick().await;
        assert!(matches!(
            outcome,
            TickOutcome::Ran(Ok(CycleOutcome::CoolingDown { .. }))
        ));
        assert_eq!(sched.state().await.cycle_count, 1);
    }

    #[tokio::test]
    async fn test_oracle_failure_does_not_stop_ticks() {
        let sched = scheduler(MockBalanceOracle::failing(), MockSwapGateway::new());

        let outcome = sched.tick().await;
        assert!(matches!(outcome, TickOutcome::Ran(Err(EngineError::TransientOracle(_)))));

        let outcome = sched.tick().await;
        assert!(matches!(outcome, TickOutcome::Ran(Err(_))));
        assert_eq!(sched.state().await, EngineRuntimeState::new());
    }

    #[tokio::test]
    async fn test_concurrent_tick_is_skipped() {
        let balance = MockBalanceOracle::new(3.0).with_delay(Duration::from_millis(200));
        let sched = scheduler(balance, MockSwapGateway::new());

        let first = {
            let sched = sched.clone();
            tokio::spawn(async move { sched.tick().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(matches!(sched.tick().await, TickOutcome::Skipped));
        assert!(matches!(first.await.unwrap(), TickOutcome::Ran(Ok(_))));
        assert_eq!(sched.state().await.cycle_count, 1);
    }

    #[tokio::test]
    async fn test_run_fires_immediately_and_stops() {
        let sched = scheduler(MockBalanceOracle::new(1.0), MockSwapGateway::new());

        let handle = {
            let sched = sched.clone();
            tokio::spawn(async move { sched.run().await })
        };

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(sched.is_running().await);
        assert!(sched.feed().latest_status().await.is_some());

        sched.stop().await;
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(!sched.is_running().await);
    }
}
