//! Buyback Engine
//!
//! The trigger state machine. One call to `evaluate_cycle` walks the gates in
//! order (market status, cooldown, balance) and, when all pass, runs the
//! buyback leg followed by the liquidity half-swap.
//!
//! The engine never owns the runtime state; the caller passes it in so a
//! single-flight guard can sit around the whole cycle.

use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::config::{Config, ConfigError, ExecutionMode};
use crate::domain::{
    fill_percentage, sol_to_lamports, Allocation, CircuitBreakerError, CircuitBreakerMonitor,
    EngineEvent, EngineRuntimeState, EngineStatus, MarketStatus, PriceImpactBreaker,
};
use crate::ports::{
    BalanceOracle, ExecutedSwap, ExecutionError, MarketStatusOracle, QuoteRequest, SwapGateway,
    SwapLeg, SwapTag,
};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Quote unavailable: {0}")]
    QuoteUnavailable(String),
    #[error(transparent)]
    SlippageExceeded(#[from] CircuitBreakerError),
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
    #[error("Oracle unavailable: {0}")]
    TransientOracle(String),
}

impl EngineError {
    /// Only bad configuration stops the process
    pub fn is_fatal(&self) -> bool {
        matches!(self, EngineError::Configuration(_))
    }
}

/// Everything the state machine reads from configuration
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub token_mint: String,
    pub lp_pair: Option<String>,
    pub accumulator_wallet: String,
    pub trigger_threshold_sol: f64,
    pub cooldown_seconds: u64,
    pub buyback_pct: f64,
    pub lp_add_pct: f64,
    pub max_slippage_bps: u16,
    pub call_timeout: Duration,
    /// Bound on swap submission; outlives the blockhash so a timed-out
    /// swap cannot still land
    pub execution_timeout: Duration,
    pub mode: ExecutionMode,
}

impl From<ConfigError> for EngineError {
    fn from(err: ConfigError) -> Self {
        EngineError::Configuration(err.to_string())
    }
}

impl EngineSettings {
    /// Accumulator falls back to the signer when not configured
    pub fn from_config(config: &Config, signer: &str) -> Result<Self, EngineError> {
        config.validate()?;
        if config.token_mint.trim().is_empty() {
            return Err(EngineError::Configuration("token mint is empty".to_string()));
        }
        if signer.trim().is_empty() && config.accumulator_wallet.is_none() {
            return Err(EngineError::Configuration(
                "no accumulator wallet and no signer address".to_string(),
            ));
        }

        let settings = Self {
            token_mint: config.token_mint.clone(),
            lp_pair: config.lp_pair.clone(),
            accumulator_wallet: config
                .accumulator_wallet
                .clone()
                .unwrap_or_else(|| signer.to_string()),
            trigger_threshold_sol: config.trigger_threshold_sol,
            cooldown_seconds: config.cooldown_seconds,
            buyback_pct: config.buyback_pct,
            lp_add_pct: config.lp_add_pct,
            max_slippage_bps: config.max_slippage_bps,
            call_timeout: Duration::from_secs(config.call_timeout_secs),
            execution_timeout: Duration::from_secs(config.execution_timeout_secs),
            mode: config.mode,
        };
        settings.cooldown()?;
        Ok(settings)
    }

    /// Fails instead of wrapping or panicking on out-of-range values
    pub fn cooldown(&self) -> Result<chrono::Duration, EngineError> {
        i64::try_from(self.cooldown_seconds)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .ok_or_else(|| {
                EngineError::Configuration(format!(
                    "cooldown of {}s is out of range",
                    self.cooldown_seconds
                ))
            })
    }
}

/// Result of the liquidity half-swap
#[derive(Debug, Clone, PartialEq)]
pub enum LiquidityLeg {
    Added(ExecutedSwap),
    /// Soft failure, the allocation stays in the wallet
    Deferred { amount: f64, reason: String },
    /// Nothing allocated to liquidity
    Skipped,
}

/// A completed cycle
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub cycle: u64,
    pub allocation: Allocation,
    pub buyback: ExecutedSwap,
    pub buyback_price_impact_pct: f64,
    pub liquidity: LiquidityLeg,
    pub events: Vec<EngineEvent>,
}

/// Where a cycle stopped
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    AwaitingGraduation(MarketStatus),
    CoolingDown { remaining_secs: u64 },
    BelowThreshold { balance: f64, fill_pct: f64 },
    Completed(CycleReport),
}

impl CycleOutcome {
    pub fn events(&self) -> &[EngineEvent] {
        match self {
            CycleOutcome::Completed(report) => &report.events,
            _ => &[],
        }
    }
}

/// Last readings from the oracles and breaker, for the status snapshot
#[derive(Debug, Clone, Default)]
pub struct Observations {
    pub balance: Option<f64>,
    pub market: Option<MarketStatus>,
    pub breaker: CircuitBreakerMonitor,
}

pub struct BuybackEngine {
    settings: EngineSettings,
    balances: Arc<dyn BalanceOracle>,
    market: Arc<dyn MarketStatusOracle>,
    gateway: Arc<dyn SwapGateway>,
    breaker: PriceImpactBreaker,
    observations: RwLock<Observations>,
}

impl BuybackEngine {
    pub fn new(
        settings: EngineSettings,
        balances: Arc<dyn BalanceOracle>,
        market: Arc<dyn MarketStatusOracle>,
        gateway: Arc<dyn SwapGateway>,
    ) -> Self {
        let breaker = PriceImpactBreaker::new(settings.max_slippage_bps);
        Self {
            settings,
            balances,
            market,
            gateway,
            breaker,
            observations: RwLock::new(Observations::default()),
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub async fn observations(&self) -> Observations {
        self.observations.read().await.clone()
    }

    /// Pair used for liquidity: configured first, then discovered
    pub fn liquidity_pair<'a>(&'a self, state: &'a EngineRuntimeState) -> Option<&'a str> {
        self.settings
            .lp_pair
            .as_deref()
            .or(state.discovered_pair.as_deref())
    }

    /// Bound an external call by the configured timeout
    async fn bounded<T, E, F>(&self, what: &str, call: F) -> Result<T, String>
    where
        F: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        bounded_by(self.settings.call_timeout, what, call).await
    }

    /// Bound a swap submission by the execution timeout
    async fn bounded_swap<F>(&self, what: &str, call: F) -> Result<ExecutedSwap, String>
    where
        F: Future<Output = Result<ExecutedSwap, ExecutionError>>,
    {
        let result = bounded_by(self.settings.execution_timeout, what, call).await;
        if let Err(reason) = &result {
            if reason.contains("timed out") {
                tracing::error!("{}; the transaction may still confirm on chain", reason);
            }
        }
        result
    }

    /// Read balance and market status without running a cycle
    pub async fn probe(&self) -> (Result<f64, EngineError>, Result<MarketStatus, EngineError>) {
        let (balance, market) = tokio::join!(
            self.read_balance(),
            self.read_market_status()
        );
        (balance, market)
    }

    async fn read_balance(&self) -> Result<f64, EngineError> {
        let balance = self
            .bounded(
                "balance read",
                self.balances.native_balance(&self.settings.accumulator_wallet),
            )
            .await
            .map_err(EngineError::TransientOracle)?;
        self.observations.write().await.balance = Some(balance);
        Ok(balance)
    }

    async fn read_market_status(&self) -> Result<MarketStatus, EngineError> {
        let status = self
            .bounded(
                "market status",
                self.market.market_status(&self.settings.token_mint),
            )
            .await
            .map_err(EngineError::TransientOracle)?;
        self.observations.write().await.market = Some(status.clone());
        Ok(status)
    }

    /// Run one poll against `state`.
    ///
    /// `Ok` outcomes other than `Completed` leave `state` untouched, except
    /// for pair discovery at graduation. Every `Err` leaves it untouched.
    pub async fn evaluate_cycle(
        &self,
        state: &mut EngineRuntimeState,
        now: DateTime<Utc>,
    ) -> Result<CycleOutcome, EngineError> {
        let market = self.read_market_status().await?;
        if !market.graduated {
            tracing::info!(
                "Bonding curve {:.1}% (mcap ${:.0}), waiting for graduation",
                market.bonding_curve_progress,
                market.market_cap
            );
            return Ok(CycleOutcome::AwaitingGraduation(market));
        }

        if self.settings.lp_pair.is_none() && state.discovered_pair.is_none() {
            if let Some(pair) = &market.pair_address {
                tracing::info!("Token graduated, liquidity pair discovered: {}", pair);
                state.discovered_pair = Some(pair.clone());
            }
        }

        let cooldown = self.settings.cooldown()?;
        if state.cooldown_remaining(now, cooldown).is_some() {
            let remaining_secs = state.cooldown_remaining_secs(now, cooldown);
            tracing::info!("Cooldown: {}s remaining", remaining_secs);
            return Ok(CycleOutcome::CoolingDown { remaining_secs });
        }

        let balance = self.read_balance().await?;
        let threshold = self.settings.trigger_threshold_sol;
        if balance < threshold {
            let fill_pct = fill_percentage(balance, threshold);
            tracing::info!(
                "Accumulator {:.4} / {:.4} SOL ({:.1}%)",
                balance,
                threshold,
                fill_pct
            );
            return Ok(CycleOutcome::BelowThreshold { balance, fill_pct });
        }

        let cycle = state.cycle_count + 1;
        let allocation =
            Allocation::split(balance, self.settings.buyback_pct, self.settings.lp_add_pct);
        tracing::info!(
            "TRIGGER #{}: balance {:.4} SOL >= {:.4}, buyback {:.4} SOL, liquidity {:.4} SOL",
            cycle,
            balance,
            threshold,
            allocation.buyback,
            allocation.liquidity
        );

        let (buyback, impact) = self.buyback_leg(&allocation, cycle, now).await?;
        tracing::info!(
            "Buyback #{} confirmed: {} ({} token units)",
            cycle,
            buyback.signature,
            buyback.output_amount
        );

        let liquidity = self.liquidity_leg(&allocation, cycle, state).await;
        let liquidity_added = match &liquidity {
            LiquidityLeg::Added(swap) => {
                tracing::info!(
                    "Liquidity half-swap #{} confirmed: {} ({:.4} SOL paired)",
                    cycle,
                    swap.signature,
                    allocation.liquidity
                );
                state.pending_liquidity = 0.0;
                Some(allocation.liquidity)
            }
            LiquidityLeg::Deferred { amount, reason } => {
                tracing::warn!(
                    "Liquidity leg #{} deferred, {:.4} SOL held for next cycle: {}",
                    cycle,
                    amount,
                    reason
                );
                state.pending_liquidity = *amount;
                None
            }
            LiquidityLeg::Skipped => None,
        };

        state.record_cycle(now, buyback.signature.clone(), allocation.buyback, liquidity_added);

        let mut events = vec![EngineEvent::buyback(
            cycle,
            now,
            buyback.signature.clone(),
            allocation.buyback,
            buyback.output_amount,
            balance,
        )];
        if let LiquidityLeg::Added(swap) = &liquidity {
            events.push(EngineEvent::liquidity_add(
                cycle,
                now,
                swap.signature.clone(),
                allocation.liquidity,
                allocation.liquidity_swap_half(),
                swap.output_amount,
                balance - allocation.buyback,
            ));
        }

        tracing::info!(
            "Cycle #{} complete. Totals: buyback {:.4} SOL, liquidity {:.4} SOL",
            cycle,
            state.total_buyback,
            state.total_liquidity
        );

        Ok(CycleOutcome::Completed(CycleReport {
            cycle,
            allocation,
            buyback,
            buyback_price_impact_pct: impact,
            liquidity,
            events,
        }))
    }

    /// Quote, breaker check, execute. Any failure aborts the cycle.
    async fn buyback_leg(
        &self,
        allocation: &Allocation,
        cycle: u64,
        now: DateTime<Utc>,
    ) -> Result<(ExecutedSwap, f64), EngineError> {
        let lamports = sol_to_lamports(allocation.buyback);
        if lamports == 0 {
            return Err(EngineError::QuoteUnavailable(
                "buyback amount rounds to zero lamports".to_string(),
            ));
        }

        let request = QuoteRequest::buy(
            &self.settings.token_mint,
            lamports,
            self.settings.max_slippage_bps,
        );
        let quote = self
            .bounded("buyback quote", self.gateway.get_quote(request))
            .await
            .map_err(EngineError::QuoteUnavailable)?;

        if let Err(trip) = self.breaker.check(quote.price_impact_pct) {
            self.observations
                .write()
                .await
                .breaker
                .record_trip(quote.price_impact_pct, now);
            tracing::warn!("{}; buyback #{} skipped", trip, cycle);
            return Err(trip.into());
        }
        self.observations.write().await.breaker.record_pass();

        let impact = quote.price_impact_pct;
        let tag = SwapTag { leg: SwapLeg::Buyback, cycle };
        let executed = self
            .bounded_swap("buyback swap", self.gateway.execute_swap(quote, tag))
            .await
            .map_err(EngineError::ExecutionFailed)?;

        Ok((executed, impact))
    }

    /// Swap half the liquidity share into the token. Never aborts the cycle.
    async fn liquidity_leg(
        &self,
        allocation: &Allocation,
        cycle: u64,
        state: &EngineRuntimeState,
    ) -> LiquidityLeg {
        let half = allocation.liquidity_swap_half();
        let lamports = sol_to_lamports(half);
        if lamports == 0 {
            return LiquidityLeg::Skipped;
        }

        let deferred = |reason: String| LiquidityLeg::Deferred {
            amount: allocation.liquidity,
            reason,
        };

        match self.liquidity_pair(state) {
            Some(pair) => tracing::debug!("Pairing {:.4} SOL against pool {}", half, pair),
            None => tracing::debug!("No liquidity pair known yet, swapping half only"),
        }

        let request = QuoteRequest::buy(
            &self.settings.token_mint,
            lamports,
            self.settings.max_slippage_bps,
        );
        let quote = match self
            .bounded("liquidity quote", self.gateway.get_quote(request))
            .await
        {
            Ok(quote) => quote,
            Err(reason) => return deferred(reason),
        };

        if let Err(trip) = self.breaker.check(quote.price_impact_pct) {
            return deferred(trip.to_string());
        }

        let tag = SwapTag { leg: SwapLeg::LiquidityPairing, cycle };
        match self
            .bounded_swap("liquidity swap", self.gateway.execute_swap(quote, tag))
            .await
        {
            Ok(executed) => LiquidityLeg::Added(executed),
            Err(reason) => deferred(reason),
        }
    }

    /// Dashboard snapshot of `state` plus the latest observations
    pub async fn status(
        &self,
        state: &EngineRuntimeState,
        now: DateTime<Utc>,
        total_events_count: usize,
    ) -> EngineStatus {
        let observations = self.observations.read().await;
        let balance = observations.balance.unwrap_or(0.0);
        let threshold = self.settings.trigger_threshold_sol;
        let cooldown_remaining = self
            .settings
            .cooldown()
            .map(|cooldown| state.cooldown_remaining_secs(now, cooldown))
            .unwrap_or(0);
        let (graduated, progress) = observations
            .market
            .as_ref()
            .map(|m| (m.graduated, m.bonding_curve_progress))
            .unwrap_or((false, 0.0));

        EngineStatus {
            accumulator_balance: balance,
            trigger_threshold: threshold,
            fill_percentage: fill_percentage(balance, threshold),
            cooldown_remaining,
            max_slippage_bps: self.settings.max_slippage_bps,
            circuit_breaker_active: observations.breaker.is_tripped(),
            last_trigger_time: state.last_trigger_ms(),
            last_trigger_tx: state.last_trigger_tx.clone().unwrap_or_default(),
            next_trigger_estimate: cooldown_remaining,
            total_buybacks: state.total_buyback,
            total_liquidity_added: state.total_liquidity,
            total_events_count,
            cycle_count: state.cycle_count,
            mode: self.settings.mode.as_str().to_string(),
            graduated,
            bonding_curve_progress: progress,
            pending_liquidity: state.pending_liquidity,
        }
    }
}

async fn bounded_by<T, E, F>(limit: Duration, what: &str, call: F) -> Result<T, String>
where
    F: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    match tokio::time::timeout(limit, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(format!("{}: {}", what, e)),
        Err(_) => Err(format!("{} timed out after {:?}", what, limit)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SigningCredential;
    use crate::ports::mocks::{MockBalanceOracle, MockMarketOracle, MockSwapGateway, QuoteScript};
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    fn settings() -> EngineSettings {
        EngineSettings {
            token_mint: "TideMint".to_string(),
            lp_pair: None,
            accumulator_wallet: "Accumulator".to_string(),
            trigger_threshold_sol: 2.5,
            cooldown_seconds: 300,
            buyback_pct: 60.0,
            lp_add_pct: 40.0,
            max_slippage_bps: 500,
            call_timeout: Duration::from_secs(5),
            execution_timeout: Duration::from_secs(5),
            mode: ExecutionMode::Simulate,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn engine(balance: f64, gateway: MockSwapGateway) -> BuybackEngine {
        BuybackEngine::new(
            settings(),
            Arc::new(MockBalanceOracle::new(balance)),
            Arc::new(MockMarketOracle::graduated("RayPair")),
            Arc::new(gateway),
        )
    }

    #[test]
    fn test_only_configuration_is_fatal() {
        assert!(EngineError::Configuration("x".into()).is_fatal());
        assert!(!EngineError::QuoteUnavailable("x".into()).is_fatal());
        assert!(!EngineError::TransientOracle("x".into()).is_fatal());
        assert!(!EngineError::ExecutionFailed("x".into()).is_fatal());
        assert!(!EngineError::SlippageExceeded(CircuitBreakerError::PriceImpactExceeded(6.0, 5.0))
            .is_fatal());
    }

    #[test]
    fn test_out_of_range_cooldown_is_configuration_error() {
        let mut settings = settings();
        assert_eq!(settings.cooldown().unwrap(), chrono::Duration::seconds(300));

        for seconds in [10_000_000_000_000_000, u64::MAX] {
            settings.cooldown_seconds = seconds;
            assert!(settings.cooldown().unwrap_err().is_fatal());
        }
    }

    #[tokio::test]
    async fn test_out_of_range_cooldown_fails_the_cycle() {
        let mut settings = settings();
        settings.cooldown_seconds = u64::MAX;
        let engine = BuybackEngine::new(
            settings,
            Arc::new(MockBalanceOracle::new(3.0)),
            Arc::new(MockMarketOracle::graduated("RayPair")),
            Arc::new(MockSwapGateway::new()),
        );
        let mut state = EngineRuntimeState::new();

        let err = engine.evaluate_cycle(&mut state, now()).await.unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
        assert_eq!(state.cycle_count, 0);
        assert_eq!(engine.status(&state, now(), 0).await.cooldown_remaining, 0);
    }

    #[test]
    fn test_settings_default_accumulator_to_signer() {
        let mut config = Config::new(SigningCredential::Base58("k".into()), "TideMint");
        let settings = EngineSettings::from_config(&config, "Signer111").unwrap();
        assert_eq!(settings.accumulator_wallet, "Signer111");
        assert_eq!(settings.call_timeout, Duration::from_secs(30));
        assert_eq!(settings.execution_timeout, Duration::from_secs(120));

        config.accumulator_wallet = Some("Fees111".into());
        let settings = EngineSettings::from_config(&config, "Signer111").unwrap();
        assert_eq!(settings.accumulator_wallet, "Fees111");
    }

    #[test]
    fn test_invalid_config_is_configuration_error() {
        let mut config = Config::new(SigningCredential::Base58("k".into()), "TideMint");
        config.buyback_pct = 80.0;
        let err = EngineSettings::from_config(&config, "Signer111").unwrap_err();
        assert!(err.is_fatal());

        let config = Config::new(SigningCredential::Base58("k".into()), "  ");
        assert!(matches!(
            EngineSettings::from_config(&config, "Signer111"),
            Err(EngineError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_completed_cycle_discovers_pair() {
        let gateway = MockSwapGateway::new();
        let engine = engine(3.0, gateway.clone());
        let mut state = EngineRuntimeState::new();

        let outcome = engine.evaluate_cycle(&mut state, now()).await.unwrap();

        let report = match outcome {
            CycleOutcome::Completed(report) => report,
            other => panic!("expected completed cycle, got {:?}", other),
        };
        assert_eq!(report.cycle, 1);
        assert_eq!(report.events.len(), 2);
        assert_eq!(state.discovered_pair.as_deref(), Some("RayPair"));
        assert_eq!(engine.liquidity_pair(&state), Some("RayPair"));
        assert_eq!(gateway.execute_calls().len(), 2);
    }

    #[tokio::test]
    async fn test_liquidity_leg_breaker_defers() {
        let gateway = MockSwapGateway::new()
            .then_quote(QuoteScript::Impact(0.5))
            .then_quote(QuoteScript::Impact(9.0));
        let engine = engine(3.0, gateway.clone());
        let mut state = EngineRuntimeState::new();

        let outcome = engine.evaluate_cycle(&mut state, now()).await.unwrap();
        let report = match outcome {
            CycleOutcome::Completed(report) => report,
            other => panic!("expected completed cycle, got {:?}", other),
        };

        assert!(matches!(report.liquidity, LiquidityLeg::Deferred { .. }));
        assert_eq!(report.events.len(), 1);
        assert_relative_eq!(state.pending_liquidity, 1.2, epsilon = 1e-9);
        assert_relative_eq!(state.total_liquidity, 0.0);
        // The buyback breaker verdict stays green
        assert!(!engine.observations().await.breaker.is_tripped());
    }

    #[tokio::test]
    async fn test_zero_liquidity_share_is_skipped() {
        let gateway = MockSwapGateway::new();
        let mut s = settings();
        s.lp_add_pct = 0.0;
        let engine = BuybackEngine::new(
            s,
            Arc::new(MockBalanceOracle::new(3.0)),
            Arc::new(MockMarketOracle::graduated("RayPair")),
            Arc::new(gateway.clone()),
        );
        let mut state = EngineRuntimeState::new();

        let outcome = engine.evaluate_cycle(&mut state, now()).await.unwrap();
        match outcome {
            CycleOutcome::Completed(report) => assert_eq!(report.liquidity, LiquidityLeg::Skipped),
            other => panic!("expected completed cycle, got {:?}", other),
        }
        assert_eq!(gateway.quote_calls().len(), 1);
        assert_eq!(state.pending_liquidity, 0.0);
    }

    #[tokio::test]
    async fn test_status_reflects_observations() {
        let gateway = MockSwapGateway::new().with_default_quote(QuoteScript::Impact(7.5));
        let engine = engine(3.0, gateway);
        let mut state = EngineRuntimeState::new();

        let err = engine.evaluate_cycle(&mut state, now()).await.unwrap_err();
        assert!(matches!(err, EngineError::SlippageExceeded(_)));

        let status = engine.status(&state, now(), 0).await;
        assert!(status.circuit_breaker_active);
        assert_relative_eq!(status.accumulator_balance, 3.0);
        assert_relative_eq!(status.fill_percentage, 120.0);
        assert!(status.graduated);
        assert_eq!(status.mode, "simulate");
        assert_eq!(status.last_trigger_time, 0);
        assert_eq!(engine.observations().await.breaker.trip_count(), 1);
    }

    #[tokio::test]
    async fn test_probe_reads_both_oracles() {
        let engine = engine(1.25, MockSwapGateway::new());
        let (balance, market) = engine.probe().await;
        assert_relative_eq!(balance.unwrap(), 1.25);
        assert!(market.unwrap().graduated);
    }
}
