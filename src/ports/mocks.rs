//! Scriptable port implementations that record every call

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::execution::{ExecutionError, SwapGateway};
use super::models::{ExecutedSwap, QuoteRequest, SwapLeg, SwapQuote, SwapTag};
use super::oracle::{BalanceOracle, MarketStatusOracle, OracleError};
use crate::domain::MarketStatus;

/// Balance oracle returning a settable balance
#[derive(Debug, Clone, Default)]
pub struct MockBalanceOracle {
    balance: Arc<Mutex<Option<f64>>>,
    delay: Option<Duration>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockBalanceOracle {
    pub fn new(balance: f64) -> Self {
        Self {
            balance: Arc::new(Mutex::new(Some(balance))),
            ..Self::default()
        }
    }

    /// Every read fails
    pub fn failing() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_balance(&self, balance: f64) {
        *self.balance.lock().unwrap() = Some(balance);
    }

    pub fn get_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BalanceOracle for MockBalanceOracle {
    async fn native_balance(&self, address: &str) -> Result<f64, OracleError> {
        self.calls.lock().unwrap().push(address.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.balance
            .lock()
            .unwrap()
            .ok_or_else(|| OracleError::Rpc("mock balance unavailable".into()))
    }
}

/// Market oracle returning a settable status
#[derive(Debug, Clone, Default)]
pub struct MockMarketOracle {
    status: Arc<Mutex<Option<MarketStatus>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockMarketOracle {
    pub fn new(status: MarketStatus) -> Self {
        Self {
            status: Arc::new(Mutex::new(Some(status))),
            ..Self::default()
        }
    }

    pub fn graduated(pair: &str) -> Self {
        Self::new(MarketStatus::graduated(120_000.0, Some(pair.to_string())))
    }

    pub fn failing() -> Self {
        Self::default()
    }

    pub fn set_status(&self, status: MarketStatus) {
        *self.status.lock().unwrap() = Some(status);
    }

    pub fn get_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MarketStatusOracle for MockMarketOracle {
    async fn market_status(&self, token_mint: &str) -> Result<MarketStatus, OracleError> {
        self.calls.lock().unwrap().push(token_mint.to_string());
        self.status
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| OracleError::Http("mock market status unavailable".into()))
    }
}

/// Scripted outcome for one quote call
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QuoteScript {
    /// Quote with the given price impact percent
    Impact(f64),
    /// No route / API failure
    Unavailable,
}

/// Swap gateway with queued quote outcomes and switchable execution
#[derive(Debug, Clone)]
pub struct MockSwapGateway {
    quotes: Arc<Mutex<VecDeque<QuoteScript>>>,
    default_quote: QuoteScript,
    failing_legs: Arc<Mutex<Vec<SwapLeg>>>,
    /// Output units per input lamport
    rate: u64,
    delay: Option<Duration>,
    execute_delay: Option<Duration>,
    quote_calls: Arc<Mutex<Vec<QuoteRequest>>>,
    execute_calls: Arc<Mutex<Vec<(SwapTag, SwapQuote)>>>,
}

impl Default for MockSwapGateway {
    fn default() -> Self {
        Self {
            quotes: Arc::new(Mutex::new(VecDeque::new())),
            default_quote: QuoteScript::Impact(0.1),
            failing_legs: Arc::new(Mutex::new(Vec::new())),
            rate: 100,
            delay: None,
            execute_delay: None,
            quote_calls: Arc::new(Mutex::new(Vec::new())),
            execute_calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl MockSwapGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Outcome for every quote not scripted with `then_quote`
    pub fn with_default_quote(mut self, script: QuoteScript) -> Self {
        self.default_quote = script;
        self
    }

    /// Queue an outcome for the next unscripted quote call
    pub fn then_quote(self, script: QuoteScript) -> Self {
        self.quotes.lock().unwrap().push_back(script);
        self
    }

    /// Every execution fails
    pub fn with_failing_execution(self) -> Self {
        self.with_failing_leg(SwapLeg::Buyback)
            .with_failing_leg(SwapLeg::LiquidityPairing)
    }

    /// Executions of `leg` fail, the other leg still succeeds
    pub fn with_failing_leg(self, leg: SwapLeg) -> Self {
        self.failing_legs.lock().unwrap().push(leg);
        self
    }

    /// Delay applied to quotes
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Delay applied to executions
    pub fn with_execute_delay(mut self, delay: Duration) -> Self {
        self.execute_delay = Some(delay);
        self
    }

    pub fn quote_calls(&self) -> Vec<QuoteRequest> {
        self.quote_calls.lock().unwrap().clone()
    }

    pub fn execute_calls(&self) -> Vec<(SwapTag, SwapQuote)> {
        self.execute_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SwapGateway for MockSwapGateway {
    async fn get_quote(&self, request: QuoteRequest) -> Result<SwapQuote, ExecutionError> {
        self.quote_calls.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let script = self
            .quotes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.default_quote);

        match script {
            QuoteScript::Unavailable => {
                Err(ExecutionError::NoRoute("mock quote unavailable".into()))
            }
            QuoteScript::Impact(impact) => {
                let out_amount = request.amount.saturating_mul(self.rate);
                Ok(SwapQuote {
                    input_mint: request.input_mint,
                    output_mint: request.output_mint,
                    in_amount: request.amount,
                    out_amount,
                    min_out_amount: out_amount - out_amount / 100,
                    price_impact_pct: impact,
                    route: "MockAMM".to_string(),
                    raw: serde_json::Value::Null,
                })
            }
        }
    }

    async fn execute_swap(
        &self,
        quote: SwapQuote,
        tag: SwapTag,
    ) -> Result<ExecutedSwap, ExecutionError> {
        self.execute_calls.lock().unwrap().push((tag, quote.clone()));
        if let Some(delay) = self.execute_delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing_legs.lock().unwrap().contains(&tag.leg) {
            return Err(ExecutionError::ExecutionFailed("mock execution failed".into()));
        }

        let prefix = match tag.leg {
            SwapLeg::Buyback => "mock-buy",
            SwapLeg::LiquidityPairing => "mock-lp",
        };

        Ok(ExecutedSwap {
            signature: format!("{}-{}", prefix, tag.cycle),
            output_amount: quote.out_amount,
            simulated: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_balance_oracle() {
        let mock = MockBalanceOracle::new(2.5);
        assert_eq!(mock.native_balance("wallet").await.unwrap(), 2.5);
        assert_eq!(mock.get_calls(), vec!["wallet".to_string()]);

        assert!(MockBalanceOracle::failing().native_balance("w").await.is_err());
    }

    #[tokio::test]
    async fn test_mock_gateway_scripts_in_order() {
        let mock = MockSwapGateway::new()
            .then_quote(QuoteScript::Unavailable)
            .then_quote(QuoteScript::Impact(6.0));

        let req = QuoteRequest::buy("Token", 1_000, 500);
        assert!(mock.get_quote(req.clone()).await.is_err());
        assert_eq!(mock.get_quote(req.clone()).await.unwrap().price_impact_pct, 6.0);
        assert_eq!(mock.get_quote(req).await.unwrap().price_impact_pct, 0.1);
        assert_eq!(mock.quote_calls().len(), 3);
    }

    #[tokio::test]
    async fn test_mock_gateway_execution() {
        let mock = MockSwapGateway::new();
        let quote = mock.get_quote(QuoteRequest::buy("Token", 10, 500)).await.unwrap();
        let tag = SwapTag { leg: SwapLeg::Buyback, cycle: 2 };

        let executed = mock.execute_swap(quote, tag).await.unwrap();
        assert_eq!(executed.signature, "mock-buy-2");
        assert_eq!(executed.output_amount, 1_000);

        let failing = MockSwapGateway::new().with_failing_execution();
        let quote = failing.get_quote(QuoteRequest::buy("Token", 10, 500)).await.unwrap();
        assert!(failing.execute_swap(quote, tag).await.is_err());

        let lp_only = MockSwapGateway::new().with_failing_leg(SwapLeg::LiquidityPairing);
        let quote = lp_only.get_quote(QuoteRequest::buy("Token", 10, 500)).await.unwrap();
        assert!(lp_only.execute_swap(quote.clone(), tag).await.is_ok());
        let lp_tag = SwapTag { leg: SwapLeg::LiquidityPairing, cycle: 2 };
        assert!(lp_only.execute_swap(quote, lp_tag).await.is_err());
    }
}
