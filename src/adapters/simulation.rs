//! Simulation Gateway
//!
//! Wraps a real gateway: quotes go through to the aggregator, executions are
//! replaced by deterministic synthetic successes. Nothing is signed or sent.

use async_trait::async_trait;

use crate::ports::{ExecutedSwap, ExecutionError, QuoteRequest, SwapGateway, SwapQuote, SwapTag};

pub struct SimulatedSwapGateway<G> {
    inner: G,
}

impl<G: SwapGateway> SimulatedSwapGateway<G> {
    pub fn new(inner: G) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &G {
        &self.inner
    }

    /// `sim-buyback-3`, `sim-lp-3`
    pub fn synthetic_signature(tag: SwapTag) -> String {
        format!("sim-{}-{}", tag.leg.as_str(), tag.cycle)
    }
}

#[async_trait]
impl<G: SwapGateway> SwapGateway for SimulatedSwapGateway<G> {
    async fn get_quote(&self, request: QuoteRequest) -> Result<SwapQuote, ExecutionError> {
        self.inner.get_quote(request).await
    }

    async fn execute_swap(
        &self,
        quote: SwapQuote,
        tag: SwapTag,
    ) -> Result<ExecutedSwap, ExecutionError> {
        let signature = Self::synthetic_signature(tag);
        tracing::info!(
            "[SIMULATE] {} swap {} lamports -> {} units via {} ({})",
            tag.leg.as_str(),
            quote.in_amount,
            quote.out_amount,
            if quote.route.is_empty() { "-" } else { &quote.route },
            signature
        );

        Ok(ExecutedSwap {
            signature,
            output_amount: quote.out_amount,
            simulated: true,
        })
    }
}
