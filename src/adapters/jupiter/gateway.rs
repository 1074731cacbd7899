//! Live swap gateway: Jupiter prices and builds, the engine signs, the RPC
//! node confirms.

use async_trait::async_trait;

use super::client::JupiterClient;
use super::quote::QuoteParams;
use super::swap::SwapRequest;
use crate::adapters::solana::{SolanaClient, WalletManager};
use crate::ports::{ExecutedSwap, ExecutionError, QuoteRequest, SwapGateway, SwapQuote, SwapTag};

pub struct JupiterSwapGateway {
    client: JupiterClient,
    solana: SolanaClient,
    wallet: WalletManager,
    priority_fee_lamports: Option<u64>,
}

impl JupiterSwapGateway {
    pub fn new(client: JupiterClient, solana: SolanaClient, wallet: WalletManager) -> Self {
        Self {
            client,
            solana,
            wallet,
            priority_fee_lamports: None,
        }
    }

    pub fn with_priority_fee(mut self, lamports: Option<u64>) -> Self {
        self.priority_fee_lamports = lamports;
        self
    }

    pub fn signer(&self) -> String {
        self.wallet.public_key()
    }
}

#[async_trait]
impl SwapGateway for JupiterSwapGateway {
    async fn get_quote(&self, request: QuoteRequest) -> Result<SwapQuote, ExecutionError> {
        if request.amount == 0 {
            return Err(ExecutionError::InvalidParameters("amount must be > 0".into()));
        }

        let params = QuoteParams::from(request);
        let response = self.client.get_quote(&params).await?;
        let quote = response.into_swap_quote()?;

        tracing::debug!(
            "Quote {} -> {}: in={} out={} impact={:.4}% via {}",
            quote.input_mint,
            quote.output_mint,
            quote.in_amount,
            quote.out_amount,
            quote.price_impact_pct,
            quote.route
        );
        Ok(quote)
    }

    async fn execute_swap(
        &self,
        quote: SwapQuote,
        tag: SwapTag,
    ) -> Result<ExecutedSwap, ExecutionError> {
        if !quote.raw.is_object() {
            return Err(ExecutionError::InvalidParameters(
                "quote carries no aggregator payload".into(),
            ));
        }

        let request = SwapRequest::new(self.wallet.public_key(), quote.raw.clone())
            .with_priority_fee(self.priority_fee_lamports);
        let built = self.client.get_swap_transaction(&request).await?;

        let unsigned = built.transaction()?;
        let signed = self
            .wallet
            .sign_versioned(unsigned)
            .map_err(|e| ExecutionError::SigningError(e.to_string()))?;

        tracing::info!(
            "Submitting {} swap for cycle {} ({} lamports in, expecting >= {} out)",
            tag.leg.as_str(),
            tag.cycle,
            quote.in_amount,
            quote.min_out_amount
        );

        let signature = self
            .solana
            .send_and_confirm_transaction(signed)
            .await
            .map_err(|e| {
                let msg = e.to_string();
                if msg.contains("SlippageToleranceExceeded") || msg.contains("0x1771") {
                    ExecutionError::SlippageExceeded
                } else {
                    ExecutionError::ExecutionFailed(msg)
                }
            })?;

        Ok(ExecutedSwap {
            signature,
            output_amount: quote.out_amount,
            simulated: false,
        })
    }
}
