//! DexScreener response types

use serde::{Deserialize, Serialize};

use crate::domain::VenueListing;

/// Response of `GET /tokens/{mint}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenPairsResponse {
    /// `null` when the token has no listing anywhere
    #[serde(default)]
    pub pairs: Option<Vec<DexPair>>,
}

impl TokenPairsResponse {
    /// The listing DexScreener ranks first
    pub fn primary_pair(&self) -> Option<&DexPair> {
        self.pairs.as_ref().and_then(|pairs| pairs.first())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DexPair {
    #[serde(default)]
    pub chain_id: String,
    pub dex_id: String,
    #[serde(default)]
    pub pair_address: Option<String>,
    /// Fully diluted valuation in USD
    #[serde(default)]
    pub fdv: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
}

impl DexPair {
    /// FDV first, falling back to reported market cap
    pub fn valuation(&self) -> f64 {
        self.fdv.or(self.market_cap).unwrap_or(0.0)
    }

    pub fn to_listing(&self) -> VenueListing {
        VenueListing {
            venue: self.dex_id.clone(),
            pair_address: self.pair_address.clone(),
            market_cap: self.valuation(),
        }
    }
}
