//! Market Status
//!
//! Classifies a token as still on its launch bonding curve or graduated to a
//! standard AMM pool. Recomputed every poll, never stored.

use serde::{Deserialize, Serialize};

/// Market cap (USD) at which a bonding curve token graduates
pub const GRADUATION_MARKET_CAP_USD: f64 = 69_000.0;

/// Progress is capped below 100 until the listing venue confirms graduation
pub const MAX_PRE_GRADUATION_PROGRESS: f64 = 99.0;

/// Venues whose listing counts as graduation
pub const GRADUATED_VENUES: &[&str] = &["raydium"];

/// Snapshot of where the token trades
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketStatus {
    pub is_on_bonding_curve: bool,
    /// 0-100, capped at 99 while on the curve
    pub bonding_curve_progress: f64,
    pub market_cap: f64,
    pub graduated: bool,
    /// Pool address on the graduation venue, when graduated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pair_address: Option<String>,
}

impl MarketStatus {
    /// Nothing listed yet
    pub fn unlisted() -> Self {
        Self::pre_graduation(0.0)
    }

    /// Still on the curve with the given market cap estimate
    pub fn pre_graduation(market_cap: f64) -> Self {
        Self {
            is_on_bonding_curve: true,
            bonding_curve_progress: bonding_curve_progress(market_cap),
            market_cap,
            graduated: false,
            pair_address: None,
        }
    }

    /// Listed on a graduation venue
    pub fn graduated(market_cap: f64, pair_address: Option<String>) -> Self {
        Self {
            is_on_bonding_curve: false,
            bonding_curve_progress: 100.0,
            market_cap,
            graduated: true,
            pair_address,
        }
    }

    /// Classify from the first listing an aggregator reports
    pub fn classify(listing: Option<&VenueListing>) -> Self {
        match listing {
            None => Self::unlisted(),
            Some(l) if is_graduation_venue(&l.venue) => {
                Self::graduated(l.market_cap, l.pair_address.clone())
            }
            Some(l) => Self::pre_graduation(l.market_cap),
        }
    }
}

/// Minimal view of a pair listing, independent of the aggregator's schema
#[derive(Debug, Clone, PartialEq)]
pub struct VenueListing {
    pub venue: String,
    pub pair_address: Option<String>,
    pub market_cap: f64,
}

/// `min(market_cap / cap * 100, 99)`, never negative
pub fn bonding_curve_progress(market_cap: f64) -> f64 {
    if market_cap <= 0.0 || !market_cap.is_finite() {
        return 0.0;
    }
    (market_cap / GRADUATION_MARKET_CAP_USD * 100.0).min(MAX_PRE_GRADUATION_PROGRESS)
}

pub fn is_graduation_venue(venue: &str) -> bool {
    let venue = venue.to_lowercase();
    GRADUATED_VENUES.iter().any(|v| venue.contains(v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn listing(venue: &str, mcap: f64) -> VenueListing {
        VenueListing {
            venue: venue.to_string(),
            pair_address: Some("Pair111".to_string()),
            market_cap: mcap,
        }
    }

    #[test]
    fn test_half_way_to_graduation() {
        let status = MarketStatus::classify(Some(&listing("pumpfun", 34_500.0)));
        assert!(status.is_on_bonding_curve);
        assert!(!status.graduated);
        assert_relative_eq!(status.bonding_curve_progress, 50.0, epsilon = 1e-9);
        assert!(status.pair_address.is_none());
    }

    #[test]
    fn test_progress_capped_below_100() {
        let status = MarketStatus::classify(Some(&listing("pumpfun", 500_000.0)));
        assert!(!status.graduated);
        assert_relative_eq!(status.bonding_curve_progress, 99.0);
    }

    #[test]
    fn test_raydium_listing_graduates() {
        let status = MarketStatus::classify(Some(&listing("Raydium", 80_000.0)));
        assert!(status.graduated);
        assert!(!status.is_on_bonding_curve);
        assert_relative_eq!(status.bonding_curve_progress, 100.0);
        assert_eq!(status.pair_address.as_deref(), Some("Pair111"));
    }

    #[test]
    fn test_no_listing_is_unlisted_curve() {
        let status = MarketStatus::classify(None);
        assert!(status.is_on_bonding_curve);
        assert_eq!(status.bonding_curve_progress, 0.0);
        assert_eq!(status.market_cap, 0.0);
    }

    #[test]
    fn test_negative_or_nan_cap_is_zero_progress() {
        assert_eq!(bonding_curve_progress(-5.0), 0.0);
        assert_eq!(bonding_curve_progress(f64::NAN), 0.0);
    }
}
