//! Allocation split
//!
//! Buyback and liquidity shares are independent fractions of the same balance
//! snapshot. Whatever is left after both is simply not spent.

use serde::{Deserialize, Serialize};

/// Lamports per native SOL
pub const LAMPORTS_PER_SOL: f64 = 1_000_000_000.0;

/// Convert native SOL to lamports (floored)
pub fn sol_to_lamports(sol: f64) -> u64 {
    if sol <= 0.0 {
        return 0;
    }
    (sol * LAMPORTS_PER_SOL).floor() as u64
}

/// Convert lamports to native SOL
pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL
}

/// How one trigger balance is divided between the two legs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    /// Balance snapshot the split was computed from
    pub balance: f64,
    /// Native amount swapped into the token
    pub buyback: f64,
    /// Native amount earmarked for the liquidity pair
    pub liquidity: f64,
}

impl Allocation {
    pub fn split(balance: f64, buyback_pct: f64, liquidity_pct: f64) -> Self {
        Self {
            balance,
            buyback: balance * buyback_pct / 100.0,
            liquidity: balance * liquidity_pct / 100.0,
        }
    }

    /// Half of the liquidity share, swapped to the token to pair with the rest
    pub fn liquidity_swap_half(&self) -> f64 {
        self.liquidity / 2.0
    }

    /// Part of the balance neither leg touches
    pub fn unallocated(&self) -> f64 {
        (self.balance - self.buyback - self.liquidity).max(0.0)
    }
}
