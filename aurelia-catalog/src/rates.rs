use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fallback used when the FX feed is unavailable.
pub const FALLBACK_INR_PER_USD: f64 = 83.0;

/// Snapshot of the external rates a quote was computed against.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RateSnapshot {
    /// Live gold price for 24kt, in paise per gram.
    pub gold_price_per_gram_paise: i64,
    pub inr_per_usd: f64,
    /// True when `inr_per_usd` is the hardcoded fallback rather than a feed value.
    pub fx_fallback: bool,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum RateError {
    #[error("Gold price unavailable: {0}")]
    GoldPriceUnavailable(String),

    #[error("Rate feed returned malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Rate cache error: {0}")]
    Cache(String),
}

/// Seam between the pricing engine and the external gold/FX feeds. The store crate
/// implements this with Redis-cached HTTP fetchers.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Current rate snapshot. `force_refresh` bypasses any cache layer.
    async fn current_rates(&self, force_refresh: bool) -> Result<RateSnapshot, RateError>;
}

impl RateSnapshot {
    /// Convert an INR paise amount to US cents at this snapshot's rate.
    pub fn paise_to_usd_cents(&self, paise: i64) -> i64 {
        ((paise as f64 / self.inr_per_usd) + 0.5).floor() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_paise_to_usd_cents() {
        let snapshot = RateSnapshot {
            gold_price_per_gram_paise: 650_000,
            inr_per_usd: 83.0,
            fx_fallback: false,
            fetched_at: Utc::now(),
        };
        // 8300 paise (83 INR) -> 100 cents (1 USD)
        assert_eq!(snapshot.paise_to_usd_cents(8300), 100);
    }

    #[test]
    fn conversion_rounds_half_up() {
        let snapshot = RateSnapshot {
            gold_price_per_gram_paise: 650_000,
            inr_per_usd: 80.0,
            fx_fallback: true,
            fetched_at: Utc::now(),
        };
        // 100 paise / 80 = 1.25 cents -> 1
        assert_eq!(snapshot.paise_to_usd_cents(100), 1);
        // 120 paise / 80 = 1.5 cents -> 2
        assert_eq!(snapshot.paise_to_usd_cents(120), 2);
    }
}
