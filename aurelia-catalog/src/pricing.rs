use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::materials::MetalType;
use crate::rates::RateSnapshot;

/// Tunable pricing rules. Defaults match the storefront's standing policy; the store
/// layer may override individual values from the `pricing_rules` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingRules {
    /// Flat markup over material cost covering craftsmanship and margin.
    pub overhead_rate: f64,

    /// Share of the grand total collected as deposit at order placement.
    pub advance_rate: f64,

    /// Accepted relative drift between a client-computed total and the server's.
    pub drift_tolerance: f64,
}

impl Default for PricingRules {
    fn default() -> Self {
        Self {
            overhead_rate: 0.25,
            advance_rate: 0.5,
            drift_tolerance: 0.01,
        }
    }
}

/// One priced stone line in a quote.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoneLine {
    pub stone_type_code: String,
    pub carat: f64,
    pub price_per_carat_paise: i64,
    pub cost_paise: i64,
}

/// Inputs to a single quote. Material codes are resolved to rows by the caller so the
/// engine itself stays synchronous and lookup-free.
#[derive(Debug, Clone)]
pub struct QuoteRequest {
    pub product_id: Option<Uuid>,
    pub metal_weight_grams: f64,
    pub stones: Vec<(String, f64, i64)>, // (code, carat, price_per_carat_paise)
    pub price_override_paise: Option<i64>,
}

/// Full server-side price breakdown. This is the single source of truth consumed by
/// the customizer quote endpoint, the admin breakdown panel and checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub product_id: Option<Uuid>,
    pub metal_cost_paise: i64,
    pub stone_cost_paise: i64,
    pub stone_lines: Vec<StoneLine>,
    pub base_total_paise: i64,
    pub overhead_paise: i64,
    pub grand_total_paise: i64,
    pub advance_paise: i64,
    pub remaining_paise: i64,
    pub grand_total_usd_cents: i64,
    pub advance_usd_cents: i64,
    pub fixed_price: bool,
    pub fx_fallback: bool,
    pub rates: RateSnapshot,
}

#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    #[error("Metal weight must be positive, got {0}")]
    NonPositiveWeight(f64),

    #[error("Stone carat must be positive, got {0} for {1}")]
    NonPositiveCarat(f64, String),

    #[error("Gold price must be positive, got {0} paise")]
    InvalidGoldPrice(i64),

    #[error("Client total {client_paise} drifted beyond tolerance from server total {server_paise}")]
    QuoteDrift { server_paise: i64, client_paise: i64 },
}

/// Round a fractional paise amount half-up to an integer.
fn round_paise(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// The pricing calculator.
pub struct QuoteEngine {
    rules: PricingRules,
}

impl QuoteEngine {
    pub fn new(rules: PricingRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &PricingRules {
        &self.rules
    }

    /// Compute the full breakdown for a quote.
    ///
    /// `total = metalWeight × goldPricePerGram × metalModifier + Σ(carat × pricePerCarat)`
    /// `grandTotal = total × (1 + overhead)`, `advance = grandTotal × advance_rate`,
    /// with the rounding remainder folded into the advance so that
    /// `advance + remaining == grandTotal` exactly.
    pub fn quote(
        &self,
        request: &QuoteRequest,
        metal: &MetalType,
        rates: &RateSnapshot,
    ) -> Result<PriceBreakdown, PricingError> {
        if let Some(override_paise) = request.price_override_paise {
            // Fixed-price pieces skip the formula but keep the split and FX mirror.
            return Ok(self.split_and_mirror(request.product_id, 0, 0, vec![], override_paise, 0, true, rates));
        }

        if request.metal_weight_grams <= 0.0 {
            return Err(PricingError::NonPositiveWeight(request.metal_weight_grams));
        }
        if rates.gold_price_per_gram_paise <= 0 {
            return Err(PricingError::InvalidGoldPrice(rates.gold_price_per_gram_paise));
        }

        let metal_cost_paise = round_paise(
            request.metal_weight_grams
                * rates.gold_price_per_gram_paise as f64
                * metal.price_modifier,
        );

        let mut stone_lines = Vec::with_capacity(request.stones.len());
        let mut stone_cost_paise: i64 = 0;
        for (code, carat, price_per_carat) in &request.stones {
            if *carat <= 0.0 {
                return Err(PricingError::NonPositiveCarat(*carat, code.clone()));
            }
            let cost = round_paise(carat * *price_per_carat as f64);
            stone_cost_paise += cost;
            stone_lines.push(StoneLine {
                stone_type_code: code.clone(),
                carat: *carat,
                price_per_carat_paise: *price_per_carat,
                cost_paise: cost,
            });
        }

        let base_total = metal_cost_paise + stone_cost_paise;
        let overhead = round_paise(base_total as f64 * self.rules.overhead_rate);

        Ok(self.split_and_mirror(
            request.product_id,
            metal_cost_paise,
            stone_cost_paise,
            stone_lines,
            base_total,
            overhead,
            false,
            rates,
        ))
    }

    /// Accept or reject a client-computed total against the server breakdown.
    /// Client hooks recompute the formula locally; drift inside the tolerance is
    /// display skew and is accepted, beyond it checkout must re-quote.
    pub fn reconcile(&self, server_total_paise: i64, client_total_paise: i64) -> Result<(), PricingError> {
        let allowed = round_paise(server_total_paise as f64 * self.rules.drift_tolerance);
        if (server_total_paise - client_total_paise).abs() > allowed {
            return Err(PricingError::QuoteDrift {
                server_paise: server_total_paise,
                client_paise: client_total_paise,
            });
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn split_and_mirror(
        &self,
        product_id: Option<Uuid>,
        metal_cost_paise: i64,
        stone_cost_paise: i64,
        stone_lines: Vec<StoneLine>,
        base_total_paise: i64,
        overhead_paise: i64,
        fixed_price: bool,
        rates: &RateSnapshot,
    ) -> PriceBreakdown {
        let grand_total = base_total_paise + overhead_paise;
        let remaining = round_paise(grand_total as f64 * (1.0 - self.rules.advance_rate));
        // Remainder goes to the deposit so the two installments sum exactly.
        let advance = grand_total - remaining;

        PriceBreakdown {
            product_id,
            metal_cost_paise,
            stone_cost_paise,
            stone_lines,
            base_total_paise,
            overhead_paise,
            grand_total_paise: grand_total,
            advance_paise: advance,
            remaining_paise: remaining,
            grand_total_usd_cents: rates.paise_to_usd_cents(grand_total),
            advance_usd_cents: rates.paise_to_usd_cents(advance),
            fixed_price,
            fx_fallback: rates.fx_fallback,
            rates: rates.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn gold_18k() -> MetalType {
        MetalType {
            code: "GOLD_18K".to_string(),
            name: "Gold".to_string(),
            purity_label: "18kt".to_string(),
            price_modifier: 0.75,
            is_active: true,
        }
    }

    fn rates(fx_fallback: bool) -> RateSnapshot {
        RateSnapshot {
            gold_price_per_gram_paise: 600_000, // INR 6000/g
            inr_per_usd: 83.0,
            fx_fallback,
            fetched_at: Utc::now(),
        }
    }

    fn engine() -> QuoteEngine {
        QuoteEngine::new(PricingRules::default())
    }

    #[test]
    fn formula_matches_worked_example() {
        // 4g of 18kt at 6000/g modifier 0.75 = INR 18,000 metal
        // 0.5ct diamond at 50,000/ct = INR 25,000 stones
        // base 43,000; overhead 10,750; grand 53,750; advance 26,875
        let request = QuoteRequest {
            product_id: None,
            metal_weight_grams: 4.0,
            stones: vec![("DIAMOND".to_string(), 0.5, 5_000_000)],
            price_override_paise: None,
        };
        let breakdown = engine().quote(&request, &gold_18k(), &rates(false)).unwrap();

        assert_eq!(breakdown.metal_cost_paise, 1_800_000);
        assert_eq!(breakdown.stone_cost_paise, 2_500_000);
        assert_eq!(breakdown.base_total_paise, 4_300_000);
        assert_eq!(breakdown.overhead_paise, 1_075_000);
        assert_eq!(breakdown.grand_total_paise, 5_375_000);
        assert_eq!(breakdown.advance_paise, 2_687_500);
        assert_eq!(breakdown.remaining_paise, 2_687_500);
        assert!(!breakdown.fixed_price);
    }

    #[test]
    fn installments_sum_exactly_on_odd_totals() {
        let request = QuoteRequest {
            product_id: None,
            metal_weight_grams: 1.0,
            stones: vec![],
            // Force an odd grand total through the override path.
            price_override_paise: Some(1001),
        };
        let breakdown = engine().quote(&request, &gold_18k(), &rates(false)).unwrap();

        assert_eq!(breakdown.grand_total_paise, 1001);
        assert_eq!(breakdown.advance_paise + breakdown.remaining_paise, 1001);
        // The odd paisa lands in the deposit.
        assert_eq!(breakdown.advance_paise, 501);
        assert_eq!(breakdown.remaining_paise, 500);
    }

    #[test]
    fn fixed_price_skips_overhead_but_keeps_split() {
        let request = QuoteRequest {
            product_id: None,
            metal_weight_grams: 10.0,
            stones: vec![("RUBY".to_string(), 1.0, 1_500_000)],
            price_override_paise: Some(10_000_000),
        };
        let breakdown = engine().quote(&request, &gold_18k(), &rates(false)).unwrap();

        assert!(breakdown.fixed_price);
        assert_eq!(breakdown.overhead_paise, 0);
        assert_eq!(breakdown.grand_total_paise, 10_000_000);
        assert_eq!(breakdown.advance_paise, 5_000_000);
    }

    #[test]
    fn fx_fallback_flag_propagates() {
        let request = QuoteRequest {
            product_id: None,
            metal_weight_grams: 2.0,
            stones: vec![],
            price_override_paise: None,
        };
        let breakdown = engine().quote(&request, &gold_18k(), &rates(true)).unwrap();
        assert!(breakdown.fx_fallback);
    }

    #[test]
    fn usd_mirror_uses_snapshot_rate() {
        let request = QuoteRequest {
            product_id: None,
            metal_weight_grams: 0.0,
            stones: vec![],
            price_override_paise: Some(8_300_000), // INR 83,000
        };
        let breakdown = engine().quote(&request, &gold_18k(), &rates(false)).unwrap();
        // 83,000 INR at 83/USD = 1000 USD
        assert_eq!(breakdown.grand_total_usd_cents, 100_000);
    }

    #[test]
    fn rejects_non_positive_weight() {
        let request = QuoteRequest {
            product_id: None,
            metal_weight_grams: 0.0,
            stones: vec![],
            price_override_paise: None,
        };
        assert!(matches!(
            engine().quote(&request, &gold_18k(), &rates(false)),
            Err(PricingError::NonPositiveWeight(_))
        ));
    }

    #[test]
    fn rejects_non_positive_carat() {
        let request = QuoteRequest {
            product_id: None,
            metal_weight_grams: 2.0,
            stones: vec![("DIAMOND".to_string(), -0.1, 5_000_000)],
            price_override_paise: None,
        };
        assert!(matches!(
            engine().quote(&request, &gold_18k(), &rates(false)),
            Err(PricingError::NonPositiveCarat(_, _))
        ));
    }

    #[test]
    fn rejects_missing_gold_price() {
        let request = QuoteRequest {
            product_id: None,
            metal_weight_grams: 2.0,
            stones: vec![],
            price_override_paise: None,
        };
        let mut bad_rates = rates(false);
        bad_rates.gold_price_per_gram_paise = 0;
        assert!(matches!(
            engine().quote(&request, &gold_18k(), &bad_rates),
            Err(PricingError::InvalidGoldPrice(0))
        ));
    }

    #[test]
    fn reconcile_accepts_drift_within_one_percent() {
        let engine = engine();
        assert!(engine.reconcile(100_000, 100_900).is_ok());
        assert!(engine.reconcile(100_000, 99_100).is_ok());
        // Exactly at the boundary is accepted.
        assert!(engine.reconcile(100_000, 101_000).is_ok());
    }

    #[test]
    fn reconcile_rejects_drift_beyond_tolerance() {
        let engine = engine();
        let err = engine.reconcile(100_000, 101_001).unwrap_err();
        assert!(matches!(err, PricingError::QuoteDrift { .. }));
    }
}
