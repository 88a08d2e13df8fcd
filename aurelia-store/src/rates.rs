use async_trait::async_trait;
use aurelia_catalog::rates::{RateError, RateProvider, RateSnapshot, FALLBACK_INR_PER_USD};
use chrono::Utc;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::redis_repo::RedisClient;

/// Gold feed payload: `{"price_gram_24k": 6234.55, "currency": "INR"}`.
fn parse_gold_payload(payload: &Value) -> Result<i64, RateError> {
    let price_inr = payload
        .get("price_gram_24k")
        .and_then(Value::as_f64)
        .ok_or_else(|| RateError::MalformedPayload("missing price_gram_24k".to_string()))?;

    if price_inr <= 0.0 {
        return Err(RateError::MalformedPayload(format!(
            "non-positive gold price {}",
            price_inr
        )));
    }
    Ok((price_inr * 100.0 + 0.5).floor() as i64)
}

/// FX feed payload (base USD): `{"rates": {"INR": 83.2, ...}}`.
fn parse_fx_payload(payload: &Value) -> Result<f64, RateError> {
    let rate = payload
        .get("rates")
        .and_then(|r| r.get("INR"))
        .and_then(Value::as_f64)
        .ok_or_else(|| RateError::MalformedPayload("missing rates.INR".to_string()))?;

    if rate <= 0.0 {
        return Err(RateError::MalformedPayload(format!("non-positive fx rate {}", rate)));
    }
    Ok(rate)
}

/// Redis-cached provider over the external gold and FX feeds. Gold is mandatory for
/// quoting; FX degrades to the hardcoded fallback.
pub struct CachedRateProvider {
    http: reqwest::Client,
    redis: RedisClient,
    gold_feed_url: String,
    fx_feed_url: String,
    cache_ttl_seconds: u64,
}

impl CachedRateProvider {
    pub fn new(
        redis: RedisClient,
        gold_feed_url: &str,
        fx_feed_url: &str,
        cache_ttl_seconds: u64,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            redis,
            gold_feed_url: gold_feed_url.to_string(),
            fx_feed_url: fx_feed_url.to_string(),
            cache_ttl_seconds,
        }
    }

    async fn fetch_gold_price(&self) -> Result<i64, RateError> {
        let payload: Value = self
            .http
            .get(&self.gold_feed_url)
            .send()
            .await
            .map_err(|e| RateError::GoldPriceUnavailable(e.to_string()))?
            .error_for_status()
            .map_err(|e| RateError::GoldPriceUnavailable(e.to_string()))?
            .json()
            .await
            .map_err(|e| RateError::MalformedPayload(e.to_string()))?;

        let price = parse_gold_payload(&payload)?;
        info!("Fetched gold price: {} paise/g", price);
        Ok(price)
    }

    async fn fetch_fx_rate(&self) -> Result<f64, RateError> {
        let payload: Value = self
            .http
            .get(&self.fx_feed_url)
            .send()
            .await
            .map_err(|e| RateError::Cache(e.to_string()))?
            .error_for_status()
            .map_err(|e| RateError::Cache(e.to_string()))?
            .json()
            .await
            .map_err(|e| RateError::MalformedPayload(e.to_string()))?;

        parse_fx_payload(&payload)
    }
}

#[async_trait]
impl RateProvider for CachedRateProvider {
    async fn current_rates(&self, force_refresh: bool) -> Result<RateSnapshot, RateError> {
        // Redis outages degrade to direct feed fetches.
        let cached_gold = if force_refresh {
            None
        } else {
            self.redis.get_gold_price().await.unwrap_or_else(|e| {
                warn!("Gold price cache read failed: {}", e);
                None
            })
        };

        let gold_price = match cached_gold {
            Some(price) => price,
            None => {
                let price = self.fetch_gold_price().await?;
                if let Err(e) = self.redis.set_gold_price(price, self.cache_ttl_seconds).await {
                    warn!("Gold price cache write failed: {}", e);
                }
                price
            }
        };

        let cached_fx = if force_refresh {
            None
        } else {
            self.redis.get_fx_rate().await.unwrap_or(None)
        };

        let (inr_per_usd, fx_fallback) = match cached_fx {
            Some(rate) => (rate, false),
            None => match self.fetch_fx_rate().await {
                Ok(rate) => {
                    if let Err(e) = self.redis.set_fx_rate(rate, self.cache_ttl_seconds).await {
                        warn!("FX cache write failed: {}", e);
                    }
                    (rate, false)
                }
                Err(e) => {
                    // The storefront still quotes; USD figures just use the fallback.
                    error!("FX feed unavailable, using fallback {}: {}", FALLBACK_INR_PER_USD, e);
                    (FALLBACK_INR_PER_USD, true)
                }
            },
        };

        Ok(RateSnapshot {
            gold_price_per_gram_paise: gold_price,
            inr_per_usd,
            fx_fallback,
            fetched_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_gold_feed_to_paise() {
        let payload = json!({"price_gram_24k": 6234.55, "currency": "INR"});
        assert_eq!(parse_gold_payload(&payload).unwrap(), 623_455);
    }

    #[test]
    fn rejects_missing_or_bad_gold_price() {
        assert!(parse_gold_payload(&json!({})).is_err());
        assert!(parse_gold_payload(&json!({"price_gram_24k": -1.0})).is_err());
    }

    #[test]
    fn parses_fx_feed() {
        let payload = json!({"base": "USD", "rates": {"INR": 83.2, "EUR": 0.92}});
        assert_eq!(parse_fx_payload(&payload).unwrap(), 83.2);
    }

    #[test]
    fn rejects_fx_payload_without_inr() {
        assert!(parse_fx_payload(&json!({"rates": {"EUR": 0.92}})).is_err());
    }
}
