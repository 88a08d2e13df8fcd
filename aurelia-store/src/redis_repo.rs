use redis::{AsyncCommands, RedisResult};
use tracing::info;

const GOLD_PRICE_KEY: &str = "rates:gold_price_per_gram_paise";
const FX_RATE_KEY: &str = "rates:inr_per_usd";

#[derive(Clone)]
pub struct RedisClient {
    client: redis::Client,
}

impl RedisClient {
    pub async fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client })
    }

    // Gold price cache

    pub async fn set_gold_price(&self, price_paise: i64, ttl_seconds: u64) -> RedisResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.set_ex::<_, _, ()>(GOLD_PRICE_KEY, price_paise, ttl_seconds).await?;
        info!("Gold price cached: {} paise/g", price_paise);
        Ok(())
    }

    pub async fn get_gold_price(&self) -> RedisResult<Option<i64>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.get(GOLD_PRICE_KEY).await
    }

    // FX rate cache

    pub async fn set_fx_rate(&self, inr_per_usd: f64, ttl_seconds: u64) -> RedisResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.set_ex::<_, _, ()>(FX_RATE_KEY, inr_per_usd, ttl_seconds).await?;
        Ok(())
    }

    pub async fn get_fx_rate(&self) -> RedisResult<Option<f64>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.get(FX_RATE_KEY).await
    }

    /// Drop both cached rates; the next quote refetches from the feeds.
    pub async fn invalidate_rates(&self) -> RedisResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.del::<_, ()>(&[GOLD_PRICE_KEY, FX_RATE_KEY]).await?;
        Ok(())
    }

    /// Fixed-window rate limiting via INCR + EXPIRE.
    pub async fn check_rate_limit(&self, key: &str, limit: i64, window_seconds: i64) -> RedisResult<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let (count,): (i64,) = redis::pipe()
            .atomic()
            .incr(key, 1)
            .expire(key, window_seconds)
            .ignore()
            .query_async(&mut conn)
            .await?;

        Ok(count <= limit)
    }
}
