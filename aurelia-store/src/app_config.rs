use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub auth: AuthConfig,
    pub pricing: PricingConfig,
    pub rates: RatesConfig,
    pub paypal: PayPalConfig,
    pub openai: OpenAiConfig,
    pub whatsapp: WhatsAppConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PricingConfig {
    #[serde(default = "default_overhead_rate")]
    pub overhead_rate: f64,
    #[serde(default = "default_advance_rate")]
    pub advance_rate: f64,
    #[serde(default = "default_drift_tolerance")]
    pub drift_tolerance: f64,
    /// Seconds a PENDING order's quoted price is honored before expiry.
    pub quote_ttl_seconds: i64,
    /// Gold price / FX cache TTL in Redis.
    pub rate_cache_ttl_seconds: u64,
}

fn default_overhead_rate() -> f64 { 0.25 }
fn default_advance_rate() -> f64 { 0.5 }
fn default_drift_tolerance() -> f64 { 0.01 }

#[derive(Debug, Deserialize, Clone)]
pub struct RatesConfig {
    pub gold_feed_url: String,
    pub fx_feed_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PayPalConfig {
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
    /// Currency installments are charged in ("INR" or "USD").
    pub currency: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WhatsAppConfig {
    pub business_number: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Environment-specific file, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Eg. `AURELIA__SERVER__PORT=8080`
            .add_source(config::Environment::with_prefix("AURELIA").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
