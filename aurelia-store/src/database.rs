use aurelia_catalog::pricing::PricingRules;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres, Row};
use std::time::Duration;
use tracing::info;

#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    pub async fn new(connection_string: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(connection_string)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations").run(&self.pool).await?;
        info!("Migrations completed successfully.");
        Ok(())
    }

    /// Overlay per-row overrides from the `pricing_rules` table onto config
    /// defaults. Rows hold `{"value": <number>}` payloads keyed by rule name.
    pub async fn fetch_pricing_rules(&self, defaults: PricingRules) -> Result<PricingRules, sqlx::Error> {
        let rows = sqlx::query("SELECT rule_key, rule_value FROM pricing_rules")
            .fetch_all(&self.pool)
            .await?;

        let mut rules = defaults;

        for row in rows {
            let key: String = row.get("rule_key");
            let val: Value = row.get("rule_value");

            if let Some(v) = val.get("value").and_then(Value::as_f64) {
                match key.as_str() {
                    "overhead_rate" => rules.overhead_rate = v,
                    "advance_rate" => rules.advance_rate = v,
                    "drift_tolerance" => rules.drift_tolerance = v,
                    other => {
                        info!("Ignoring unknown pricing rule {}", other);
                    }
                }
            }
        }

        Ok(rules)
    }
}
