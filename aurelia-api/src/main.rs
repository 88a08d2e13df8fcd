use std::net::SocketAddr;
use std::sync::Arc;

use aurelia_api::{
    app,
    state::{AppState, AuthConfig},
    worker,
};
use aurelia_catalog::pricing::QuoteEngine;
use aurelia_content::{ChatBot, OpenAiClient};
use aurelia_order::paypal::PayPalAdapter;
use aurelia_order::CheckoutManager;
use aurelia_store::catalog_repo::{StoreMaterialRepository, StoreProductRepository};
use aurelia_store::design_repo::DesignRepository;
use aurelia_store::order_repo::StoreOrderRepository;
use aurelia_store::testimonial_repo::TestimonialRepository;
use aurelia_store::user_repo::UserRepository;
use aurelia_store::{CachedRateProvider, DbClient, RedisClient, Telemetry};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aurelia_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = aurelia_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Aurelia API on port {}", config.server.port);

    // Database Connection
    let db = DbClient::new(&config.database.url)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");

    // Redis Connection
    let redis = RedisClient::new(&config.redis.url)
        .await
        .expect("Failed to connect to Redis");
    let redis_arc = Arc::new(redis.clone());

    // Pricing rules: config defaults overlaid with pricing_rules table rows
    let defaults = aurelia_catalog::pricing::PricingRules {
        overhead_rate: config.pricing.overhead_rate,
        advance_rate: config.pricing.advance_rate,
        drift_tolerance: config.pricing.drift_tolerance,
    };
    let rules = db
        .fetch_pricing_rules(defaults)
        .await
        .expect("Failed to load pricing rules");

    let rates = Arc::new(CachedRateProvider::new(
        redis.clone(),
        &config.rates.gold_feed_url,
        &config.rates.fx_feed_url,
        config.pricing.rate_cache_ttl_seconds,
    ));

    let chat_client = OpenAiClient::new(&config.openai.api_key, &config.openai.model);

    let app_state = AppState {
        redis: redis_arc,
        product_repo: Arc::new(StoreProductRepository::new(db.pool.clone())),
        material_repo: Arc::new(StoreMaterialRepository::new(db.pool.clone())),
        order_repo: Arc::new(StoreOrderRepository::new(db.pool.clone())),
        design_repo: Arc::new(DesignRepository::new(db.pool.clone())),
        testimonial_repo: Arc::new(TestimonialRepository::new(db.pool.clone())),
        user_repo: Arc::new(UserRepository::new(db.pool.clone())),
        rates,
        engine: Arc::new(QuoteEngine::new(rules)),
        checkout: Arc::new(CheckoutManager::new(config.pricing.quote_ttl_seconds)),
        payments: Arc::new(PayPalAdapter::new(
            &config.paypal.base_url,
            &config.paypal.client_id,
            &config.paypal.client_secret,
        )),
        openai: Arc::new(OpenAiClient::new(&config.openai.api_key, &config.openai.model)),
        chatbot: Arc::new(ChatBot::new(chat_client)),
        telemetry: Arc::new(Telemetry::new()),
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
        payment_currency: config.paypal.currency.clone(),
        whatsapp_number: config.whatsapp.business_number.clone(),
    };

    // Rate refresh + order expiry sweep
    tokio::spawn(worker::start_background_worker(app_state.clone(), 300));

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .unwrap();
}
