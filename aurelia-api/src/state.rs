use std::sync::Arc;

use aurelia_catalog::pricing::QuoteEngine;
use aurelia_catalog::rates::RateProvider;
use aurelia_catalog::repository::{MaterialRepository, ProductRepository};
use aurelia_content::{ChatBot, OpenAiClient};
use aurelia_order::payment::PaymentAdapter;
use aurelia_order::repository::OrderRepository;
use aurelia_order::CheckoutManager;
use aurelia_store::design_repo::DesignRepository;
use aurelia_store::testimonial_repo::TestimonialRepository;
use aurelia_store::user_repo::UserRepository;
use aurelia_store::{RedisClient, Telemetry};

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub redis: Arc<RedisClient>,
    pub product_repo: Arc<dyn ProductRepository>,
    pub material_repo: Arc<dyn MaterialRepository>,
    pub order_repo: Arc<dyn OrderRepository>,
    pub design_repo: Arc<DesignRepository>,
    pub testimonial_repo: Arc<TestimonialRepository>,
    pub user_repo: Arc<UserRepository>,
    pub rates: Arc<dyn RateProvider>,
    pub engine: Arc<QuoteEngine>,
    pub checkout: Arc<CheckoutManager>,
    pub payments: Arc<dyn PaymentAdapter>,
    pub openai: Arc<OpenAiClient>,
    pub chatbot: Arc<ChatBot>,
    pub telemetry: Arc<Telemetry>,
    pub auth: AuthConfig,
    pub payment_currency: String,
    pub whatsapp_number: String,
}
