pub mod app_config;
pub mod catalog_repo;
pub mod database;
pub mod design_repo;
pub mod events;
pub mod order_repo;
pub mod rates;
pub mod redis_repo;
pub mod testimonial_repo;
pub mod user_repo;

pub use database::DbClient;
pub use events::Telemetry;
pub use rates::CachedRateProvider;
pub use redis_repo::RedisClient;
