pub mod designs;
pub mod materials;
pub mod pricing;
pub mod product;
pub mod rates;
pub mod repository;

pub use materials::{MetalType, StoneType};
pub use pricing::{PriceBreakdown, QuoteEngine, QuoteRequest};
pub use product::{Product, ProductCategory};
