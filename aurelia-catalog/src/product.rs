use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Jewelry categories carried in the catalog
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductCategory {
    Ring,
    Necklace,
    Earrings,
    Bracelet,
    Pendant,
    Bangle,
}

/// A stone set into a piece, referenced by stone type code
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoneSetting {
    pub stone_type_code: String,
    pub carat: f64,
}

/// Core catalog record. Prices are derived from materials at quote time unless
/// `price_override_paise` pins a fixed price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub sku: String,
    pub category: ProductCategory,
    pub name: String,
    pub description: Option<String>,
    pub image_urls: Vec<String>,
    pub metal_type_code: String,
    pub metal_weight_grams: f64,
    pub stones: Vec<StoneSetting>,
    pub price_override_paise: Option<i64>,
    pub is_active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Shown when a product has no uploaded photography yet.
pub const DEFAULT_IMAGE_URL: &str = "/static/images/placeholder-jewelry.jpg";

impl Product {
    /// Primary display image, falling back to the placeholder.
    pub fn primary_image(&self) -> &str {
        self.image_urls
            .first()
            .map(|s| s.as_str())
            .unwrap_or(DEFAULT_IMAGE_URL)
    }

    /// Total stone weight across all settings, in carats.
    pub fn total_stone_carats(&self) -> f64 {
        self.stones.iter().map(|s| s.carat).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring() -> Product {
        Product {
            id: Uuid::new_v4(),
            sku: "RNG-001".to_string(),
            category: ProductCategory::Ring,
            name: "Solitaire Ring".to_string(),
            description: None,
            image_urls: vec![],
            metal_type_code: "GOLD_18K".to_string(),
            metal_weight_grams: 4.5,
            stones: vec![
                StoneSetting { stone_type_code: "DIAMOND".to_string(), carat: 0.5 },
                StoneSetting { stone_type_code: "RUBY".to_string(), carat: 0.25 },
            ],
            price_override_paise: None,
            is_active: true,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn falls_back_to_placeholder_image() {
        let product = ring();
        assert_eq!(product.primary_image(), DEFAULT_IMAGE_URL);
    }

    #[test]
    fn sums_stone_carats() {
        let product = ring();
        assert!((product.total_stone_carats() - 0.75).abs() < 1e-9);
    }
}
