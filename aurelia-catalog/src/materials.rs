use serde::{Deserialize, Serialize};

/// A metal the workshop fabricates in. The modifier scales the live gold price per
/// gram: 24kt gold is 1.0, lower purities and other metals deviate from it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetalType {
    pub code: String,
    pub name: String,
    pub purity_label: String,
    pub price_modifier: f64,
    pub is_active: bool,
}

/// A stone priced per carat, in paise.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoneType {
    pub code: String,
    pub name: String,
    pub price_per_carat_paise: i64,
    pub is_active: bool,
}

/// Seed table used by migrations and tests. Admin CRUD owns the live rows.
pub fn default_metal_types() -> Vec<MetalType> {
    vec![
        MetalType {
            code: "GOLD_24K".to_string(),
            name: "Gold".to_string(),
            purity_label: "24kt".to_string(),
            price_modifier: 1.0,
            is_active: true,
        },
        MetalType {
            code: "GOLD_22K".to_string(),
            name: "Gold".to_string(),
            purity_label: "22kt".to_string(),
            price_modifier: 0.92,
            is_active: true,
        },
        MetalType {
            code: "GOLD_18K".to_string(),
            name: "Gold".to_string(),
            purity_label: "18kt".to_string(),
            price_modifier: 0.75,
            is_active: true,
        },
        MetalType {
            code: "PLATINUM".to_string(),
            name: "Platinum".to_string(),
            purity_label: "950".to_string(),
            price_modifier: 0.55,
            is_active: true,
        },
        MetalType {
            code: "SILVER".to_string(),
            name: "Silver".to_string(),
            purity_label: "925".to_string(),
            price_modifier: 0.015,
            is_active: true,
        },
    ]
}

pub fn default_stone_types() -> Vec<StoneType> {
    vec![
        StoneType {
            code: "DIAMOND".to_string(),
            name: "Diamond".to_string(),
            price_per_carat_paise: 5_000_000,
            is_active: true,
        },
        StoneType {
            code: "RUBY".to_string(),
            name: "Ruby".to_string(),
            price_per_carat_paise: 1_500_000,
            is_active: true,
        },
        StoneType {
            code: "EMERALD".to_string(),
            name: "Emerald".to_string(),
            price_per_carat_paise: 1_200_000,
            is_active: true,
        },
        StoneType {
            code: "SAPPHIRE".to_string(),
            name: "Sapphire".to_string(),
            price_per_carat_paise: 900_000,
            is_active: true,
        },
        StoneType {
            code: "PEARL".to_string(),
            name: "Pearl".to_string(),
            price_per_carat_paise: 200_000,
            is_active: true,
        },
    ]
}
