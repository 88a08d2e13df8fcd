use aurelia_catalog::materials::{MetalType, StoneType};
use aurelia_catalog::product::Product;

use crate::openai::{ContentError, OpenAiClient};

const SYSTEM_PROMPT: &str = "You are a copywriter for a fine-jewelry atelier. Write \
warm, specific product descriptions of 60-90 words. Mention the metal, purity and \
stones. Never invent certifications, prices or delivery promises.";

/// Build the user prompt from the catalog record and its resolved materials.
pub fn build_prompt(product: &Product, metal: &MetalType, stones: &[StoneType]) -> String {
    let mut prompt = format!(
        "Piece: {} ({:?})\nMetal: {} {} ({:.2} g)\n",
        product.name, product.category, metal.purity_label, metal.name, product.metal_weight_grams
    );

    if product.stones.is_empty() {
        prompt.push_str("Stones: none\n");
    } else {
        prompt.push_str("Stones:\n");
        for setting in &product.stones {
            let name = stones
                .iter()
                .find(|s| s.code == setting.stone_type_code)
                .map(|s| s.name.as_str())
                .unwrap_or(setting.stone_type_code.as_str());
            prompt.push_str(&format!("- {} ({:.2} ct)\n", name, setting.carat));
        }
    }

    if let Some(existing) = &product.description {
        prompt.push_str(&format!("Current description to improve on: {}\n", existing));
    }

    prompt.push_str("Write the description.");
    prompt
}

/// Generate a fresh description for a product.
pub async fn generate_description(
    client: &OpenAiClient,
    product: &Product,
    metal: &MetalType,
    stones: &[StoneType],
) -> Result<String, ContentError> {
    let prompt = build_prompt(product, metal, stones);
    let text = client.chat(SYSTEM_PROMPT, &prompt).await?;
    tracing::info!("Generated description for product {}", product.id);
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aurelia_catalog::materials::{default_metal_types, default_stone_types};
    use aurelia_catalog::product::{ProductCategory, StoneSetting};
    use uuid::Uuid;

    fn product() -> Product {
        Product {
            id: Uuid::new_v4(),
            sku: "NCK-014".to_string(),
            category: ProductCategory::Necklace,
            name: "Meenakari Choker".to_string(),
            description: Some("A short old blurb.".to_string()),
            image_urls: vec![],
            metal_type_code: "GOLD_22K".to_string(),
            metal_weight_grams: 18.25,
            stones: vec![StoneSetting { stone_type_code: "EMERALD".to_string(), carat: 1.2 }],
            price_override_paise: None,
            is_active: true,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn prompt_names_materials_and_weights() {
        let metals = default_metal_types();
        let metal = metals.iter().find(|m| m.code == "GOLD_22K").unwrap();
        let prompt = build_prompt(&product(), metal, &default_stone_types());

        assert!(prompt.contains("Meenakari Choker"));
        assert!(prompt.contains("22kt Gold"));
        assert!(prompt.contains("18.25 g"));
        assert!(prompt.contains("Emerald (1.20 ct)"));
        assert!(prompt.contains("A short old blurb."));
    }

    #[test]
    fn prompt_handles_unknown_stone_codes() {
        let metals = default_metal_types();
        let metal = metals.iter().find(|m| m.code == "GOLD_22K").unwrap();
        let mut p = product();
        p.stones = vec![StoneSetting { stone_type_code: "MOONSTONE".to_string(), carat: 0.8 }];

        // Falls back to the raw code rather than dropping the line.
        let prompt = build_prompt(&p, metal, &default_stone_types());
        assert!(prompt.contains("MOONSTONE (0.80 ct)"));
    }
}
