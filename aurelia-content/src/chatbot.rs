use aurelia_catalog::product::Product;

use crate::openai::{ContentError, OpenAiClient};

/// Served when OpenAI is unreachable or unconfigured; the storefront shows it with a
/// retry affordance.
pub const FALLBACK_REPLY: &str = "I'm having trouble reaching our assistant right now. \
Please try again in a moment, or message us on WhatsApp and we'll get right back to you.";

const SYSTEM_PREAMBLE: &str = "You are the shopping assistant for a fine-jewelry \
storefront. Answer questions about the catalog, custom design requests, the 50% \
advance / 50% on-completion payment plan, and care instructions. Keep answers under \
120 words. If asked for a firm price, explain that quotes follow the live gold rate \
and point to the price calculator. Never invent items that are not in the catalog \
summary below.";

/// Catalog-aware chatbot.
pub struct ChatBot {
    client: OpenAiClient,
}

impl ChatBot {
    pub fn new(client: OpenAiClient) -> Self {
        Self { client }
    }

    /// System prompt grounding the model in what is actually for sale.
    pub fn build_system_prompt(products: &[Product]) -> String {
        let mut prompt = String::from(SYSTEM_PREAMBLE);
        prompt.push_str("\n\nCatalog summary:\n");

        if products.is_empty() {
            prompt.push_str("(catalog is currently empty)\n");
        }
        for product in products.iter().filter(|p| p.is_active).take(40) {
            prompt.push_str(&format!(
                "- {} [{:?}] {} {:.1}g, {} stone(s)\n",
                product.name,
                product.category,
                product.metal_type_code,
                product.metal_weight_grams,
                product.stones.len()
            ));
        }
        prompt
    }

    /// Answer a customer message. Failures degrade to the canned reply instead of
    /// surfacing an error to the storefront.
    pub async fn reply(&self, products: &[Product], message: &str) -> String {
        let system = Self::build_system_prompt(products);
        match self.client.chat(&system, message).await {
            Ok(text) => text,
            Err(ContentError::MissingApiKey) => {
                tracing::warn!("Chatbot invoked without an OpenAI API key");
                FALLBACK_REPLY.to_string()
            }
            Err(e) => {
                tracing::error!("Chatbot completion failed: {}", e);
                FALLBACK_REPLY.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aurelia_catalog::product::ProductCategory;
    use uuid::Uuid;

    fn product(name: &str, active: bool) -> Product {
        Product {
            id: Uuid::new_v4(),
            sku: format!("SKU-{}", name),
            category: ProductCategory::Ring,
            name: name.to_string(),
            description: None,
            image_urls: vec![],
            metal_type_code: "GOLD_18K".to_string(),
            metal_weight_grams: 3.5,
            stones: vec![],
            price_override_paise: None,
            is_active: active,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn system_prompt_lists_only_active_products() {
        let products = vec![product("Aster Ring", true), product("Retired Ring", false)];
        let prompt = ChatBot::build_system_prompt(&products);
        assert!(prompt.contains("Aster Ring"));
        assert!(!prompt.contains("Retired Ring"));
    }

    #[tokio::test]
    async fn unconfigured_client_degrades_to_fallback() {
        let bot = ChatBot::new(OpenAiClient::new("", "gpt-4o-mini"));
        let reply = bot.reply(&[], "Do you ship to Mumbai?").await;
        assert_eq!(reply, FALLBACK_REPLY);
    }
}
