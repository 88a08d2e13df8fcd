use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Installment;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Created,
    ApprovalPending,
    Approved,
    Captured,
    Denied,
    Failed,
}

/// A provider-side payment for one installment of an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    /// Provider's ID (e.g. a PayPal order id)
    pub id: String,
    pub order_id: Uuid,
    pub installment: Installment,
    pub amount_minor: i64,
    pub currency: String,
    pub status: PaymentStatus,
    /// Redirect URL the buyer approves the payment at.
    pub approve_url: Option<String>,
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

type AdapterError = Box<dyn std::error::Error + Send + Sync>;

/// Provider seam. The live implementation is [`crate::paypal::PayPalAdapter`];
/// tests and local runs use [`MockPaymentAdapter`].
#[async_trait]
pub trait PaymentAdapter: Send + Sync {
    /// Create a provider-side payment for one installment.
    async fn create_intent(
        &self,
        order_id: Uuid,
        installment: Installment,
        amount_minor: i64,
        currency: &str,
    ) -> Result<PaymentIntent, AdapterError>;

    /// Retrieve intent status.
    async fn get_intent(&self, intent_id: &str) -> Result<PaymentIntent, AdapterError>;

    /// Capture a previously approved payment.
    async fn capture(&self, intent_id: &str) -> Result<PaymentIntent, AdapterError>;
}

pub struct MockPaymentAdapter;

#[async_trait]
impl PaymentAdapter for MockPaymentAdapter {
    async fn create_intent(
        &self,
        order_id: Uuid,
        installment: Installment,
        amount_minor: i64,
        currency: &str,
    ) -> Result<PaymentIntent, AdapterError> {
        Ok(PaymentIntent {
            // Encode order_id in the intent id so the mock can "remember" it
            id: format!("mock_{}_{}", installment.as_str(), order_id.simple()),
            order_id,
            installment,
            amount_minor,
            currency: currency.to_string(),
            status: PaymentStatus::ApprovalPending,
            approve_url: Some("https://example.test/approve".to_string()),
            reference: None,
            created_at: Utc::now(),
        })
    }

    async fn get_intent(&self, intent_id: &str) -> Result<PaymentIntent, AdapterError> {
        self.decode(intent_id, PaymentStatus::Approved)
    }

    async fn capture(&self, intent_id: &str) -> Result<PaymentIntent, AdapterError> {
        if intent_id.ends_with("fail-capture") {
            return Err("Simulated gateway capture failure".into());
        }
        self.decode(intent_id, PaymentStatus::Captured)
    }
}

impl MockPaymentAdapter {
    fn decode(&self, intent_id: &str, status: PaymentStatus) -> Result<PaymentIntent, AdapterError> {
        let rest = intent_id.strip_prefix("mock_").unwrap_or_default();
        let (installment, order_id) = match rest.split_once('_') {
            Some((inst, id)) => (
                Installment::parse(inst).unwrap_or(Installment::Advance),
                Uuid::parse_str(id).unwrap_or_else(|_| Uuid::new_v4()),
            ),
            None => (Installment::Advance, Uuid::new_v4()),
        };

        Ok(PaymentIntent {
            id: intent_id.to_string(),
            order_id,
            installment,
            amount_minor: 0,
            currency: "INR".to_string(),
            status,
            approve_url: None,
            reference: Some(format!("mock-capture-{}", order_id.simple())),
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkout::CheckoutManager;
    use crate::models::OrderStatus;
    use aurelia_catalog::materials::MetalType;
    use aurelia_catalog::pricing::{PricingRules, QuoteEngine, QuoteRequest};
    use aurelia_catalog::rates::RateSnapshot;

    fn order(manager: &CheckoutManager) -> crate::models::Order {
        let engine = QuoteEngine::new(PricingRules::default());
        let metal = MetalType {
            code: "GOLD_18K".to_string(),
            name: "Gold".to_string(),
            purity_label: "18kt".to_string(),
            price_modifier: 0.75,
            is_active: true,
        };
        let rates = RateSnapshot {
            gold_price_per_gram_paise: 600_000,
            inr_per_usd: 83.0,
            fx_fallback: false,
            fetched_at: Utc::now(),
        };
        let request = QuoteRequest {
            product_id: None,
            metal_weight_grams: 3.0,
            stones: vec![],
            price_override_paise: None,
        };
        let breakdown = engine.quote(&request, &metal, &rates).unwrap();
        manager.build_order("customer-1", None, "Pendant", breakdown)
    }

    #[tokio::test]
    async fn intent_capture_and_record_round_trip() {
        let adapter = MockPaymentAdapter;
        let manager = CheckoutManager::new(3600);
        let mut order = order(&manager);

        let intent = adapter
            .create_intent(
                order.id,
                Installment::Advance,
                order.plan.advance_due_paise,
                "INR",
            )
            .await
            .unwrap();
        assert_eq!(intent.status, PaymentStatus::ApprovalPending);
        assert!(intent.approve_url.is_some());

        let captured = adapter.capture(&intent.id).await.unwrap();
        assert_eq!(captured.status, PaymentStatus::Captured);
        // The adapter round-trips which order and installment the payment was for.
        assert_eq!(captured.order_id, order.id);
        assert_eq!(captured.installment, Installment::Advance);

        let entry = manager
            .record_installment(
                &mut order,
                captured.installment,
                captured.reference.as_deref(),
                Utc::now(),
            )
            .unwrap();
        assert_eq!(entry.transaction_type, "ADVANCE_RECEIVED");
        assert_eq!(order.status, OrderStatus::AdvancePaid);
    }

    #[tokio::test]
    async fn gateway_capture_failure_leaves_order_untouched() {
        let adapter = MockPaymentAdapter;
        let manager = CheckoutManager::new(3600);
        let order = order(&manager);

        let result = adapter.capture("mock_ADVANCE_fail-capture").await;
        assert!(result.is_err());
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.plan.advance_paid_at.is_none());
    }
}
