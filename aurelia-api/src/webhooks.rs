use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use chrono::Utc;
use serde::Deserialize;

use aurelia_order::payment::{PaymentAdapter, PaymentStatus};
use aurelia_order::repository::OrderRepository;
use aurelia_shared::models::events::InstallmentPaidEvent;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PayPalWebhook {
    pub id: String,
    pub event_type: String,
    pub resource: PayPalResource,
}

#[derive(Debug, Deserialize)]
pub struct PayPalResource {
    pub id: String,
    pub supplementary_data: Option<SupplementaryData>,
}

#[derive(Debug, Deserialize)]
pub struct SupplementaryData {
    pub related_ids: Option<RelatedIds>,
}

#[derive(Debug, Deserialize)]
pub struct RelatedIds {
    pub order_id: Option<String>,
}

impl PayPalWebhook {
    /// Approval events carry the checkout order id in `resource.id`; capture events
    /// carry the capture id there, with the order id under
    /// `supplementary_data.related_ids.order_id`.
    fn provider_order_id(&self) -> &str {
        self.resource
            .supplementary_data
            .as_ref()
            .and_then(|s| s.related_ids.as_ref())
            .and_then(|r| r.order_id.as_deref())
            .unwrap_or(&self.resource.id)
    }
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/webhooks/paypal", post(handle_paypal_webhook))
}

/// POST /api/webhooks/paypal
/// Reconciliation path: if the buyer approved or the capture completed but the
/// storefront's own capture call never landed (tab closed, network drop), the
/// webhook records the installment. Already-recorded installments are a no-op.
async fn handle_paypal_webhook(
    State(state): State<AppState>,
    Json(payload): Json<PayPalWebhook>,
) -> Result<StatusCode, StatusCode> {
    tracing::info!(
        "Received PayPal webhook {} ({}) for resource {}",
        payload.id,
        payload.event_type,
        payload.resource.id
    );

    match payload.event_type.as_str() {
        "CHECKOUT.ORDER.APPROVED" | "PAYMENT.CAPTURE.COMPLETED" => {}
        "PAYMENT.CAPTURE.DENIED" => {
            // Nothing was recorded for this capture, so there is nothing to unwind;
            // the buyer retries from the order page.
            tracing::warn!(
                "PayPal capture denied for resource {} (webhook {})",
                payload.resource.id,
                payload.id
            );
            return Ok(StatusCode::OK);
        }
        _ => return Ok(StatusCode::OK),
    }

    // 1. Resolve the provider order; the installment and our order id ride in it.
    let provider_order_id = payload.provider_order_id().to_string();
    let mut intent = state
        .payments
        .get_intent(&provider_order_id)
        .await
        .map_err(|e| {
            tracing::error!("Webhook intent lookup failed for {}: {}", provider_order_id, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    // 2. Approved but uncaptured funds are captured here.
    if intent.status == PaymentStatus::Approved {
        intent = state.payments.capture(&intent.id).await.map_err(|e| {
            tracing::error!("Webhook capture failed for {}: {}", payload.resource.id, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    }
    if intent.status != PaymentStatus::Captured {
        tracing::info!(
            "Webhook for {} left intent in status {:?}, nothing to record",
            payload.resource.id,
            intent.status
        );
        return Ok(StatusCode::OK);
    }

    // 3. Record the installment against the order, tolerating replays.
    let mut order = match state.order_repo.get_order(intent.order_id).await {
        Ok(Some(order)) => order,
        Ok(None) => {
            tracing::error!("Webhook references unknown order {}", intent.order_id);
            return Ok(StatusCode::OK);
        }
        Err(e) => {
            tracing::error!("Webhook order lookup failed: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    if order.plan.is_paid(intent.installment) {
        // Replay or the storefront capture already landed.
        return Ok(StatusCode::OK);
    }

    let reference = intent.reference.as_deref().or(Some(intent.id.as_str()));
    let entry = match state
        .checkout
        .record_installment(&mut order, intent.installment, reference, Utc::now())
    {
        Ok(entry) => entry,
        Err(e) => {
            tracing::error!("Webhook installment rejected for order {}: {}", order.id, e);
            return Ok(StatusCode::OK);
        }
    };

    state.order_repo.save_order(&order).await.map_err(|e| {
        tracing::error!("Webhook order save failed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    if let Err(e) = state.order_repo.add_ledger_entry(&entry).await {
        tracing::error!("Webhook ledger write failed: {}", e);
    }

    state.telemetry.log_installment_paid(InstallmentPaidEvent {
        order_id: order.id,
        installment: intent.installment.as_str().to_string(),
        amount_paise: entry.amount_paise,
        provider_reference: reference.map(str::to_string),
        timestamp: Utc::now().timestamp(),
    });

    tracing::info!(
        "Order {} {} installment recorded via webhook",
        order.id,
        intent.installment.as_str()
    );
    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use aurelia_order::models::{Installment, Order, OrderStatus};

    use crate::quotes::{resolve_and_quote, CalculatePriceRequest};
    use crate::testutil::{app_state, InMemoryMaterials, InMemoryOrders, InMemoryProducts};

    fn capture_event(event_type: &str, capture_id: &str, order_id: &str) -> PayPalWebhook {
        PayPalWebhook {
            id: "WH-1".to_string(),
            event_type: event_type.to_string(),
            resource: PayPalResource {
                id: capture_id.to_string(),
                supplementary_data: Some(SupplementaryData {
                    related_ids: Some(RelatedIds {
                        order_id: Some(order_id.to_string()),
                    }),
                }),
            },
        }
    }

    async fn state_over(orders: Arc<InMemoryOrders>) -> AppState {
        app_state(
            Arc::new(InMemoryProducts::default()),
            Arc::new(InMemoryMaterials::seeded()),
            orders,
        )
        .await
    }

    async fn placed_order(state: &AppState) -> Order {
        let request = CalculatePriceRequest {
            product_id: None,
            metal_type_code: Some("GOLD_18K".to_string()),
            metal_weight_grams: Some(4.0),
            stones: vec![],
            client_total_paise: None,
            force_refresh: false,
        };
        let (breakdown, name) = resolve_and_quote(state, &request).await.unwrap();
        let order = state.checkout.build_order("customer-1", None, &name, breakdown);
        state.order_repo.create_order(&order).await.unwrap();
        order
    }

    #[test]
    fn capture_events_resolve_the_order_id_from_supplementary_data() {
        let payload: PayPalWebhook = serde_json::from_value(serde_json::json!({
            "id": "WH-58D329510W468432D-8HN650336L201105X",
            "event_type": "PAYMENT.CAPTURE.COMPLETED",
            "resource": {
                "id": "42311647XV020574X",
                "supplementary_data": {
                    "related_ids": { "order_id": "5O190127TN364715T" }
                }
            }
        }))
        .unwrap();
        assert_eq!(payload.provider_order_id(), "5O190127TN364715T");
    }

    #[test]
    fn approval_events_resolve_the_order_id_from_the_resource() {
        let payload: PayPalWebhook = serde_json::from_value(serde_json::json!({
            "id": "WH-2WR32451HC0233532-67976317FL4543714",
            "event_type": "CHECKOUT.ORDER.APPROVED",
            "resource": { "id": "5O190127TN364715T" }
        }))
        .unwrap();
        assert_eq!(payload.provider_order_id(), "5O190127TN364715T");
    }

    #[tokio::test]
    async fn completed_capture_event_records_the_installment() {
        let orders = Arc::new(InMemoryOrders::default());
        let state = state_over(orders.clone()).await;
        let order = placed_order(&state).await;

        let intent = state
            .payments
            .create_intent(order.id, Installment::Advance, order.plan.advance_due_paise, "INR")
            .await
            .unwrap();

        let payload = capture_event("PAYMENT.CAPTURE.COMPLETED", "42311647XV020574X", &intent.id);
        let status = handle_paypal_webhook(State(state), Json(payload)).await.unwrap();
        assert_eq!(status, StatusCode::OK);

        let stored = orders.orders.lock().unwrap().get(&order.id).cloned().unwrap();
        assert_eq!(stored.status, OrderStatus::AdvancePaid);
    }

    #[tokio::test]
    async fn denied_capture_acks_without_touching_the_order() {
        let orders = Arc::new(InMemoryOrders::default());
        let state = state_over(orders.clone()).await;
        let order = placed_order(&state).await;

        let intent = state
            .payments
            .create_intent(order.id, Installment::Advance, order.plan.advance_due_paise, "INR")
            .await
            .unwrap();

        let payload = capture_event("PAYMENT.CAPTURE.DENIED", "42311647XV020574X", &intent.id);
        let status = handle_paypal_webhook(State(state), Json(payload)).await.unwrap();
        assert_eq!(status, StatusCode::OK);

        let stored = orders.orders.lock().unwrap().get(&order.id).cloned().unwrap();
        assert_eq!(stored.status, OrderStatus::Pending);
        assert!(stored.plan.advance_paid_at.is_none());
        assert!(orders.ledger.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unrelated_events_are_acknowledged() {
        let orders = Arc::new(InMemoryOrders::default());
        let state = state_over(orders).await;

        let payload: PayPalWebhook = serde_json::from_value(serde_json::json!({
            "id": "WH-3",
            "event_type": "BILLING.SUBSCRIPTION.CREATED",
            "resource": { "id": "I-BW452GLLEP1G" }
        }))
        .unwrap();
        let status = handle_paypal_webhook(State(state), Json(payload)).await.unwrap();
        assert_eq!(status, StatusCode::OK);
    }
}
