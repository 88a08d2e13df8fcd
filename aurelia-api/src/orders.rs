use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use aurelia_order::models::{Installment, Order, PaymentPlan};
use aurelia_order::payment::{PaymentAdapter, PaymentStatus};
use aurelia_order::repository::OrderRepository;
use aurelia_shared::models::events::{InstallmentPaidEvent, OrderPlacedEvent};

use crate::middleware::auth::CustomerClaims;
use crate::quotes::{resolve_and_quote, CalculatePriceRequest};
use crate::{error::AppError, state::AppState};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    #[serde(flatten)]
    pub quote: CalculatePriceRequest,
}

#[derive(Debug, Serialize)]
pub struct PaymentIntentResponse {
    pub intent_id: String,
    pub installment: String,
    pub amount_minor: i64,
    pub currency: String,
    pub approve_url: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/orders", get(list_orders).post(checkout))
        .route("/api/orders/{id}", get(get_order))
        .route("/api/orders/{id}/payments/{installment}/intent", post(create_installment_intent))
        .route("/api/orders/{id}/payments/{installment}/capture", post(capture_installment))
        .route("/api/orders/{id}/cancel", post(cancel_order))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/orders
/// Re-quote server-side, reconcile the client's total, snapshot the breakdown into
/// a PENDING order with the quote TTL running.
async fn checkout(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Json(req): Json<CheckoutRequest>,
) -> Result<Json<Order>, AppError> {
    let (breakdown, item_name) = resolve_and_quote(&state, &req.quote).await?;

    // The storefront always sends the total it displayed; drift past the tolerance
    // means the gold rate moved under the customer and they must re-quote.
    if let Some(client_total) = req.quote.client_total_paise {
        state.engine.reconcile(breakdown.grand_total_paise, client_total)?;
    }

    let order = state
        .checkout
        .build_order(&claims.sub, req.quote.product_id, &item_name, breakdown);
    state.order_repo.create_order(&order).await?;

    state.telemetry.log_order_placed(OrderPlacedEvent {
        order_id: order.id,
        customer_id: order.customer_id.clone(),
        grand_total_paise: order.plan.grand_total_paise,
        advance_due_paise: order.plan.advance_due_paise,
        timestamp: Utc::now().timestamp(),
    });

    Ok(Json(order))
}

/// GET /api/orders
async fn list_orders(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
) -> Result<Json<Vec<Order>>, AppError> {
    let orders = state.order_repo.list_orders(Some(&claims.sub)).await?;
    Ok(Json(orders))
}

/// GET /api/orders/:id
async fn get_order(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    let order = load_owned_order(&state, &claims, id).await?;
    Ok(Json(order))
}

/// POST /api/orders/:id/payments/:installment/intent
/// Create a provider-side payment for one installment; the storefront redirects
/// the buyer to `approve_url`.
async fn create_installment_intent(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Path((id, installment)): Path<(Uuid, String)>,
) -> Result<Json<PaymentIntentResponse>, AppError> {
    let installment = parse_installment(&installment)?;
    let order = load_owned_order(&state, &claims, id).await?;

    if order.plan.is_paid(installment) {
        return Err(AppError::ConflictError(format!(
            "Installment {} already paid",
            installment.as_str()
        )));
    }
    if installment == Installment::Balance && order.plan.advance_paid_at.is_none() {
        return Err(AppError::ConflictError(
            "Balance cannot be paid before the advance".to_string(),
        ));
    }
    if let Some(expires_at) = order.expires_at {
        if Utc::now() > expires_at {
            return Err(AppError::GoneError("Order quote has expired".to_string()));
        }
    }

    let (amount_minor, currency) =
        installment_amount(&order.plan, installment, &state.payment_currency);

    let intent = state
        .payments
        .create_intent(order.id, installment, amount_minor, &currency)
        .await
        .map_err(|e| AppError::InternalServerError(format!("Payment intent failed: {}", e)))?;

    Ok(Json(PaymentIntentResponse {
        intent_id: intent.id,
        installment: installment.as_str().to_string(),
        amount_minor: intent.amount_minor,
        currency: intent.currency,
        approve_url: intent.approve_url,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CaptureRequest {
    pub intent_id: String,
}

/// POST /api/orders/:id/payments/:installment/capture
/// Capture an approved payment and record the installment against the order.
async fn capture_installment(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Path((id, installment)): Path<(Uuid, String)>,
    Json(req): Json<CaptureRequest>,
) -> Result<Json<Order>, AppError> {
    let installment = parse_installment(&installment)?;
    let mut order = load_owned_order(&state, &claims, id).await?;

    let intent = state
        .payments
        .capture(&req.intent_id)
        .await
        .map_err(|e| AppError::InternalServerError(format!("Payment capture failed: {}", e)))?;

    if intent.order_id != order.id || intent.installment != installment {
        return Err(AppError::ValidationError(
            "Payment does not belong to this order installment".to_string(),
        ));
    }
    if intent.status != PaymentStatus::Captured {
        return Err(AppError::ConflictError(format!(
            "Payment not captured (provider status {:?})",
            intent.status
        )));
    }

    let reference = intent.reference.as_deref().or(Some(intent.id.as_str()));
    let entry = state
        .checkout
        .record_installment(&mut order, installment, reference, Utc::now())?;

    state.order_repo.save_order(&order).await?;
    // The provider has already settled the funds; a ledger outage must not turn a
    // recorded installment into a client-facing error.
    if let Err(e) = state.order_repo.add_ledger_entry(&entry).await {
        tracing::error!("Ledger write failed for order {}: {}", order.id, e);
    }

    state.telemetry.log_installment_paid(InstallmentPaidEvent {
        order_id: order.id,
        installment: installment.as_str().to_string(),
        amount_paise: entry.amount_paise,
        provider_reference: reference.map(str::to_string),
        timestamp: Utc::now().timestamp(),
    });

    Ok(Json(order))
}

/// POST /api/orders/:id/cancel
/// Free before the advance; afterwards a REFUND_DUE ledger entry is written for
/// manual settlement.
async fn cancel_order(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    let mut order = load_owned_order(&state, &claims, id).await?;

    let refund = state.checkout.cancel(&mut order)?;
    state.order_repo.save_order(&order).await?;
    if let Some(entry) = refund {
        if let Err(e) = state.order_repo.add_ledger_entry(&entry).await {
            tracing::error!("Refund ledger write failed for order {}: {}", order.id, e);
        }
    }

    Ok(Json(order))
}

// ============================================================================
// Helpers
// ============================================================================

async fn load_owned_order(
    state: &AppState,
    claims: &CustomerClaims,
    id: Uuid,
) -> Result<Order, AppError> {
    let order = state
        .order_repo
        .get_order(id)
        .await?
        // Other customers' orders look like they don't exist.
        .filter(|o| o.customer_id == claims.sub)
        .ok_or_else(|| AppError::NotFoundError(format!("Order {} not found", id)))?;
    Ok(order)
}

fn parse_installment(raw: &str) -> Result<Installment, AppError> {
    Installment::parse(raw)
        .ok_or_else(|| AppError::ValidationError(format!("Unknown installment {}", raw)))
}

/// Amount to charge for an installment in the configured provider currency. INR
/// charges the exact paise owed; USD converts at the rate frozen into the plan.
fn installment_amount(plan: &PaymentPlan, installment: Installment, currency: &str) -> (i64, String) {
    let paise = plan.installment_amount_paise(installment);
    if currency.eq_ignore_ascii_case("USD") {
        let cents = ((paise as f64 / plan.inr_per_usd) + 0.5).floor() as i64;
        (cents, "USD".to_string())
    } else {
        (paise, "INR".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use aurelia_order::models::OrderStatus;

    use crate::testutil::{app_state, InMemoryMaterials, InMemoryOrders, InMemoryProducts};

    fn claims(sub: &str) -> CustomerClaims {
        CustomerClaims {
            sub: sub.to_string(),
            email: None,
            role: "CUSTOMER".to_string(),
            exp: 0,
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

    async fn placed_order(state: &AppState, customer: &str) -> Order {
        let request = CalculatePriceRequest {
            product_id: None,
            metal_type_code: Some("GOLD_18K".to_string()),
            metal_weight_grams: Some(4.0),
            stones: vec![],
            client_total_paise: None,
            force_refresh: false,
        };
        let (breakdown, name) = resolve_and_quote(state, &request).await.unwrap();
        let order = state.checkout.build_order(customer, None, &name, breakdown);
        state.order_repo.create_order(&order).await.unwrap();
        order
    }

    #[tokio::test]
    async fn capture_records_installment_and_writes_ledger() {
        let orders = Arc::new(InMemoryOrders::default());
        let state = state_over(orders.clone()).await;
        let order = placed_order(&state, "customer-1").await;

        let intent = state
            .payments
            .create_intent(order.id, Installment::Advance, order.plan.advance_due_paise, "INR")
            .await
            .unwrap();

        let Json(updated) = capture_installment(
            State(state.clone()),
            Extension(claims("customer-1")),
            Path((order.id, "ADVANCE".to_string())),
            Json(CaptureRequest { intent_id: intent.id }),
        )
        .await
        .unwrap();

        assert_eq!(updated.status, OrderStatus::AdvancePaid);
        assert_eq!(orders.ledger.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn ledger_outage_does_not_fail_a_settled_capture() {
        let orders = Arc::new(InMemoryOrders::failing_ledger());
        let state = state_over(orders.clone()).await;
        let order = placed_order(&state, "customer-1").await;

        let intent = state
            .payments
            .create_intent(order.id, Installment::Advance, order.plan.advance_due_paise, "INR")
            .await
            .unwrap();

        let result = capture_installment(
            State(state.clone()),
            Extension(claims("customer-1")),
            Path((order.id, "ADVANCE".to_string())),
            Json(CaptureRequest { intent_id: intent.id }),
        )
        .await;

        // The provider already settled the funds; the response must reflect the
        // recorded installment even though the ledger write failed.
        let Json(updated) = result.expect("capture must survive a ledger outage");
        assert_eq!(updated.status, OrderStatus::AdvancePaid);

        let stored = orders.orders.lock().unwrap().get(&order.id).cloned().unwrap();
        assert!(stored.plan.advance_paid_at.is_some());
        assert!(orders.ledger.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn other_customers_orders_are_invisible() {
        let orders = Arc::new(InMemoryOrders::default());
        let state = state_over(orders).await;
        let order = placed_order(&state, "customer-1").await;

        let err = get_order(
            State(state.clone()),
            Extension(claims("customer-2")),
            Path(order.id),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotFoundError(_)));
    }
}
