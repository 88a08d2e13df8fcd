use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use aurelia_catalog::pricing::{PriceBreakdown, QuoteRequest};
use aurelia_catalog::rates::{RateError, RateProvider};
use aurelia_catalog::repository::{MaterialRepository, ProductRepository};
use aurelia_shared::models::events::QuoteComputedEvent;

use crate::{error::AppError, state::AppState};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StoneInput {
    pub stone_type_code: String,
    pub carat: f64,
}

/// Quote input. Either a bare `product_id` (quote the catalog piece as-is) or
/// explicit materials (the customizer), with the explicit fields winning when both
/// are present.
#[derive(Debug, Deserialize)]
pub struct CalculatePriceRequest {
    pub product_id: Option<Uuid>,
    pub metal_type_code: Option<String>,
    pub metal_weight_grams: Option<f64>,
    #[serde(default)]
    pub stones: Vec<StoneInput>,
    /// Client-side recomputation of the grand total, reconciled server-side.
    pub client_total_paise: Option<i64>,
    /// Bypass the rate cache, e.g. after the feed recovered from an outage.
    #[serde(default)]
    pub force_refresh: bool,
}

#[derive(Debug, Serialize)]
pub struct GoldRateResponse {
    pub gold_price_per_gram_paise: i64,
    pub inr_per_usd: f64,
    pub fx_fallback: bool,
    pub fetched_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Deserialize)]
pub struct GoldRateQuery {
    #[serde(default)]
    pub force_refresh: bool,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/calculate-price", post(calculate_price))
        .route("/api/rates/gold", get(gold_rate))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/calculate-price
/// The storefront's single pricing endpoint: metal cost from the live gold rate,
/// stone cost per carat, overhead, the 50/50 split and the USD mirror.
async fn calculate_price(
    State(state): State<AppState>,
    Json(req): Json<CalculatePriceRequest>,
) -> Result<Json<PriceBreakdown>, AppError> {
    let (breakdown, _name) = resolve_and_quote(&state, &req).await?;

    if let Some(client_total) = req.client_total_paise {
        state.engine.reconcile(breakdown.grand_total_paise, client_total)?;
    }

    state.telemetry.log_quote_computed(QuoteComputedEvent {
        product_id: breakdown.product_id,
        metal_type_code: req
            .metal_type_code
            .clone()
            .unwrap_or_else(|| "(product)".to_string()),
        grand_total_paise: breakdown.grand_total_paise,
        fx_fallback: breakdown.fx_fallback,
        timestamp: chrono::Utc::now().timestamp(),
    });

    Ok(Json(breakdown))
}

/// GET /api/rates/gold
/// Current gold/FX snapshot. `?force_refresh=true` punches through the cache.
async fn gold_rate(
    State(state): State<AppState>,
    Query(query): Query<GoldRateQuery>,
) -> Result<Json<GoldRateResponse>, AppError> {
    let snapshot = state
        .rates
        .current_rates(query.force_refresh)
        .await
        .map_err(rate_error)?;

    Ok(Json(GoldRateResponse {
        gold_price_per_gram_paise: snapshot.gold_price_per_gram_paise,
        inr_per_usd: snapshot.inr_per_usd,
        fx_fallback: snapshot.fx_fallback,
        fetched_at: snapshot.fetched_at,
    }))
}

// ============================================================================
// Quote Resolution (shared with checkout)
// ============================================================================

/// Resolve material codes against the rate tables and run the engine. Returns the
/// breakdown plus a display name for order items.
pub(crate) async fn resolve_and_quote(
    state: &AppState,
    req: &CalculatePriceRequest,
) -> Result<(PriceBreakdown, String), AppError> {
    // Load the catalog piece when referenced; the customizer may still override
    // its materials below.
    let product = match req.product_id {
        Some(id) => Some(
            state
                .product_repo
                .get_product(id)
                .await?
                .filter(|p| p.is_active)
                .ok_or_else(|| AppError::NotFoundError(format!("Product {} not found", id)))?,
        ),
        None => None,
    };

    let metal_code = req
        .metal_type_code
        .clone()
        .or_else(|| product.as_ref().map(|p| p.metal_type_code.clone()))
        .ok_or_else(|| {
            AppError::ValidationError("metal_type_code is required without a product_id".to_string())
        })?;

    let metal = state
        .material_repo
        .get_metal_type(&metal_code)
        .await?
        .filter(|m| m.is_active)
        .ok_or_else(|| AppError::ValidationError(format!("Unknown metal type {}", metal_code)))?;

    let metal_weight_grams = req
        .metal_weight_grams
        .or_else(|| product.as_ref().map(|p| p.metal_weight_grams))
        .ok_or_else(|| {
            AppError::ValidationError("metal_weight_grams is required without a product_id".to_string())
        })?;

    // Explicit stones replace the product's settings entirely.
    let stone_inputs: Vec<(String, f64)> = if !req.stones.is_empty() {
        req.stones.iter().map(|s| (s.stone_type_code.clone(), s.carat)).collect()
    } else {
        product
            .as_ref()
            .map(|p| p.stones.iter().map(|s| (s.stone_type_code.clone(), s.carat)).collect())
            .unwrap_or_default()
    };

    let mut stones = Vec::with_capacity(stone_inputs.len());
    for (code, carat) in stone_inputs {
        let stone = state
            .material_repo
            .get_stone_type(&code)
            .await?
            .filter(|s| s.is_active)
            .ok_or_else(|| AppError::ValidationError(format!("Unknown stone type {}", code)))?;
        stones.push((code, carat, stone.price_per_carat_paise));
    }

    // A fixed price only applies when the piece is quoted unmodified.
    let customized = req.metal_type_code.is_some()
        || req.metal_weight_grams.is_some()
        || !req.stones.is_empty();
    let price_override_paise = match (&product, customized) {
        (Some(p), false) => p.price_override_paise,
        _ => None,
    };

    let rates = state.rates.current_rates(req.force_refresh).await.map_err(rate_error)?;

    let quote_request = QuoteRequest {
        product_id: req.product_id,
        metal_weight_grams,
        stones,
        price_override_paise,
    };

    let breakdown = state.engine.quote(&quote_request, &metal, &rates)?;
    let name = product
        .map(|p| p.name)
        .unwrap_or_else(|| format!("Custom {} piece", metal.purity_label));

    Ok((breakdown, name))
}

/// Gold is mandatory for quoting, so feed failures surface as 503-ish internal
/// errors; malformed payloads are treated the same way.
pub(crate) fn rate_error(err: RateError) -> AppError {
    AppError::InternalServerError(format!("Rate lookup failed: {}", err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::testutil::{
        app_state, catalog_ring, InMemoryMaterials, InMemoryOrders, InMemoryProducts,
    };

    async fn state_with(products: Vec<aurelia_catalog::product::Product>) -> AppState {
        app_state(
            Arc::new(InMemoryProducts::with(products)),
            Arc::new(InMemoryMaterials::seeded()),
            Arc::new(InMemoryOrders::default()),
        )
        .await
    }

    fn custom_piece(metal: &str, stones: Vec<StoneInput>) -> CalculatePriceRequest {
        CalculatePriceRequest {
            product_id: None,
            metal_type_code: Some(metal.to_string()),
            metal_weight_grams: Some(4.0),
            stones,
            client_total_paise: None,
            force_refresh: false,
        }
    }

    #[tokio::test]
    async fn unknown_metal_code_is_rejected() {
        let state = state_with(vec![]).await;
        let err = resolve_and_quote(&state, &custom_piece("GOLD_9K", vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn unknown_stone_code_is_rejected() {
        let state = state_with(vec![]).await;
        let stones = vec![StoneInput {
            stone_type_code: "MOONSTONE".to_string(),
            carat: 0.5,
        }];
        let err = resolve_and_quote(&state, &custom_piece("GOLD_18K", stones))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn bare_materials_require_metal_and_weight() {
        let state = state_with(vec![]).await;
        let request = CalculatePriceRequest {
            product_id: None,
            metal_type_code: None,
            metal_weight_grams: None,
            stones: vec![],
            client_total_paise: None,
            force_refresh: false,
        };
        let err = resolve_and_quote(&state, &request).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn catalog_piece_quotes_from_its_own_materials() {
        let ring = catalog_ring("GOLD_18K", 4.0);
        let ring_id = ring.id;
        let state = state_with(vec![ring]).await;

        let request = CalculatePriceRequest {
            product_id: Some(ring_id),
            metal_type_code: None,
            metal_weight_grams: None,
            stones: vec![],
            client_total_paise: None,
            force_refresh: false,
        };
        let (breakdown, name) = resolve_and_quote(&state, &request).await.unwrap();

        // 4g at 600,000 paise/g with the 18kt modifier 0.75, plus 25% overhead.
        assert_eq!(breakdown.metal_cost_paise, 1_800_000);
        assert_eq!(breakdown.grand_total_paise, 2_250_000);
        assert_eq!(name, "Aster Ring");
    }

    #[tokio::test]
    async fn customizing_a_fixed_price_piece_reprices_from_materials() {
        let mut ring = catalog_ring("GOLD_18K", 4.0);
        ring.price_override_paise = Some(9_999_900);
        let ring_id = ring.id;
        let state = state_with(vec![ring]).await;

        let unmodified = CalculatePriceRequest {
            product_id: Some(ring_id),
            metal_type_code: None,
            metal_weight_grams: None,
            stones: vec![],
            client_total_paise: None,
            force_refresh: false,
        };
        let (breakdown, _) = resolve_and_quote(&state, &unmodified).await.unwrap();
        assert!(breakdown.fixed_price);
        assert_eq!(breakdown.grand_total_paise, 9_999_900);

        let customized = CalculatePriceRequest {
            metal_weight_grams: Some(6.0),
            ..unmodified
        };
        let (breakdown, _) = resolve_and_quote(&state, &customized).await.unwrap();
        assert!(!breakdown.fixed_price);
        assert_ne!(breakdown.grand_total_paise, 9_999_900);
    }

    #[tokio::test]
    async fn inactive_products_do_not_quote() {
        let mut ring = catalog_ring("GOLD_18K", 4.0);
        ring.is_active = false;
        let ring_id = ring.id;
        let state = state_with(vec![ring]).await;

        let request = CalculatePriceRequest {
            product_id: Some(ring_id),
            metal_type_code: None,
            metal_weight_grams: None,
            stones: vec![],
            client_total_paise: None,
            force_refresh: false,
        };
        let err = resolve_and_quote(&state, &request).await.unwrap_err();
        assert!(matches!(err, AppError::NotFoundError(_)));
    }
}
