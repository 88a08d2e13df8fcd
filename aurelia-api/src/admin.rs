use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use aurelia_catalog::designs::{CommentAuthor, CustomDesignRequest, DesignComment, DesignStatus};
use aurelia_catalog::materials::{MetalType, StoneType};
use aurelia_catalog::product::{Product, ProductCategory, StoneSetting};
use aurelia_catalog::rates::RateProvider;
use aurelia_catalog::repository::{MaterialRepository, ProductRepository};
use aurelia_catalog::PriceBreakdown;
use aurelia_content::testimonials::generate_testimonial;
use aurelia_content::Testimonial;
use aurelia_order::finance::{FinancialManager, LedgerEntry};
use aurelia_order::models::{Order, OrderStatus};
use aurelia_order::repository::OrderRepository;

use crate::middleware::auth::{has_permission, AdminClaims};
use crate::quotes::{resolve_and_quote, CalculatePriceRequest};
use crate::{error::AppError, state::AppState};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub sku: String,
    pub category: ProductCategory,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub image_urls: Vec<String>,
    pub metal_type_code: String,
    pub metal_weight_grams: f64,
    #[serde(default)]
    pub stones: Vec<StoneSetting>,
    pub price_override_paise: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image_urls: Option<Vec<String>>,
    pub metal_type_code: Option<String>,
    pub metal_weight_grams: Option<f64>,
    pub stones: Option<Vec<StoneSetting>>,
    pub price_override_paise: Option<Option<i64>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ListProductsQuery {
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListDesignsQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDesignStatusRequest {
    pub status: String,
    pub quoted_amount_paise: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct AddCommentRequest {
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateTestimonialRequest {
    pub theme: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetApprovalRequest {
    pub approved: bool,
}

#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct DescriptionResponse {
    pub description: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/products", get(list_products).post(create_product))
        .route("/api/admin/products/{id}", put(update_product).delete(deactivate_product))
        .route("/api/admin/products/{id}/generate-description", post(generate_description))
        .route("/api/admin/materials/metals", put(upsert_metal))
        .route("/api/admin/materials/stones", put(upsert_stone))
        .route("/api/admin/price-breakdown", post(price_breakdown))
        .route("/api/admin/rates/refresh", post(refresh_rates))
        .route("/api/admin/designs", get(list_designs))
        .route("/api/admin/designs/{id}/status", put(update_design_status))
        .route("/api/admin/designs/{id}/comments", post(add_design_comment))
        .route("/api/admin/testimonials", get(list_testimonials))
        .route("/api/admin/testimonials/generate", post(generate_testimonial_draft))
        .route("/api/admin/testimonials/{id}/approval", put(set_testimonial_approval))
        .route("/api/admin/testimonials/{id}", delete(delete_testimonial))
        .route("/api/admin/orders", get(list_orders))
        .route("/api/admin/orders/{id}/status", put(update_order_status))
        .route("/api/admin/orders/{id}/ledger", get(list_ledger))
        .route("/api/admin/finance/settlement", get(settlement_summary))
}

// ============================================================================
// Product Management Handlers
// ============================================================================

/// POST /api/admin/products
async fn create_product(
    State(state): State<AppState>,
    Extension(claims): Extension<AdminClaims>,
    Json(req): Json<CreateProductRequest>,
) -> Result<Json<Product>, AppError> {
    require(&claims, "catalog:write")?;

    // Reject products referencing unknown materials up front
    state
        .material_repo
        .get_metal_type(&req.metal_type_code)
        .await?
        .ok_or_else(|| AppError::ValidationError(format!("Unknown metal type {}", req.metal_type_code)))?;
    for stone in &req.stones {
        state
            .material_repo
            .get_stone_type(&stone.stone_type_code)
            .await?
            .ok_or_else(|| {
                AppError::ValidationError(format!("Unknown stone type {}", stone.stone_type_code))
            })?;
    }

    let now = Utc::now();
    let product = Product {
        id: Uuid::new_v4(),
        sku: req.sku,
        category: req.category,
        name: req.name,
        description: req.description,
        image_urls: req.image_urls,
        metal_type_code: req.metal_type_code,
        metal_weight_grams: req.metal_weight_grams,
        stones: req.stones,
        price_override_paise: req.price_override_paise,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    state.product_repo.create_product(&product).await?;
    Ok(Json(product))
}

/// GET /api/admin/products
/// Back-office listing includes deactivated pieces.
async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ListProductsQuery>,
) -> Result<Json<Vec<Product>>, AppError> {
    let products = state
        .product_repo
        .list_products(query.category.as_deref(), false)
        .await?;
    Ok(Json(products))
}

/// PUT /api/admin/products/:id
async fn update_product(
    State(state): State<AppState>,
    Extension(claims): Extension<AdminClaims>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProductRequest>,
) -> Result<Json<Product>, AppError> {
    require(&claims, "catalog:write")?;

    let mut product = state
        .product_repo
        .get_product(id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Product {} not found", id)))?;

    if let Some(name) = req.name {
        product.name = name;
    }
    if let Some(description) = req.description {
        product.description = Some(description);
    }
    if let Some(image_urls) = req.image_urls {
        product.image_urls = image_urls;
    }
    if let Some(metal_type_code) = req.metal_type_code {
        state
            .material_repo
            .get_metal_type(&metal_type_code)
            .await?
            .ok_or_else(|| AppError::ValidationError(format!("Unknown metal type {}", metal_type_code)))?;
        product.metal_type_code = metal_type_code;
    }
    if let Some(metal_weight_grams) = req.metal_weight_grams {
        product.metal_weight_grams = metal_weight_grams;
    }
    if let Some(stones) = req.stones {
        product.stones = stones;
    }
    if let Some(price_override_paise) = req.price_override_paise {
        product.price_override_paise = price_override_paise;
    }
    if let Some(is_active) = req.is_active {
        product.is_active = is_active;
    }
    product.updated_at = Utc::now();

    state.product_repo.update_product(id, &product).await?;
    Ok(Json(product))
}

/// DELETE /api/admin/products/:id
/// Soft delete; the row stays for order history.
async fn deactivate_product(
    State(state): State<AppState>,
    Extension(claims): Extension<AdminClaims>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    require(&claims, "catalog:write")?;

    state
        .product_repo
        .get_product(id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Product {} not found", id)))?;

    state.product_repo.deactivate_product(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/admin/products/:id/generate-description
/// Generate and persist an AI product description.
async fn generate_description(
    State(state): State<AppState>,
    Extension(claims): Extension<AdminClaims>,
    Path(id): Path<Uuid>,
) -> Result<Json<DescriptionResponse>, AppError> {
    require(&claims, "content:write")?;

    let mut product = state
        .product_repo
        .get_product(id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Product {} not found", id)))?;

    let metal = state
        .material_repo
        .get_metal_type(&product.metal_type_code)
        .await?
        .ok_or_else(|| {
            AppError::InternalServerError(format!("Product {} references unknown metal", id))
        })?;
    let stones = state.material_repo.list_stone_types().await?;

    let description =
        aurelia_content::describe::generate_description(&state.openai, &product, &metal, &stones)
            .await
            .map_err(|e| AppError::InternalServerError(format!("Description generation failed: {}", e)))?;

    product.description = Some(description.clone());
    product.updated_at = Utc::now();
    state.product_repo.update_product(id, &product).await?;

    Ok(Json(DescriptionResponse { description }))
}

// ============================================================================
// Materials & Pricing Handlers
// ============================================================================

/// PUT /api/admin/materials/metals
async fn upsert_metal(
    State(state): State<AppState>,
    Extension(claims): Extension<AdminClaims>,
    Json(metal): Json<MetalType>,
) -> Result<Json<MetalType>, AppError> {
    require(&claims, "catalog:write")?;

    if metal.price_modifier <= 0.0 {
        return Err(AppError::ValidationError("price_modifier must be positive".to_string()));
    }
    state.material_repo.upsert_metal_type(&metal).await?;
    Ok(Json(metal))
}

/// PUT /api/admin/materials/stones
async fn upsert_stone(
    State(state): State<AppState>,
    Extension(claims): Extension<AdminClaims>,
    Json(stone): Json<StoneType>,
) -> Result<Json<StoneType>, AppError> {
    require(&claims, "catalog:write")?;

    if stone.price_per_carat_paise <= 0 {
        return Err(AppError::ValidationError("price_per_carat_paise must be positive".to_string()));
    }
    state.material_repo.upsert_stone_type(&stone).await?;
    Ok(Json(stone))
}

/// POST /api/admin/price-breakdown
/// Full cost panel for a hypothetical or catalog piece, same engine as the
/// storefront calculator.
async fn price_breakdown(
    State(state): State<AppState>,
    Json(req): Json<CalculatePriceRequest>,
) -> Result<Json<PriceBreakdown>, AppError> {
    let (breakdown, _name) = resolve_and_quote(&state, &req).await?;
    Ok(Json(breakdown))
}

/// POST /api/admin/rates/refresh
/// Drop the cached gold/FX rates; the next quote refetches from the feeds.
async fn refresh_rates(
    State(state): State<AppState>,
    Extension(claims): Extension<AdminClaims>,
) -> Result<Json<crate::quotes::GoldRateResponse>, AppError> {
    require(&claims, "catalog:write")?;

    state
        .redis
        .invalidate_rates()
        .await
        .map_err(|e| AppError::InternalServerError(format!("Rate cache invalidation failed: {}", e)))?;

    let snapshot = state.rates.current_rates(true).await.map_err(crate::quotes::rate_error)?;
    Ok(Json(crate::quotes::GoldRateResponse {
        gold_price_per_gram_paise: snapshot.gold_price_per_gram_paise,
        inr_per_usd: snapshot.inr_per_usd,
        fx_fallback: snapshot.fx_fallback,
        fetched_at: snapshot.fetched_at,
    }))
}

// ============================================================================
// Design Request Handlers
// ============================================================================

/// GET /api/admin/designs
async fn list_designs(
    State(state): State<AppState>,
    Query(query): Query<ListDesignsQuery>,
) -> Result<Json<Vec<CustomDesignRequest>>, AppError> {
    let status = match query.status.as_deref() {
        Some(raw) => Some(
            DesignStatus::parse(raw)
                .ok_or_else(|| AppError::ValidationError(format!("Unknown design status {}", raw)))?,
        ),
        None => None,
    };

    Ok(Json(state.design_repo.list_requests(status).await?))
}

/// PUT /api/admin/designs/:id/status
/// Moves a request through review/quote/accept; quoting requires an amount.
async fn update_design_status(
    State(state): State<AppState>,
    Extension(claims): Extension<AdminClaims>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateDesignStatusRequest>,
) -> Result<Json<CustomDesignRequest>, AppError> {
    require(&claims, "designs:write")?;

    let target = DesignStatus::parse(&req.status)
        .ok_or_else(|| AppError::ValidationError(format!("Unknown design status {}", req.status)))?;

    let request = state
        .design_repo
        .get_request(id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Design request {} not found", id)))?;

    if !request.status.can_transition_to(target) {
        return Err(AppError::ConflictError(format!(
            "Cannot move design from {} to {}",
            request.status.as_str(),
            target.as_str()
        )));
    }
    if target == DesignStatus::Quoted
        && req.quoted_amount_paise.is_none()
        && request.quoted_amount_paise.is_none()
    {
        return Err(AppError::ValidationError(
            "quoted_amount_paise is required when quoting".to_string(),
        ));
    }

    state
        .design_repo
        .update_status(id, target, req.quoted_amount_paise)
        .await?;

    let updated = state
        .design_repo
        .get_request(id)
        .await?
        .ok_or_else(|| AppError::InternalServerError("Design vanished mid-update".to_string()))?;
    Ok(Json(updated))
}

/// POST /api/admin/designs/:id/comments
async fn add_design_comment(
    State(state): State<AppState>,
    Extension(claims): Extension<AdminClaims>,
    Path(id): Path<Uuid>,
    Json(req): Json<AddCommentRequest>,
) -> Result<Json<DesignComment>, AppError> {
    require(&claims, "designs:write")?;

    if req.body.trim().is_empty() {
        return Err(AppError::ValidationError("Comment body is required".to_string()));
    }
    state
        .design_repo
        .get_request(id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Design request {} not found", id)))?;

    let comment = DesignComment {
        id: Uuid::new_v4(),
        request_id: id,
        author: CommentAuthor::Admin,
        body: req.body,
        created_at: Utc::now(),
    };
    state.design_repo.add_comment(&comment).await?;
    Ok(Json(comment))
}

// ============================================================================
// Testimonial Handlers
// ============================================================================

/// GET /api/admin/testimonials
async fn list_testimonials(State(state): State<AppState>) -> Result<Json<Vec<Testimonial>>, AppError> {
    Ok(Json(state.testimonial_repo.list_all().await?))
}

/// POST /api/admin/testimonials/generate
/// Draft a placeholder testimonial; it stays unapproved until signed off.
async fn generate_testimonial_draft(
    State(state): State<AppState>,
    Extension(claims): Extension<AdminClaims>,
    Json(req): Json<GenerateTestimonialRequest>,
) -> Result<Json<Testimonial>, AppError> {
    require(&claims, "content:write")?;

    let testimonial = generate_testimonial(&state.openai, req.theme.as_deref())
        .await
        .map_err(|e| AppError::InternalServerError(format!("Testimonial generation failed: {}", e)))?;

    state.testimonial_repo.create(&testimonial).await?;
    Ok(Json(testimonial))
}

/// PUT /api/admin/testimonials/:id/approval
async fn set_testimonial_approval(
    State(state): State<AppState>,
    Extension(claims): Extension<AdminClaims>,
    Path(id): Path<Uuid>,
    Json(req): Json<SetApprovalRequest>,
) -> Result<StatusCode, AppError> {
    require(&claims, "content:write")?;

    state.testimonial_repo.set_approval(id, req.approved).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/admin/testimonials/:id
async fn delete_testimonial(
    State(state): State<AppState>,
    Extension(claims): Extension<AdminClaims>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    require(&claims, "content:write")?;

    state.testimonial_repo.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Order & Finance Handlers
// ============================================================================

/// GET /api/admin/orders
async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<Vec<Order>>, AppError> {
    let orders = match query.status.as_deref() {
        Some(raw) => {
            let status = OrderStatus::parse(raw)
                .ok_or_else(|| AppError::ValidationError(format!("Unknown order status {}", raw)))?;
            state.order_repo.list_orders_by_status(status).await?
        }
        None => state.order_repo.list_orders(None).await?,
    };
    Ok(Json(orders))
}

/// PUT /api/admin/orders/:id/status
/// Production progress: ADVANCE_PAID -> IN_PRODUCTION -> SHIPPED -> DELIVERED.
async fn update_order_status(
    State(state): State<AppState>,
    Extension(claims): Extension<AdminClaims>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateOrderStatusRequest>,
) -> Result<Json<Order>, AppError> {
    require(&claims, "orders:write")?;

    let target = OrderStatus::parse(&req.status)
        .ok_or_else(|| AppError::ValidationError(format!("Unknown order status {}", req.status)))?;

    let mut order = state
        .order_repo
        .get_order(id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Order {} not found", id)))?;

    state.checkout.advance_fulfilment(&mut order, target)?;
    state.order_repo.save_order(&order).await?;

    Ok(Json(order))
}

/// GET /api/admin/orders/:id/ledger
async fn list_ledger(
    State(state): State<AppState>,
    Extension(claims): Extension<AdminClaims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<LedgerEntry>>, AppError> {
    require(&claims, "finance:read")?;

    state
        .order_repo
        .get_order(id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Order {} not found", id)))?;

    Ok(Json(state.order_repo.list_ledger_entries(id).await?))
}

/// GET /api/admin/finance/settlement
/// Aggregate advance/balance collection and outstanding balances.
async fn settlement_summary(
    State(state): State<AppState>,
    Extension(claims): Extension<AdminClaims>,
) -> Result<Json<serde_json::Value>, AppError> {
    require(&claims, "finance:read")?;

    let orders = state.order_repo.list_orders(None).await?;
    let summary = FinancialManager::new().settlement_summary(&orders);
    Ok(Json(summary))
}

// ============================================================================
// Helpers
// ============================================================================

fn require(claims: &AdminClaims, permission: &str) -> Result<(), AppError> {
    if !has_permission(claims, permission) {
        return Err(AppError::AuthorizationError(format!(
            "Missing permission {}",
            permission
        )));
    }
    Ok(())
}
