use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use aurelia_catalog::materials::{MetalType, StoneType};
use aurelia_catalog::product::Product;
use aurelia_catalog::repository::{MaterialRepository, ProductRepository};

use crate::{error::AppError, state::AppState};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ListProductsQuery {
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    #[serde(flatten)]
    pub product: Product,
    /// Primary display image with placeholder fallback.
    pub primary_image: String,
}

impl ProductResponse {
    fn from_product(product: Product) -> Self {
        let primary_image = product.primary_image().to_string();
        Self { product, primary_image }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/products", get(list_products))
        .route("/api/products/{id}", get(get_product))
        .route("/api/metal-types", get(list_metal_types))
        .route("/api/stone-types", get(list_stone_types))
        .route("/api/testimonials", get(list_testimonials))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/products
/// Public storefront listing; only active pieces, optionally filtered by category.
async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ListProductsQuery>,
) -> Result<Json<Vec<ProductResponse>>, AppError> {
    let products = state
        .product_repo
        .list_products(query.category.as_deref(), true)
        .await?;

    Ok(Json(products.into_iter().map(ProductResponse::from_product).collect()))
}

/// GET /api/products/:id
async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductResponse>, AppError> {
    let product = state
        .product_repo
        .get_product(id)
        .await?
        .filter(|p| p.is_active)
        .ok_or_else(|| AppError::NotFoundError(format!("Product {} not found", id)))?;

    Ok(Json(ProductResponse::from_product(product)))
}

/// GET /api/metal-types
/// Metal rate table the customizer renders its purity picker from.
async fn list_metal_types(State(state): State<AppState>) -> Result<Json<Vec<MetalType>>, AppError> {
    let metals = state.material_repo.list_metal_types().await?;
    Ok(Json(metals.into_iter().filter(|m| m.is_active).collect()))
}

/// GET /api/stone-types
async fn list_stone_types(State(state): State<AppState>) -> Result<Json<Vec<StoneType>>, AppError> {
    let stones = state.material_repo.list_stone_types().await?;
    Ok(Json(stones.into_iter().filter(|s| s.is_active).collect()))
}

/// GET /api/testimonials
/// Approved testimonials only; drafts stay behind the admin panel.
async fn list_testimonials(
    State(state): State<AppState>,
) -> Result<Json<Vec<aurelia_content::Testimonial>>, AppError> {
    let testimonials = state.testimonial_repo.list_approved().await?;
    Ok(Json(testimonials))
}
