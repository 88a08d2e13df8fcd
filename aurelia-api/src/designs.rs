use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use aurelia_catalog::designs::{
    whatsapp_link, CommentAuthor, CustomDesignRequest, DesignComment, DesignStatus,
};
use aurelia_shared::models::events::DesignSubmittedEvent;
use aurelia_shared::pii::Masked;

use crate::{error::AppError, state::AppState};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SubmitDesignRequest {
    pub customer_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub description: String,
    #[serde(default)]
    pub reference_image_urls: Vec<String>,
    pub budget_min_paise: Option<i64>,
    pub budget_max_paise: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct AddCommentRequest {
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct WhatsAppLinkResponse {
    pub url: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/custom-designs", post(submit_design))
        .route("/api/custom-designs/{id}", get(get_design))
        .route("/api/custom-designs/{id}/comments", get(list_comments).post(add_comment))
        .route("/api/custom-designs/{id}/whatsapp-link", get(whatsapp_deep_link))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/custom-designs
/// Custom design intake. Open to guests; contact details are masked in logs.
async fn submit_design(
    State(state): State<AppState>,
    Json(req): Json<SubmitDesignRequest>,
) -> Result<Json<CustomDesignRequest>, AppError> {
    if req.description.trim().is_empty() {
        return Err(AppError::ValidationError("Description is required".to_string()));
    }
    if !req.email.contains('@') {
        return Err(AppError::ValidationError("Invalid email address".to_string()));
    }
    if let (Some(min), Some(max)) = (req.budget_min_paise, req.budget_max_paise) {
        if min > max {
            return Err(AppError::ValidationError(
                "Budget minimum exceeds maximum".to_string(),
            ));
        }
    }

    let now = Utc::now();
    let request = CustomDesignRequest {
        id: Uuid::new_v4(),
        customer_name: req.customer_name,
        email: Masked(req.email),
        phone: req.phone.map(Masked),
        description: req.description,
        reference_image_urls: req.reference_image_urls,
        budget_min_paise: req.budget_min_paise,
        budget_max_paise: req.budget_max_paise,
        status: DesignStatus::Submitted,
        quoted_amount_paise: None,
        created_at: now,
        updated_at: now,
    };

    state.design_repo.create_request(&request).await?;

    state.telemetry.log_design_submitted(DesignSubmittedEvent {
        request_id: request.id,
        customer_id: None,
        budget_max_paise: request.budget_max_paise,
        timestamp: now.timestamp(),
    });

    Ok(Json(request))
}

/// GET /api/custom-designs/:id
async fn get_design(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CustomDesignRequest>, AppError> {
    let request = state
        .design_repo
        .get_request(id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Design request {} not found", id)))?;

    Ok(Json(request))
}

/// GET /api/custom-designs/:id/comments
async fn list_comments(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<DesignComment>>, AppError> {
    // 404 for unknown requests rather than an empty thread
    state
        .design_repo
        .get_request(id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Design request {} not found", id)))?;

    Ok(Json(state.design_repo.list_comments(id).await?))
}

/// POST /api/custom-designs/:id/comments
/// Customer side of the design conversation thread.
async fn add_comment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AddCommentRequest>,
) -> Result<Json<DesignComment>, AppError> {
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
        author: CommentAuthor::Customer,
        body: req.body,
        created_at: Utc::now(),
    };
    state.design_repo.add_comment(&comment).await?;

    Ok(Json(comment))
}

/// GET /api/custom-designs/:id/whatsapp-link
/// Prefilled `wa.me` deep link to continue the conversation with the workshop.
async fn whatsapp_deep_link(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WhatsAppLinkResponse>, AppError> {
    let request = state
        .design_repo
        .get_request(id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Design request {} not found", id)))?;

    Ok(Json(WhatsAppLinkResponse {
        url: whatsapp_link(&state.whatsapp_number, &request),
    }))
}
