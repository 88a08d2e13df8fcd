use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use aurelia_catalog::repository::ProductRepository;

use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/chat", post(chat))
}

/// POST /api/chat
/// Catalog-grounded assistant. Provider failures degrade to a canned reply, never
/// an error page.
async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    if req.message.trim().is_empty() {
        return Err(AppError::ValidationError("Message is required".to_string()));
    }
    if req.message.len() > 2000 {
        return Err(AppError::ValidationError("Message too long".to_string()));
    }

    let products = state.product_repo.list_products(None, true).await?;
    let reply = state.chatbot.reply(&products, &req.message).await;

    Ok(Json(ChatResponse { reply }))
}
