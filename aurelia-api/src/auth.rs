use axum::{extract::State, routing::post, Json, Router};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::AppError,
    middleware::auth::{AdminClaims, CustomerClaims},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
struct AuthResponse {
    token: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/guest", post(login_guest))
}

/// POST /api/auth/register
async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    if req.password.len() < 8 {
        return Err(AppError::ValidationError(
            "Password must be at least 8 characters".to_string(),
        ));
    }
    if !req.email.contains('@') {
        return Err(AppError::ValidationError("Invalid email address".to_string()));
    }

    if state.user_repo.find_by_email(&req.email).await?.is_some() {
        return Err(AppError::ConflictError("Email already registered".to_string()));
    }

    let password_hash = bcrypt::hash(req.password.as_bytes(), bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::InternalServerError(format!("Password hashing failed: {}", e)))?;

    let user = state
        .user_repo
        .create_user(&req.email, &password_hash, "CUSTOMER")
        .await?;

    let token = issue_customer_token(&state, &user.id.to_string(), Some(user.email.clone()), "CUSTOMER")?;
    Ok(Json(AuthResponse { token }))
}

/// POST /api/auth/login
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = state
        .user_repo
        .find_by_email(&req.email)
        .await?
        .ok_or_else(|| AppError::AuthenticationError("Invalid credentials".to_string()))?;

    let valid = bcrypt::verify(req.password.as_bytes(), &user.password_hash)
        .map_err(|e| AppError::InternalServerError(format!("Password verify failed: {}", e)))?;
    if !valid {
        return Err(AppError::AuthenticationError("Invalid credentials".to_string()));
    }

    let token = if user.role == "ADMIN" {
        issue_admin_token(&state, &user.id.to_string(), &user.email)?
    } else {
        issue_customer_token(&state, &user.id.to_string(), Some(user.email.clone()), &user.role)?
    };
    Ok(Json(AuthResponse { token }))
}

/// POST /api/auth/guest
/// Anonymous browsing token. Guests can quote but not place orders.
async fn login_guest(State(state): State<AppState>) -> Result<Json<AuthResponse>, AppError> {
    let token = issue_customer_token(&state, &format!("guest-{}", Uuid::new_v4()), None, "GUEST")?;
    Ok(Json(AuthResponse { token }))
}

fn issue_customer_token(
    state: &AppState,
    sub: &str,
    email: Option<String>,
    role: &str,
) -> Result<String, AppError> {
    let claims = CustomerClaims {
        sub: sub.to_string(),
        email,
        role: role.to_string(),
        exp: (Utc::now() + Duration::seconds(state.auth.expiration as i64)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(state.auth.secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(format!("Token encoding failed: {}", e)))
}

fn issue_admin_token(state: &AppState, sub: &str, email: &str) -> Result<String, AppError> {
    let claims = AdminClaims {
        sub: sub.to_string(),
        email: email.to_string(),
        role: "ADMIN".to_string(),
        permissions: vec![
            "catalog:write".to_string(),
            "designs:write".to_string(),
            "orders:write".to_string(),
            "content:write".to_string(),
            "finance:read".to_string(),
        ],
        exp: (Utc::now() + Duration::seconds(state.auth.expiration as i64)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(state.auth.secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(format!("Token encoding failed: {}", e)))
}
