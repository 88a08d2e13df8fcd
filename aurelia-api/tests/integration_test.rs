use aurelia_api::error::AppError;
use aurelia_api::middleware::auth::{has_permission, AdminClaims, CustomerClaims};
use axum::body::to_bytes;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn validation_errors_surface_as_bad_request() {
    let response = AppError::ValidationError("Metal weight must be positive".to_string())
        .into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"], "Metal weight must be positive");
}

#[tokio::test]
async fn internal_errors_hide_details_from_clients() {
    let response =
        AppError::InternalServerError("db password wrong".to_string()).into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_json(response).await;
    assert_eq!(body["error"], "Internal Server Error");
}

#[tokio::test]
async fn conflict_and_gone_map_to_their_status_codes() {
    let conflict = AppError::ConflictError("Installment ADVANCE already paid".to_string())
        .into_response();
    assert_eq!(conflict.status(), StatusCode::CONFLICT);

    let gone = AppError::GoneError("Order quote has expired".to_string()).into_response();
    assert_eq!(gone.status(), StatusCode::GONE);
}

#[test]
fn customer_token_roundtrip() {
    let secret = b"test-secret";
    let claims = CustomerClaims {
        sub: "user-1".to_string(),
        email: Some("user@example.com".to_string()),
        role: "CUSTOMER".to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp() as usize,
    };

    let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(secret)).unwrap();

    let decoded = decode::<CustomerClaims>(
        &token,
        &DecodingKey::from_secret(secret),
        &Validation::default(),
    )
    .unwrap();
    assert_eq!(decoded.claims.sub, "user-1");
    assert_eq!(decoded.claims.role, "CUSTOMER");

    // A different secret must not validate.
    let forged = decode::<CustomerClaims>(
        &token,
        &DecodingKey::from_secret(b"other-secret"),
        &Validation::default(),
    );
    assert!(forged.is_err());
}

#[test]
fn expired_tokens_are_rejected() {
    let secret = b"test-secret";
    let claims = CustomerClaims {
        sub: "user-1".to_string(),
        email: None,
        role: "CUSTOMER".to_string(),
        exp: (chrono::Utc::now() - chrono::Duration::hours(1)).timestamp() as usize,
    };

    let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(secret)).unwrap();
    let decoded = decode::<CustomerClaims>(
        &token,
        &DecodingKey::from_secret(secret),
        &Validation::default(),
    );
    assert!(decoded.is_err());
}

#[test]
fn permission_checks_match_exact_strings() {
    let claims = AdminClaims {
        sub: "admin-1".to_string(),
        email: "admin@example.com".to_string(),
        role: "ADMIN".to_string(),
        permissions: vec!["catalog:write".to_string(), "finance:read".to_string()],
        exp: 0,
    };

    assert!(has_permission(&claims, "catalog:write"));
    assert!(has_permission(&claims, "finance:read"));
    assert!(!has_permission(&claims, "orders:write"));
    assert!(!has_permission(&claims, "catalog"));
}
