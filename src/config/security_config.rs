use crate::error::ApiError;
use crate::models::AppState;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::{extract::State, http::StatusCode};
use chrono::{Duration, Utc};
use http::HeaderMap;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::env;
use std::sync::Arc;
use tracing::{error, warn};
use uuid::Uuid;

/// Authenticated-actor context attached to every request that passes the
/// auth middleware. `sub` is the staff member, `clinic` the tenant scope.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub clinic: String,
    pub exp: usize,
    pub iat: usize,
}

impl Claims {
    pub fn staff_id(&self) -> Result<Uuid, ApiError> {
        Uuid::parse_str(&self.sub).map_err(|e| ApiError::Auth(format!("Invalid subject claim: {}", e)))
    }

    pub fn clinic_id(&self) -> Result<Uuid, ApiError> {
        Uuid::parse_str(&self.clinic)
            .map_err(|e| ApiError::Auth(format!("Invalid clinic claim: {}", e)))
    }
}

pub fn create_token(state: &AppState, staff_id: Uuid, clinic_id: Uuid) -> Result<String, ApiError> {
    let secret = state.jwt_secret.as_bytes();

    let now = Utc::now();
    let expiration_hours: i64 = env::var("JWT_EXPIRATION_HOURS")
        .unwrap_or_else(|_| "8".to_string())
        .parse()
        .map_err(|e| {
            error!("JWT expiration config error: {}", e);
            ApiError::Token(format!("Invalid JWT expiration configuration: {}", e))
        })?;

    let claims = Claims {
        sub: staff_id.to_string(),
        clinic: clinic_id.to_string(),
        exp: (now + Duration::hours(expiration_hours)).timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| {
        error!("JWT encoding error: {}", e);
        ApiError::Token(format!("Token creation failed: {}", e))
    })
}

pub fn verify_token(state: &AppState, token: &str) -> Result<Claims, String> {
    let validation = Validation::new(Algorithm::HS256);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| format!("JWT verification error: {}", e))
}

#[derive(Debug)]
pub enum AuthError {
    MissingHeader,
    InvalidFormat,
    InvalidToken(String),
}

impl From<AuthError> for (StatusCode, String) {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingHeader => (
                StatusCode::UNAUTHORIZED,
                "Authorization header required".to_string(),
            ),
            AuthError::InvalidFormat => (
                StatusCode::BAD_REQUEST,
                "Invalid Authorization format".to_string(),
            ),
            AuthError::InvalidToken(msg) => {
                (StatusCode::UNAUTHORIZED, format!("Invalid token: {}", msg))
            }
        }
    }
}

fn extract_bearer_token(headers: &HeaderMap) -> Result<String, AuthError> {
    let auth_header = headers
        .get("Authorization")
        .ok_or(AuthError::MissingHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidFormat)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidFormat)?
        .trim();

    if token.is_empty() {
        return Err(AuthError::InvalidFormat);
    }

    Ok(token.to_string())
}

pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let token = match extract_bearer_token(req.headers()) {
        Ok(token) => token,
        Err(error) => {
            let (status, message): (StatusCode, String) = error.into();
            return Err((status, message).into_response());
        }
    };

    let claims = match verify_token(&state, &token) {
        Ok(claims) => claims,
        Err(e) => {
            warn!("JWT verification failed: {}", e);
            let (status, message): (StatusCode, String) =
                AuthError::InvalidToken("Token verification failed".to_string()).into();
            return Err((status, message).into_response());
        }
    };

    let now = Utc::now().timestamp() as usize;
    if claims.exp < now {
        warn!("Expired token presented for staff {}", claims.sub);
        let (status, message): (StatusCode, String) =
            AuthError::InvalidToken("Token expired".to_string()).into();
        return Err((status, message).into_response());
    }

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
