use crate::config::security_config::create_token;
use crate::error::ApiError;
use crate::models::dtos::{LoginRequest, LoginResponse};
use crate::models::entities::Staff;
use crate::models::AppState;
use crate::schema::staff;
use axum::{extract::State, Json};
use bcrypt::verify;
use diesel::prelude::*;
use std::sync::Arc;
use tracing::warn;
use validator::Validate;

#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 401, description = "Invalid email or password"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    payload.validate()?;

    let conn = &mut state
        .db
        .get()
        .map_err(|e| ApiError::DatabaseConnection(e.to_string()))?;

    let member: Option<Staff> = staff::table
        .filter(staff::email.eq(&payload.email))
        .select(Staff::as_select())
        .first(conn)
        .optional()?;

    let Some(member) = member else {
        warn!("Login attempt for unknown email");
        return Err(ApiError::Auth("Invalid email or password".to_string()));
    };

    if !verify(&payload.password, &member.password_hash)? {
        warn!("Failed login for staff {}", member.id);
        return Err(ApiError::Auth("Invalid email or password".to_string()));
    }

    let token = create_token(&state, member.id, member.clinic_id)?;

    Ok(Json(LoginResponse {
        token,
        staff_id: member.id,
        clinic_id: member.clinic_id,
    }))
}
