use crate::config::security_config::create_token;
use crate::error::ApiError;
use crate::models::dtos::{RegisterRequest, RegisterResponse};
use crate::models::entities::{NewClinic, NewStaff};
use crate::models::AppState;
use crate::schema::{clinics, staff};
use axum::{extract::State, http::StatusCode, Json};
use bcrypt::hash;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

#[utoipa::path(
    post,
    path = "/api/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Clinic and first staff member created", body = RegisterResponse),
        (status = 400, description = "Validation failure or email already registered"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    payload.validate().map_err(|e| {
        tracing::error!("Validation error: {}", e);
        ApiError::Validation(e)
    })?;

    let conn = &mut state.db.get().map_err(|e| {
        tracing::error!("Database connection error: {}", e);
        ApiError::DatabaseConnection(e.to_string())
    })?;

    let hashed = hash(&payload.password, 12)?;

    let (clinic_id, staff_id) = conn
        .transaction(|conn| {
            let exists: i64 = staff::table
                .filter(staff::email.eq(&payload.email))
                .select(diesel::dsl::count_star())
                .first(conn)?;
            if exists > 0 {
                return Err(DieselError::RollbackTransaction);
            }

            let clinic_id: Uuid = diesel::insert_into(clinics::table)
                .values(NewClinic {
                    name: payload.clinic_name.clone(),
                })
                .returning(clinics::id)
                .get_result(conn)?;

            let staff_id: Uuid = diesel::insert_into(staff::table)
                .values(NewStaff {
                    clinic_id,
                    email: payload.email.clone(),
                    password_hash: hashed,
                    full_name: payload.full_name.clone(),
                    role: "admin".to_string(),
                })
                .returning(staff::id)
                .get_result(conn)?;

            Ok::<(Uuid, Uuid), DieselError>((clinic_id, staff_id))
        })
        .map_err(|e| match e {
            DieselError::RollbackTransaction => {
                ApiError::BadRequest("Email already registered".to_string())
            }
            _ => ApiError::Database(e),
        })?;

    let token = create_token(&state, staff_id, clinic_id)?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            token,
            staff_id,
            clinic_id,
        }),
    ))
}
