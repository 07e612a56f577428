use crate::config::security_config::Claims;
use crate::error::ApiError;
use crate::models::dtos::{AppointmentRequest, PageQuery};
use crate::models::entities::{Appointment, NewAppointment};
use crate::models::AppState;
use crate::schema::{appointments, patients};
use axum::extract::{Path, Query, State};
use axum::{http::StatusCode, Extension, Json};
use chrono::Utc;
use diesel::prelude::*;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

#[utoipa::path(
    post,
    path = "/api/appointments",
    request_body = AppointmentRequest,
    responses(
        (status = 201, description = "Appointment booked", body = Appointment),
        (status = 400, description = "Validation failure or unknown patient"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearerAuth" = [])),
    tag = "Appointments"
)]
pub async fn create_appointment(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<AppointmentRequest>,
) -> Result<(StatusCode, Json<Appointment>), ApiError> {
    payload.validate()?;
    let clinic_id = claims.clinic_id()?;
    let staff_id = claims.staff_id()?;

    let conn = &mut state
        .db
        .get()
        .map_err(|e| ApiError::DatabaseConnection(e.to_string()))?;

    // the patient must belong to the caller's clinic
    let patient_known: i64 = patients::table
        .filter(patients::id.eq(payload.patient_id))
        .filter(patients::clinic_id.eq(clinic_id))
        .select(diesel::dsl::count_star())
        .first(conn)?;
    if patient_known == 0 {
        return Err(ApiError::BadRequest(format!(
            "Patient {} is not registered with this clinic",
            payload.patient_id
        )));
    }

    let appointment: Appointment = diesel::insert_into(appointments::table)
        .values(NewAppointment {
            clinic_id,
            patient_id: payload.patient_id,
            staff_id,
            scheduled_at: payload.scheduled_at,
            duration_minutes: payload.duration_minutes,
            status: payload.status.unwrap_or_else(|| "scheduled".to_string()),
            reason: payload.reason,
        })
        .returning(Appointment::as_returning())
        .get_result(conn)?;

    Ok((StatusCode::CREATED, Json(appointment)))
}

#[utoipa::path(
    get,
    path = "/api/appointments",
    params(PageQuery),
    responses(
        (status = 200, description = "Appointments for the caller's clinic", body = [Appointment]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearerAuth" = [])),
    tag = "Appointments"
)]
pub async fn list_appointments(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<Appointment>>, ApiError> {
    let clinic_id = claims.clinic_id()?;
    let limit = query.size.unwrap_or(50).clamp(1, 200);
    let offset = (query.page.unwrap_or(1).max(1) - 1) * limit;

    let conn = &mut state
        .db
        .get()
        .map_err(|e| ApiError::DatabaseConnection(e.to_string()))?;

    let rows = appointments::table
        .filter(appointments::clinic_id.eq(clinic_id))
        .order(appointments::scheduled_at.desc())
        .limit(limit)
        .offset(offset)
        .select(Appointment::as_select())
        .load(conn)?;

    Ok(Json(rows))
}

#[utoipa::path(
    put,
    path = "/api/appointments/{id}",
    params(("id" = Uuid, Path, description = "Appointment id")),
    request_body = AppointmentRequest,
    responses(
        (status = 200, description = "Appointment updated", body = Appointment),
        (status = 404, description = "Unknown appointment in this clinic")
    ),
    security(("bearerAuth" = [])),
    tag = "Appointments"
)]
pub async fn update_appointment(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AppointmentRequest>,
) -> Result<Json<Appointment>, ApiError> {
    payload.validate()?;
    let clinic_id = claims.clinic_id()?;

    let conn = &mut state
        .db
        .get()
        .map_err(|e| ApiError::DatabaseConnection(e.to_string()))?;

    let updated: Option<Appointment> = diesel::update(
        appointments::table
            .filter(appointments::id.eq(id))
            .filter(appointments::clinic_id.eq(clinic_id)),
    )
    .set((
        appointments::patient_id.eq(payload.patient_id),
        appointments::scheduled_at.eq(payload.scheduled_at),
        appointments::duration_minutes.eq(payload.duration_minutes),
        appointments::status.eq(payload.status.unwrap_or_else(|| "scheduled".to_string())),
        appointments::reason.eq(payload.reason),
        appointments::updated_at.eq(Utc::now()),
    ))
    .returning(Appointment::as_returning())
    .get_result(conn)
    .optional()?;

    updated
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Appointment {} not found", id)))
}

#[utoipa::path(
    delete,
    path = "/api/appointments/{id}",
    params(("id" = Uuid, Path, description = "Appointment id")),
    responses(
        (status = 200, description = "Appointment removed"),
        (status = 404, description = "Unknown appointment in this clinic")
    ),
    security(("bearerAuth" = [])),
    tag = "Appointments"
)]
pub async fn delete_appointment(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let clinic_id = claims.clinic_id()?;

    let conn = &mut state
        .db
        .get()
        .map_err(|e| ApiError::DatabaseConnection(e.to_string()))?;

    let deleted = diesel::delete(
        appointments::table
            .filter(appointments::id.eq(id))
            .filter(appointments::clinic_id.eq(clinic_id)),
    )
    .execute(conn)?;

    if deleted == 0 {
        return Err(ApiError::NotFound(format!("Appointment {} not found", id)));
    }

    Ok(Json(json!({ "status": "deleted", "id": id })))
}
