use crate::config::security_config::Claims;
use crate::error::ApiError;
use crate::models::dtos::{PageQuery, PatientRequest};
use crate::models::entities::{NewPatient, Patient};
use crate::models::AppState;
use crate::schema::patients;
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
    path = "/api/patients",
    request_body = PatientRequest,
    responses(
        (status = 201, description = "Patient created", body = Patient),
        (status = 400, description = "Validation failure"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearerAuth" = [])),
    tag = "Patients"
)]
pub async fn create_patient(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<PatientRequest>,
) -> Result<(StatusCode, Json<Patient>), ApiError> {
    payload.validate()?;
    let clinic_id = claims.clinic_id()?;

    let conn = &mut state
        .db
        .get()
        .map_err(|e| ApiError::DatabaseConnection(e.to_string()))?;

    let patient: Patient = diesel::insert_into(patients::table)
        .values(NewPatient {
            clinic_id,
            first_name: payload.first_name,
            last_name: payload.last_name,
            email: payload.email,
            phone: payload.phone,
            date_of_birth: payload.date_of_birth,
            notes: payload.notes,
        })
        .returning(Patient::as_returning())
        .get_result(conn)?;

    Ok((StatusCode::CREATED, Json(patient)))
}

#[utoipa::path(
    get,
    path = "/api/patients",
    params(PageQuery),
    responses(
        (status = 200, description = "Patients for the caller's clinic", body = [Patient]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearerAuth" = [])),
    tag = "Patients"
)]
pub async fn list_patients(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<Patient>>, ApiError> {
    let clinic_id = claims.clinic_id()?;
    let limit = query.size.unwrap_or(50).clamp(1, 200);
    let offset = (query.page.unwrap_or(1).max(1) - 1) * limit;

    let conn = &mut state
        .db
        .get()
        .map_err(|e| ApiError::DatabaseConnection(e.to_string()))?;

    let rows = patients::table
        .filter(patients::clinic_id.eq(clinic_id))
        .order(patients::created_at.desc())
        .limit(limit)
        .offset(offset)
        .select(Patient::as_select())
        .load(conn)?;

    Ok(Json(rows))
}

#[utoipa::path(
    get,
    path = "/api/patients/{id}",
    params(("id" = Uuid, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Patient detail", body = Patient),
        (status = 404, description = "Unknown patient in this clinic")
    ),
    security(("bearerAuth" = [])),
    tag = "Patients"
)]
pub async fn get_patient(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Patient>, ApiError> {
    let clinic_id = claims.clinic_id()?;

    let conn = &mut state
        .db
        .get()
        .map_err(|e| ApiError::DatabaseConnection(e.to_string()))?;

    patients::table
        .filter(patients::id.eq(id))
        .filter(patients::clinic_id.eq(clinic_id))
        .select(Patient::as_select())
        .first(conn)
        .optional()?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Patient {} not found", id)))
}

#[utoipa::path(
    put,
    path = "/api/patients/{id}",
    params(("id" = Uuid, Path, description = "Patient id")),
    request_body = PatientRequest,
    responses(
        (status = 200, description = "Patient updated", body = Patient),
        (status = 404, description = "Unknown patient in this clinic")
    ),
    security(("bearerAuth" = [])),
    tag = "Patients"
)]
pub async fn update_patient(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PatientRequest>,
) -> Result<Json<Patient>, ApiError> {
    payload.validate()?;
    let clinic_id = claims.clinic_id()?;

    let conn = &mut state
        .db
        .get()
        .map_err(|e| ApiError::DatabaseConnection(e.to_string()))?;

    let updated: Option<Patient> = diesel::update(
        patients::table
            .filter(patients::id.eq(id))
            .filter(patients::clinic_id.eq(clinic_id)),
    )
    .set((
        patients::first_name.eq(payload.first_name),
        patients::last_name.eq(payload.last_name),
        patients::email.eq(payload.email),
        patients::phone.eq(payload.phone),
        patients::date_of_birth.eq(payload.date_of_birth),
        patients::notes.eq(payload.notes),
        patients::updated_at.eq(Utc::now()),
    ))
    .returning(Patient::as_returning())
    .get_result(conn)
    .optional()?;

    updated
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Patient {} not found", id)))
}

#[utoipa::path(
    delete,
    path = "/api/patients/{id}",
    params(("id" = Uuid, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Patient deleted"),
        (status = 404, description = "Unknown patient in this clinic")
    ),
    security(("bearerAuth" = [])),
    tag = "Patients"
)]
pub async fn delete_patient(
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
        patients::table
            .filter(patients::id.eq(id))
            .filter(patients::clinic_id.eq(clinic_id)),
    )
    .execute(conn)?;

    if deleted == 0 {
        return Err(ApiError::NotFound(format!("Patient {} not found", id)));
    }

    Ok(Json(json!({ "status": "deleted", "id": id })))
}
