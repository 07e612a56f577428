use crate::error::ApiError;
use crate::models::entities::{Appointment, Patient};
use crate::models::AppState;
use crate::schema::{appointments, patients};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

/// Clinic-scoped lookup of the current persisted state of a resource,
/// serialized to JSON. `Ok(None)` when the row does not exist or the label
/// is not a snapshottable resource; errors are for the caller to swallow.
pub fn fetch_before_state(
    state: &AppState,
    resource_type: &str,
    id: Uuid,
    clinic_id: Uuid,
) -> Result<Option<Value>, ApiError> {
    let mut conn = state
        .db
        .get()
        .map_err(|e| ApiError::DatabaseConnection(e.to_string()))?;

    let snapshot = match resource_type {
        "Patient" => patients::table
            .filter(patients::id.eq(id))
            .filter(patients::clinic_id.eq(clinic_id))
            .select(Patient::as_select())
            .first(&mut conn)
            .optional()?
            .map(|p| serde_json::to_value(&p))
            .transpose()
            .map_err(|e| ApiError::Internal(e.to_string()))?,
        "Appointment" => appointments::table
            .filter(appointments::id.eq(id))
            .filter(appointments::clinic_id.eq(clinic_id))
            .select(Appointment::as_select())
            .first(&mut conn)
            .optional()?
            .map(|a| serde_json::to_value(&a))
            .transpose()
            .map_err(|e| ApiError::Internal(e.to_string()))?,
        _ => None,
    };

    Ok(snapshot)
}
