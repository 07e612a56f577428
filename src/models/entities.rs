use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Queryable, Insertable, Selectable, Identifiable, Serialize, Debug)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(table_name = crate::schema::clinics)]
pub struct Clinic {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::clinics)]
pub struct NewClinic {
    pub name: String,
}

#[derive(Queryable, Selectable, Identifiable, Debug)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(table_name = crate::schema::staff)]
pub struct Staff {
    pub id: Uuid,
    pub clinic_id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::staff)]
pub struct NewStaff {
    pub clinic_id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: String,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, ToSchema, Debug)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(table_name = crate::schema::patients)]
pub struct Patient {
    pub id: Uuid,
    pub clinic_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::patients)]
pub struct NewPatient {
    pub clinic_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, ToSchema, Debug)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(table_name = crate::schema::appointments)]
pub struct Appointment {
    pub id: Uuid,
    pub clinic_id: Uuid,
    pub patient_id: Uuid,
    pub staff_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub status: String,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::appointments)]
pub struct NewAppointment {
    pub clinic_id: Uuid,
    pub patient_id: Uuid,
    pub staff_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub status: String,
    pub reason: Option<String>,
}

/// Durable log entry describing a single resource mutation, its actor and
/// its field-level diff. Written once, never updated; removed only by the
/// retention cleanup task.
#[derive(Queryable, Selectable, Identifiable, Serialize, Deserialize, Debug)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(table_name = crate::schema::audit_records)]
pub struct AuditRecord {
    pub id: Uuid,
    pub clinic_id: Uuid,
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub action: String,
    pub performed_by: Uuid,
    pub before: Option<JsonValue>,
    pub after: Option<JsonValue>,
    pub changes: Option<JsonValue>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::audit_records)]
pub struct NewAuditRecord {
    pub id: Uuid,
    pub clinic_id: Uuid,
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub action: String,
    pub performed_by: Uuid,
    pub before: Option<JsonValue>,
    pub after: Option<JsonValue>,
    pub changes: Option<JsonValue>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}
