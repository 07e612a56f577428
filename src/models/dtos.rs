use crate::utility::validate_password;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Deserialize, ToSchema, Validate)]
pub struct RegisterRequest {
    #[validate(length(
        min = 2,
        max = 255,
        message = "Clinic name must be between 2 and 255 characters"
    ))]
    pub clinic_name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 8), custom(function = validate_password))]
    pub password: String,
    #[validate(length(
        min = 2,
        max = 150,
        message = "Full name must be between 2 and 150 characters"
    ))]
    pub full_name: String,
}

#[derive(Serialize, ToSchema)]
pub struct RegisterResponse {
    pub token: String,
    pub staff_id: Uuid,
    pub clinic_id: Uuid,
}

#[derive(Deserialize, ToSchema, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub staff_id: Uuid,
    pub clinic_id: Uuid,
}

#[derive(Deserialize, ToSchema, Validate)]
pub struct PatientRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Deserialize, ToSchema, Validate)]
pub struct AppointmentRequest {
    pub patient_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    #[validate(range(min = 5, max = 480, message = "Duration must be 5-480 minutes"))]
    pub duration_minutes: i32,
    #[validate(length(max = 30))]
    pub status: Option<String>,
    pub reason: Option<String>,
}

#[derive(Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// 1-based page number
    pub page: Option<i64>,
    /// rows per page
    pub size: Option<i64>,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct ErrorResponse {
    pub error: String,
}
