use crate::handlers::{
    appointments::{
        __path_create_appointment, __path_delete_appointment, __path_list_appointments,
        __path_update_appointment,
    },
    audit_records::__path_list_audit_records,
    health::__path_health,
    login::__path_login,
    patients::{
        __path_create_patient, __path_delete_patient, __path_get_patient, __path_list_patients,
        __path_update_patient,
    },
    register::__path_register,
};
use crate::models::dtos::{
    AppointmentRequest, ErrorResponse, LoginRequest, LoginResponse, PatientRequest,
    RegisterRequest, RegisterResponse,
};
use crate::models::entities::{Appointment, Patient};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        health, register, login,
        create_patient, list_patients, get_patient, update_patient, delete_patient,
        create_appointment, list_appointments, update_appointment, delete_appointment,
        list_audit_records
    ),
    components(schemas(
        RegisterRequest, RegisterResponse, LoginRequest, LoginResponse,
        PatientRequest, AppointmentRequest, Patient, Appointment, ErrorResponse
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness"),
        (name = "Auth", description = "Clinic registration and staff login"),
        (name = "Patients", description = "Patient management"),
        (name = "Appointments", description = "Appointment management"),
        (name = "Audit", description = "Clinic audit trail")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "bearerAuth".to_string(),
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
