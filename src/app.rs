use axum::extract::{RawPathParams, Request, State};
use axum::middleware::Next;
use axum::routing::{get, post};
use axum::{middleware, Router};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::audit::audit_capture;
use crate::config::security_config::auth_middleware;
use crate::config::swagger_config::ApiDoc;
use crate::handlers::appointments::{
    create_appointment, delete_appointment, list_appointments, update_appointment,
};
use crate::handlers::audit_records::list_audit_records;
use crate::handlers::health::health;
use crate::handlers::login::login;
use crate::handlers::patients::{
    create_patient, delete_patient, get_patient, list_patients, update_patient,
};
use crate::handlers::register::register;
use crate::models::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Public routes (no authentication, no audit)
    let public_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(health))
        .route("/api/register", post(register))
        .route("/api/login", post(login));

    let patient_router = Router::new()
        .route("/api/patients", post(create_patient).get(list_patients))
        .route(
            "/api/patients/{id}",
            get(get_patient).put(update_patient).delete(delete_patient),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            |state: State<Arc<AppState>>, params: RawPathParams, req: Request, next: Next| {
                audit_capture(state, params, "Patient", req, next)
            },
        ));

    let appointment_router = Router::new()
        .route(
            "/api/appointments",
            post(create_appointment).get(list_appointments),
        )
        .route(
            "/api/appointments/{id}",
            axum::routing::put(update_appointment).delete(delete_appointment),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            |state: State<Arc<AppState>>, params: RawPathParams, req: Request, next: Next| {
                audit_capture(state, params, "Appointment", req, next)
            },
        ));

    // Protected routes (JWT). The audit-trail listing sits outside any
    // audit layer so reading the trail does not grow the trail.
    let protected_router = Router::new()
        .merge(patient_router)
        .merge(appointment_router)
        .route("/api/audit_records", get(list_audit_records))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_router)
        .merge(protected_router)
        .with_state(state)
}
