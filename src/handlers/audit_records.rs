use crate::config::security_config::Claims;
use crate::error::ApiError;
use crate::models::dtos::PageQuery;
use crate::models::entities::AuditRecord;
use crate::models::AppState;
use crate::schema::audit_records;
use axum::extract::{Query, State};
use axum::{Extension, Json};
use diesel::prelude::*;
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/api/audit_records",
    params(PageQuery),
    responses(
        (status = 200, description = "Paginated audit trail for the caller's clinic"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearerAuth" = [])),
    tag = "Audit"
)]
pub async fn list_audit_records(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<PageQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let clinic_id = claims.clinic_id()?;
    let limit = query.size.unwrap_or(20).clamp(1, 100);
    let offset = (query.page.unwrap_or(1).max(1) - 1) * limit;

    let mut conn = state
        .db
        .get()
        .map_err(|e| ApiError::DatabaseConnection(e.to_string()))?;

    let records: Vec<AuditRecord> = audit_records::table
        .filter(audit_records::clinic_id.eq(clinic_id))
        .order(audit_records::created_at.desc())
        .limit(limit)
        .offset(offset)
        .select(AuditRecord::as_select())
        .load(&mut conn)?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": records,
        "page": query.page.unwrap_or(1),
        "limit": limit
    })))
}
