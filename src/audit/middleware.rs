use crate::audit::{diff, snapshot, AuditAction, AuditContext};
use crate::config::security_config::Claims;
use crate::error::ApiError;
use crate::models::entities::NewAuditRecord;
use crate::models::AppState;
use crate::schema::audit_records;
use axum::body::{to_bytes, Body, Bytes, HttpBody};
use axum::extract::{RawPathParams, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use diesel::prelude::*;
use http::HeaderMap;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, warn};
use uuid::Uuid;

/// Clinic payloads are JSON documents; anything bigger than this is not a
/// resource we can meaningfully snapshot.
const BODY_CAPTURE_LIMIT: usize = 4 * 1024 * 1024;

/// A body is only buffered when its size hint proves it fits the capture
/// limit. Unknown-length (streaming) bodies are left alone: once a stream
/// is partially consumed the original can no longer be forwarded, and the
/// primary exchange always outranks the audit copy.
fn exceeds_capture_limit(body: &Body) -> bool {
    HttpBody::size_hint(body)
        .upper()
        .map_or(true, |upper| upper > BODY_CAPTURE_LIMIT as u64)
}

/// Wraps a request/response cycle for one resource type so that, on
/// successful completion, a durable audit record describes what changed.
///
/// Entry: derives the action from the method and stores defensive copies of
/// body, path params and query in an [`AuditContext`] extension, then (for
/// updates/deletes with an `{id}` path param) snapshots the resource before
/// the handler mutates it. Exit: if the response is 2xx and an
/// authenticated actor is present, builds the record synchronously and
/// hands the insert to a detached task. The caller always receives exactly
/// the response the handler produced; no failure in here may change that.
pub async fn audit_capture(
    State(state): State<Arc<AppState>>,
    params: RawPathParams,
    resource_type: &'static str,
    req: Request,
    next: Next,
) -> Response {
    // Methods outside the action table are not audited at all.
    let Some(action) = AuditAction::from_method(req.method()) else {
        return next.run(req).await;
    };

    let path_params = params
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let query = req.uri().query().map(str::to_string);
    let ip_address = client_ip(req.headers());
    let user_agent = req
        .headers()
        .get(http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    // Buffer the body so an owned copy survives handler-side consumption,
    // then hand the handler an equivalent body. Oversized or unknown-length
    // bodies are not captured; the handler gets the original untouched.
    let (request_body, mut req) = if exceeds_capture_limit(req.body()) {
        warn!(resource_type, "audit: request body too large to capture");
        (Bytes::new(), req)
    } else {
        let (parts, body) = req.into_parts();
        match to_bytes(body, BODY_CAPTURE_LIMIT).await {
            Ok(bytes) => {
                let req = Request::from_parts(parts, Body::from(bytes.clone()));
                (bytes, req)
            }
            Err(e) => {
                // within-hint reads only fail when the transport already
                // broke; the handler sees the same broken request either way
                warn!(resource_type, "audit: request body not captured: {}", e);
                (Bytes::new(), Request::from_parts(parts, Body::empty()))
            }
        }
    };

    let ctx = AuditContext {
        resource_type,
        action,
        path_params,
        query,
        request_body,
    };
    req.extensions_mut().insert(ctx.clone());

    let claims = req.extensions().get::<Claims>().cloned();

    // Pre-mutation snapshot. Every failure here degrades to "no before
    // state"; the request must proceed untouched.
    let before = capture_before_state(&state, &ctx, claims.as_ref());

    let response = next.run(req).await;

    // Guards: only successful responses from an authenticated actor leave
    // a trail.
    if !response.status().is_success() {
        return response;
    }
    let Some(claims) = claims else {
        return response;
    };
    let (Ok(performed_by), Ok(clinic_id)) = (claims.staff_id(), claims.clinic_id()) else {
        warn!(resource_type, "audit: malformed actor claims, skipping");
        return response;
    };

    // Buffer the response payload, then rebuild the response byte-identical.
    // A payload too large (or too opaque) to capture is forwarded untouched
    // and simply goes unaudited.
    if exceeds_capture_limit(response.body()) {
        warn!(resource_type, "audit: response body too large to capture, skipping record");
        return response;
    }
    let (parts, body) = response.into_parts();
    let response_body = match to_bytes(body, BODY_CAPTURE_LIMIT).await {
        Ok(bytes) => bytes,
        Err(e) => {
            // same transport-failure caveat as the request side
            error!(resource_type, "audit: response body not readable: {}", e);
            return Response::from_parts(parts, Body::empty());
        }
    };
    let response = Response::from_parts(parts, Body::from(response_body.clone()));

    debug!(
        resource_type,
        action = %ctx.action,
        request_bytes = ctx.request_body.len(),
        query = ctx.query.as_deref().unwrap_or(""),
        "audit capture"
    );

    let record = build_record(
        &ctx,
        performed_by,
        clinic_id,
        before,
        &response_body,
        ip_address,
        user_agent,
    );

    // Fire-and-forget: the write races the response and its outcome is
    // only ever visible in the server log.
    tokio::spawn(async move {
        if let Err(e) = persist(&state, record) {
            error!(resource_type, "audit: failed to persist record: {}", e);
        }
    });

    response
}

fn capture_before_state(
    state: &AppState,
    ctx: &AuditContext,
    claims: Option<&Claims>,
) -> Option<Value> {
    if !ctx.action.captures_before_state() {
        return None;
    }
    let clinic_id = claims.and_then(|c| c.clinic_id().ok())?;
    let id = ctx
        .path_params
        .get("id")
        .and_then(|raw| Uuid::parse_str(raw).ok())?;

    match snapshot::fetch_before_state(state, ctx.resource_type, id, clinic_id) {
        Ok(snap) => snap,
        Err(e) => {
            warn!(
                resource_type = ctx.resource_type,
                %id,
                "audit: before-state lookup failed: {}", e
            );
            None
        }
    }
}

/// Pure record construction: id resolution, after-snapshot parsing and
/// diffing. Kept free of I/O so the contract is unit-testable.
fn build_record(
    ctx: &AuditContext,
    performed_by: Uuid,
    clinic_id: Uuid,
    before: Option<Value>,
    response_body: &[u8],
    ip_address: Option<String>,
    user_agent: Option<String>,
) -> NewAuditRecord {
    let after = parse_after(response_body);

    // Path parameter wins over a response-body identifier.
    let resource_id = ctx
        .path_params
        .get("id")
        .cloned()
        .or_else(|| after.as_ref().and_then(body_identifier));

    let changes = match (&before, &after) {
        (Some(before), Some(after)) => {
            let list = diff::compute_changes(before, after);
            if list.is_empty() {
                None
            } else {
                serde_json::to_value(list).ok()
            }
        }
        _ => None,
    };

    NewAuditRecord {
        id: Uuid::new_v4(),
        clinic_id,
        resource_type: ctx.resource_type.to_string(),
        resource_id,
        action: ctx.action.as_str().to_string(),
        performed_by,
        before,
        after,
        changes,
        ip_address,
        user_agent,
    }
}

/// The response payload as the after-snapshot: parsed JSON when possible,
/// the raw text otherwise, nothing for an empty body.
fn parse_after(body: &[u8]) -> Option<Value> {
    if body.is_empty() {
        return None;
    }
    match serde_json::from_slice(body) {
        Ok(value) => Some(value),
        Err(_) => Some(Value::String(String::from_utf8_lossy(body).into_owned())),
    }
}

fn body_identifier(after: &Value) -> Option<String> {
    match after.get("id") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        })
}

fn persist(state: &AppState, record: NewAuditRecord) -> Result<(), ApiError> {
    let mut conn = state
        .db
        .get()
        .map_err(|e| ApiError::DatabaseConnection(e.to_string()))?;
    diesel::insert_into(audit_records::table)
        .values(&record)
        .execute(&mut conn)
        .map_err(ApiError::Database)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn ctx(action: AuditAction, path_id: Option<&str>) -> AuditContext {
        let mut path_params = HashMap::new();
        if let Some(id) = path_id {
            path_params.insert("id".to_string(), id.to_string());
        }
        AuditContext {
            resource_type: "Patient",
            action,
            path_params,
            query: None,
            request_body: Bytes::new(),
        }
    }

    fn build(ctx: &AuditContext, before: Option<Value>, body: &[u8]) -> NewAuditRecord {
        build_record(
            ctx,
            Uuid::new_v4(),
            Uuid::new_v4(),
            before,
            body,
            Some("10.0.0.1".to_string()),
            Some("test-agent".to_string()),
        )
    }

    #[test]
    fn action_is_persisted_from_the_method_mapping() {
        for (action, expected) in [
            (AuditAction::Create, "create"),
            (AuditAction::Update, "update"),
            (AuditAction::Delete, "delete"),
            (AuditAction::View, "view"),
        ] {
            let record = build(&ctx(action, None), None, b"{}");
            assert_eq!(record.action, expected);
        }
    }

    #[test]
    fn path_parameter_wins_over_body_identifier() {
        let record = build(
            &ctx(AuditAction::Update, Some("path-id")),
            None,
            br#"{"id": "body-id"}"#,
        );
        assert_eq!(record.resource_id.as_deref(), Some("path-id"));
    }

    #[test]
    fn body_identifier_used_when_no_path_parameter() {
        let record = build(&ctx(AuditAction::Create, None), None, br#"{"id": "body-id"}"#);
        assert_eq!(record.resource_id.as_deref(), Some("body-id"));
    }

    #[test]
    fn create_without_before_has_after_but_no_changes() {
        let record = build(
            &ctx(AuditAction::Create, None),
            None,
            br#"{"id": "p1", "name": "A"}"#,
        );
        assert!(record.before.is_none());
        assert_eq!(record.after, Some(json!({"id": "p1", "name": "A"})));
        assert!(record.changes.is_none());
    }

    #[test]
    fn update_with_both_snapshots_records_the_diff() {
        let before = json!({"id": "p1", "name": "A", "age": 30});
        let record = build(
            &ctx(AuditAction::Update, Some("p1")),
            Some(before),
            br#"{"id": "p1", "name": "B", "age": 30}"#,
        );
        let changes = record.changes.expect("changes expected");
        assert_eq!(
            changes,
            json!([{"field": "name", "old_value": "A", "new_value": "B"}])
        );
    }

    #[test]
    fn unchanged_snapshots_omit_changes() {
        let before = json!({"id": "p1", "name": "A"});
        let record = build(
            &ctx(AuditAction::Update, Some("p1")),
            Some(before),
            br#"{"id": "p1", "name": "A"}"#,
        );
        assert!(record.changes.is_none());
    }

    #[test]
    fn empty_response_body_leaves_after_and_changes_absent() {
        let before = json!({"id": "p1", "name": "A"});
        let record = build(&ctx(AuditAction::Delete, Some("p1")), Some(before), b"");
        assert!(record.after.is_none());
        assert!(record.changes.is_none());
        assert!(record.before.is_some());
    }

    #[test]
    fn non_json_response_body_is_kept_as_raw_text() {
        let record = build(&ctx(AuditAction::View, None), None, b"plain text payload");
        assert_eq!(record.after, Some(json!("plain text payload")));
    }

    #[test]
    fn provenance_metadata_is_carried() {
        let record = build(&ctx(AuditAction::Create, None), None, b"{}");
        assert_eq!(record.ip_address.as_deref(), Some("10.0.0.1"));
        assert_eq!(record.user_agent.as_deref(), Some("test-agent"));
    }

    #[test]
    fn forwarded_header_beats_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.9, 10.0.0.2".parse().unwrap());
        headers.insert("x-real-ip", "10.0.0.3".parse().unwrap());
        assert_eq!(client_ip(&headers).as_deref(), Some("203.0.113.9"));

        headers.remove("x-forwarded-for");
        assert_eq!(client_ip(&headers).as_deref(), Some("10.0.0.3"));
    }
}
