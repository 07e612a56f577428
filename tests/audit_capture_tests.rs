mod common;

use axum_test::TestServer;
use common::{
    count_all_audit_records, create_test_app, create_test_app_state, prepare_database,
    register_clinic, wait_for_audit_records,
};
use http::StatusCode;
use serde_json::json;
use serial_test::serial;
use std::time::Duration;
use uuid::Uuid;

#[tokio::test]
#[serial]
async fn successful_create_leaves_exactly_one_create_record() {
    let state = create_test_app_state();
    if !prepare_database(&state) {
        eprintln!("skipping: test database unavailable");
        return;
    }
    let server = TestServer::new(create_test_app(state.clone())).unwrap();
    let (token, clinic_id) = register_clinic(&server, "audit_create").await;

    let response = server
        .post("/api/patients")
        .authorization_bearer(&token)
        .json(&json!({"first_name": "Ada", "last_name": "Obi"}))
        .await;
    response.assert_status(StatusCode::CREATED);
    let patient: serde_json::Value = response.json();

    assert!(!wait_for_audit_records(&state, clinic_id, "Patient", "create")
        .await
        .is_empty());
    // give a straggler write a chance to show up before asserting "exactly one"
    tokio::time::sleep(Duration::from_millis(150)).await;
    let records = common::load_audit_records(&state, clinic_id, "Patient", "create");
    assert_eq!(records.len(), 1, "expected exactly one create record");

    let record = &records[0];
    assert_eq!(record.resource_id.as_deref(), patient["id"].as_str());
    assert!(record.before.is_none());
    let after = record.after.as_ref().expect("after snapshot");
    assert_eq!(after["first_name"], "Ada");
    assert!(record.changes.is_none(), "creates carry no changes");
}

#[tokio::test]
#[serial]
async fn update_records_field_level_diff_with_path_id() {
    let state = create_test_app_state();
    if !prepare_database(&state) {
        eprintln!("skipping: test database unavailable");
        return;
    }
    let server = TestServer::new(create_test_app(state.clone())).unwrap();
    let (token, clinic_id) = register_clinic(&server, "audit_update").await;

    let created: serde_json::Value = server
        .post("/api/patients")
        .authorization_bearer(&token)
        .json(&json!({"first_name": "Ada", "last_name": "Obi", "phone": "0800"}))
        .await
        .json();
    let id = created["id"].as_str().unwrap().to_string();

    let response = server
        .put(&format!("/api/patients/{}", id))
        .authorization_bearer(&token)
        .json(&json!({"first_name": "Ada", "last_name": "Okafor", "phone": "0800"}))
        .await;
    response.assert_status_ok();

    let records = wait_for_audit_records(&state, clinic_id, "Patient", "update").await;
    assert_eq!(records.len(), 1);
    let record = &records[0];

    // path parameter id wins over (and here equals) the body identifier
    assert_eq!(record.resource_id.as_deref(), Some(id.as_str()));
    assert!(record.before.is_some());
    assert!(record.after.is_some());

    let changes = record.changes.as_ref().expect("changes expected");
    let changes = changes.as_array().expect("changes is a list");
    let changed_fields: Vec<&str> = changes
        .iter()
        .map(|c| c["field"].as_str().unwrap())
        .collect();
    assert!(changed_fields.contains(&"last_name"));
    assert!(!changed_fields.contains(&"first_name"), "unchanged field reported");
    assert!(!changed_fields.contains(&"phone"), "unchanged field reported");
    assert!(!changed_fields.contains(&"updated_at"), "meta field reported");

    let last_name = changes
        .iter()
        .find(|c| c["field"] == "last_name")
        .expect("last_name change");
    assert_eq!(last_name["old_value"], "Obi");
    assert_eq!(last_name["new_value"], "Okafor");
}

#[tokio::test]
#[serial]
async fn delete_records_before_snapshot() {
    let state = create_test_app_state();
    if !prepare_database(&state) {
        eprintln!("skipping: test database unavailable");
        return;
    }
    let server = TestServer::new(create_test_app(state.clone())).unwrap();
    let (token, clinic_id) = register_clinic(&server, "audit_delete").await;

    let created: serde_json::Value = server
        .post("/api/patients")
        .authorization_bearer(&token)
        .json(&json!({"first_name": "Ada", "last_name": "Obi"}))
        .await
        .json();
    let id = created["id"].as_str().unwrap().to_string();

    let response = server
        .delete(&format!("/api/patients/{}", id))
        .authorization_bearer(&token)
        .await;
    response.assert_status_ok();

    let records = wait_for_audit_records(&state, clinic_id, "Patient", "delete").await;
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.resource_id.as_deref(), Some(id.as_str()));
    let before = record.before.as_ref().expect("before snapshot");
    assert_eq!(before["first_name"], "Ada");
}

#[tokio::test]
#[serial]
async fn reads_record_view_actions() {
    let state = create_test_app_state();
    if !prepare_database(&state) {
        eprintln!("skipping: test database unavailable");
        return;
    }
    let server = TestServer::new(create_test_app(state.clone())).unwrap();
    let (token, clinic_id) = register_clinic(&server, "audit_view").await;

    let created: serde_json::Value = server
        .post("/api/patients")
        .authorization_bearer(&token)
        .json(&json!({"first_name": "Ada", "last_name": "Obi"}))
        .await
        .json();
    let id = created["id"].as_str().unwrap().to_string();

    server
        .get(&format!("/api/patients/{}", id))
        .authorization_bearer(&token)
        .await
        .assert_status_ok();

    let records = wait_for_audit_records(&state, clinic_id, "Patient", "view").await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].resource_id.as_deref(), Some(id.as_str()));
}

#[tokio::test]
#[serial]
async fn unauthenticated_requests_leave_no_records() {
    let state = create_test_app_state();
    if !prepare_database(&state) {
        eprintln!("skipping: test database unavailable");
        return;
    }
    let server = TestServer::new(create_test_app(state.clone())).unwrap();

    let response = server
        .post("/api/patients")
        .json(&json!({"first_name": "Ada", "last_name": "Obi"}))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(count_all_audit_records(&state), 0);
}

#[tokio::test]
#[serial]
async fn non_2xx_responses_leave_no_records() {
    let state = create_test_app_state();
    if !prepare_database(&state) {
        eprintln!("skipping: test database unavailable");
        return;
    }
    let server = TestServer::new(create_test_app(state.clone())).unwrap();
    let (token, clinic_id) = register_clinic(&server, "audit_404").await;

    let response = server
        .get(&format!("/api/patients/{}", Uuid::new_v4()))
        .authorization_bearer(&token)
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    tokio::time::sleep(Duration::from_millis(200)).await;
    let records = common::load_audit_records(&state, clinic_id, "Patient", "view");
    assert!(records.is_empty(), "404 must not be audited");
}

#[tokio::test]
#[serial]
async fn reading_the_trail_does_not_grow_the_trail() {
    let state = create_test_app_state();
    if !prepare_database(&state) {
        eprintln!("skipping: test database unavailable");
        return;
    }
    let server = TestServer::new(create_test_app(state.clone())).unwrap();
    let (token, _clinic_id) = register_clinic(&server, "audit_trail").await;

    let baseline = count_all_audit_records(&state);
    server
        .get("/api/audit_records")
        .authorization_bearer(&token)
        .await
        .assert_status_ok();

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(count_all_audit_records(&state), baseline);
}

#[tokio::test]
#[serial]
async fn trail_pagination_survives_degenerate_sizes() {
    let state = create_test_app_state();
    if !prepare_database(&state) {
        eprintln!("skipping: test database unavailable");
        return;
    }
    let server = TestServer::new(create_test_app(state.clone())).unwrap();
    let (token, _clinic_id) = register_clinic(&server, "audit_page").await;

    for query in ["size=-1", "size=0&page=0", "size=100000", "page=-5"] {
        let response = server
            .get(&format!("/api/audit_records?{}", query))
            .authorization_bearer(&token)
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["status"], "success");
    }
}

#[tokio::test]
#[serial]
async fn appointment_mutations_use_their_own_label() {
    let state = create_test_app_state();
    if !prepare_database(&state) {
        eprintln!("skipping: test database unavailable");
        return;
    }
    let server = TestServer::new(create_test_app(state.clone())).unwrap();
    let (token, clinic_id) = register_clinic(&server, "audit_appt").await;

    let patient: serde_json::Value = server
        .post("/api/patients")
        .authorization_bearer(&token)
        .json(&json!({"first_name": "Ada", "last_name": "Obi"}))
        .await
        .json();

    let response = server
        .post("/api/appointments")
        .authorization_bearer(&token)
        .json(&json!({
            "patient_id": patient["id"],
            "scheduled_at": "2026-09-15T10:00:00Z",
            "duration_minutes": 30,
            "reason": "annual check-up"
        }))
        .await;
    response.assert_status(StatusCode::CREATED);

    let records = wait_for_audit_records(&state, clinic_id, "Appointment", "create").await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].resource_type, "Appointment");
}
