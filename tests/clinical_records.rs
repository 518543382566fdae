//! Clinical record tests: crises, prescriptions with their status
//! transitions, hospitalizations with discharge, exams with result
//! recording, treatments, and the patient soft delete.

mod common;

use actix_web::http::StatusCode;
use actix_web::{test, App};
use serde_json::{json, Value};

use asthmacare::api;

macro_rules! app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data($state.clone())
                .app_data(api::json_config())
                .configure(api::configure),
        )
        .await
    };
}

macro_rules! post_json {
    ($app:expr, $uri:expr, $token:expr, $payload:expr) => {{
        let req = test::TestRequest::post()
            .uri($uri)
            .insert_header(common::bearer($token))
            .set_json($payload)
            .to_request();
        test::call_service(&$app, req).await
    }};
}

macro_rules! get_json {
    ($app:expr, $uri:expr, $token:expr) => {{
        let req = test::TestRequest::get()
            .uri($uri)
            .insert_header(common::bearer($token))
            .to_request();
        test::call_service(&$app, req).await
    }};
}

async fn register(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
    >,
    phone: &str,
) -> (i64, String) {
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(common::register_payload(phone, "1234"))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(app, req).await).await;
    (
        body["data"]["patient"]["id"].as_i64().unwrap(),
        body["data"]["token"].as_str().unwrap().to_owned(),
    )
}

#[actix_web::test]
async fn crisis_lifecycle() {
    let (state, _) = common::state().await;
    let app = app!(state);
    let (patient_id, token) = register(&app, "771234567").await;

    // Unknown patient is a validation failure, not a 404.
    let resp = post_json!(
        app,
        "/api/crises",
        &token,
        json!({
            "patient_id": 999,
            "started_at": "2026-03-01T08:00:00Z",
            "intensity": "severe",
            "symptoms": "Wheezing, shortness of breath",
        })
    );
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let resp = post_json!(
        app,
        "/api/crises",
        &token,
        json!({
            "patient_id": patient_id,
            "started_at": "2026-03-01T08:00:00Z",
            "intensity": "severe",
            "symptoms": "Wheezing, shortness of breath",
            "triggers": "Dust exposure",
        })
    );
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let crisis_id = body["data"]["id"].as_i64().unwrap();
    // No end timestamp: still ongoing.
    assert_eq!(body["data"]["status"], "ongoing");

    // Closing the crisis via update.
    let req = test::TestRequest::put()
        .uri(&format!("/api/crises/{}", crisis_id))
        .insert_header(common::bearer(&token))
        .set_json(json!({ "ended_at": "2026-03-01T11:00:00Z", "status": "completed" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["status"], "completed");

    // End before start is rejected.
    let req = test::TestRequest::put()
        .uri(&format!("/api/crises/{}", crisis_id))
        .insert_header(common::bearer(&token))
        .set_json(json!({ "ended_at": "2026-02-28T11:00:00Z" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNPROCESSABLE_ENTITY
    );

    let resp = get_json!(app, &format!("/api/crises?patient_id={}", patient_id), &token);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn prescription_status_transitions() {
    let (state, _) = common::state().await;
    let app = app!(state);
    let (patient_id, token) = register(&app, "771234567").await;

    let resp = post_json!(
        app,
        "/api/prescription-types",
        &token,
        json!({ "code": "ORD-MED", "name": "Medication order", "category": "pharmacy", "kind": "medicament" })
    );
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let type_id = body["data"]["id"].as_i64().unwrap();

    let resp = post_json!(
        app,
        "/api/prescriptions",
        &token,
        json!({
            "patient_id": patient_id,
            "prescription_type_id": type_id,
            "prescribing_doctor": "Dr. Ndiaye",
            "dosage": "2 puffs",
            "frequency": "twice daily",
        })
    );
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let rx_id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["status"], "active");

    // Suspension needs a reason.
    let resp = post_json!(
        app,
        &format!("/api/prescriptions/{}/suspend", rx_id),
        &token,
        json!({ "reason": "" })
    );
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let resp = post_json!(
        app,
        &format!("/api/prescriptions/{}/suspend", rx_id),
        &token,
        json!({ "reason": "Adverse reaction reported" })
    );
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["status"], "suspended");
    assert_eq!(body["data"]["suspension_reason"], "Adverse reaction reported");

    // Suspending twice is rejected.
    let resp = post_json!(
        app,
        &format!("/api/prescriptions/{}/suspend", rx_id),
        &token,
        json!({ "reason": "again" })
    );
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri(&format!("/api/prescriptions/{}/reactivate", rx_id))
        .insert_header(common::bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["status"], "active");
    assert!(body["data"]["suspension_reason"].is_null());

    let resp = post_json!(
        app,
        &format!("/api/prescriptions/{}/terminate", rx_id),
        &token,
        json!({ "end_date": "2026-04-01T00:00:00Z" })
    );
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["status"], "completed");
    assert!(body["data"]["end_date"].is_string());

    // Terminating a completed prescription is rejected.
    let resp = post_json!(
        app,
        &format!("/api/prescriptions/{}/terminate", rx_id),
        &token,
        json!({ "end_date": "2026-04-02T00:00:00Z" })
    );
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn hospitalization_discharge_freezes_length_of_stay() {
    let (state, _) = common::state().await;
    let app = app!(state);
    let (patient_id, token) = register(&app, "771234567").await;

    let resp = post_json!(
        app,
        "/api/hospitalizations",
        &token,
        json!({
            "patient_id": patient_id,
            "reason": "Severe asthma exacerbation",
            "start_date": "2026-03-01T08:00:00Z",
            "severity": "severe",
            "department": "Pneumology",
        })
    );
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let stay_id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["status"], "ongoing");
    assert!(body["data"]["length_of_stay_days"].is_i64());

    // Discharge before admission is rejected.
    let resp = post_json!(
        app,
        &format!("/api/hospitalizations/{}/terminate", stay_id),
        &token,
        json!({ "end_date": "2026-02-28T10:00:00Z" })
    );
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let resp = post_json!(
        app,
        &format!("/api/hospitalizations/{}/terminate", stay_id),
        &token,
        json!({ "end_date": "2026-03-06T10:00:00Z", "discharge_notes": "Stable on discharge" })
    );
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["status"], "completed");
    assert_eq!(body["data"]["length_of_stay_days"], 5);
    assert_eq!(body["data"]["discharge_notes"], "Stable on discharge");

    // A completed stay cannot be discharged again.
    let resp = post_json!(
        app,
        &format!("/api/hospitalizations/{}/terminate", stay_id),
        &token,
        json!({ "end_date": "2026-03-07T10:00:00Z" })
    );
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn exam_results_complete_the_exam() {
    let (state, _) = common::state().await;
    let app = app!(state);
    let (patient_id, token) = register(&app, "771234567").await;

    let resp = post_json!(
        app,
        "/api/exam-types",
        &token,
        json!({ "code": "SPIRO", "name": "Spirometry", "category": "respiratory" })
    );
    let body: Value = test::read_body_json(resp).await;
    let type_id = body["data"]["id"].as_i64().unwrap();

    let resp = post_json!(
        app,
        "/api/exams",
        &token,
        json!({
            "patient_id": patient_id,
            "exam_type_id": type_id,
            "exam_date": "2026-03-05T09:00:00Z",
            "urgent": true,
        })
    );
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let exam_id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["status"], "scheduled");
    assert!(body["data"]["results"].is_null());

    // Results cannot predate the exam itself.
    let resp = post_json!(
        app,
        &format!("/api/exams/{}/results", exam_id),
        &token,
        json!({ "results": "early entry", "result_date": "2026-02-24T09:00:00Z" })
    );
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["errors"]["result_date"].is_array());

    let resp = post_json!(
        app,
        &format!("/api/exams/{}/results", exam_id),
        &token,
        json!({
            "results": "FEV1 at 65% of predicted",
            "interpretation": "Moderate obstruction",
            "performing_technician": "A. Sow",
            "result_date": "2026-03-05T11:30:00Z",
        })
    );
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["status"], "completed");
    assert_eq!(body["data"]["results"], "FEV1 at 65% of predicted");
    assert!(body["data"]["result_date"].is_string());

    // Rescheduling past the recorded result date is rejected.
    let req = test::TestRequest::put()
        .uri(&format!("/api/exams/{}", exam_id))
        .insert_header(common::bearer(&token))
        .set_json(json!({ "exam_date": "2026-03-07T09:00:00Z" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["errors"]["exam_date"].is_array());

    // Results cannot land on a cancelled exam.
    let req = test::TestRequest::put()
        .uri(&format!("/api/exams/{}", exam_id))
        .insert_header(common::bearer(&token))
        .set_json(json!({ "status": "cancelled" }))
        .to_request();
    test::call_service(&app, req).await;
    let resp = post_json!(
        app,
        &format!("/api/exams/{}/results", exam_id),
        &token,
        json!({ "results": "late entry", "result_date": "2026-03-06T09:00:00Z" })
    );
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn treatment_requires_valid_references() {
    let (state, _) = common::state().await;
    let app = app!(state);
    let (patient_id, token) = register(&app, "771234567").await;

    let resp = post_json!(app, "/api/categories", &token, common::category_payload("Bronchodilators"));
    let body: Value = test::read_body_json(resp).await;
    let category_id = body["data"]["id"].as_i64().unwrap();

    let resp = post_json!(
        app,
        "/api/medicaments",
        &token,
        common::medicament_payload("Salbutamol", category_id)
    );
    let body: Value = test::read_body_json(resp).await;
    let medicament_id = body["data"]["id"].as_i64().unwrap();

    // Unknown medicament.
    let resp = post_json!(
        app,
        "/api/treatments",
        &token,
        json!({
            "patient_id": patient_id,
            "medicament_id": 999,
            "dosage": "100 mcg",
            "frequency": "as needed",
            "kind": "rescue",
            "start_date": "2026-01-01",
        })
    );
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let resp = post_json!(
        app,
        "/api/treatments",
        &token,
        json!({
            "patient_id": patient_id,
            "medicament_id": medicament_id,
            "dosage": "100 mcg",
            "frequency": "as needed",
            "kind": "rescue",
            "start_date": "2026-01-01",
        })
    );
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["active"], true);

    // End date before start date.
    let resp = post_json!(
        app,
        "/api/treatments",
        &token,
        json!({
            "patient_id": patient_id,
            "medicament_id": medicament_id,
            "dosage": "100 mcg",
            "frequency": "daily",
            "kind": "preventive",
            "start_date": "2026-01-10",
            "end_date": "2026-01-05",
        })
    );
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn patient_delete_is_soft() {
    let (state, _) = common::state().await;
    let app = app!(state);
    let (_, token) = register(&app, "771234567").await;

    // A second patient record created through the roster endpoint.
    let resp = post_json!(
        app,
        "/api/patients",
        &token,
        common::register_payload("778888888", "4321")
    );
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let other_id = body["data"]["id"].as_i64().unwrap();

    let resp = get_json!(app, "/api/patients", &token);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/patients/{}", other_id))
        .insert_header(common::bearer(&token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    // Gone from the active roster, still readable by id.
    let resp = get_json!(app, "/api/patients", &token);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let resp = get_json!(app, &format!("/api/patients/{}", other_id), &token);
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["is_active_patient"], false);
}

#[actix_web::test]
async fn patient_search_filters_the_roster() {
    let (state, _) = common::state().await;
    let app = app!(state);
    let (_, token) = register(&app, "771234567").await;

    let mut payload = common::register_payload("778888888", "4321");
    payload["name"] = json!("Moussa");
    payload["last_name"] = json!("Fall");
    payload["asthma_severity"] = json!("severe");
    let resp = post_json!(app, "/api/patients", &token, payload);
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = get_json!(app, "/api/patients?search=Moussa", &token);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["name"], "Moussa");

    let resp = get_json!(app, "/api/patients?severity=severe", &token);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["asthma_severity"], "severe");
}
