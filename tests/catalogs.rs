//! Reference catalog tests: uniqueness rules, the in-use delete guards
//! and medicament search.

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

macro_rules! delete_req {
    ($app:expr, $uri:expr, $token:expr) => {{
        let req = test::TestRequest::delete()
            .uri($uri)
            .insert_header(common::bearer($token))
            .to_request();
        test::call_service(&$app, req).await
    }};
}

async fn auth_token(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
    >,
) -> (i64, String) {
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(common::register_payload("771234567", "1234"))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(app, req).await).await;
    (
        body["data"]["patient"]["id"].as_i64().unwrap(),
        body["data"]["token"].as_str().unwrap().to_owned(),
    )
}

#[actix_web::test]
async fn catalog_routes_require_authentication() {
    let (state, _) = common::state().await;
    let app = app!(state);

    let req = test::TestRequest::get().uri("/api/categories").to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[actix_web::test]
async fn category_names_are_unique() {
    let (state, _) = common::state().await;
    let app = app!(state);
    let (_, token) = auth_token(&app).await;

    let resp = post_json!(app, "/api/categories", &token, common::category_payload("Corticosteroids"));
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = post_json!(app, "/api/categories", &token, common::category_payload("Corticosteroids"));
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["errors"]["name"].is_array());
}

#[actix_web::test]
async fn category_with_medicaments_cannot_be_deleted() {
    let (state, _) = common::state().await;
    let app = app!(state);
    let (_, token) = auth_token(&app).await;

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

    let resp = delete_req!(app, &format!("/api/categories/{}", category_id), &token);
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Empty the category, then deletion goes through.
    let resp = delete_req!(app, &format!("/api/medicaments/{}", medicament_id), &token);
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = delete_req!(app, &format!("/api/categories/{}", category_id), &token);
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn medicament_in_use_cannot_be_deleted() {
    let (state, _) = common::state().await;
    let app = app!(state);
    let (patient_id, token) = auth_token(&app).await;

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
    let treatment_id = body["data"]["id"].as_i64().unwrap();

    let resp = delete_req!(app, &format!("/api/medicaments/{}", medicament_id), &token);
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);

    let resp = delete_req!(app, &format!("/api/treatments/{}", treatment_id), &token);
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = delete_req!(app, &format!("/api/medicaments/{}", medicament_id), &token);
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn medicament_search_requires_a_term() {
    let (state, _) = common::state().await;
    let app = app!(state);
    let (_, token) = auth_token(&app).await;

    let resp = post_json!(app, "/api/categories", &token, common::category_payload("Bronchodilators"));
    let body: Value = test::read_body_json(resp).await;
    let category_id = body["data"]["id"].as_i64().unwrap();

    post_json!(
        app,
        "/api/medicaments",
        &token,
        common::medicament_payload("Salbutamol", category_id)
    );
    let mut unavailable = common::medicament_payload("Terbutaline", category_id);
    unavailable["available"] = json!(false);
    post_json!(app, "/api/medicaments", &token, unavailable);

    let resp = get_json!(app, "/api/medicaments/search", &token);
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let resp = get_json!(app, "/api/medicaments/search?q=%20", &token);
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Matches by name, available entries only.
    let resp = get_json!(app, "/api/medicaments/search?q=salbu", &token);
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    // Matches by description too, but the unavailable one stays hidden.
    let resp = get_json!(app, "/api/medicaments/search?q=bronchodilator", &token);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["name"], "Salbutamol");
}

#[actix_web::test]
async fn exam_type_codes_are_unique_and_guarded() {
    let (state, _) = common::state().await;
    let app = app!(state);
    let (patient_id, token) = auth_token(&app).await;

    let resp = post_json!(
        app,
        "/api/exam-types",
        &token,
        json!({ "code": "SPIRO", "name": "Spirometry", "category": "respiratory" })
    );
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let type_id = body["data"]["id"].as_i64().unwrap();

    let resp = post_json!(
        app,
        "/api/exam-types",
        &token,
        json!({ "code": "SPIRO", "name": "Duplicate", "category": "respiratory" })
    );
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let resp = post_json!(
        app,
        "/api/exams",
        &token,
        json!({
            "patient_id": patient_id,
            "exam_type_id": type_id,
            "exam_date": "2026-03-05T09:00:00Z",
        })
    );
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = delete_req!(app, &format!("/api/exam-types/{}", type_id), &token);
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn prescription_type_in_use_cannot_be_deleted() {
    let (state, _) = common::state().await;
    let app = app!(state);
    let (patient_id, token) = auth_token(&app).await;

    let resp = post_json!(
        app,
        "/api/prescription-types",
        &token,
        json!({ "code": "ORD-MED", "name": "Medication order", "category": "pharmacy", "kind": "medicament" })
    );
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

    let resp = delete_req!(app, &format!("/api/prescription-types/{}", type_id), &token);
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn malformed_json_is_a_field_error() {
    let (state, _) = common::state().await;
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert!(body["errors"]["body"].is_array());
}
