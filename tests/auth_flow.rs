//! End-to-end authentication tests: registration, login, the lockout
//! state machine, PIN change/reset, profile and logout.

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

#[actix_web::test]
async fn registration_returns_token_and_defaults() {
    let (state, _) = common::state().await;
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(common::register_payload("771234567", "1234"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["token_type"], "Bearer");
    assert_eq!(body["data"]["token"].as_str().unwrap().len(), 64);

    let patient = &body["data"]["patient"];
    assert_eq!(patient["asthma_severity"], "moderate");
    assert_eq!(patient["phone_verified"], false);
    assert_eq!(patient["is_active_patient"], true);
    assert_eq!(patient["full_name"], "Awa Diop");
    // Credentials never leave the server.
    assert!(patient.get("pin").is_none());
    assert!(patient.get("pin_hash").is_none());
    assert!(patient.get("password_hash").is_none());
}

#[actix_web::test]
async fn registration_rejects_duplicate_phone() {
    let (state, _) = common::state().await;
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(common::register_payload("771234567", "1234"))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::CREATED
    );

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(common::register_payload("771234567", "5678"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["errors"]["phone"].is_array());
}

#[actix_web::test]
async fn registration_rejects_out_of_range_measurements() {
    let (state, _) = common::state().await;
    let app = app!(state);

    // Heights live in 50-300 cm, weights in 10-500 kg.
    let mut payload = common::register_payload("771234567", "1234");
    payload["height"] = json!(40.0);
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["errors"]["height"].is_array());

    let mut payload = common::register_payload("771234567", "1234");
    payload["weight"] = json!(5.0);
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["errors"]["weight"].is_array());
}

#[actix_web::test]
async fn registration_rejects_malformed_pin() {
    let (state, _) = common::state().await;
    let app = app!(state);

    for pin in ["123", "12345", "12a4", ""] {
        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(common::register_payload("771234567", pin))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}

#[actix_web::test]
async fn login_rejects_unknown_phone_without_detail() {
    let (state, _) = common::state().await;
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "phone": "770000000", "pin": "1234" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Incorrect phone number or PIN");
    // Unknown phone must look identical to a wrong PIN, minus the counter.
    assert!(body.get("attempts_remaining").is_none());
}

#[actix_web::test]
async fn lockout_engages_after_five_failures() {
    let (state, _) = common::state().await;
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(common::register_payload("771234567", "1234"))
        .to_request();
    test::call_service(&app, req).await;

    // Four failures count down; the fifth locks.
    for remaining in [4, 3, 2, 1] {
        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "phone": "771234567", "pin": "0000" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["attempts_remaining"], remaining);
    }

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "phone": "771234567", "pin": "0000" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::LOCKED);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["locked_until"].is_string());

    // The correct PIN does not bypass an active lock.
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "phone": "771234567", "pin": "1234" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::LOCKED
    );
}

#[actix_web::test]
async fn successful_login_resets_the_failure_counter() {
    let (state, _) = common::state().await;
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(common::register_payload("771234567", "1234"))
        .to_request();
    test::call_service(&app, req).await;

    for _ in 0..3 {
        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "phone": "771234567", "pin": "0000" }))
            .to_request();
        test::call_service(&app, req).await;
    }

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "phone": "771234567", "pin": "1234" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    // A fresh failure starts back at the full allowance.
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "phone": "771234567", "pin": "0000" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["attempts_remaining"], 4);
}

#[actix_web::test]
async fn profile_requires_a_valid_token() {
    let (state, _) = common::state().await;
    let app = app!(state);

    let req = test::TestRequest::get().uri("/api/auth/profile").to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let req = test::TestRequest::get()
        .uri("/api/auth/profile")
        .insert_header(common::bearer("not-a-real-token"))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[actix_web::test]
async fn profile_carries_derived_attributes() {
    let (state, _) = common::state().await;
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(common::register_payload("771234567", "1234"))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let token = body["data"]["token"].as_str().unwrap().to_owned();

    let req = test::TestRequest::get()
        .uri("/api/auth/profile")
        .insert_header(common::bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;

    // 70 kg at 170 cm.
    assert_eq!(body["data"]["bmi"], 24.22);
    assert_eq!(body["data"]["bmi_category"], "normal");
    assert!(body["data"]["age"].as_i64().unwrap() >= 35);
    assert!(body["data"]["emergency_contact"].is_object());
}

#[actix_web::test]
async fn change_pin_rotates_the_credential() {
    let (state, _) = common::state().await;
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(common::register_payload("771234567", "1234"))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let token = body["data"]["token"].as_str().unwrap().to_owned();

    // Wrong current PIN.
    let req = test::TestRequest::post()
        .uri("/api/auth/change-pin")
        .insert_header(common::bearer(&token))
        .set_json(json!({ "current_pin": "0000", "new_pin": "5678" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );

    // New PIN must differ.
    let req = test::TestRequest::post()
        .uri("/api/auth/change-pin")
        .insert_header(common::bearer(&token))
        .set_json(json!({ "current_pin": "1234", "new_pin": "1234" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNPROCESSABLE_ENTITY
    );

    let req = test::TestRequest::post()
        .uri("/api/auth/change-pin")
        .insert_header(common::bearer(&token))
        .set_json(json!({ "current_pin": "1234", "new_pin": "5678" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    // Old PIN is dead, new one works.
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "phone": "771234567", "pin": "1234" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "phone": "771234567", "pin": "5678" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_web::test]
async fn pin_reset_sends_sms_and_never_echoes_the_pin() {
    let (state, notifier) = common::state().await;
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(common::register_payload("771234567", "1234"))
        .to_request();
    test::call_service(&app, req).await;

    // Unknown phone.
    let req = test::TestRequest::post()
        .uri("/api/auth/reset-pin")
        .set_json(json!({ "phone": "770000000" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );

    let req = test::TestRequest::post()
        .uri("/api/auth/reset-pin")
        .set_json(json!({ "phone": "771234567" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let raw = test::read_body(resp).await;
    let text = String::from_utf8(raw.to_vec()).unwrap();

    let sent = notifier.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "771234567");
    let temp_pin: String = sent[0]
        .1
        .chars()
        .filter(|c| c.is_ascii_digit())
        .take(4)
        .collect();
    assert_eq!(temp_pin.len(), 4);
    assert!(!text.contains(&temp_pin), "temporary PIN leaked in response");
    drop(sent);

    // The old PIN no longer works; the temporary one does.
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "phone": "771234567", "pin": "1234" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let temp_pin: String = notifier.sent.lock().unwrap()[0]
        .1
        .chars()
        .filter(|c| c.is_ascii_digit())
        .take(4)
        .collect();
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "phone": "771234567", "pin": temp_pin }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_web::test]
async fn logout_revokes_only_the_presented_token() {
    let (state, _) = common::state().await;
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(common::register_payload("771234567", "1234"))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let first = body["data"]["token"].as_str().unwrap().to_owned();

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "phone": "771234567", "pin": "1234" }))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let second = body["data"]["token"].as_str().unwrap().to_owned();

    let req = test::TestRequest::post()
        .uri("/api/auth/logout")
        .insert_header(common::bearer(&first))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    // The revoked token is dead; the other session survives.
    let req = test::TestRequest::get()
        .uri("/api/auth/profile")
        .insert_header(common::bearer(&first))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );
    let req = test::TestRequest::get()
        .uri("/api/auth/profile")
        .insert_header(common::bearer(&second))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}
