//! Shared setup for the integration suites: an in-memory database behind
//! the real application state, plus request payload builders.

#![allow(dead_code)]

use std::sync::Arc;

use actix_web::web;
use serde_json::{json, Value};

use asthmacare::db::Database;
use asthmacare::notify::testing::RecordingNotifier;
use asthmacare::AppState;

pub async fn state() -> (web::Data<AppState>, Arc<RecordingNotifier>) {
    let db = Database::connect_in_memory()
        .await
        .expect("in-memory database");
    let notifier = Arc::new(RecordingNotifier::default());
    let state = web::Data::new(AppState {
        db,
        notifier: notifier.clone(),
    });
    (state, notifier)
}

pub fn register_payload(phone: &str, pin: &str) -> Value {
    json!({
        "name": "Awa",
        "last_name": "Diop",
        "phone": phone,
        "pin": pin,
        "birth_date": "1990-06-15",
        "height": 170.0,
        "weight": 70.0,
    })
}

pub fn category_payload(name: &str) -> Value {
    json!({ "name": name, "description": "Inhaled corticosteroids" })
}

pub fn medicament_payload(name: &str, category_id: i64) -> Value {
    json!({
        "name": name,
        "description": "Short-acting bronchodilator",
        "category_id": category_id,
        "form": "inhaler",
    })
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}
