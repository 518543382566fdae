//! HTTP route wiring.
//!
//! The auth register/login/reset-pin endpoints are public; every other
//! route requires a bearer token via the [`AuthPatient`] extractor on its
//! handler.
//!
//! [`AuthPatient`]: crate::api::extractors::AuthPatient

use actix_web::web;

use crate::api::handlers::{
    auth, categories, crises, exam_types, exams, hospitalizations, medicaments, patients,
    prescription_types, prescriptions, treatments,
};
use crate::error::ApiError;

/// Body deserialization failures surface in the standard envelope instead
/// of actix's default error page.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| ApiError::field("body", &err.to_string()).into())
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(auth::register))
                    .route("/login", web::post().to(auth::login))
                    .route("/reset-pin", web::post().to(auth::request_pin_reset))
                    .route("/profile", web::get().to(auth::profile))
                    .route("/change-pin", web::post().to(auth::change_pin))
                    .route("/logout", web::post().to(auth::logout)),
            )
            .service(
                web::scope("/patients")
                    .route("", web::get().to(patients::index))
                    .route("", web::post().to(patients::store))
                    .route("/{id}", web::get().to(patients::show))
                    .route("/{id}", web::put().to(patients::update))
                    .route("/{id}", web::delete().to(patients::destroy)),
            )
            .service(
                web::scope("/crises")
                    .route("", web::get().to(crises::index))
                    .route("", web::post().to(crises::store))
                    .route("/{id}", web::get().to(crises::show))
                    .route("/{id}", web::put().to(crises::update))
                    .route("/{id}", web::delete().to(crises::destroy)),
            )
            .service(
                web::scope("/prescriptions")
                    .route("", web::get().to(prescriptions::index))
                    .route("", web::post().to(prescriptions::store))
                    .route("/{id}", web::get().to(prescriptions::show))
                    .route("/{id}", web::put().to(prescriptions::update))
                    .route("/{id}", web::delete().to(prescriptions::destroy))
                    .route("/{id}/suspend", web::post().to(prescriptions::suspend))
                    .route("/{id}/reactivate", web::post().to(prescriptions::reactivate))
                    .route("/{id}/terminate", web::post().to(prescriptions::terminate)),
            )
            .service(
                web::scope("/hospitalizations")
                    .route("", web::get().to(hospitalizations::index))
                    .route("", web::post().to(hospitalizations::store))
                    .route("/{id}", web::get().to(hospitalizations::show))
                    .route("/{id}", web::put().to(hospitalizations::update))
                    .route("/{id}", web::delete().to(hospitalizations::destroy))
                    .route("/{id}/terminate", web::post().to(hospitalizations::terminate)),
            )
            .service(
                web::scope("/exams")
                    .route("", web::get().to(exams::index))
                    .route("", web::post().to(exams::store))
                    .route("/{id}", web::get().to(exams::show))
                    .route("/{id}", web::put().to(exams::update))
                    .route("/{id}", web::delete().to(exams::destroy))
                    .route("/{id}/results", web::post().to(exams::record_results)),
            )
            .service(
                web::scope("/treatments")
                    .route("", web::get().to(treatments::index))
                    .route("", web::post().to(treatments::store))
                    .route("/{id}", web::get().to(treatments::show))
                    .route("/{id}", web::put().to(treatments::update))
                    .route("/{id}", web::delete().to(treatments::destroy)),
            )
            .service(
                web::scope("/medicaments")
                    .route("", web::get().to(medicaments::index))
                    .route("", web::post().to(medicaments::store))
                    .route("/search", web::get().to(medicaments::search))
                    .route("/{id}", web::get().to(medicaments::show))
                    .route("/{id}", web::put().to(medicaments::update))
                    .route("/{id}", web::delete().to(medicaments::destroy)),
            )
            .service(
                web::scope("/categories")
                    .route("", web::get().to(categories::index))
                    .route("", web::post().to(categories::store))
                    .route("/{id}", web::get().to(categories::show))
                    .route("/{id}", web::put().to(categories::update))
                    .route("/{id}", web::delete().to(categories::destroy))
                    .route("/{id}/medicaments", web::get().to(categories::medicaments)),
            )
            .service(
                web::scope("/exam-types")
                    .route("", web::get().to(exam_types::index))
                    .route("", web::post().to(exam_types::store))
                    .route("/{id}", web::get().to(exam_types::show))
                    .route("/{id}", web::put().to(exam_types::update))
                    .route("/{id}", web::delete().to(exam_types::destroy)),
            )
            .service(
                web::scope("/prescription-types")
                    .route("", web::get().to(prescription_types::index))
                    .route("", web::post().to(prescription_types::store))
                    .route("/{id}", web::get().to(prescription_types::show))
                    .route("/{id}", web::put().to(prescription_types::update))
                    .route("/{id}", web::delete().to(prescription_types::destroy)),
            ),
    );
}
