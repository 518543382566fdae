//! Data models for the AsthmaCare API.
//!
//! Entities are plain structs hydrated from rows (`sqlx::FromRow`);
//! relations are typed identifiers, not object graphs. Derived attributes
//! (age, BMI, length of stay) are recomputed on read and never persisted.

pub mod catalog;
pub mod crisis;
pub mod exam;
pub mod hospitalization;
pub mod patient;
pub mod prescription;
pub mod treatment;

pub use catalog::{Category, ExamType, Medicament, PrescriptionType, PrescriptionTypeKind};
pub use crisis::Crisis;
pub use exam::{Exam, ExamStatus};
pub use hospitalization::{Hospitalization, HospitalizationSeverity, StayStatus};
pub use patient::{AsthmaSeverity, BmiCategory, Gender, Patient};
pub use prescription::{Prescription, PrescriptionStatus};
pub use treatment::{Treatment, TreatmentKind};
