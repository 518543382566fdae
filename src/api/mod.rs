//! API module for the AsthmaCare API.
//!
//! This module contains all API-related functionality: route wiring, the
//! authenticated-request extractor, the response envelope and the
//! per-resource handlers.

pub mod extractors;
pub mod handlers;
pub mod response;
pub mod routes;

pub use routes::{configure, json_config};
