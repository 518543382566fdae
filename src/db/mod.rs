//! Database module for the AsthmaCare API.
//!
//! This module handles the connection pool, schema initialization and the
//! per-entity query functions. Handlers never touch SQL directly; they go
//! through these functions and get plain model structs back.

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

pub mod catalogs;
pub mod crises;
pub mod exams;
pub mod hospitalizations;
pub mod patients;
pub mod prescriptions;
mod schema;
pub mod tokens;
pub mod treatments;

/// Database connection pool
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect and initialize the schema if needed.
    pub async fn connect(url: &str) -> Result<Self, sqlx::Error> {
        let pool = SqlitePoolOptions::new().connect(url).await?;
        schema::initialize(&pool).await?;
        Ok(Self { pool })
    }

    /// In-memory database for the test suites. A single connection keeps
    /// every query on the same memory store.
    pub async fn connect_in_memory() -> Result<Self, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        schema::initialize(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
