//! Bearer token store. Tokens are opaque strings validated per-request;
//! logout deletes only the presented token.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::instrument;

use crate::models::Patient;

#[instrument(skip(pool, token))]
pub async fn issue(pool: &SqlitePool, patient_id: i64, token: &str) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO access_tokens (patient_id, token, created_at) VALUES (?, ?, ?)")
        .bind(patient_id)
        .bind(token)
        .bind(Utc::now())
        .execute(pool)
        .await?;
    Ok(())
}

/// Resolve a presented token to its patient, touching `last_used_at`.
#[instrument(skip(pool, token))]
pub async fn authenticate(
    pool: &SqlitePool,
    token: &str,
) -> Result<Option<Patient>, sqlx::Error> {
    let patient = sqlx::query_as::<_, Patient>(
        "SELECT p.* FROM patients p
         INNER JOIN access_tokens t ON t.patient_id = p.id
         WHERE t.token = ?",
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    if patient.is_some() {
        sqlx::query("UPDATE access_tokens SET last_used_at = ? WHERE token = ?")
            .bind(Utc::now())
            .bind(token)
            .execute(pool)
            .await?;
    }

    Ok(patient)
}

#[instrument(skip(pool, token))]
pub async fn revoke(pool: &SqlitePool, token: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM access_tokens WHERE token = ?")
        .bind(token)
        .execute(pool)
        .await?;
    Ok(())
}
