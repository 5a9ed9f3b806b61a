use anyhow::Result;

use super::schema::Database;
use super::types::{DiscoveryCacheDbRow, DiscoveryCacheRow, NewDiscoveryCacheEntry};
use crate::util::hash_string;

impl Database {
    // ========================================================================
    // Discovery Cache Operations
    // ========================================================================

    /// Look up the cache row for an origin, fresh or not.
    ///
    /// Freshness (`expires_at`) is the caller's concern: a stale row still
    /// carries the previous `created_at` and error context.
    pub async fn get_discovery_cache(&self, origin: &str) -> Result<Option<DiscoveryCacheRow>> {
        let row: Option<DiscoveryCacheDbRow> = sqlx::query_as(
            r#"
            SELECT id, source_origin, source_url, candidates_json, status,
                   last_error, checked_at, expires_at, created_at, updated_at
            FROM discovery_cache
            WHERE source_origin = ?
        "#,
        )
        .bind(origin)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(DiscoveryCacheDbRow::into_row))
    }

    /// Insert or supersede the cache row for an origin.
    ///
    /// Keyed on the UNIQUE `source_origin`; `created_at` survives updates,
    /// everything else reflects the latest run. Concurrent writers for the
    /// same origin derive equivalent state, so last-writer-wins is fine.
    pub async fn upsert_discovery_cache(&self, entry: &NewDiscoveryCacheEntry<'_>) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        let id = hash_string(entry.source_origin);

        sqlx::query(
            r#"
            INSERT INTO discovery_cache
                (id, source_origin, source_url, candidates_json, status,
                 last_error, checked_at, expires_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(source_origin) DO UPDATE SET
                source_url = excluded.source_url,
                candidates_json = excluded.candidates_json,
                status = excluded.status,
                last_error = excluded.last_error,
                checked_at = excluded.checked_at,
                expires_at = excluded.expires_at,
                updated_at = excluded.updated_at
        "#,
        )
        .bind(&id)
        .bind(entry.source_origin)
        .bind(entry.source_url)
        .bind(entry.candidates_json)
        .bind(entry.status.as_str())
        .bind(entry.last_error)
        .bind(entry.checked_at)
        .bind(entry.expires_at)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Delete all expired cache rows, returning the number evicted.
    ///
    /// The engine itself never deletes rows; this is housekeeping offered
    /// to the owning service.
    pub async fn evict_expired_discovery_cache(&self) -> Result<u64> {
        let now = chrono::Utc::now().timestamp();
        let result = sqlx::query("DELETE FROM discovery_cache WHERE expires_at < ?")
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
