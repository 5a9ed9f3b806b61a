use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Database-specific errors with user-friendly messages
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Another process has the discovery store locked
    #[error("another process has the discovery store locked; close it and try again")]
    InstanceLocked,

    /// Migration failed
    #[error("database migration failed: {0}")]
    Migration(String),

    /// Generic database error
    #[error("database error: {0}")]
    Other(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Check if a sqlx error indicates database locking
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        let error_string = err.to_string().to_lowercase();

        // SQLITE_BUSY (5): database is locked
        // SQLITE_LOCKED (6): database table is locked
        // SQLITE_CANTOPEN (14): unable to open database file
        if error_string.contains("database is locked")
            || error_string.contains("database table is locked")
            || error_string.contains("sqlite_busy")
            || error_string.contains("sqlite_locked")
            || error_string.contains("unable to open database file")
        {
            return DatabaseError::InstanceLocked;
        }

        DatabaseError::Other(err)
    }
}

// ============================================================================
// Data Structures
// ============================================================================

/// Lifecycle state of a cached discovery run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// At least one validated candidate was found
    Success,
    /// The run completed but found nothing
    Empty,
    /// The run failed unexpectedly; retried soonest
    Error,
}

impl CacheStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheStatus::Success => "SUCCESS",
            CacheStatus::Empty => "EMPTY",
            CacheStatus::Error => "ERROR",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SUCCESS" => Some(CacheStatus::Success),
            "EMPTY" => Some(CacheStatus::Empty),
            "ERROR" => Some(CacheStatus::Error),
            _ => None,
        }
    }
}

/// One persisted discovery-cache row. Exactly one row exists per origin;
/// rows are superseded by upserts, never deleted by the engine itself.
#[derive(Debug, Clone)]
pub struct DiscoveryCacheRow {
    /// sha256 of `source_origin`
    pub id: String,
    pub source_origin: String,
    /// The source URL whose probe produced this row
    pub source_url: String,
    /// JSON-serialized `Vec<DiscoveredFeedCandidate>`
    pub candidates_json: String,
    pub status: CacheStatus,
    pub last_error: Option<String>,
    pub checked_at: i64,
    pub expires_at: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Fields written on a cache upsert. `id`, `created_at`, and `updated_at`
/// are derived by the storage layer.
#[derive(Debug, Clone)]
pub struct NewDiscoveryCacheEntry<'a> {
    pub source_origin: &'a str,
    pub source_url: &'a str,
    pub candidates_json: &'a str,
    pub status: CacheStatus,
    pub last_error: Option<&'a str>,
    pub checked_at: i64,
    pub expires_at: i64,
}

/// Internal row type for cache queries (used by sqlx FromRow);
/// converts to [`DiscoveryCacheRow`] via `into_row()`.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct DiscoveryCacheDbRow {
    pub id: String,
    pub source_origin: String,
    pub source_url: String,
    pub candidates_json: String,
    pub status: String,
    pub last_error: Option<String>,
    pub checked_at: i64,
    pub expires_at: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl DiscoveryCacheDbRow {
    pub(crate) fn into_row(self) -> DiscoveryCacheRow {
        DiscoveryCacheRow {
            id: self.id,
            source_origin: self.source_origin,
            source_url: self.source_url,
            candidates_json: self.candidates_json,
            // An unknown status marker is treated as the shortest-lived
            // state so the row gets re-probed soon
            status: CacheStatus::parse(&self.status).unwrap_or(CacheStatus::Error),
            last_error: self.last_error,
            checked_at: self.checked_at,
            expires_at: self.expires_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
