mod discovery_cache;
mod schema;
mod types;

pub use schema::Database;
pub use types::{CacheStatus, DatabaseError, DiscoveryCacheRow, NewDiscoveryCacheEntry};
