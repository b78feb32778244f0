//! Partitioned record cache
//!
//! Keeps an in-memory view of each (store id, sheet) pair so request
//! handling never waits on the backing store except when a partition is
//! missing or stale.
//!
//! ## Partitions
//!
//! The [`partition`] module holds one sheet's rows in raw and clean form
//! plus the secondary indices the allocator searches:
//! - owner key → row
//! - status → rows (ascending)
//! - rows with no owner
//! - identity keys (user id, uid, user name, email) → row
//!
//! ## Registry
//!
//! The [`store`] module maps partition keys to `Arc<Partition>` handles in a
//! `DashMap`, so partitions of different sheets never contend. A reload
//! builds a fresh partition and swaps the handle; holders of the old one
//! keep reading the old data.

pub mod partition;
pub mod store;

pub use partition::{IdentityField, Partition, PartitionData, PartitionKey};
pub use store::{spawn_cleanup_task, CacheStats, PartitionCache};

use std::time::Duration;

/// Cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// How long a loaded partition is served without reloading
    pub ttl: Duration,
    /// First sheet row holding account data (1-based)
    pub data_start_row: usize,
    /// Last sheet row fetched on load
    pub data_end_row: usize,
    /// Bound on a single remote fetch
    pub fetch_timeout: Duration,
    /// How often expired partitions are dropped
    pub cleanup_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),             // 5 minutes
            data_start_row: 11,
            data_end_row: 5000,
            fetch_timeout: Duration::from_secs(20),
            cleanup_interval: Duration::from_secs(60), // Run cleanup every minute
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.ttl, Duration::from_secs(300));
        assert_eq!(config.data_start_row, 11);
        assert!(config.data_end_row > config.data_start_row);
    }
}
