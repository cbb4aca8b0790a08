// Storage maintenance port
use crate::error::Result;
use async_trait::async_trait;

/// Storage statistics
#[derive(Debug, Clone, Default)]
pub struct MaintenanceStats {
    pub db_size_bytes: i64,
    pub queue_count: i64,
    pub service_count: i64,
    pub fragmentation_percent: f64,
}

/// Storage maintenance operations
#[async_trait]
pub trait Maintenance: Send + Sync {
    /// Reclaim space and defragment
    ///
    /// # Returns
    /// Space reclaimed in bytes
    async fn vacuum(&self) -> Result<i64>;

    /// Get storage statistics
    async fn get_stats(&self) -> Result<MaintenanceStats>;
}
