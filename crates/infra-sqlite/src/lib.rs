// Tokenline Infrastructure - SQLite Adapter
// Implements: QueueStore (compare-and-swap on a version column), ServiceDirectory, Maintenance

mod connection;
mod error;
mod maintenance_impl;
mod migration;
mod queue_store;
mod service_directory;

pub use connection::create_pool;
pub use maintenance_impl::SqliteMaintenance;
pub use migration::run_migrations;
pub use queue_store::SqliteQueueStore;
pub use service_directory::SqliteServiceDirectory;
