// Port Layer - Interfaces for external dependencies

pub mod change_notifier;
pub mod id_provider; // For deterministic testing
pub mod maintenance;
pub mod queue_store;
pub mod service_directory;
pub mod time_provider;

// Re-exports
pub use change_notifier::ChangeNotifier;
pub use id_provider::IdProvider;
pub use maintenance::{Maintenance, MaintenanceStats};
pub use queue_store::{InMemoryQueueStore, QueueStore, VersionedQueue};
pub use service_directory::{InMemoryServiceDirectory, ServiceDirectory};
pub use time_provider::TimeProvider;
