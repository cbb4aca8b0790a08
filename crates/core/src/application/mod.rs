// Application Layer - Use Cases and Business Logic

pub mod catalog;
pub mod notifier;
pub mod prune;
pub mod queue_engine;

// Re-exports
pub use notifier::{BroadcastNotifier, ChangeSubscription, Notification, SubscriptionFilter};
pub use prune::{shutdown_channel, PruneScheduler, ShutdownSender, ShutdownToken};
pub use queue_engine::{
    ActiveToken, DuplicateJoinPolicy, EngineConfig, QueueEngine, QueueSnapshot,
    DEFAULT_MAX_CAS_RETRIES, DEFAULT_MINUTES_PER_PERSON,
};
