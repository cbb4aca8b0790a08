// Domain Layer - Pure business logic and entities

pub mod error;
pub mod event;
pub mod queue;
pub mod service;

// Re-exports
pub use error::DomainError;
pub use event::{queue_key, ChangeKind, QueueChangeEvent};
pub use queue::{
    QueueMember, QueuePhase, QueuePosition, QueueState, ServiceId, Token, ANONYMOUS_DISPLAY_NAME,
};
pub use service::{Gender, Service, ServiceStatus, ServiceType};
