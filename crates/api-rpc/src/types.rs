//! RPC Request/Response Types
//!
//! Defines the JSON-RPC method parameters and results. Queue records and
//! services reuse the core read models so the wire shape matches storage.

use serde::{Deserialize, Serialize};
use tokenline_core::application::{ActiveToken, QueueSnapshot};
use tokenline_core::domain::{Gender, QueueMember, QueuePosition, Service, Token};

/// queue.join.v1 - Take a token
#[derive(Debug, Deserialize)]
pub struct JoinRequest {
    pub service_id: String,
    pub member_id: String,
    #[serde(default)]
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct JoinResponse {
    pub service_id: String,
    pub member_id: String,
    pub display_name: String,
    pub token: Token,
}

/// queue.leave.v1 - Member leaves a queue
///
/// Also the request shape for queue.remove.v1 and queue.position.v1.
#[derive(Debug, Deserialize)]
pub struct MemberRequest {
    pub service_id: String,
    pub member_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaveResponse {
    pub service_id: String,
    pub member_id: String,
    pub left: bool,
}

/// queue.remove.v1 - Operator removes a member
#[derive(Debug, Clone, Serialize)]
pub struct RemoveResponse {
    pub service_id: String,
    pub removed: Option<QueueMember>,
}

/// queue.advance.v1 - Call the next token
#[derive(Debug, Deserialize)]
pub struct ServiceRequest {
    pub service_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdvanceResponse {
    pub service_id: String,
    pub current_token: Token,
}

/// queue.query.v1 - Read one queue
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub service_id: String,
    #[serde(default = "default_upcoming")]
    pub upcoming: usize,
}

fn default_upcoming() -> usize {
    5
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    #[serde(flatten)]
    pub snapshot: QueueSnapshot,
    pub upcoming_tokens: Vec<Token>,
}

/// queue.position.v1 - Where a member stands
#[derive(Debug, Clone, Serialize)]
pub struct PositionResponse {
    pub service_id: String,
    pub member_id: String,
    pub position: Option<QueuePosition>,
}

/// queue.active.v1 - A member's tokens across services
#[derive(Debug, Deserialize)]
pub struct ActiveRequest {
    pub member_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActiveResponse {
    pub member_id: String,
    pub tokens: Vec<ActiveToken>,
}

/// queue.watch.v1 - Long-poll for a change
#[derive(Debug, Deserialize)]
pub struct WatchRequest {
    pub service_id: String,
    /// Version the caller last saw (0 = never written)
    #[serde(default)]
    pub known_version: i64,
    #[serde(default = "default_watch_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_watch_timeout_ms() -> u64 {
    30_000
}

#[derive(Debug, Clone, Serialize)]
pub struct WatchResponse {
    pub changed: bool,
    pub snapshot: QueueSnapshot,
}

/// services.list.v1 - Optional audience filter
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListServicesRequest {
    /// Hide services reserved for the other gender
    #[serde(default)]
    pub gender: Option<Gender>,
}

/// services.list.v1 - Catalog listing
#[derive(Debug, Clone, Serialize)]
pub struct ListServicesResponse {
    pub services: Vec<Service>,
}

/// admin.prune.v1 - Drop served members, optionally VACUUM
#[derive(Debug, Deserialize)]
pub struct PruneRequest {
    /// Only this queue; every stored queue when absent
    #[serde(default)]
    pub service_id: Option<String>,
    #[serde(default)]
    pub vacuum: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PruneResponse {
    pub members_pruned: usize,
    pub vacuum_run: bool,
    pub bytes_reclaimed: i64,
}

/// admin.stats.v1 - Daemon statistics
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub version: String,
    pub queue_count: i64,
    pub service_count: i64,
    pub db_size_bytes: i64,
    pub fragmentation_percent: f64,
    pub observer_count: usize,
    pub uptime_seconds: i64,
}
