//! SDK Request/Response Types
//!
//! Mirrors the JSON-RPC types from the api-rpc crate.

use serde::{Deserialize, Serialize};

/// Token number (1-indexed)
pub type Token = u64;

#[derive(Debug, Clone, Serialize)]
pub struct JoinRequest {
    pub service_id: String,
    pub member_id: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JoinResponse {
    pub service_id: String,
    pub member_id: String,
    pub display_name: String,
    pub token: Token,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct MemberRequest {
    pub service_id: String,
    pub member_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ServiceRequest {
    pub service_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeaveResponse {
    pub service_id: String,
    pub member_id: String,
    pub left: bool,
}

/// One person holding a token
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueMember {
    pub member_id: String,
    pub display_name: String,
    pub token: Token,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoveResponse {
    pub service_id: String,
    pub removed: Option<QueueMember>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdvanceResponse {
    pub service_id: String,
    pub current_token: Token,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct QueryRequest {
    pub service_id: String,
    pub upcoming: usize,
}

/// A queue as seen by `query` and `watch`
#[derive(Debug, Clone, Deserialize)]
pub struct QueueSnapshot {
    pub service_id: String,
    pub current_token: Token,
    pub total_tokens_issued: Token,
    pub total_in_queue: usize,
    pub waiting_members: Vec<QueueMember>,
    /// EMPTY, SERVING or CAUGHT_UP
    pub phase: String,
    pub version: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryResponse {
    #[serde(flatten)]
    pub snapshot: QueueSnapshot,
    pub upcoming_tokens: Vec<Token>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QueuePosition {
    pub token: Token,
    pub current_token: Token,
    pub people_ahead: u64,
    pub estimated_wait_minutes: u64,
    pub is_my_turn: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PositionResponse {
    pub service_id: String,
    pub member_id: String,
    pub position: Option<QueuePosition>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ActiveRequest {
    pub member_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActiveToken {
    pub service_id: String,
    pub service_name: String,
    pub icon_name: String,
    pub token: Token,
    pub current_token: Token,
    pub total_in_queue: usize,
    pub is_my_turn: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActiveResponse {
    pub member_id: String,
    pub tokens: Vec<ActiveToken>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct WatchRequest {
    pub service_id: String,
    pub known_version: i64,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WatchResponse {
    pub changed: bool,
    pub snapshot: QueueSnapshot,
}

/// Catalog entry
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    pub name: String,
    /// "queue" or "appointment"
    #[serde(rename = "type")]
    pub service_type: String,
    /// "Open" or "Closed"
    pub status: String,
    pub icon_name: String,
    pub description: String,
    #[serde(default)]
    pub gender: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ListServicesRequest {
    pub gender: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ListServicesResponse {
    pub services: Vec<Service>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct PruneRequest {
    pub service_id: Option<String>,
    pub vacuum: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PruneResponse {
    pub members_pruned: usize,
    pub vacuum_run: bool,
    pub bytes_reclaimed: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatsResponse {
    pub version: String,
    pub queue_count: i64,
    pub service_count: i64,
    pub db_size_bytes: i64,
    pub fragmentation_percent: f64,
    pub observer_count: usize,
    pub uptime_seconds: i64,
}
