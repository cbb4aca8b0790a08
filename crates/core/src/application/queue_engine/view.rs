// Read models returned by the engine

use crate::domain::{QueueMember, QueuePhase, QueueState, Token};
use serde::{Deserialize, Serialize};

/// Result of `query`: who is waiting and what is being served
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    pub service_id: String,
    pub current_token: Token,
    pub total_tokens_issued: Token,
    pub total_in_queue: usize,
    /// Ascending by token, only members with token > current_token
    pub waiting_members: Vec<QueueMember>,
    pub phase: QueuePhase,
    /// Store version the snapshot was read at (0 = never written)
    pub version: i64,
}

impl QueueSnapshot {
    pub fn from_state(service_id: &str, state: &QueueState, version: i64) -> Self {
        Self {
            service_id: service_id.to_string(),
            current_token: state.current_token,
            total_tokens_issued: state.total_tokens_issued,
            total_in_queue: state.total_in_queue(),
            waiting_members: state.waiting_members(),
            phase: state.phase(),
            version,
        }
    }

    /// The next `limit` tokens that will be called
    pub fn upcoming_tokens(&self, limit: usize) -> Vec<Token> {
        self.waiting_members
            .iter()
            .take(limit)
            .map(|m| m.token)
            .collect()
    }
}

/// A member's token in one queue service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveToken {
    pub service_id: String,
    pub service_name: String,
    pub icon_name: String,
    pub token: Token,
    pub current_token: Token,
    pub total_in_queue: usize,
    pub is_my_turn: bool,
}
