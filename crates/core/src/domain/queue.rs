// Queue Domain Model
//
// Pure token/serving state for one service. No I/O here: the engine loads a
// QueueState, applies one of these methods, and writes it back.

use crate::domain::error::{DomainError, Result};
use serde::{Deserialize, Serialize};

/// Service identifier (also the queue key)
pub type ServiceId = String;

/// Token number handed out at join time (1-indexed)
pub type Token = u64;

/// Name used when a member joins without a display name
pub const ANONYMOUS_DISPLAY_NAME: &str = "Anonymous";

/// One person holding a token in a queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueMember {
    pub member_id: String,
    pub display_name: String,
    pub token: Token,
}

/// Persisted per-service queue record
///
/// Serialized shape: `{ currentToken, totalTokensIssued, members: [...] }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueState {
    pub current_token: Token,
    pub total_tokens_issued: Token,
    pub members: Vec<QueueMember>,
}

/// Serving phase, derived purely from the two counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueuePhase {
    Empty,
    Serving,
    CaughtUp,
}

impl std::fmt::Display for QueuePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueuePhase::Empty => write!(f, "EMPTY"),
            QueuePhase::Serving => write!(f, "SERVING"),
            QueuePhase::CaughtUp => write!(f, "CAUGHT_UP"),
        }
    }
}

/// Where a member stands relative to "now serving"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuePosition {
    pub token: Token,
    pub current_token: Token,
    pub people_ahead: u64,
    pub estimated_wait_minutes: u64,
    pub is_my_turn: bool,
}

impl QueueState {
    /// Token the next join will receive
    pub fn next_token(&self) -> Result<Token> {
        self.total_tokens_issued
            .checked_add(1)
            .ok_or(DomainError::TokensExhausted(self.total_tokens_issued))
    }

    pub fn is_waiting(&self, member: &QueueMember) -> bool {
        member.token > self.current_token
    }

    /// Any entry for this member, served or not
    pub fn find(&self, member_id: &str) -> Option<&QueueMember> {
        self.members.iter().find(|m| m.member_id == member_id)
    }

    /// Entry for this member only if still waiting
    pub fn find_waiting(&self, member_id: &str) -> Option<&QueueMember> {
        self.find(member_id).filter(|m| self.is_waiting(m))
    }

    /// Issue a fresh token to `member_id`
    ///
    /// A stale (already served) entry for the same member is dropped first so
    /// the member appears at most once. Fails without touching the state when
    /// the counter cannot grow.
    pub fn issue(&mut self, member_id: &str, display_name: &str) -> Result<QueueMember> {
        let token = self.next_token()?;
        self.members.retain(|m| m.member_id != member_id);
        self.total_tokens_issued = token;

        let member = QueueMember {
            member_id: member_id.to_string(),
            display_name: display_name.to_string(),
            token,
        };
        self.members.push(member.clone());
        Ok(member)
    }

    /// Remove a member regardless of served status. Counters are untouched.
    pub fn remove(&mut self, member_id: &str) -> Option<QueueMember> {
        let index = self.members.iter().position(|m| m.member_id == member_id)?;
        Some(self.members.remove(index))
    }

    /// Move "now serving" forward by one token
    ///
    /// Returns false when already caught up.
    pub fn advance(&mut self) -> bool {
        if self.current_token < self.total_tokens_issued {
            self.current_token += 1;
            true
        } else {
            false
        }
    }

    /// Waiting members, ascending by token
    pub fn waiting_members(&self) -> Vec<QueueMember> {
        let mut waiting: Vec<QueueMember> = self
            .members
            .iter()
            .filter(|m| self.is_waiting(m))
            .cloned()
            .collect();
        waiting.sort_by_key(|m| m.token);
        waiting
    }

    pub fn total_in_queue(&self) -> usize {
        self.members.iter().filter(|m| self.is_waiting(m)).count()
    }

    pub fn phase(&self) -> QueuePhase {
        if self.total_tokens_issued == 0 {
            QueuePhase::Empty
        } else if self.current_token < self.total_tokens_issued {
            QueuePhase::Serving
        } else {
            QueuePhase::CaughtUp
        }
    }

    /// Physically drop members whose token has already been served
    pub fn prune_served(&mut self) -> usize {
        let before = self.members.len();
        let current = self.current_token;
        self.members.retain(|m| m.token > current);
        before - self.members.len()
    }

    pub fn position(&self, member_id: &str, minutes_per_person: u64) -> Option<QueuePosition> {
        let member = self.find(member_id)?;
        let people_ahead = member
            .token
            .saturating_sub(self.current_token.saturating_add(1));

        Some(QueuePosition {
            token: member.token,
            current_token: self.current_token,
            people_ahead,
            estimated_wait_minutes: people_ahead.saturating_mul(minutes_per_person),
            is_my_turn: member.token <= self.current_token,
        })
    }

    /// Check the structural invariants of a record read from storage
    pub fn validate(&self) -> Result<()> {
        if self.current_token > self.total_tokens_issued {
            return Err(DomainError::InvariantViolation(format!(
                "currentToken {} exceeds totalTokensIssued {}",
                self.current_token, self.total_tokens_issued
            )));
        }

        let mut previous: Token = 0;
        let mut seen = std::collections::HashSet::new();
        for member in &self.members {
            if member.member_id.is_empty() {
                return Err(DomainError::InvariantViolation(
                    "member with empty memberId".to_string(),
                ));
            }
            if !seen.insert(member.member_id.as_str()) {
                return Err(DomainError::InvariantViolation(format!(
                    "duplicate memberId {}",
                    member.member_id
                )));
            }
            if member.token == 0 || member.token <= previous {
                return Err(DomainError::InvariantViolation(format!(
                    "token {} for {} is not strictly increasing",
                    member.token, member.member_id
                )));
            }
            if member.token > self.total_tokens_issued {
                return Err(DomainError::InvariantViolation(format!(
                    "token {} exceeds totalTokensIssued {}",
                    member.token, self.total_tokens_issued
                )));
            }
            previous = member.token;
        }

        Ok(())
    }
}
