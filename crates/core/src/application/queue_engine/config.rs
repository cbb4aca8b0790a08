// Engine configuration

use serde::{Deserialize, Serialize};

/// Default number of compare-and-swap attempts before giving up
pub const DEFAULT_MAX_CAS_RETRIES: u32 = 16;

/// Default wait estimate per person ahead (minutes)
pub const DEFAULT_MINUTES_PER_PERSON: u64 = 2;

/// What to do when a member who is still waiting asks to join again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateJoinPolicy {
    /// Hand back the existing membership, no new token
    #[default]
    ReturnExisting,
    /// Fail with `AlreadyInQueue`
    Reject,
}

impl std::str::FromStr for DuplicateJoinPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "return_existing" => Ok(DuplicateJoinPolicy::ReturnExisting),
            "reject" => Ok(DuplicateJoinPolicy::Reject),
            other => Err(format!("unknown duplicate join policy: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub duplicate_join: DuplicateJoinPolicy,
    pub max_cas_retries: u32,
    pub minutes_per_person: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            duplicate_join: DuplicateJoinPolicy::default(),
            max_cas_retries: DEFAULT_MAX_CAS_RETRIES,
            minutes_per_person: DEFAULT_MINUTES_PER_PERSON,
        }
    }
}
