// Service Domain Model
//
// Services are owned by the catalog, not by the queue engine. The engine only
// reads `service_type` and `status` to decide whether a join is allowed.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    Queue,
    Appointment,
}

impl std::fmt::Display for ServiceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceType::Queue => write!(f, "queue"),
            ServiceType::Appointment => write!(f, "appointment"),
        }
    }
}

impl std::str::FromStr for ServiceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queue" => Ok(ServiceType::Queue),
            "appointment" => Ok(ServiceType::Appointment),
            other => Err(format!("unknown service type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceStatus {
    Open,
    Closed,
}

impl std::fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceStatus::Open => write!(f, "Open"),
            ServiceStatus::Closed => write!(f, "Closed"),
        }
    }
}

impl std::str::FromStr for ServiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Open" => Ok(ServiceStatus::Open),
            "Closed" => Ok(ServiceStatus::Closed),
            other => Err(format!("unknown service status: {}", other)),
        }
    }
}

/// Audience restriction for queue services
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    All,
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Gender::Male => write!(f, "male"),
            Gender::Female => write!(f, "female"),
            Gender::All => write!(f, "all"),
        }
    }
}

impl std::str::FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "all" => Ok(Gender::All),
            other => Err(format!("unknown gender: {}", other)),
        }
    }
}

/// A bookable or queueable campus offering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub service_type: ServiceType,
    pub status: ServiceStatus,
    pub icon_name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
}

impl Service {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        service_type: ServiceType,
        status: ServiceStatus,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            service_type,
            status,
            icon_name: "Ticket".to_string(),
            description: String::new(),
            gender: None,
        }
    }

    pub fn is_queue(&self) -> bool {
        self.service_type == ServiceType::Queue
    }

    /// Whether new tokens may be issued for this service
    pub fn accepts_joins(&self) -> bool {
        self.is_queue() && self.status == ServiceStatus::Open
    }

    /// Whether a member of `audience` should be offered this service
    ///
    /// Only services reserved for the other gender are hidden. `All` sees
    /// everything.
    pub fn visible_to(&self, audience: Gender) -> bool {
        !matches!(
            (audience, self.gender),
            (Gender::Male, Some(Gender::Female)) | (Gender::Female, Some(Gender::Male))
        )
    }
}
