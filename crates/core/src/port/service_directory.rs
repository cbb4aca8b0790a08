// Service Directory Port (Interface)

use crate::domain::Service;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::RwLock;

/// Read-only view of the service catalog
#[async_trait]
pub trait ServiceDirectory: Send + Sync {
    /// Find a service by id
    async fn get_service(&self, service_id: &str) -> Result<Option<Service>>;

    /// All services, ordered by id
    async fn list_services(&self) -> Result<Vec<Service>>;
}

/// In-process catalog (tests and the `memory` backend)
#[derive(Default)]
pub struct InMemoryServiceDirectory {
    services: RwLock<BTreeMap<String, Service>>,
}

impl InMemoryServiceDirectory {
    pub fn new(services: impl IntoIterator<Item = Service>) -> Self {
        let directory = Self::default();
        for service in services {
            directory.upsert(service);
        }
        directory
    }

    pub fn upsert(&self, service: Service) {
        self.services
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(service.id.clone(), service);
    }
}

#[async_trait]
impl ServiceDirectory for InMemoryServiceDirectory {
    async fn get_service(&self, service_id: &str) -> Result<Option<Service>> {
        Ok(self
            .services
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(service_id)
            .cloned())
    }

    async fn list_services(&self) -> Result<Vec<Service>> {
        Ok(self
            .services
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .values()
            .cloned()
            .collect())
    }
}
