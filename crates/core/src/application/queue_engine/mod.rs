// Queue Engine - token issuance and serving over a QueueStore
//
// Every mutation is a read-modify-write: load the versioned record, apply a
// pure QueueState method, compare-and-swap it back. Same-service operations
// are serialized in-process; a lost CAS (another process wrote first) reloads
// and reapplies up to `max_cas_retries` times.

mod config;
mod locks;
pub mod validate;
mod view;

#[cfg(test)]
mod engine_test;

pub use config::{
    DuplicateJoinPolicy, EngineConfig, DEFAULT_MAX_CAS_RETRIES, DEFAULT_MINUTES_PER_PERSON,
};
pub use view::{ActiveToken, QueueSnapshot};

use crate::domain::{QueueChangeEvent, QueueMember, QueuePosition, QueueState, Token};
use crate::error::{AppError, Result};
use crate::port::{ChangeNotifier, IdProvider, QueueStore, ServiceDirectory};
use locks::KeyedLocks;
use std::sync::Arc;
use tracing::{debug, info, warn};
use validate::{normalize_display_name, validate_member_id, validate_service_id};

/// Outcome of applying an operation to a loaded state
enum Mutation<T> {
    /// State changed: persist, notify, return T
    Write(T),
    /// Nothing to persist
    Skip(T),
}

/// Queue Engine
pub struct QueueEngine {
    store: Arc<dyn QueueStore>,
    directory: Arc<dyn ServiceDirectory>,
    notifier: Arc<dyn ChangeNotifier>,
    config: EngineConfig,
    origin: String,
    locks: KeyedLocks,
}

impl QueueEngine {
    /// Create an engine
    ///
    /// # Arguments
    ///
    /// * `store` - Versioned queue storage
    /// * `directory` - Service catalog (consulted on join)
    /// * `notifier` - Change publication
    /// * `id_provider` - Generates this engine's origin id
    /// * `config` - Duplicate-join policy, CAS retries, wait estimate
    pub fn new(
        store: Arc<dyn QueueStore>,
        directory: Arc<dyn ServiceDirectory>,
        notifier: Arc<dyn ChangeNotifier>,
        id_provider: &dyn IdProvider,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            directory,
            notifier,
            config,
            origin: id_provider.generate_id(),
            locks: KeyedLocks::default(),
        }
    }

    /// Origin id stamped on every change event this engine publishes
    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Take a token for `member_id`
    pub async fn join(
        &self,
        service_id: &str,
        member_id: &str,
        display_name: &str,
    ) -> Result<QueueMember> {
        validate_service_id(service_id)?;
        validate_member_id(member_id)?;
        let display_name = normalize_display_name(display_name);

        let service = self
            .directory
            .get_service(service_id)
            .await?
            .ok_or_else(|| AppError::ServiceNotFound(service_id.to_string()))?;

        if !service.accepts_joins() {
            let reason = if service.is_queue() {
                format!("status is {}", service.status)
            } else {
                format!("service type is {}", service.service_type)
            };
            return Err(AppError::ServiceUnavailable {
                service_id: service_id.to_string(),
                reason,
            });
        }

        let policy = self.config.duplicate_join;
        let member = self
            .mutate(service_id, |state| {
                if let Some(existing) = state.find_waiting(member_id) {
                    return match policy {
                        DuplicateJoinPolicy::ReturnExisting => Ok(Mutation::Skip(existing.clone())),
                        DuplicateJoinPolicy::Reject => Err(AppError::AlreadyInQueue {
                            service_id: service_id.to_string(),
                            member_id: member_id.to_string(),
                            token: existing.token,
                        }),
                    };
                }
                Ok(Mutation::Write(state.issue(member_id, &display_name)?))
            })
            .await?;

        info!(
            service_id = %service_id,
            member_id = %member_id,
            token = member.token,
            "Member joined queue"
        );
        Ok(member)
    }

    /// Member leaves; returns whether an entry was removed
    pub async fn leave(&self, service_id: &str, member_id: &str) -> Result<bool> {
        let removed = self.remove_member(service_id, member_id).await?;
        if removed.is_some() {
            info!(service_id = %service_id, member_id = %member_id, "Member left queue");
        }
        Ok(removed.is_some())
    }

    /// Admin removal; returns the removed member
    pub async fn admin_remove(
        &self,
        service_id: &str,
        member_id: &str,
    ) -> Result<Option<QueueMember>> {
        let removed = self.remove_member(service_id, member_id).await?;
        if let Some(member) = &removed {
            info!(
                service_id = %service_id,
                member_id = %member_id,
                token = member.token,
                "Member removed by admin"
            );
        }
        Ok(removed)
    }

    /// Serve the next token; returns the (possibly unchanged) current token
    pub async fn advance(&self, service_id: &str) -> Result<Token> {
        validate_service_id(service_id)?;

        let current = self
            .mutate(service_id, |state| {
                if state.advance() {
                    Ok(Mutation::Write(state.current_token))
                } else {
                    Ok(Mutation::Skip(state.current_token))
                }
            })
            .await?;

        debug!(service_id = %service_id, current_token = current, "Advance");
        Ok(current)
    }

    /// Read-only view of one queue
    pub async fn query(&self, service_id: &str) -> Result<QueueSnapshot> {
        validate_service_id(service_id)?;
        let loaded = self.store.load(service_id).await?;
        Ok(QueueSnapshot::from_state(
            service_id,
            &loaded.state,
            loaded.version,
        ))
    }

    /// Where `member_id` stands in one queue
    pub async fn position(
        &self,
        service_id: &str,
        member_id: &str,
    ) -> Result<Option<QueuePosition>> {
        validate_service_id(service_id)?;
        validate_member_id(member_id)?;
        let loaded = self.store.load(service_id).await?;
        Ok(loaded
            .state
            .position(member_id, self.config.minutes_per_person))
    }

    /// Every queue service where `member_id` currently holds a token
    pub async fn active_tokens(&self, member_id: &str) -> Result<Vec<ActiveToken>> {
        validate_member_id(member_id)?;

        let mut tokens = Vec::new();
        for service in self.directory.list_services().await? {
            if !service.is_queue() {
                continue;
            }

            let loaded = self.store.load(&service.id).await?;
            if let Some(member) = loaded.state.find(member_id) {
                tokens.push(ActiveToken {
                    service_id: service.id.clone(),
                    service_name: service.name.clone(),
                    icon_name: service.icon_name.clone(),
                    token: member.token,
                    current_token: loaded.state.current_token,
                    total_in_queue: loaded.state.total_in_queue(),
                    is_my_turn: member.token <= loaded.state.current_token,
                });
            }
        }

        Ok(tokens)
    }

    /// Drop already-served members from one queue
    pub async fn prune(&self, service_id: &str) -> Result<usize> {
        validate_service_id(service_id)?;

        let pruned = self
            .mutate(service_id, |state| {
                let pruned = state.prune_served();
                if pruned > 0 {
                    Ok(Mutation::Write(pruned))
                } else {
                    Ok(Mutation::Skip(0))
                }
            })
            .await?;

        if pruned > 0 {
            debug!(service_id = %service_id, pruned, "Pruned served members");
        }
        Ok(pruned)
    }

    /// Prune every stored queue
    pub async fn prune_all(&self) -> Result<usize> {
        let mut total = 0;
        for service_id in self.store.list_queue_ids().await? {
            total += self.prune(&service_id).await?;
        }
        Ok(total)
    }

    async fn remove_member(&self, service_id: &str, member_id: &str) -> Result<Option<QueueMember>> {
        validate_service_id(service_id)?;
        validate_member_id(member_id)?;

        self.mutate(service_id, |state| match state.remove(member_id) {
            Some(member) => Ok(Mutation::Write(Some(member))),
            None => Ok(Mutation::Skip(None)),
        })
        .await
    }

    /// Load, apply `op`, compare-and-swap, notify
    ///
    /// `op` runs against a fresh copy on every attempt and must be
    /// deterministic in the loaded state.
    async fn mutate<T, F>(&self, service_id: &str, mut op: F) -> Result<T>
    where
        F: FnMut(&mut QueueState) -> Result<Mutation<T>> + Send,
        T: Send,
    {
        let _guard = self.locks.acquire(service_id).await;

        for attempt in 0..=self.config.max_cas_retries {
            let loaded = self.store.load(service_id).await?;
            let mut state = loaded.state;

            let value = match op(&mut state)? {
                Mutation::Skip(value) => return Ok(value),
                Mutation::Write(value) => value,
            };

            if self
                .store
                .compare_and_swap(service_id, loaded.version, &state)
                .await?
            {
                self.notifier
                    .publish(QueueChangeEvent::queue_changed(service_id, &self.origin));
                return Ok(value);
            }

            debug!(
                service_id = %service_id,
                attempt,
                version = loaded.version,
                "Queue version moved underneath us, retrying"
            );
        }

        warn!(
            service_id = %service_id,
            retries = self.config.max_cas_retries,
            "Gave up after repeated write conflicts"
        );
        Err(AppError::Conflict(format!(
            "queue {} changed concurrently {} times",
            service_id,
            self.config.max_cas_retries + 1
        )))
    }
}
