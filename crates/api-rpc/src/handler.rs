//! RPC Method Handlers
//!
//! Thin adapters from JSON-RPC requests to `QueueEngine` calls.

use crate::error::{throttled, to_rpc_error};
use crate::rate_limiter::RateLimiter;
use crate::types::{
    ActiveRequest, ActiveResponse, AdvanceResponse, JoinRequest, JoinResponse, LeaveResponse,
    ListServicesRequest, ListServicesResponse, MemberRequest, PositionResponse, PruneRequest, PruneResponse,
    QueryRequest, QueryResponse, RemoveResponse, ServiceRequest, StatsResponse, WatchRequest,
    WatchResponse,
};
use jsonrpsee::types::ErrorObjectOwned;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokenline_core::application::{
    BroadcastNotifier, Notification, QueueEngine, SubscriptionFilter,
};
use tokenline_core::domain::Service;
use tokenline_core::error::AppError;
use tokenline_core::port::{Maintenance, ServiceDirectory};
use tracing::debug;

/// Longest a watch call may block
pub const MAX_WATCH_TIMEOUT_MS: u64 = 60_000;

/// RPC Handler with injected dependencies
pub struct RpcHandler {
    engine: Arc<QueueEngine>,
    directory: Arc<dyn ServiceDirectory>,
    notifier: Arc<BroadcastNotifier>,
    maintenance: Arc<dyn Maintenance>,
    rate_limiter: RateLimiter,
    start_time: Instant,
}

impl RpcHandler {
    /// Create a handler
    ///
    /// Write calls share one token bucket of `rate_limit_burst` refilled at
    /// `rate_limit_rate` per second. Reads are not limited.
    pub fn new(
        engine: Arc<QueueEngine>,
        directory: Arc<dyn ServiceDirectory>,
        notifier: Arc<BroadcastNotifier>,
        maintenance: Arc<dyn Maintenance>,
        rate_limit_burst: u32,
        rate_limit_rate: u32,
    ) -> Self {
        Self {
            engine,
            directory,
            notifier,
            maintenance,
            rate_limiter: RateLimiter::new(rate_limit_burst, rate_limit_rate),
            start_time: Instant::now(),
        }
    }

    fn throttle(&self) -> Result<(), ErrorObjectOwned> {
        if self.rate_limiter.try_acquire() {
            Ok(())
        } else {
            Err(throttled())
        }
    }

    /// queue.join.v1
    pub async fn join(&self, params: JoinRequest) -> Result<JoinResponse, ErrorObjectOwned> {
        self.throttle()?;

        let member = self
            .engine
            .join(&params.service_id, &params.member_id, &params.display_name)
            .await
            .map_err(to_rpc_error)?;

        Ok(JoinResponse {
            service_id: params.service_id,
            member_id: member.member_id,
            display_name: member.display_name,
            token: member.token,
        })
    }

    /// queue.leave.v1
    pub async fn leave(&self, params: MemberRequest) -> Result<LeaveResponse, ErrorObjectOwned> {
        self.throttle()?;

        let left = self
            .engine
            .leave(&params.service_id, &params.member_id)
            .await
            .map_err(to_rpc_error)?;

        Ok(LeaveResponse {
            service_id: params.service_id,
            member_id: params.member_id,
            left,
        })
    }

    /// queue.remove.v1
    pub async fn remove(&self, params: MemberRequest) -> Result<RemoveResponse, ErrorObjectOwned> {
        self.throttle()?;

        let removed = self
            .engine
            .admin_remove(&params.service_id, &params.member_id)
            .await
            .map_err(to_rpc_error)?;

        Ok(RemoveResponse {
            service_id: params.service_id,
            removed,
        })
    }

    /// queue.advance.v1
    pub async fn advance(
        &self,
        params: ServiceRequest,
    ) -> Result<AdvanceResponse, ErrorObjectOwned> {
        self.throttle()?;

        let current_token = self
            .engine
            .advance(&params.service_id)
            .await
            .map_err(to_rpc_error)?;

        Ok(AdvanceResponse {
            service_id: params.service_id,
            current_token,
        })
    }

    /// queue.query.v1
    pub async fn query(&self, params: QueryRequest) -> Result<QueryResponse, ErrorObjectOwned> {
        let snapshot = self
            .engine
            .query(&params.service_id)
            .await
            .map_err(to_rpc_error)?;
        let upcoming_tokens = snapshot.upcoming_tokens(params.upcoming);

        Ok(QueryResponse {
            snapshot,
            upcoming_tokens,
        })
    }

    /// queue.position.v1
    pub async fn position(
        &self,
        params: MemberRequest,
    ) -> Result<PositionResponse, ErrorObjectOwned> {
        let position = self
            .engine
            .position(&params.service_id, &params.member_id)
            .await
            .map_err(to_rpc_error)?;

        Ok(PositionResponse {
            service_id: params.service_id,
            member_id: params.member_id,
            position,
        })
    }

    /// queue.active.v1
    pub async fn active(&self, params: ActiveRequest) -> Result<ActiveResponse, ErrorObjectOwned> {
        let tokens = self
            .engine
            .active_tokens(&params.member_id)
            .await
            .map_err(to_rpc_error)?;

        Ok(ActiveResponse {
            member_id: params.member_id,
            tokens,
        })
    }

    /// queue.watch.v1
    ///
    /// Returns immediately if the stored version already differs from
    /// `known_version`, otherwise waits for the next change event on the
    /// service (or a resync) until the timeout.
    pub async fn watch(&self, params: WatchRequest) -> Result<WatchResponse, ErrorObjectOwned> {
        let timeout = Duration::from_millis(params.timeout_ms.min(MAX_WATCH_TIMEOUT_MS));

        // Subscribe before reading so a write between the two is not missed
        let mut subscription = self
            .notifier
            .subscribe(SubscriptionFilter::service(params.service_id.clone()));

        let snapshot = self
            .engine
            .query(&params.service_id)
            .await
            .map_err(to_rpc_error)?;
        if snapshot.version != params.known_version {
            return Ok(WatchResponse {
                changed: true,
                snapshot,
            });
        }

        match tokio::time::timeout(timeout, subscription.recv()).await {
            Ok(Some(notification)) => {
                if let Notification::Resync { missed } = notification {
                    debug!(service_id = %params.service_id, missed, "Watch resync");
                }
                let snapshot = self
                    .engine
                    .query(&params.service_id)
                    .await
                    .map_err(to_rpc_error)?;
                Ok(WatchResponse {
                    changed: snapshot.version != params.known_version,
                    snapshot,
                })
            }
            Ok(None) | Err(_) => Ok(WatchResponse {
                changed: false,
                snapshot,
            }),
        }
    }

    /// services.list.v1
    ///
    /// Params may be omitted entirely.
    pub async fn list_services(
        &self,
        params: Option<ListServicesRequest>,
    ) -> Result<ListServicesResponse, ErrorObjectOwned> {
        let mut services = self
            .directory
            .list_services()
            .await
            .map_err(to_rpc_error)?;

        if let Some(audience) = params.and_then(|p| p.gender) {
            services.retain(|s| s.visible_to(audience));
        }

        Ok(ListServicesResponse { services })
    }

    /// services.get.v1
    pub async fn get_service(&self, params: ServiceRequest) -> Result<Service, ErrorObjectOwned> {
        self.directory
            .get_service(&params.service_id)
            .await
            .map_err(to_rpc_error)?
            .ok_or_else(|| to_rpc_error(AppError::ServiceNotFound(params.service_id)))
    }

    /// admin.prune.v1
    pub async fn prune(&self, params: PruneRequest) -> Result<PruneResponse, ErrorObjectOwned> {
        self.throttle()?;

        let members_pruned = match &params.service_id {
            Some(service_id) => self.engine.prune(service_id).await,
            None => self.engine.prune_all().await,
        }
        .map_err(to_rpc_error)?;

        let bytes_reclaimed = if params.vacuum {
            self.maintenance.vacuum().await.map_err(to_rpc_error)?
        } else {
            0
        };

        Ok(PruneResponse {
            members_pruned,
            vacuum_run: params.vacuum,
            bytes_reclaimed,
        })
    }

    /// admin.stats.v1
    pub async fn stats(&self) -> Result<StatsResponse, ErrorObjectOwned> {
        let stats = self.maintenance.get_stats().await.map_err(to_rpc_error)?;
        let service_count = self
            .directory
            .list_services()
            .await
            .map_err(to_rpc_error)?
            .len() as i64;

        Ok(StatsResponse {
            version: tokenline_core::VERSION.to_string(),
            queue_count: stats.queue_count,
            service_count,
            db_size_bytes: stats.db_size_bytes,
            fragmentation_percent: stats.fragmentation_percent,
            observer_count: self.notifier.observer_count(),
            uptime_seconds: self.start_time.elapsed().as_secs() as i64,
        })
    }
}
