//! Tokenline Client Implementation

use crate::error::{Result, SdkError};
use crate::types::{
    ActiveRequest, ActiveResponse, AdvanceResponse, JoinRequest, JoinResponse, LeaveResponse,
    ListServicesRequest, ListServicesResponse, MemberRequest, PositionResponse, PruneRequest, PruneResponse,
    QueryRequest, QueryResponse, RemoveResponse, Service, ServiceRequest, StatsResponse,
    WatchRequest, WatchResponse,
};
use jsonrpsee::core::client::ClientT;
use jsonrpsee::core::params::ObjectParams;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use serde::Serialize;
use std::time::Duration;

/// Longest the daemon holds a watch call open
const MAX_WATCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Tokenline daemon client
///
/// # Example
///
/// ```no_run
/// use tokenline_sdk::TokenlineClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = TokenlineClient::connect("http://127.0.0.1:9530").await?;
/// let joined = client.join("mens-mess-1", "student-42", "Asha").await?;
/// println!("token {}", joined.token);
/// # Ok(())
/// # }
/// ```
pub struct TokenlineClient {
    client: HttpClient,
}

/// Serialize a request struct into named params
fn named<T: Serialize>(request: &T) -> Result<ObjectParams> {
    let mut params = ObjectParams::new();
    if let serde_json::Value::Object(fields) = serde_json::to_value(request)? {
        for (name, value) in fields {
            params.insert(&name, value)?;
        }
    }
    Ok(params)
}

impl TokenlineClient {
    /// Connect to the daemon
    ///
    /// # Arguments
    ///
    /// * `url` - RPC endpoint URL (e.g., `http://127.0.0.1:9530`)
    pub async fn connect(url: impl AsRef<str>) -> Result<Self> {
        let url = url.as_ref();

        // Room for a full-length watch plus transport overhead
        let client = HttpClientBuilder::default()
            .request_timeout(MAX_WATCH_TIMEOUT + Duration::from_secs(10))
            .build(url)
            .map_err(|e| SdkError::Connection(format!("Failed to create client: {}", e)))?;

        Ok(Self { client })
    }

    async fn call<T, R>(&self, method: &str, request: &T) -> Result<R>
    where
        T: Serialize,
        R: serde::de::DeserializeOwned,
    {
        let response: R = self.client.request(method, named(request)?).await?;
        Ok(response)
    }

    /// Take a token. An empty `display_name` becomes "Anonymous".
    pub async fn join(
        &self,
        service_id: impl Into<String>,
        member_id: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Result<JoinResponse> {
        let request = JoinRequest {
            service_id: service_id.into(),
            member_id: member_id.into(),
            display_name: display_name.into(),
        };
        self.call("queue.join.v1", &request).await
    }

    /// Leave a queue
    pub async fn leave(
        &self,
        service_id: impl Into<String>,
        member_id: impl Into<String>,
    ) -> Result<LeaveResponse> {
        let request = MemberRequest {
            service_id: service_id.into(),
            member_id: member_id.into(),
        };
        self.call("queue.leave.v1", &request).await
    }

    /// Remove a member on their behalf (staff)
    pub async fn remove(
        &self,
        service_id: impl Into<String>,
        member_id: impl Into<String>,
    ) -> Result<RemoveResponse> {
        let request = MemberRequest {
            service_id: service_id.into(),
            member_id: member_id.into(),
        };
        self.call("queue.remove.v1", &request).await
    }

    /// Call the next token (staff)
    pub async fn advance(&self, service_id: impl Into<String>) -> Result<AdvanceResponse> {
        let request = ServiceRequest {
            service_id: service_id.into(),
        };
        self.call("queue.advance.v1", &request).await
    }

    /// Read a queue with the next `upcoming` tokens
    pub async fn query(
        &self,
        service_id: impl Into<String>,
        upcoming: usize,
    ) -> Result<QueryResponse> {
        let request = QueryRequest {
            service_id: service_id.into(),
            upcoming,
        };
        self.call("queue.query.v1", &request).await
    }

    /// Where a member stands
    pub async fn position(
        &self,
        service_id: impl Into<String>,
        member_id: impl Into<String>,
    ) -> Result<PositionResponse> {
        let request = MemberRequest {
            service_id: service_id.into(),
            member_id: member_id.into(),
        };
        self.call("queue.position.v1", &request).await
    }

    /// Every queue where a member holds a token
    pub async fn active_tokens(&self, member_id: impl Into<String>) -> Result<ActiveResponse> {
        let request = ActiveRequest {
            member_id: member_id.into(),
        };
        self.call("queue.active.v1", &request).await
    }

    /// Wait for the queue to move past `known_version`
    ///
    /// `timeout` is capped at 60 seconds. `changed` is false on timeout.
    pub async fn watch(
        &self,
        service_id: impl Into<String>,
        known_version: i64,
        timeout: Duration,
    ) -> Result<WatchResponse> {
        let request = WatchRequest {
            service_id: service_id.into(),
            known_version,
            timeout_ms: timeout.min(MAX_WATCH_TIMEOUT).as_millis() as u64,
        };
        self.call("queue.watch.v1", &request).await
    }

    /// Catalog listing
    pub async fn services(&self) -> Result<Vec<Service>> {
        let response: ListServicesResponse = self
            .client
            .request("services.list.v1", ObjectParams::new())
            .await?;
        Ok(response.services)
    }

    /// Catalog listing as offered to one audience
    ///
    /// `gender` is "male", "female" or "all"; services reserved for the
    /// other gender are left out.
    pub async fn services_for(&self, gender: impl Into<String>) -> Result<Vec<Service>> {
        let request = ListServicesRequest {
            gender: Some(gender.into()),
        };
        let response: ListServicesResponse = self.call("services.list.v1", &request).await?;
        Ok(response.services)
    }

    /// One catalog entry
    pub async fn service(&self, service_id: impl Into<String>) -> Result<Service> {
        let request = ServiceRequest {
            service_id: service_id.into(),
        };
        self.call("services.get.v1", &request).await
    }

    /// Drop served members from one queue, or every queue when `service_id` is None
    pub async fn prune(&self, service_id: Option<String>, vacuum: bool) -> Result<PruneResponse> {
        let request = PruneRequest { service_id, vacuum };
        self.call("admin.prune.v1", &request).await
    }

    /// Daemon statistics
    pub async fn stats(&self) -> Result<StatsResponse> {
        let response: StatsResponse = self
            .client
            .request("admin.stats.v1", ObjectParams::new())
            .await?;
        Ok(response)
    }
}
