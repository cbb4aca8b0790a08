//! JSON-RPC Server
//!
//! Serves the queue API over HTTP on TCP (localhost by default).

use crate::handler::RpcHandler;
use crate::types::{
    ActiveRequest, JoinRequest, ListServicesRequest, MemberRequest, PruneRequest, QueryRequest, ServiceRequest,
    WatchRequest,
};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::RpcModule;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

pub const DEFAULT_RPC_HOST: &str = "127.0.0.1";
pub const DEFAULT_RPC_PORT: u16 = 9530;
pub const DEFAULT_RATE_LIMIT_BURST: u32 = 200;
pub const DEFAULT_RATE_LIMIT_RATE: u32 = 100;

/// RPC Server Configuration
#[derive(Debug, Clone)]
pub struct RpcServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPC_HOST.to_string(),
            port: DEFAULT_RPC_PORT,
        }
    }
}

/// RPC Server
pub struct RpcServer {
    config: RpcServerConfig,
    handler: Arc<RpcHandler>,
}

/// Register `$method`, parsing params into `$req` and forwarding to `$call`
macro_rules! register {
    ($module:expr, $handler:expr, $method:literal, $req:ty, $call:ident) => {{
        let handler = $handler.clone();
        $module
            .register_async_method($method, move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: $req = params.parse()?;
                    handler.$call(req).await
                }
            })
            .map_err(|e| e.to_string())?;
    }};
    ($module:expr, $handler:expr, $method:literal, $call:ident) => {{
        let handler = $handler.clone();
        $module
            .register_async_method($method, move |_, _, _| {
                let handler = handler.clone();
                async move { handler.$call().await }
            })
            .map_err(|e| e.to_string())?;
    }};
}

impl RpcServer {
    pub fn new(config: RpcServerConfig, handler: RpcHandler) -> Self {
        Self {
            config,
            handler: Arc::new(handler),
        }
    }

    /// Build the method table
    pub fn into_module(self) -> Result<RpcModule<()>, String> {
        let mut module = RpcModule::new(());
        let handler = self.handler;

        // Queue
        register!(module, handler, "queue.join.v1", JoinRequest, join);
        register!(module, handler, "queue.leave.v1", MemberRequest, leave);
        register!(module, handler, "queue.remove.v1", MemberRequest, remove);
        register!(module, handler, "queue.advance.v1", ServiceRequest, advance);
        register!(module, handler, "queue.query.v1", QueryRequest, query);
        register!(module, handler, "queue.position.v1", MemberRequest, position);
        register!(module, handler, "queue.active.v1", ActiveRequest, active);
        register!(module, handler, "queue.watch.v1", WatchRequest, watch);

        // Catalog
        register!(module, handler, "services.list.v1", Option<ListServicesRequest>, list_services);
        register!(module, handler, "services.get.v1", ServiceRequest, get_service);

        // Admin
        register!(module, handler, "admin.prune.v1", PruneRequest, prune);
        register!(module, handler, "admin.stats.v1", stats);

        Ok(module)
    }

    /// Start the JSON-RPC server
    ///
    /// Returns the bound address (useful with port 0) and the handle that
    /// keeps the server alive.
    pub async fn start(self) -> Result<(SocketAddr, ServerHandle), String> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        info!(
            host = %self.config.host,
            port = %self.config.port,
            "Starting JSON-RPC server"
        );

        let server = Server::builder()
            .build(&addr)
            .await
            .map_err(|e| format!("Failed to build server on {}: {}", addr, e))?;
        let local_addr = server
            .local_addr()
            .map_err(|e| format!("Failed to read bound address: {}", e))?;

        let module = self.into_module()?;

        info!(addr = %local_addr, "JSON-RPC server started successfully");

        let handle = server.start(module);
        Ok((local_addr, handle))
    }
}
