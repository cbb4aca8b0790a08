//! JSON-RPC API Layer
//!
//! Implements the JSON-RPC 2.0 server for the Tokenline queue engine.
//! Every method is versioned (`<group>.<name>.v1`).

pub mod error;
pub mod handler;
mod rate_limiter;
pub mod server;
pub mod types;

pub use handler::RpcHandler;
pub use server::{RpcServer, RpcServerConfig};
