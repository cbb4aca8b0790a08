//! Tokenline SDK - Rust Client Library
//!
//! Typed client for the Tokenline queue daemon's JSON-RPC API.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use tokenline_sdk::TokenlineClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = TokenlineClient::connect("http://127.0.0.1:9530").await?;
//!
//!     let joined = client.join("mens-mess-1", "student-42", "Asha").await?;
//!     println!("Your token: {}", joined.token);
//!
//!     // Block until the queue moves
//!     let queue = client.query("mens-mess-1", 5).await?;
//!     let update = client
//!         .watch("mens-mess-1", queue.snapshot.version, Duration::from_secs(30))
//!         .await?;
//!     println!("Now serving: {}", update.snapshot.current_token);
//!
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod types;

pub use client::TokenlineClient;
pub use error::{code, Result, SdkError};
pub use types::{
    ActiveResponse, ActiveToken, AdvanceResponse, JoinResponse, LeaveResponse, PositionResponse,
    PruneResponse, QueryResponse, QueueMember, QueuePosition, QueueSnapshot, RemoveResponse,
    Service, StatsResponse, Token, WatchResponse,
};
