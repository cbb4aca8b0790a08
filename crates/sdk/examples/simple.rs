//! Simple SDK Example
//!
//! Joins a queue, lets staff call tokens, and follows the queue until it is
//! this member's turn.
//!
//! # Usage
//!
//! 1. Start the daemon:
//!    ```bash
//!    cargo run --package tokenline-daemon
//!    ```
//!
//! 2. Run this example:
//!    ```bash
//!    cargo run --example simple
//!    ```

use std::time::Duration;
use tokenline_sdk::TokenlineClient;

const SERVICE: &str = "mens-mess-1";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Tokenline SDK - Simple Example");
    println!("==============================\n");

    // 1. Connect to daemon
    println!("1. Connecting to daemon...");
    let client = TokenlineClient::connect("http://127.0.0.1:9530").await?;
    println!("   ✓ Connected\n");

    // 2. Two students take tokens
    println!("2. Joining {}...", SERVICE);
    let first = client.join(SERVICE, "example-student-1", "Asha").await?;
    let second = client.join(SERVICE, "example-student-2", "").await?;
    println!("   ✓ {} holds token {}", first.display_name, first.token);
    println!("   ✓ {} holds token {}\n", second.display_name, second.token);

    // 3. Where does the second student stand?
    println!("3. Checking position...");
    let position = client.position(SERVICE, "example-student-2").await?;
    if let Some(position) = &position.position {
        println!(
            "   ✓ {} ahead, ~{} min wait\n",
            position.people_ahead, position.estimated_wait_minutes
        );
    }

    // 4. Staff call tokens until the second student's turn, watching as we go
    println!("4. Calling tokens...");
    let mut version = client.query(SERVICE, 5).await?.snapshot.version;
    loop {
        let advanced = client.advance(SERVICE).await?;
        let update = client
            .watch(SERVICE, version, Duration::from_secs(5))
            .await?;
        version = update.snapshot.version;
        println!("   → now serving {}", advanced.current_token);

        if advanced.current_token >= second.token {
            break;
        }
    }
    println!();

    // 5. Clean up
    println!("5. Leaving...");
    client.leave(SERVICE, "example-student-1").await?;
    client.leave(SERVICE, "example-student-2").await?;
    let pruned = client.prune(Some(SERVICE.to_string()), false).await?;
    println!("   ✓ {} served entries pruned", pruned.members_pruned);

    println!("\n✓ Example completed successfully!");

    Ok(())
}
