//! Tokenline CLI - Command-line interface for the Tokenline daemon

mod rpc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use rpc::RpcClient;
use serde::Deserialize;
use serde_json::json;
use tabled::{Table, Tabled};

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:9530";
const WATCH_TIMEOUT_MS: u64 = 30_000;

#[derive(Parser)]
#[command(name = "tokenline")]
#[command(about = "Campus service queue CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// RPC server URL
    #[arg(long, env = "TOKENLINE_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Take a token in a queue
    Join {
        /// Service ID (e.g., mens-mess-1)
        service_id: String,

        /// Your member ID
        #[arg(short, long, env = "TOKENLINE_MEMBER_ID")]
        member: String,

        /// Name shown to staff (default: Anonymous)
        #[arg(short, long, default_value = "")]
        name: String,
    },

    /// Leave a queue
    Leave {
        service_id: String,

        #[arg(short, long, env = "TOKENLINE_MEMBER_ID")]
        member: String,
    },

    /// Remove someone from a queue (staff)
    Remove {
        service_id: String,
        member_id: String,
    },

    /// Call the next token (staff)
    Advance { service_id: String },

    /// Show a queue
    Show {
        service_id: String,

        /// How many upcoming tokens to list
        #[arg(short, long, default_value = "5")]
        upcoming: usize,
    },

    /// Where you stand in a queue
    Position {
        service_id: String,

        #[arg(short, long, env = "TOKENLINE_MEMBER_ID")]
        member: String,
    },

    /// All your tokens
    Mine {
        #[arg(short, long, env = "TOKENLINE_MEMBER_ID")]
        member: String,
    },

    /// List services
    Services {
        /// Only show services open to this audience (male, female, all)
        #[arg(short, long)]
        gender: Option<String>,
    },

    /// Follow a queue until Ctrl+C
    Watch { service_id: String },

    /// Drop served members (staff)
    Prune {
        /// Only this service
        #[arg(long)]
        service: Option<String>,

        /// Also VACUUM the database
        #[arg(long)]
        vacuum: bool,
    },

    /// Show daemon status
    Status,
}

#[derive(Debug, Deserialize)]
struct Member {
    #[serde(rename = "memberId")]
    member_id: String,
    #[serde(rename = "displayName")]
    display_name: String,
    token: u64,
}

#[derive(Tabled)]
struct MemberRow {
    #[tabled(rename = "Token")]
    token: u64,
    #[tabled(rename = "Member")]
    member_id: String,
    #[tabled(rename = "Name")]
    display_name: String,
}

impl From<Member> for MemberRow {
    fn from(m: Member) -> Self {
        Self {
            token: m.token,
            member_id: m.member_id,
            display_name: m.display_name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Snapshot {
    service_id: String,
    current_token: u64,
    total_tokens_issued: u64,
    total_in_queue: usize,
    waiting_members: Vec<Member>,
    phase: String,
    version: i64,
    #[serde(default)]
    upcoming_tokens: Vec<u64>,
}

#[derive(Debug, Deserialize, Tabled)]
struct ServiceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    #[serde(rename = "type")]
    service_type: String,
    #[tabled(rename = "Status")]
    status: String,
}

#[derive(Debug, Deserialize, Tabled)]
struct ActiveRow {
    #[tabled(rename = "Service")]
    service_name: String,
    #[tabled(rename = "Token")]
    token: u64,
    #[tabled(rename = "Serving")]
    current_token: u64,
    #[tabled(rename = "Waiting")]
    total_in_queue: usize,
    #[tabled(rename = "Your turn")]
    is_my_turn: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = RpcClient::new(cli.rpc_url);

    match cli.command {
        Commands::Join {
            service_id,
            member,
            name,
        } => {
            let params = json!({
                "service_id": service_id,
                "member_id": member,
                "display_name": name,
            });
            let result = client.call("queue.join.v1", params).await?;

            println!("{}", "✓ Joined queue".green().bold());
            println!(
                "  {} {}",
                "Your token:".bold(),
                result["token"].to_string().cyan().bold()
            );
            print_position(&client, &service_id, &member).await?;
        }

        Commands::Leave { service_id, member } => {
            let params = json!({ "service_id": service_id, "member_id": member });
            let result = client.call("queue.leave.v1", params).await?;

            if result["left"].as_bool().unwrap_or(false) {
                println!("{}", format!("✓ Left {}", service_id).green().bold());
            } else {
                println!("{}", format!("Not in {}", service_id).yellow());
            }
        }

        Commands::Remove {
            service_id,
            member_id,
        } => {
            let params = json!({ "service_id": service_id, "member_id": member_id });
            let result = client.call("queue.remove.v1", params).await?;

            match result.get("removed").filter(|v| !v.is_null()) {
                Some(removed) => println!(
                    "{}",
                    format!("✓ Removed token {} from {}", removed["token"], service_id)
                        .green()
                        .bold()
                ),
                None => println!("{}", format!("{} is not in {}", member_id, service_id).yellow()),
            }
        }

        Commands::Advance { service_id } => {
            let params = json!({ "service_id": service_id });
            let result = client.call("queue.advance.v1", params).await?;

            println!(
                "{} {}",
                "Now serving:".bold(),
                result["current_token"].to_string().cyan().bold()
            );
        }

        Commands::Show {
            service_id,
            upcoming,
        } => {
            let params = json!({ "service_id": service_id, "upcoming": upcoming });
            let snapshot: Snapshot = client.call_as("queue.query.v1", params).await?;
            print_snapshot(snapshot);
        }

        Commands::Position { service_id, member } => {
            print_position(&client, &service_id, &member).await?;
        }

        Commands::Mine { member } => {
            let result = client
                .call("queue.active.v1", json!({ "member_id": member }))
                .await?;
            let tokens: Vec<ActiveRow> = serde_json::from_value(result["tokens"].clone())?;

            if tokens.is_empty() {
                println!("{}", "No active tokens".yellow());
            } else {
                println!("{}", Table::new(tokens));
            }
        }

        Commands::Services { gender } => {
            let result = client
                .call("services.list.v1", json!({ "gender": gender }))
                .await?;
            let services: Vec<ServiceRow> = serde_json::from_value(result["services"].clone())?;
            println!("{}", Table::new(services));
        }

        Commands::Watch { service_id } => watch(&client, &service_id).await?,

        Commands::Prune { service, vacuum } => {
            let params = json!({ "service_id": service, "vacuum": vacuum });
            let result = client.call("admin.prune.v1", params).await?;

            println!(
                "  {} {} served members pruned",
                "✓".green(),
                result["members_pruned"]
            );
            if result["vacuum_run"].as_bool().unwrap_or(false) {
                println!(
                    "  {} VACUUM reclaimed {} bytes",
                    "✓".green(),
                    result["bytes_reclaimed"]
                );
            }
        }

        Commands::Status => {
            println!("{}", "System Status".cyan().bold());
            println!();

            match client.call("admin.stats.v1", json!({})).await {
                Ok(stats) => {
                    println!("  {} {}", "RPC URL:".bold(), client.url());
                    println!("  {} {}", "Status:".bold(), "ONLINE".green());
                    println!("  {} {}", "Version:".bold(), stats["version"]);
                    println!();
                    println!("  {} {}", "Services:".bold(), stats["service_count"]);
                    println!("  {} {}", "Queues:".bold(), stats["queue_count"]);
                    println!("  {} {}", "Watchers:".bold(), stats["observer_count"]);
                    println!();
                    let db_mb =
                        stats["db_size_bytes"].as_i64().unwrap_or(0) as f64 / (1024.0 * 1024.0);
                    println!("  {} {:.2} MB", "DB Size:".bold(), db_mb);
                    println!("  {} {} seconds", "Uptime:".bold(), stats["uptime_seconds"]);
                }
                Err(e) => {
                    println!("  {} {}", "Status:".bold(), "ERROR".red());
                    println!("  {} {}", "Error:".bold(), e);
                }
            }
        }
    }

    Ok(())
}

async fn print_position(client: &RpcClient, service_id: &str, member: &str) -> Result<()> {
    let params = json!({ "service_id": service_id, "member_id": member });
    let result = client.call("queue.position.v1", params).await?;
    let position = &result["position"];

    if position.is_null() {
        println!("{}", format!("Not in {}", service_id).yellow());
    } else if position["is_my_turn"].as_bool().unwrap_or(false) {
        println!("{}", "★ It's your turn!".green().bold());
    } else {
        println!(
            "  {} {}  {} {}  {} ~{} min",
            "Serving:".bold(),
            position["current_token"],
            "Ahead of you:".bold(),
            position["people_ahead"],
            "Wait:".bold(),
            position["estimated_wait_minutes"]
        );
    }
    Ok(())
}

fn print_snapshot(snapshot: Snapshot) {
    println!(
        "{} {}",
        snapshot.service_id.cyan().bold(),
        format!("[{}]", snapshot.phase).dimmed()
    );
    println!(
        "  {} {}  {} {}  {} {}",
        "Serving:".bold(),
        snapshot.current_token,
        "Issued:".bold(),
        snapshot.total_tokens_issued,
        "Waiting:".bold(),
        snapshot.total_in_queue
    );

    if !snapshot.upcoming_tokens.is_empty() {
        let upcoming: Vec<String> = snapshot
            .upcoming_tokens
            .iter()
            .map(|t| t.to_string())
            .collect();
        println!("  {} {}", "Next up:".bold(), upcoming.join(", "));
    }

    if !snapshot.waiting_members.is_empty() {
        let rows: Vec<MemberRow> = snapshot
            .waiting_members
            .into_iter()
            .map(MemberRow::from)
            .collect();
        println!("{}", Table::new(rows));
    }
}

/// Long-poll `queue.watch.v1` and print every change
async fn watch(client: &RpcClient, service_id: &str) -> Result<()> {
    let params = json!({ "service_id": service_id, "upcoming": 5 });
    let snapshot: Snapshot = client.call_as("queue.query.v1", params).await?;
    let mut known_version = snapshot.version;
    print_snapshot(snapshot);
    println!("{}", "Watching (Ctrl+C to stop)...".dimmed());

    loop {
        let params = json!({
            "service_id": service_id,
            "known_version": known_version,
            "timeout_ms": WATCH_TIMEOUT_MS,
        });

        let result = tokio::select! {
            result = client.call("queue.watch.v1", params) => result?,
            _ = tokio::signal::ctrl_c() => return Ok(()),
        };

        if result["changed"].as_bool().unwrap_or(false) {
            let mut snapshot: Snapshot = serde_json::from_value(result["snapshot"].clone())?;
            known_version = snapshot.version;
            snapshot.upcoming_tokens = snapshot
                .waiting_members
                .iter()
                .take(5)
                .map(|m| m.token)
                .collect();
            println!();
            print_snapshot(snapshot);
        }
    }
}
