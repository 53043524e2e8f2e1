//! Command-line chat client for clubchat rooms.
//!
//! Connects to a room, joins as the given user and sends every typed line as a
//! chat message. Reconnects on lost connections (max 5 attempts with 5 second
//! interval); a rejected join ends the client.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin clubchat-client -- --chat-id 6f1c2a4e-8d2b-4c53-9a4e-0f3b7a9d1e22 --user-id 1
//! ```

use std::process::ExitCode;

use clap::Parser;
use clubchat_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "clubchat-client")]
#[command(about = "Chat client for clubchat rooms", long_about = None)]
struct Args {
    /// Chat id (UUID) of the club room to join
    #[arg(short = 'c', long)]
    chat_id: String,

    /// Numeric user id to join as
    #[arg(short = 'i', long)]
    user_id: String,

    /// WebSocket server URL
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:8080/ws")]
    url: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    match clubchat_client::run_client(args.url, args.chat_id, args.user_id).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Client error: {}", e);
            ExitCode::FAILURE
        }
    }
}
