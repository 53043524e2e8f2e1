//! Club chat server.
//!
//! Serves one broadcast room per club chat id over WebSocket.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin clubchat-server
//! cargo run --bin clubchat-server -- --host 0.0.0.0 --port 3000 --directory fixtures/directory.json
//! ```

use std::{path::PathBuf, process::ExitCode, sync::Arc, time::Duration};

use clap::Parser;
use clubchat_server::{
    config::{ChatConfig, DEFAULT_TITLE},
    infrastructure::directory::InMemoryDirectory,
    ui::{Server, ServerError},
    usecase::Registry,
};
use clubchat_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "clubchat-server")]
#[command(about = "Real-time club chat server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// JSON file with the users and clubs known to the server
    #[arg(short = 'd', long)]
    directory: Option<PathBuf>,

    /// Capacity of each room's inbound queue (primary throttle)
    #[arg(long, default_value = "100")]
    queue_capacity: usize,

    /// Capacity of each connection's outbound queue
    #[arg(long, default_value = "256")]
    outbox_capacity: usize,

    /// Seconds without a pong before a connection is dropped
    #[arg(long, default_value = "60")]
    read_timeout_secs: u64,

    /// Upper bound for a single socket write, in seconds
    #[arg(long, default_value = "10")]
    write_timeout_secs: u64,

    /// Largest accepted inbound frame, in bytes
    #[arg(long, default_value = "10000")]
    max_message_size: usize,

    /// Title of rooms the directory does not know
    #[arg(long, default_value = DEFAULT_TITLE)]
    default_title: String,

    /// Seconds to wait for connections to close on shutdown
    #[arg(long, default_value = "5")]
    shutdown_timeout_secs: u64,
}

impl Args {
    fn chat_config(&self) -> ChatConfig {
        ChatConfig {
            inbound_queue_capacity: self.queue_capacity,
            outbound_queue_capacity: self.outbox_capacity,
            read_timeout: Duration::from_secs(self.read_timeout_secs),
            write_timeout: Duration::from_secs(self.write_timeout_secs),
            max_message_size: self.max_message_size,
            default_title: self.default_title.clone(),
            shutdown_timeout: Duration::from_secs(self.shutdown_timeout_secs),
        }
    }
}

async fn run(args: Args) -> Result<(), ServerError> {
    // 1. Configuration
    let config = args.chat_config();
    config.validate()?;

    // 2. Directories (user identity + room titles)
    let directory = match &args.directory {
        Some(path) => InMemoryDirectory::load(path).await?,
        None => InMemoryDirectory::new(),
    };
    tracing::info!(
        users = directory.user_count(),
        clubs = directory.club_count(),
        "Directory loaded"
    );
    let directory = Arc::new(directory);

    // 3. Registry and server
    let registry = Arc::new(Registry::new(config, directory.clone(), directory));
    Server::new(registry).run(args.host, args.port).await
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}
