//! Server configuration (command line flags and `LILYCHAT_*` environment variables).

use std::time::Duration;

use clap::Parser;

/// Configuration of the chat server
#[derive(Parser, Debug, Clone)]
#[command(name = "lilychat-server")]
#[command(about = "Two-party WebSocket chat server", long_about = None)]
pub struct ServerConfig {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "LILYCHAT_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "LILYCHAT_PORT", default_value = "8080")]
    pub port: u16,

    /// Secret used to verify HS256 access tokens
    #[arg(long, env = "LILYCHAT_JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    /// Number of frames buffered per connection before deliveries are dropped
    #[arg(
        long,
        env = "LILYCHAT_OUTBOUND_QUEUE_CAPACITY",
        default_value = "64",
        value_parser = parse_capacity
    )]
    pub outbound_queue_capacity: usize,

    /// Maximum number of stored messages (unlimited if omitted)
    #[arg(long, env = "LILYCHAT_MESSAGE_CAPACITY")]
    pub message_capacity: Option<usize>,

    /// Seconds to wait for sessions to drain on shutdown
    #[arg(long, env = "LILYCHAT_SHUTDOWN_TIMEOUT_SECS", default_value = "5")]
    pub shutdown_timeout_secs: u64,
}

impl ServerConfig {
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

fn parse_capacity(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("capacity must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}
