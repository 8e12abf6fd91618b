//! Server configuration, parsed from the command line.

use clap::Parser;

/// TideKV - in-memory key-value store with per-key FIFO queues
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "tidekv", version, about)]
pub struct Config {
    /// Host to bind to
    #[arg(long, default_value = crate::DEFAULT_HOST)]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = crate::DEFAULT_PORT)]
    pub port: u16,

    /// Log filter used when RUST_LOG is not set (e.g. "info", "tidekv=debug")
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: crate::DEFAULT_HOST.to_string(),
            port: crate::DEFAULT_PORT,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Returns the bind address as a string
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}
