//! TCP accept loop.
//!
//! A [`Server`] owns the listener, the shared [`Store`] and the connection
//! statistics. Each accepted connection gets its own task and its own
//! [`CommandHandler`] pointing at the same store.

use crate::commands::CommandHandler;
use crate::connection::{handle_connection, ConnectionStats};
use crate::storage::Store;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, ToSocketAddrs};
use tracing::{error, info};

pub struct Server {
    listener: TcpListener,
    store: Arc<Store>,
    stats: Arc<ConnectionStats>,
}

impl Server {
    /// Binds a listener with a fresh, empty store.
    pub async fn bind(addr: impl ToSocketAddrs) -> io::Result<Self> {
        Self::bind_with_store(addr, Arc::new(Store::new())).await
    }

    /// Binds a listener serving an existing store.
    pub async fn bind_with_store(addr: impl ToSocketAddrs, store: Arc<Store>) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            store,
            stats: Arc::new(ConnectionStats::new()),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub fn stats(&self) -> &Arc<ConnectionStats> {
        &self.stats
    }

    /// Accepts connections until `shutdown` completes.
    ///
    /// Connections already in flight keep running on their own tasks.
    pub async fn run_until(&self, shutdown: impl Future<Output = ()>) {
        tokio::select! {
            _ = self.accept_loop() => {}
            _ = shutdown => {
                info!("shutdown signal received, stopping server");
            }
        }

        let store = self.store.stats();
        info!(
            connections = self.stats.connections_accepted.load(Ordering::Relaxed),
            active = self.stats.active_connections.load(Ordering::Relaxed),
            commands = self.stats.commands_processed.load(Ordering::Relaxed),
            bytes_read = self.stats.bytes_read.load(Ordering::Relaxed),
            bytes_written = self.stats.bytes_written.load(Ordering::Relaxed),
            keys = store.keys,
            expired = store.expired,
            "server stopped"
        );
    }

    async fn accept_loop(&self) {
        let mut backoff = None;

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    backoff = None;
                    let handler = CommandHandler::new(Arc::clone(&self.store));
                    let stats = Arc::clone(&self.stats);

                    tokio::spawn(async move {
                        handle_connection(stream, addr, handler, stats).await;
                    });
                }
                Err(e) => {
                    // Errors such as EMFILE persist until a connection closes
                    let delay = next_backoff(backoff);
                    backoff = Some(delay);
                    error!(retry_in = ?delay, "failed to accept connection: {}", e);
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

/// First delay after a failed accept
const MIN_ACCEPT_BACKOFF: Duration = Duration::from_millis(10);

/// Upper bound for the accept retry delay
const MAX_ACCEPT_BACKOFF: Duration = Duration::from_secs(1);

/// Doubles the previous accept retry delay, capped at [`MAX_ACCEPT_BACKOFF`].
fn next_backoff(previous: Option<Duration>) -> Duration {
    match previous {
        None => MIN_ACCEPT_BACKOFF,
        Some(delay) => (delay * 2).min(MAX_ACCEPT_BACKOFF),
    }
}
