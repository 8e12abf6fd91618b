//! Connection Handler
//!
//! Each client connection is served by its own task running a
//! read → decode → execute → reply loop until the client disconnects,
//! sends `QUIT`, or sends bytes that cannot be decoded.
//!
//! ## Buffer Management
//!
//! Incoming bytes accumulate in a `BytesMut`. TCP is a stream, so one read may
//! hold half a request or several pipelined ones; every complete request is
//! executed, and all their replies are flushed together before the next read.

use crate::commands::CommandHandler;
use crate::protocol::{parse_request, ParseError, RespValue};
use bytes::{Buf, BytesMut};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter};
use tracing::{debug, info, trace, warn};

/// Maximum size for the read buffer (1 MB)
const MAX_BUFFER_SIZE: usize = 1024 * 1024;

/// Initial buffer capacity
const INITIAL_BUFFER_SIZE: usize = 4096;

/// Statistics for connection handling
#[derive(Debug, Default)]
pub struct ConnectionStats {
    /// Total number of connections accepted
    pub connections_accepted: AtomicU64,
    /// Currently active connections
    pub active_connections: AtomicU64,
    /// Total commands processed
    pub commands_processed: AtomicU64,
    /// Total bytes read
    pub bytes_read: AtomicU64,
    /// Total bytes written
    pub bytes_written: AtomicU64,
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    fn connection_opened(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Errors that can occur while handling a connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// I/O error (network issue)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Undecodable request
    #[error("protocol error: {0}")]
    Parse(#[from] ParseError),

    /// Client closed the connection between requests
    #[error("client disconnected")]
    ClientDisconnected,

    /// Client closed the connection in the middle of a request
    #[error("unexpected end of stream")]
    UnexpectedEof,

    /// A single request outgrew the read buffer limit
    #[error("buffer size limit exceeded")]
    BufferFull,
}

/// Serves a single client connection.
pub struct ConnectionHandler<S> {
    /// Client stream, writes buffered until a batch of replies is complete
    stream: BufWriter<S>,

    /// Client's address (for logging)
    addr: SocketAddr,

    /// Unparsed incoming bytes
    buffer: BytesMut,

    /// Encoded replies waiting to be flushed
    replies: BytesMut,

    command_handler: CommandHandler,

    stats: Arc<ConnectionStats>,
}

impl<S> ConnectionHandler<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(
        stream: S,
        addr: SocketAddr,
        command_handler: CommandHandler,
        stats: Arc<ConnectionStats>,
    ) -> Self {
        stats.connection_opened();

        Self {
            stream: BufWriter::new(stream),
            addr,
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_SIZE),
            replies: BytesMut::new(),
            command_handler,
            stats,
        }
    }

    /// Runs the connection loop to completion.
    ///
    /// Returns `Ok(())` when the client sends `QUIT`.
    pub async fn run(mut self) -> Result<(), ConnectionError> {
        debug!(client = %self.addr, "client connected");

        let result = self.main_loop().await;

        match &result {
            Ok(()) => debug!(client = %self.addr, "client quit"),
            Err(ConnectionError::ClientDisconnected) => {
                debug!(client = %self.addr, "client disconnected")
            }
            Err(ConnectionError::Io(e)) if e.kind() == std::io::ErrorKind::ConnectionReset => {
                debug!(client = %self.addr, "connection reset by client")
            }
            Err(e) => warn!(client = %self.addr, error = %e, "connection error"),
        }

        self.stats.connection_closed();
        result
    }

    async fn main_loop(&mut self) -> Result<(), ConnectionError> {
        loop {
            let quit = self.execute_buffered().await?;
            self.flush_replies().await?;
            if quit {
                return Ok(());
            }

            self.read_more_data().await?;
        }
    }

    /// Executes every complete request in the buffer.
    ///
    /// Returns true if one of them was `QUIT`; requests after it are dropped.
    async fn execute_buffered(&mut self) -> Result<bool, ConnectionError> {
        loop {
            let (args, consumed) = match parse_request(&self.buffer) {
                Ok(Some(request)) => request,
                Ok(None) => return Ok(false),
                Err(e) => {
                    warn!(client = %self.addr, error = %e, "undecodable request");
                    RespValue::error(format!("ERR Protocol error: {}", e)).encode(&mut self.replies);
                    self.flush_replies().await?;
                    return Err(e.into());
                }
            };
            self.buffer.advance(consumed);

            // Blank inline line
            if args.is_empty() {
                continue;
            }

            let quit = args[0].eq_ignore_ascii_case(b"QUIT");
            let reply = self.command_handler.execute(args);
            reply.encode(&mut self.replies);
            self.stats.commands_processed.fetch_add(1, Ordering::Relaxed);

            if quit {
                return Ok(true);
            }
        }
    }

    async fn flush_replies(&mut self) -> Result<(), ConnectionError> {
        if self.replies.is_empty() {
            return Ok(());
        }

        let replies = self.replies.split();
        self.stream.write_all(&replies).await?;
        self.stream.flush().await?;
        self.stats
            .bytes_written
            .fetch_add(replies.len() as u64, Ordering::Relaxed);
        trace!(client = %self.addr, bytes = replies.len(), "sent replies");
        Ok(())
    }

    async fn read_more_data(&mut self) -> Result<(), ConnectionError> {
        if self.buffer.len() >= MAX_BUFFER_SIZE {
            warn!(client = %self.addr, size = self.buffer.len(), "buffer size limit exceeded");
            return Err(ConnectionError::BufferFull);
        }

        let n = self.stream.get_mut().read_buf(&mut self.buffer).await?;

        if n == 0 {
            return Err(if self.buffer.is_empty() {
                ConnectionError::ClientDisconnected
            } else {
                ConnectionError::UnexpectedEof
            });
        }

        self.stats.bytes_read.fetch_add(n as u64, Ordering::Relaxed);
        trace!(client = %self.addr, bytes = n, "read data");
        Ok(())
    }
}

/// Serves a client connection to completion, logging how it ended.
pub async fn handle_connection<S>(
    stream: S,
    addr: SocketAddr,
    command_handler: CommandHandler,
    stats: Arc<ConnectionStats>,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let handler = ConnectionHandler::new(stream, addr, command_handler, stats);
    if let Err(e) = handler.run().await {
        if !matches!(e, ConnectionError::ClientDisconnected) {
            info!(client = %addr, error = %e, "connection closed with error");
        }
    }
}
