//! RDP connection and event loop.
//!
//! This module handles the byte stream to the Firefox debugger server,
//! including packet framing, request/reply correlation and event routing.
//!
//! # Event Loop
//!
//! The connection spawns a tokio task that exclusively owns:
//!
//! - The stream halves
//! - The incoming byte buffer
//! - The [`Multiplexer`] queue and active table
//!
//! API handles talk to it over a command channel, so no lock guards
//! protocol state. Events are delivered, in arrival order, to the
//! [`EventHandler`] installed on the connection.

// ============================================================================
// Imports
// ============================================================================

use std::future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, WriteHalf};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, error, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::ActorId;
use crate::protocol::{ParseOutcome, RdpMessage, RdpRequest, UnsolicitedEvents, parse_next};

use super::multiplexer::{Multiplexer, ReplySender, Routed};

// ============================================================================
// Constants
// ============================================================================

/// Size of a single socket read.
const READ_CHUNK_SIZE: usize = 16 * 1024;

// ============================================================================
// Types
// ============================================================================

/// Event handler callback type.
///
/// Called on the event loop task for each event, in arrival order.
/// The handler must not install or clear handlers on the same connection.
pub type EventHandler = Box<dyn Fn(RdpEvent) + Send + Sync>;

/// Receiver for the root greeting.
pub type GreetingReceiver = oneshot::Receiver<Result<RdpMessage>>;

/// Shared slot holding the optional event handler.
type HandlerSlot = Arc<Mutex<Option<EventHandler>>>;

// ============================================================================
// RdpEvent
// ============================================================================

/// Notifications not tied to any request.
#[derive(Debug)]
pub enum RdpEvent {
    /// Server-pushed event of a configured unsolicited type.
    Unsolicited(RdpMessage),

    /// Error envelope without a sender actor.
    RdpError(RdpMessage),

    /// Framing, protocol or socket error.
    ///
    /// Fatal framing and socket errors are followed by disconnection.
    Error(Error),

    /// The server closed the stream.
    End,

    /// No bytes arrived within the configured idle timeout.
    Timeout,
}

// ============================================================================
// ConnectionCommand
// ============================================================================

/// Internal commands for the event loop.
enum ConnectionCommand {
    /// Queue a request.
    Request {
        request: RdpRequest,
        reply: ReplySender,
    },
    /// Close the stream and reject everything outstanding.
    Disconnect,
}

// ============================================================================
// Connection
// ============================================================================

/// Connection to a Firefox debugger server.
///
/// Dropping the connection closes the stream.
pub struct Connection {
    /// Channel for sending commands to the event loop.
    command_tx: mpsc::UnboundedSender<ConnectionCommand>,
    /// Event handler (shared with event loop).
    event_handler: HandlerSlot,
}

impl Connection {
    /// Opens a connection over `stream` and spawns its event loop.
    ///
    /// A reply expectation for the root actor is registered before the
    /// first byte is read; the returned receiver completes with the
    /// server's greeting.
    pub fn open<S>(
        stream: S,
        unsolicited: UnsolicitedEvents,
        idle_timeout: Option<Duration>,
        event_handler: Option<EventHandler>,
    ) -> (Self, GreetingReceiver)
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let event_handler: HandlerSlot = Arc::new(Mutex::new(event_handler));

        let mut multiplexer = Multiplexer::new(unsolicited);
        let (greeting_tx, greeting_rx) = oneshot::channel();
        multiplexer.expect_reply(ActorId::root(), greeting_tx);

        tokio::spawn(Self::run_event_loop(
            stream,
            multiplexer,
            command_rx,
            Arc::clone(&event_handler),
            idle_timeout,
        ));

        (
            Self {
                command_tx,
                event_handler,
            },
            greeting_rx,
        )
    }

    /// Sets the event handler callback.
    pub fn set_event_handler(&self, handler: EventHandler) {
        *self.event_handler.lock() = Some(handler);
    }

    /// Clears the event handler.
    pub fn clear_event_handler(&self) {
        *self.event_handler.lock() = None;
    }

    /// Sends a request and waits for the target actor's reply.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidRequest`] if the request has no target or type
    /// - [`Error::ConnectionClosed`] if the connection closes first
    /// - [`Error::Remote`] if the reply carries an `error` field
    pub async fn send(&self, request: RdpRequest) -> Result<RdpMessage> {
        request.validate()?;

        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(ConnectionCommand::Request {
                request,
                reply: reply_tx,
            })
            .map_err(|_| Error::ConnectionClosed)?;

        reply_rx.await.map_err(|_| Error::ConnectionClosed)?
    }

    /// Closes the connection. Idempotent.
    ///
    /// Every queued and active request is rejected with
    /// [`Error::ConnectionClosed`].
    pub fn disconnect(&self) {
        let _ = self.command_tx.send(ConnectionCommand::Disconnect);
    }

    /// Returns `true` once the event loop has terminated.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.command_tx.is_closed()
    }

    /// Event loop that handles stream I/O.
    async fn run_event_loop<S>(
        stream: S,
        mut multiplexer: Multiplexer,
        mut command_rx: mpsc::UnboundedReceiver<ConnectionCommand>,
        event_handler: HandlerSlot,
        idle_timeout: Option<Duration>,
    ) where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (mut reader, mut writer) = tokio::io::split(stream);
        let mut incoming: Vec<u8> = Vec::new();
        let mut chunk = vec![0u8; READ_CHUNK_SIZE];
        let mut idle_deadline = idle_timeout.map(|d| Instant::now() + d);

        loop {
            tokio::select! {
                // Incoming bytes from the server
                read = reader.read(&mut chunk) => {
                    match read {
                        Ok(0) => {
                            debug!("RDP stream ended");
                            Self::emit(&event_handler, RdpEvent::End);
                            break;
                        }

                        Ok(n) => {
                            trace!(bytes = n, "Data received");
                            idle_deadline = idle_timeout.map(|d| Instant::now() + d);
                            incoming.extend_from_slice(&chunk[..n]);

                            if !Self::read_messages(&mut incoming, &mut multiplexer, &event_handler) {
                                break;
                            }
                        }

                        Err(e) => {
                            error!(error = %e, "RDP socket error");
                            Self::emit(&event_handler, RdpEvent::Error(Error::Io(e)));
                            break;
                        }
                    }
                }

                // Commands from the API
                command = command_rx.recv() => {
                    match command {
                        Some(ConnectionCommand::Request { request, reply }) => {
                            multiplexer.submit(request, reply);
                        }

                        Some(ConnectionCommand::Disconnect) | None => {
                            debug!("Disconnecting RDP connection");
                            let _ = writer.shutdown().await;
                            break;
                        }
                    }
                }

                () = Self::idle(idle_deadline) => {
                    debug!("RDP connection idle");
                    Self::emit(&event_handler, RdpEvent::Timeout);
                    idle_deadline = idle_timeout.map(|d| Instant::now() + d);
                }
            }

            if let Err(e) = Self::write_packets(&mut writer, multiplexer.flush()).await {
                error!(error = %e, "Failed to write RDP request");
                Self::emit(&event_handler, RdpEvent::Error(e));
                break;
            }
        }

        // Fail all outstanding requests on shutdown
        multiplexer.reject_all();

        debug!("Event loop terminated");
    }

    /// Parses and dispatches every complete packet in `incoming`.
    ///
    /// Returns `false` if a fatal framing error requires disconnection.
    fn read_messages(
        incoming: &mut Vec<u8>,
        multiplexer: &mut Multiplexer,
        event_handler: &HandlerSlot,
    ) -> bool {
        loop {
            match parse_next(incoming) {
                ParseOutcome::NeedMoreData => return true,

                ParseOutcome::Message { consumed, message } => {
                    incoming.drain(..consumed);
                    Self::dispatch(message, multiplexer, event_handler);
                }

                ParseOutcome::Malformed { consumed, error } => {
                    incoming.drain(..consumed);
                    warn!(error = %error, "Skipping malformed RDP packet");
                    Self::emit(event_handler, RdpEvent::Error(error));
                }

                ParseOutcome::Fatal(error) => {
                    error!(error = %error, "Unframable RDP stream");
                    Self::emit(event_handler, RdpEvent::Error(error));
                    return false;
                }
            }
        }
    }

    /// Routes one decoded message.
    fn dispatch(message: RdpMessage, multiplexer: &mut Multiplexer, event_handler: &HandlerSlot) {
        match multiplexer.route(message) {
            Routed::Completed(_) => {}
            Routed::Unsolicited(message) => {
                Self::emit(event_handler, RdpEvent::Unsolicited(message));
            }
            Routed::RdpError(message) => {
                Self::emit(event_handler, RdpEvent::RdpError(message));
            }
            Routed::Unexpected(error) => {
                warn!(error = %error, "Unroutable RDP message");
                Self::emit(event_handler, RdpEvent::Error(error));
            }
        }
    }

    /// Writes encoded requests to the stream.
    async fn write_packets<S>(writer: &mut WriteHalf<S>, packets: Vec<Vec<u8>>) -> Result<()>
    where
        S: AsyncWrite,
    {
        if packets.is_empty() {
            return Ok(());
        }

        for packet in &packets {
            writer.write_all(packet).await?;
        }
        writer.flush().await?;

        trace!(count = packets.len(), "Requests written");
        Ok(())
    }

    /// Completes at `deadline`, or never when there is none.
    async fn idle(deadline: Option<Instant>) {
        match deadline {
            Some(deadline) => sleep_until(deadline).await,
            None => future::pending().await,
        }
    }

    /// Delivers an event to the installed handler.
    fn emit(event_handler: &HandlerSlot, event: RdpEvent) {
        let guard = event_handler.lock();
        match guard.as_ref() {
            Some(handler) => handler(event),
            None => match event {
                RdpEvent::Error(e) => warn!(error = %e, "RDP error with no event handler"),
                other => trace!(event = ?other, "RDP event with no event handler"),
            },
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
