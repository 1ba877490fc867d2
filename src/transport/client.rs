//! RDP client.
//!
//! Composes a [`Connection`] with the connect handshake: the debugger
//! server greets every new connection from the root actor, and the client
//! is ready once that greeting has arrived.
//!
//! # Example
//!
//! ```no_run
//! use firefox_rdp::{ConnectOptions, RdpClient, RdpRequest};
//!
//! # async fn example() -> firefox_rdp::Result<()> {
//! let client = RdpClient::connect(&ConnectOptions::for_port(6000)).await?;
//! let root = client.request_root("getRoot").await?;
//! println!("addons actor: {:?}", root.get_str("addonsActor"));
//!
//! let types = client
//!     .request(RdpRequest::new("server1.conn0.addon3", "requestTypes"))
//!     .await?;
//! println!("{types:?}");
//! client.disconnect();
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use crate::error::{Error, Result};
use crate::options::ConnectOptions;
use crate::protocol::{RdpMessage, RdpRequest};

use super::connection::{Connection, EventHandler};

// ============================================================================
// RdpClient
// ============================================================================

/// Client for one connection to a Firefox debugger server.
///
/// Requests to different actors may be in flight at the same time;
/// requests to the same actor are sent one at a time, in call order.
pub struct RdpClient {
    /// Underlying connection.
    connection: Connection,
    /// Greeting sent by the root actor on connect.
    greeting: RdpMessage,
}

impl fmt::Debug for RdpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RdpClient")
            .field("greeting", &self.greeting)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// RdpClient - Connect
// ============================================================================

impl RdpClient {
    /// Connects over TCP and waits for the root greeting.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the options are invalid
    /// - [`Error::ConnectionRefused`] if nothing listens on the port
    /// - [`Error::Connection`] for other socket failures
    /// - [`Error::ConnectionTimeout`] if no greeting arrives in time
    pub async fn connect(options: &ConnectOptions) -> Result<Self> {
        options.validate()?;

        let addr = options.addr();
        let stream = TcpStream::connect(addr.as_str())
            .await
            .map_err(|e| Error::from_connect(addr.as_str(), e))?;

        debug!(%addr, "TCP connection established");

        Self::connect_stream(stream, options).await
    }

    /// Performs the greeting handshake over an already-open stream.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionTimeout`] if no greeting arrives in time
    /// - [`Error::ConnectionClosed`] if the stream closes first
    pub async fn connect_stream<S>(stream: S, options: &ConnectOptions) -> Result<Self>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (connection, greeting_rx) = Connection::open(
            stream,
            options.unsolicited_events.clone(),
            options.idle_timeout,
            None,
        );

        let greeting = match timeout(options.greeting_timeout, greeting_rx).await {
            Ok(received) => received??,
            Err(_) => {
                connection.disconnect();
                let timeout_ms =
                    u64::try_from(options.greeting_timeout.as_millis()).unwrap_or(u64::MAX);
                return Err(Error::connection_timeout(timeout_ms));
            }
        };

        debug!(
            application_type = greeting.get_str("applicationType").unwrap_or("unknown"),
            "RDP greeting received"
        );

        Ok(Self {
            connection,
            greeting,
        })
    }
}

// ============================================================================
// RdpClient - Public API
// ============================================================================

impl RdpClient {
    /// Sends a request and waits for the target actor's reply.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidRequest`] if `to` or `type` is empty (no I/O)
    /// - [`Error::ConnectionClosed`] if the connection closes first
    /// - [`Error::Remote`] if the reply carries an `error` field
    pub async fn request(&self, request: RdpRequest) -> Result<RdpMessage> {
        self.connection.send(request).await
    }

    /// Sends a request of `request_type` to the root actor.
    ///
    /// # Errors
    ///
    /// See [`RdpClient::request`].
    pub async fn request_root(&self, request_type: impl Into<String>) -> Result<RdpMessage> {
        self.request(RdpRequest::root(request_type)).await
    }

    /// Returns the greeting sent by the root actor.
    #[inline]
    #[must_use]
    pub fn greeting(&self) -> &RdpMessage {
        &self.greeting
    }

    /// Sets the callback for unsolicited events and connection errors.
    #[inline]
    pub fn set_event_handler(&self, handler: EventHandler) {
        self.connection.set_event_handler(handler);
    }

    /// Clears the event handler.
    #[inline]
    pub fn clear_event_handler(&self) {
        self.connection.clear_event_handler();
    }

    /// Closes the connection. Idempotent.
    #[inline]
    pub fn disconnect(&self) {
        self.connection.disconnect();
    }

    /// Returns `true` once the connection has closed.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.connection.is_closed()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;
    use tokio::io::duplex;

    use crate::test_support::MockServer;

    #[tokio::test]
    async fn test_connect_receives_greeting() {
        let server = MockServer::start(|_| Vec::new()).await;
        let client = RdpClient::connect(&server.options()).await.expect("connect");

        assert_eq!(client.greeting().from.as_ref().map(|a| a.as_str()), Some("root"));
        assert_eq!(client.greeting().get_str("applicationType"), Some("browser"));
    }

    #[tokio::test]
    async fn test_custom_greeting() {
        let server = MockServer::start_with_greeting(
            json!({"from": "root", "applicationType": "b2g"}),
            |_| Vec::new(),
        )
        .await;
        let options = server
            .options()
            .with_greeting_timeout(Duration::from_secs(5));

        let client = RdpClient::connect(&options).await.expect("connect");
        assert_eq!(client.greeting().get_str("applicationType"), Some("b2g"));
        assert!(!client.is_closed());
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let port = crate::remote::find_free_tcp_port().await.expect("free port");
        let err = RdpClient::connect(&ConnectOptions::for_port(port))
            .await
            .unwrap_err();
        assert!(err.is_connection_refused());
    }

    #[tokio::test]
    async fn test_connect_invalid_options() {
        let options = ConnectOptions::new().with_host("");
        let err = RdpClient::connect(&options).await.unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[tokio::test]
    async fn test_greeting_timeout() {
        let (client_side, _server_side) = duplex(1024);
        let options = ConnectOptions::new().with_greeting_timeout(Duration::from_millis(20));

        let err = RdpClient::connect_stream(client_side, &options)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ConnectionTimeout { timeout_ms: 20 }));
    }

    #[tokio::test]
    async fn test_request_round_trip() {
        let server = MockServer::start(|request| {
            vec![json!({"from": request.to, "type": request.request_type, "echo": true})]
        })
        .await;
        let client = RdpClient::connect(&server.options()).await.expect("connect");

        let reply = client
            .request(RdpRequest::new("actor7", "ping"))
            .await
            .expect("reply");
        assert_eq!(reply.get("echo"), Some(&json!(true)));
        assert_eq!(server.requests(), vec![json!({"to": "actor7", "type": "ping"})]);
    }

    #[tokio::test]
    async fn test_requests_to_distinct_actors_overlap() {
        // The server withholds replies until it has seen both requests.
        let server = MockServer::start_batched(2, |request| {
            vec![json!({"from": request.to, "type": request.request_type})]
        })
        .await;
        let client = RdpClient::connect(&server.options()).await.expect("connect");

        let (a, b) = tokio::join!(
            client.request(RdpRequest::new("a", "ping")),
            client.request(RdpRequest::new("b", "ping")),
        );
        assert!(a.is_ok());
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn test_same_actor_requests_are_serialized() {
        let server = MockServer::start(|request| {
            vec![json!({"from": request.to, "seen": request.request_type})]
        })
        .await;
        let client = Arc::new(RdpClient::connect(&server.options()).await.expect("connect"));

        let (first, second, third) = tokio::join!(
            client.request(RdpRequest::new("addon", "one")),
            client.request(RdpRequest::new("addon", "two")),
            client.request(RdpRequest::new("addon", "three")),
        );

        assert_eq!(first.expect("first").get_str("seen"), Some("one"));
        assert_eq!(second.expect("second").get_str("seen"), Some("two"));
        assert_eq!(third.expect("third").get_str("seen"), Some("three"));
        assert_eq!(server.max_in_flight(), 1);
    }

    #[tokio::test]
    async fn test_forced_disconnect_rejects_all() {
        // Never replies.
        let server = MockServer::start(|_| Vec::new()).await;
        let client = Arc::new(RdpClient::connect(&server.options()).await.expect("connect"));

        let mut handles = Vec::new();
        for (actor, request_type) in [("a", "one"), ("a", "two"), ("b", "one"), ("c", "one")] {
            let client = Arc::clone(&client);
            handles.push(tokio::spawn(async move {
                client.request(RdpRequest::new(actor, request_type)).await
            }));
        }

        server.wait_for_requests(3).await;
        client.disconnect();

        for handle in handles {
            let result = handle.await.expect("task");
            assert!(matches!(result, Err(Error::ConnectionClosed)));
        }
    }

    #[tokio::test]
    async fn test_remote_error_reply() {
        let server = MockServer::start(|request| {
            vec![json!({
                "from": request.to,
                "error": "unknownPacketType",
                "message": "Actor does not recognize the packet type"
            })]
        })
        .await;
        let client = RdpClient::connect(&server.options()).await.expect("connect");

        let err = client.request_root("frobnicate").await.unwrap_err();
        assert!(err.is_remote_error());
        assert!(err.to_string().starts_with("unknownPacketType"));
    }
}
