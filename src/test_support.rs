//! In-process RDP debugger server for tests.
//!
//! Accepts any number of connections on an ephemeral port, greets each
//! one from the root actor, and answers requests through a responder
//! closure. Every received request is recorded for assertions.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::options::ConnectOptions;
use crate::protocol::{ParseOutcome, RdpRequest, encode_frame, parse_next};

// ============================================================================
// Types
// ============================================================================

/// Produces the packets sent back for one request.
type Responder = Arc<dyn Fn(RdpRequest) -> Vec<Value> + Send + Sync>;

#[derive(Default)]
struct MockState {
    requests: Vec<Value>,
    connections: usize,
    max_in_flight: usize,
}

/// Settings shared by every connection of one server.
struct ServeConfig {
    greeting: Value,
    batch: usize,
    responder: Responder,
    state: Arc<Mutex<MockState>>,
    notify: Arc<Notify>,
}

// ============================================================================
// MockServer
// ============================================================================

pub(crate) struct MockServer {
    port: u16,
    state: Arc<Mutex<MockState>>,
    notify: Arc<Notify>,
    task: JoinHandle<()>,
}

impl MockServer {
    /// Starts a server that replies after every read.
    pub(crate) async fn start<F>(responder: F) -> Self
    where
        F: Fn(RdpRequest) -> Vec<Value> + Send + Sync + 'static,
    {
        Self::launch(browser_greeting(), 1, Arc::new(responder)).await
    }

    /// Starts a server that withholds replies until `batch` requests
    /// are pending on a connection.
    pub(crate) async fn start_batched<F>(batch: usize, responder: F) -> Self
    where
        F: Fn(RdpRequest) -> Vec<Value> + Send + Sync + 'static,
    {
        Self::launch(browser_greeting(), batch, Arc::new(responder)).await
    }

    /// Starts a server with a custom greeting packet.
    pub(crate) async fn start_with_greeting<F>(greeting: Value, responder: F) -> Self
    where
        F: Fn(RdpRequest) -> Vec<Value> + Send + Sync + 'static,
    {
        Self::launch(greeting, 1, Arc::new(responder)).await
    }

    async fn launch(greeting: Value, batch: usize, responder: Responder) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock server");
        let port = listener.local_addr().expect("local addr").port();

        let state = Arc::new(Mutex::new(MockState::default()));
        let notify = Arc::new(Notify::new());
        let config = Arc::new(ServeConfig {
            greeting,
            batch: batch.max(1),
            responder,
            state: Arc::clone(&state),
            notify: Arc::clone(&notify),
        });

        let task = tokio::spawn(accept_loop(listener, config));

        Self {
            port,
            state,
            notify,
            task,
        }
    }

    pub(crate) fn port(&self) -> u16 {
        self.port
    }

    pub(crate) fn options(&self) -> ConnectOptions {
        ConnectOptions::for_port(self.port)
    }

    /// Raw bodies of all received requests, in arrival order.
    pub(crate) fn requests(&self) -> Vec<Value> {
        self.state.lock().requests.clone()
    }

    /// Types of all received requests, in arrival order.
    pub(crate) fn request_types(&self) -> Vec<String> {
        self.state
            .lock()
            .requests
            .iter()
            .filter_map(|r| r.get("type").and_then(Value::as_str).map(str::to_string))
            .collect()
    }

    pub(crate) fn connection_count(&self) -> usize {
        self.state.lock().connections
    }

    /// Largest number of unanswered requests seen on one connection.
    pub(crate) fn max_in_flight(&self) -> usize {
        self.state.lock().max_in_flight
    }

    /// Waits until at least `count` requests have arrived.
    pub(crate) async fn wait_for_requests(&self, count: usize) {
        let wait = async {
            loop {
                let notified = self.notify.notified();
                if self.state.lock().requests.len() >= count {
                    return;
                }
                notified.await;
            }
        };
        timeout(Duration::from_secs(5), wait)
            .await
            .expect("mock server did not receive enough requests");
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

// ============================================================================
// Server Tasks
// ============================================================================

fn browser_greeting() -> Value {
    json!({"from": "root", "applicationType": "browser", "traits": {}})
}

async fn accept_loop(listener: TcpListener, config: Arc<ServeConfig>) {
    while let Ok((stream, _)) = listener.accept().await {
        config.state.lock().connections += 1;
        tokio::spawn(serve(stream, Arc::clone(&config)));
    }
}

async fn serve(mut stream: TcpStream, config: Arc<ServeConfig>) {
    let Ok(greeting) = encode_frame(&config.greeting) else {
        return;
    };
    if stream.write_all(&greeting).await.is_err() {
        return;
    }

    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];
    let mut pending = Vec::new();

    loop {
        let n = match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        buffer.extend_from_slice(&chunk[..n]);

        while let ParseOutcome::Message { consumed, message } = parse_next(&buffer) {
            buffer.drain(..consumed);
            let body = serde_json::to_value(&message).expect("re-serialize request");
            config.state.lock().requests.push(body.clone());
            if let Ok(request) = RdpRequest::try_from(body) {
                pending.push(request);
            }
        }

        {
            let mut state = config.state.lock();
            state.max_in_flight = state.max_in_flight.max(pending.len());
        }
        config.notify.notify_waiters();

        if pending.len() < config.batch {
            continue;
        }
        for request in pending.drain(..) {
            for reply in (config.responder)(request) {
                let Ok(packet) = encode_frame(&reply) else {
                    return;
                };
                if stream.write_all(&packet).await.is_err() {
                    return;
                }
            }
        }
    }
}
