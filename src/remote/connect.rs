//! Connection establishment with retry on refusal.
//!
//! Firefox opens its debugger server a little after the process starts,
//! so early attempts are refused. Only refusals are retried; every other
//! failure is returned at once.

// ============================================================================
// Imports
// ============================================================================

use std::future::Future;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::time::sleep;
use tracing::debug;

use crate::error::Result;
use crate::options::{ConnectOptions, DEFAULT_HOST};
use crate::transport::RdpClient;

use super::RemoteFirefox;

// ============================================================================
// Connect
// ============================================================================

/// Connects to the debugger server on `port` at the default host.
///
/// # Errors
///
/// See [`RdpClient::connect`].
pub async fn connect(port: u16) -> Result<RemoteFirefox> {
    connect_with_options(&ConnectOptions::for_port(port)).await
}

/// Connects with explicit options. Makes a single attempt.
///
/// # Errors
///
/// See [`RdpClient::connect`].
pub async fn connect_with_options(options: &ConnectOptions) -> Result<RemoteFirefox> {
    let client = RdpClient::connect(options).await?;
    Ok(RemoteFirefox::new(client))
}

/// Connects with explicit options, retrying refusals as the options say.
///
/// # Errors
///
/// The last refusal once `max_retries` is exhausted, or the first
/// non-refusal error.
pub async fn connect_retrying(options: &ConnectOptions) -> Result<RemoteFirefox> {
    retry_on_refused(options.max_retries, options.retry_interval, || {
        connect_with_options(options)
    })
    .await
}

/// Connects to `port`, retrying refusals up to `max_retries` times.
///
/// # Errors
///
/// See [`connect_retrying`].
pub async fn connect_with_retries(
    port: u16,
    max_retries: u32,
    retry_interval: Duration,
) -> Result<RemoteFirefox> {
    let options = ConnectOptions::for_port(port)
        .with_max_retries(max_retries)
        .with_retry_interval(retry_interval);
    connect_retrying(&options).await
}

// ============================================================================
// Retry Loop
// ============================================================================

/// Runs `attempt` once plus up to `max_retries` more times.
///
/// Sleeps `interval` after each refused attempt except the last.
///
/// # Errors
///
/// The last refusal, or the first error that is not a refusal.
pub async fn retry_on_refused<T, F, Fut>(
    max_retries: u32,
    interval: Duration,
    mut attempt: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut retries = 0;

    loop {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_connection_refused() && retries < max_retries => {
                retries += 1;
                debug!(retries, max_retries, error = %e, "Connection refused, retrying");
                sleep(interval).await;
            }
            Err(e) => return Err(e),
        }
    }
}

// ============================================================================
// Ports
// ============================================================================

/// Returns a TCP port on the default host that was free a moment ago.
///
/// The port is released before returning, so another process may take it.
///
/// # Errors
///
/// Returns an IO error if binding fails.
pub async fn find_free_tcp_port() -> Result<u16> {
    let listener = TcpListener::bind((DEFAULT_HOST, 0)).await?;
    let port = listener.local_addr()?.port();
    drop(listener);
    Ok(port)
}

// ============================================================================
// Tests
// ============================================================================
