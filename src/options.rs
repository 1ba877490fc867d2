//! Connection options.
//!
//! Provides a type-safe interface for where and how to reach the Firefox
//! debugger server. Nothing here is global: every value is threaded
//! through the `connect*` calls.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use firefox_rdp::ConnectOptions;
//!
//! let options = ConnectOptions::new()
//!     .with_port(6001)
//!     .with_max_retries(10)
//!     .with_retry_interval(Duration::from_millis(200));
//!
//! assert_eq!(options.addr(), "127.0.0.1:6001");
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::error::{Error, Result};
use crate::protocol::UnsolicitedEvents;

// ============================================================================
// Constants
// ============================================================================

/// Default debugger server host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default debugger server port (Firefox `--start-debugger-server` default).
pub const DEFAULT_PORT: u16 = 6000;

/// Default timeout for the root greeting.
pub const DEFAULT_GREETING_TIMEOUT: Duration = Duration::from_secs(30);

/// Default retry count. With the default interval this is about 30 seconds.
pub const DEFAULT_MAX_RETRIES: u32 = 250;

/// Default delay between connection attempts.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(120);

// ============================================================================
// ConnectOptions
// ============================================================================

/// Options for connecting to the Firefox debugger server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOptions {
    /// Debugger server host.
    pub host: String,

    /// Debugger server port.
    pub port: u16,

    /// Maximum wait for the root greeting after the TCP connect.
    pub greeting_timeout: Duration,

    /// Emit a timeout event when no bytes arrive for this long.
    pub idle_timeout: Option<Duration>,

    /// Message types routed as unsolicited events.
    pub unsolicited_events: UnsolicitedEvents,

    /// Retries after the first refused attempt.
    pub max_retries: u32,

    /// Delay between refused attempts.
    pub retry_interval: Duration,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl ConnectOptions {
    /// Creates options with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            greeting_timeout: DEFAULT_GREETING_TIMEOUT,
            idle_timeout: None,
            unsolicited_events: UnsolicitedEvents::default(),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_interval: DEFAULT_RETRY_INTERVAL,
        }
    }

    /// Creates default options for `port`.
    #[inline]
    #[must_use]
    pub fn for_port(port: u16) -> Self {
        Self::new().with_port(port)
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl ConnectOptions {
    /// Sets the host.
    #[inline]
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the port.
    #[inline]
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the greeting timeout.
    #[inline]
    #[must_use]
    pub fn with_greeting_timeout(mut self, timeout: Duration) -> Self {
        self.greeting_timeout = timeout;
        self
    }

    /// Enables the idle timeout event.
    #[inline]
    #[must_use]
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }

    /// Replaces the unsolicited event set.
    #[inline]
    #[must_use]
    pub fn with_unsolicited_events(mut self, events: UnsolicitedEvents) -> Self {
        self.unsolicited_events = events;
        self
    }

    /// Sets the retry count used by [`crate::remote::connect_retrying`].
    #[inline]
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the delay between refused attempts.
    #[inline]
    #[must_use]
    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }
}

// ============================================================================
// Accessors & Validation
// ============================================================================

impl ConnectOptions {
    /// Returns `host:port`.
    #[inline]
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Validates the options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the host is empty or the greeting
    /// timeout is zero.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::config("host must not be empty"));
        }
        if self.greeting_timeout.is_zero() {
            return Err(Error::config("greeting timeout must be greater than zero"));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
