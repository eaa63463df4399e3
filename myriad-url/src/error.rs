//! Error types for URL parsing, property resolution and connection dispatch.
//!
//! Every error carries an [`ErrorCode`] for programmatic handling, the SQL
//! state the driver reports to callers, and optional context pointing at the
//! offending configuration key.
//!
//! # Error Codes
//!
//! Codes follow the pattern `M{category}{number}`:
//! - 3xxx: Connection errors (strategy construction, close)
//! - 7xxx: Configuration errors (bad attributes, host counts)
//! - 9xxx: Internal errors
//!
//! ```rust
//! use myriad_url::{DriverError, ErrorCode};
//!
//! let err = DriverError::insufficient_hosts(1);
//! assert_eq!(err.code, ErrorCode::InsufficientHosts);
//! assert_eq!(err.code.code(), "M7004");
//! assert_eq!(err.sql_state(), "01S00");
//! ```
//!
//! An unrecognised URL is never an error: parsing returns `Ok(None)` so a
//! driver can decline URLs it does not own.

use std::fmt;
use thiserror::Error;

/// Boxed error used at the collaborator boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for driver operations.
pub type DriverResult<T> = Result<T, DriverError>;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Connection errors (3xxx)
    /// Underlying strategy or transport failed to connect (M3001).
    UnableToConnect = 3001,
    /// Closing a connection failed (M3002).
    CloseFailed = 3002,

    // Configuration errors (7xxx)
    /// Malformed host, port or named configuration (M7003).
    InvalidConnectionAttribute = 7003,
    /// Topology needs more hosts than the URL names (M7004).
    InsufficientHosts = 7004,

    // Internal errors (9xxx)
    /// Internal error (M9001).
    Internal = 9001,
}

impl ErrorCode {
    /// Get the error code string (e.g., "M7003").
    pub fn code(&self) -> String {
        format!("M{}", *self as u16)
    }

    /// Get a short description of the error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::UnableToConnect => "Unable to connect",
            Self::CloseFailed => "Connection close failed",
            Self::InvalidConnectionAttribute => "Invalid connection attribute",
            Self::InsufficientHosts => "Insufficient hosts",
            Self::Internal => "Internal error",
        }
    }

    /// SQL state reported for this code.
    pub fn sql_state(&self) -> &'static str {
        match self {
            Self::UnableToConnect => "08001",
            Self::CloseFailed => "08003",
            Self::InvalidConnectionAttribute | Self::InsufficientHosts => "01S00",
            Self::Internal => "S1000",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Additional context for an error.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Configuration key involved.
    pub key: Option<String>,
    /// Suggestions for fixing the error.
    pub suggestions: Vec<String>,
    /// Help text.
    pub help: Option<String>,
}

/// Errors raised while parsing, resolving or dispatching a connection.
#[derive(Error, Debug)]
pub struct DriverError {
    /// The error code.
    pub code: ErrorCode,
    /// The error message.
    pub message: String,
    /// Additional context.
    pub context: ErrorContext,
    /// The source error (if any).
    #[source]
    pub source: Option<BoxError>,
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)
    }
}

impl DriverError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
            source: None,
        }
    }

    /// Set the configuration key involved.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.context.key = Some(key.into());
        self
    }

    /// Add a suggestion for fixing the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context.suggestions.push(suggestion.into());
        self
    }

    /// Add help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.context.help = Some(help.into());
        self
    }

    /// Set the source error.
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    // ============== Constructor Functions ==============

    /// Create an invalid connection attribute error.
    pub fn invalid_attribute(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidConnectionAttribute, message)
    }

    /// A `host:` token with nothing after the colon.
    pub fn dangling_port(token: &str) -> Self {
        Self::invalid_attribute(format!(
            "Must specify port after ':' in connection string (found '{}')",
            token
        ))
        .with_suggestion("Remove the trailing ':' or add a port number")
    }

    /// A named configuration that no loader provides.
    pub fn missing_configuration(name: &str) -> Self {
        Self::invalid_attribute(format!(
            "Can't find configuration template named '{}'",
            name
        ))
        .with_key(crate::properties::keys::USE_CONFIGS)
    }

    /// A named configuration that exists but could not be read.
    pub fn unloadable_configuration(name: &str) -> Self {
        Self::invalid_attribute(format!(
            "Unable to load configuration template '{}' due to underlying I/O or format error",
            name
        ))
        .with_key(crate::properties::keys::USE_CONFIGS)
    }

    /// A properties transform that is unknown or failed.
    pub fn transform_failed(name: &str, reason: impl fmt::Display) -> Self {
        Self::invalid_attribute(format!(
            "Unable to create or apply properties transform '{}': {}",
            name, reason
        ))
        .with_key(crate::properties::keys::PROPERTIES_TRANSFORM)
        .with_help("Register the transform on the driver before connecting")
    }

    /// Replication requested with too few hosts.
    pub fn insufficient_hosts(found: usize) -> Self {
        Self::new(
            ErrorCode::InsufficientHosts,
            format!(
                "Must specify at least one slave host to connect to for master/slave replication load-balancing functionality (found {} host(s))",
                found
            ),
        )
        .with_key(crate::properties::keys::NUM_HOSTS)
    }

    /// Wrap a transport or strategy failure.
    pub fn unable_to_connect(cause: impl Into<BoxError>) -> Self {
        let cause = cause.into();
        Self::new(
            ErrorCode::UnableToConnect,
            format!(
                "Unable to establish connection: {}",
                cause
            ),
        )
        .with_suggestion("Check that the database server is running")
        .with_source(cause)
    }

    /// Wrap a failure raised while closing a session.
    pub fn close_failed(cause: impl Into<BoxError>) -> Self {
        let cause = cause.into();
        Self::new(ErrorCode::CloseFailed, format!("Connection close failed: {}", cause))
            .with_source(cause)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(ErrorCode::Internal, format!("Internal error: {}", message))
    }

    // ============== Error Checks ==============

    /// SQL state reported for this error.
    pub fn sql_state(&self) -> &'static str {
        self.code.sql_state()
    }

    /// Check if this is an invalid connection attribute error.
    pub fn is_invalid_attribute(&self) -> bool {
        self.code == ErrorCode::InvalidConnectionAttribute
    }

    /// Check if this is an insufficient hosts error.
    pub fn is_insufficient_hosts(&self) -> bool {
        self.code == ErrorCode::InsufficientHosts
    }

    /// Check if this wraps a connection failure.
    pub fn is_unable_to_connect(&self) -> bool {
        self.code == ErrorCode::UnableToConnect
    }

    /// Display the full error with context and suggestions.
    pub fn display_full(&self) -> String {
        let mut output = format!("Error [{}]: {}\n", self.code.code(), self.message);

        if let Some(ref key) = self.context.key {
            output.push_str(&format!("  → Key: {}\n", key));
        }
        if let Some(ref source) = self.source {
            output.push_str(&format!("  → Caused by: {}\n", source));
        }

        if !self.context.suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for (i, suggestion) in self.context.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion));
            }
        }

        if let Some(ref help) = self.context.help {
            output.push_str(&format!("\nHelp: {}\n", help));
        }

        output
    }
}
