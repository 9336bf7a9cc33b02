//! Error types for the gateway core and the surrounding glue.
//!
//! Request authentication, classification, routing, and handler failures
//! each have their own enumeration so the dispatcher can map them to the
//! correct HTTP status without inspecting message strings.

use std::fmt::{Display, Formatter};

/// Shared application result type for glue-level failures.
pub type Result<T> = std::result::Result<T, AppError>;

/// Request authentication failure.
///
/// Every variant maps to an HTTP 400 with a generic body; the precise
/// variant is only ever written to the server log.
#[derive(Debug)]
pub enum AuthError {
    /// The mutual-TLS identity header is absent, ambiguous, or carries
    /// an untrusted common name.
    InvalidIdentity,
    /// `X-Slack-Request-Timestamp` is absent or not a decimal integer.
    InvalidTimestamp(String),
    /// The request timestamp is outside the replay window.
    StaleRequest {
        /// Seconds elapsed since the request timestamp.
        age_seconds: i64,
    },
    /// The request body could not be read.
    BodyReadError(String),
    /// The computed HMAC does not match `X-Slack-Signature`.
    SignatureMismatch,
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidIdentity => write!(f, "invalid client certificate identity"),
            Self::InvalidTimestamp(msg) => write!(f, "invalid timestamp: {msg}"),
            Self::StaleRequest { age_seconds } => {
                write!(f, "stale request: timestamp is {age_seconds}s old")
            }
            Self::BodyReadError(msg) => write!(f, "body read failed: {msg}"),
            Self::SignatureMismatch => write!(f, "signature mismatch"),
        }
    }
}

impl std::error::Error for AuthError {}

/// Payload classification failure.
///
/// Unlike [`AuthError`], classification messages are part of the HTTP
/// contract: the dispatcher surfaces them verbatim in the 400 body.
#[derive(Debug, PartialEq, Eq)]
pub enum ClassifyError {
    /// A required key is absent or empty in an interaction payload.
    MissingField(&'static str),
    /// The `payload` form field is not valid JSON.
    MalformedJson(String),
    /// The body matches none of the known payload shapes.
    UnparseablePayload,
}

impl Display for ClassifyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "missing value for '{field}' key"),
            Self::MalformedJson(msg) => write!(f, "error parsing payload JSON: {msg}"),
            Self::UnparseablePayload => write!(f, "unrecognized payload shape"),
        }
    }
}

impl std::error::Error for ClassifyError {}

/// Route registration failure.
///
/// A failed match at dispatch time is the normal 404 path, not an error;
/// these variants only occur while the table is being built or edited.
#[derive(Debug, PartialEq, Eq)]
pub enum RouteError {
    /// A route with the same discriminator is already registered.
    DuplicateRoute(String),
    /// No route with the given discriminator is registered.
    RouteNotFound(String),
}

impl Display for RouteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateRoute(key) => write!(f, "duplicate route: {key}"),
            Self::RouteNotFound(key) => write!(f, "route not found: {key}"),
        }
    }
}

impl std::error::Error for RouteError {}

/// Handler invocation failure.
///
/// Logged with full detail server-side and converted to a generic 500;
/// handler error text never reaches the caller.
#[derive(Debug)]
pub enum HandlerError {
    /// The handler asked the context for a payload kind it does not carry.
    WrongKind {
        /// Kind the handler expected.
        expected: &'static str,
        /// Kind the context actually carries.
        got: &'static str,
    },
    /// Whatever the handler itself raised.
    Other(String),
}

impl Display for HandlerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WrongKind { expected, got } => {
                write!(f, "handler context mismatch: expected {expected}, got {got}")
            }
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for HandlerError {}

impl From<String> for HandlerError {
    fn from(msg: String) -> Self {
        Self::Other(msg)
    }
}

impl From<&str> for HandlerError {
    fn from(msg: &str) -> Self {
        Self::Other(msg.to_owned())
    }
}

/// Application error enumeration for the glue around the core.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// Slack API failure.
    Slack(String),
    /// Route registration failure during startup.
    Routes(String),
    /// File-system or network I/O failure.
    Io(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Slack(msg) => write!(f, "slack: {msg}"),
            Self::Routes(msg) => write!(f, "routes: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<RouteError> for AppError {
    fn from(err: RouteError) -> Self {
        Self::Routes(err.to_string())
    }
}
