//! Inbound request authentication.
//!
//! Verifies that a request actually originated from Slack: an optional
//! mutual-TLS identity header check, a replay window on
//! `X-Slack-Request-Timestamp`, and an HMAC-SHA256 signature over
//! `v0:<timestamp>:<body>` compared against `X-Slack-Signature`.
//!
//! The validator operates on an owned body buffer acquired once by the
//! dispatcher; the same buffer is handed to the classifier afterwards, so
//! no stream rewinding is involved anywhere.

use std::sync::OnceLock;

use axum::http::HeaderMap;
use hmac::{Hmac, Mac};
use regex::Regex;
use sha2::Sha256;

use crate::errors::AuthError;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the request timestamp in decimal Unix seconds.
pub const TIMESTAMP_HEADER: &str = "X-Slack-Request-Timestamp";

/// Header carrying the `v0=<hex hmac>` request signature.
pub const SIGNATURE_HEADER: &str = "X-Slack-Signature";

/// Common name Slack presents on its mutual-TLS client certificate.
pub const TRUSTED_CLIENT_CN: &str = "platform-tls-client.slack.com";

/// Maximum accepted age of a request timestamp, inclusive.
const MAX_TIMESTAMP_AGE_SECONDS: i64 = 300;

#[allow(clippy::expect_used)] // compile-time literal pattern
fn cn_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new("CN=(.*?),").expect("valid CN pattern"))
}

/// Verifies request signatures against a shared signing secret.
pub struct SignatureValidator {
    signing_secret: String,
    identity_header: Option<String>,
}

impl SignatureValidator {
    /// Create a validator for the given signing secret.
    ///
    /// When `identity_header` is set, the named header must carry a
    /// client-certificate distinguished name whose CN is
    /// [`TRUSTED_CLIENT_CN`].
    #[must_use]
    pub fn new(signing_secret: impl Into<String>, identity_header: Option<String>) -> Self {
        Self {
            signing_secret: signing_secret.into(),
            identity_header,
        }
    }

    /// Verify a request against the current wall clock.
    ///
    /// # Errors
    ///
    /// Returns the first [`AuthError`] encountered; checks run in a fixed
    /// order (identity, timestamp, staleness, signature).
    pub fn verify(&self, headers: &HeaderMap, body: &[u8]) -> Result<(), AuthError> {
        self.verify_at(headers, body, chrono::Utc::now().timestamp())
    }

    /// Verify a request as of `now` (Unix seconds).
    ///
    /// Split out from [`verify`](Self::verify) so the replay-window
    /// boundary is testable without clock manipulation.
    ///
    /// # Errors
    ///
    /// Returns the first [`AuthError`] encountered.
    pub fn verify_at(&self, headers: &HeaderMap, body: &[u8], now: i64) -> Result<(), AuthError> {
        if let Some(name) = &self.identity_header {
            verify_identity(headers, name)?;
        }

        let raw_timestamp = headers
            .get(TIMESTAMP_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AuthError::InvalidTimestamp("header missing".to_owned()))?;
        let timestamp: i64 = raw_timestamp
            .trim()
            .parse()
            .map_err(|err| AuthError::InvalidTimestamp(format!("not a unix timestamp: {err}")))?;

        // Only staleness is enforced; timestamps from the future pass.
        let age_seconds = now - timestamp;
        if age_seconds > MAX_TIMESTAMP_AGE_SECONDS {
            return Err(AuthError::StaleRequest { age_seconds });
        }

        let provided = headers
            .get(SIGNATURE_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or(AuthError::SignatureMismatch)?;
        let provided = provided
            .strip_prefix("v0=")
            .ok_or(AuthError::SignatureMismatch)?;
        let provided = hex::decode(provided).map_err(|_| AuthError::SignatureMismatch)?;

        // HMAC-SHA256 accepts any key length, so this cannot fail in
        // practice; map it to a mismatch rather than panic.
        let mut mac = HmacSha256::new_from_slice(self.signing_secret.as_bytes())
            .map_err(|_| AuthError::SignatureMismatch)?;
        mac.update(format!("v0:{timestamp}:").as_bytes());
        mac.update(body);

        // Constant-time comparison via the Mac trait.
        mac.verify_slice(&provided)
            .map_err(|_| AuthError::SignatureMismatch)
    }

    /// Compute the `v0=<hex>` signature for a timestamp and body.
    ///
    /// Exposed so tests and local tooling can sign requests the same way
    /// the platform does.
    ///
    /// # Panics
    ///
    /// Never in practice; HMAC-SHA256 accepts keys of any length.
    #[must_use]
    pub fn sign(&self, timestamp: i64, body: &[u8]) -> String {
        #[allow(clippy::expect_used)] // any key length is accepted
        let mut mac = HmacSha256::new_from_slice(self.signing_secret.as_bytes())
            .expect("hmac key of any length");
        mac.update(format!("v0:{timestamp}:").as_bytes());
        mac.update(body);
        format!("v0={}", hex::encode(mac.finalize().into_bytes()))
    }
}

fn verify_identity(headers: &HeaderMap, header_name: &str) -> Result<(), AuthError> {
    let value = headers
        .get(header_name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    // The DN must contain the CN pattern exactly once.
    let mut captures = cn_pattern().captures_iter(value);
    let first = captures.next().ok_or(AuthError::InvalidIdentity)?;
    if captures.next().is_some() {
        return Err(AuthError::InvalidIdentity);
    }

    let cn = first.get(1).map_or("", |m| m.as_str());
    if cn == TRUSTED_CLIENT_CN {
        Ok(())
    } else {
        Err(AuthError::InvalidIdentity)
    }
}
