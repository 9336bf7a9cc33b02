//! Unit tests for the signature validator.
//!
//! The replay-window boundary and single-byte-mutation properties are
//! exercised through `verify_at` so no clock manipulation is needed.

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use helpdesk_gateway::errors::AuthError;
use helpdesk_gateway::webhook::signature::{
    SignatureValidator, SIGNATURE_HEADER, TIMESTAMP_HEADER, TRUSTED_CLIENT_CN,
};

const SECRET: &str = "8f742231b10e8888abcd99yyyzzz85a5";
const DN_HEADER: &str = "x-client-dn";

fn header_name(name: &str) -> HeaderName {
    HeaderName::from_bytes(name.as_bytes()).expect("valid header name")
}

fn signed_headers(validator: &SignatureValidator, timestamp: i64, body: &[u8]) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header_name(TIMESTAMP_HEADER),
        HeaderValue::from_str(&timestamp.to_string()).expect("valid header value"),
    );
    headers.insert(
        header_name(SIGNATURE_HEADER),
        HeaderValue::from_str(&validator.sign(timestamp, body)).expect("valid header value"),
    );
    headers
}

#[test]
fn valid_signature_within_window_passes() {
    let validator = SignatureValidator::new(SECRET, None);
    let body = b"command=%2Fhelp-me&text=";
    let headers = signed_headers(&validator, 1_600_000_000, body);

    assert!(validator.verify_at(&headers, body, 1_600_000_000).is_ok());
}

#[test]
fn timestamp_exactly_300s_old_is_accepted() {
    let validator = SignatureValidator::new(SECRET, None);
    let body = b"payload=%7B%7D";
    let headers = signed_headers(&validator, 1_600_000_000, body);

    assert!(validator.verify_at(&headers, body, 1_600_000_300).is_ok());
}

#[test]
fn timestamp_301s_old_is_stale() {
    let validator = SignatureValidator::new(SECRET, None);
    let body = b"payload=%7B%7D";
    let headers = signed_headers(&validator, 1_600_000_000, body);

    let err = validator
        .verify_at(&headers, body, 1_600_000_301)
        .expect_err("stale timestamp must be rejected");
    assert!(matches!(err, AuthError::StaleRequest { age_seconds: 301 }));
}

#[test]
fn future_timestamp_is_accepted() {
    // Only staleness is enforced; there is no lower bound on age.
    let validator = SignatureValidator::new(SECRET, None);
    let body = b"text";
    let headers = signed_headers(&validator, 1_600_000_500, body);

    assert!(validator.verify_at(&headers, body, 1_600_000_000).is_ok());
}

#[test]
fn mutated_body_flips_to_mismatch() {
    let validator = SignatureValidator::new(SECRET, None);
    let body = b"command=%2Fhelp-me";
    let headers = signed_headers(&validator, 1_600_000_000, body);

    let mut tampered = body.to_vec();
    tampered[0] ^= 1;
    let err = validator
        .verify_at(&headers, &tampered, 1_600_000_000)
        .expect_err("tampered body must fail");
    assert!(matches!(err, AuthError::SignatureMismatch));
}

#[test]
fn mutated_timestamp_flips_to_mismatch() {
    let validator = SignatureValidator::new(SECRET, None);
    let body = b"command=%2Fhelp-me";
    let mut headers = signed_headers(&validator, 1_600_000_000, body);
    headers.insert(
        header_name(TIMESTAMP_HEADER),
        HeaderValue::from_static("1600000001"),
    );

    let err = validator
        .verify_at(&headers, body, 1_600_000_001)
        .expect_err("re-stamped request must fail");
    assert!(matches!(err, AuthError::SignatureMismatch));
}

#[test]
fn wrong_secret_flips_to_mismatch() {
    let signer = SignatureValidator::new(SECRET, None);
    let verifier = SignatureValidator::new("some-other-secret", None);
    let body = b"command=%2Fhelp-me";
    let headers = signed_headers(&signer, 1_600_000_000, body);

    let err = verifier
        .verify_at(&headers, body, 1_600_000_000)
        .expect_err("wrong secret must fail");
    assert!(matches!(err, AuthError::SignatureMismatch));
}

#[test]
fn missing_timestamp_is_invalid() {
    let validator = SignatureValidator::new(SECRET, None);
    let headers = HeaderMap::new();

    let err = validator
        .verify_at(&headers, b"", 1_600_000_000)
        .expect_err("missing timestamp must fail");
    assert!(matches!(err, AuthError::InvalidTimestamp(_)));
}

#[test]
fn non_numeric_timestamp_is_invalid() {
    let validator = SignatureValidator::new(SECRET, None);
    let mut headers = HeaderMap::new();
    headers.insert(
        header_name(TIMESTAMP_HEADER),
        HeaderValue::from_static("yesterday"),
    );

    let err = validator
        .verify_at(&headers, b"", 1_600_000_000)
        .expect_err("non-numeric timestamp must fail");
    assert!(matches!(err, AuthError::InvalidTimestamp(_)));
}

#[test]
fn missing_signature_header_is_mismatch() {
    let validator = SignatureValidator::new(SECRET, None);
    let mut headers = HeaderMap::new();
    headers.insert(
        header_name(TIMESTAMP_HEADER),
        HeaderValue::from_static("1600000000"),
    );

    let err = validator
        .verify_at(&headers, b"body", 1_600_000_000)
        .expect_err("missing signature must fail");
    assert!(matches!(err, AuthError::SignatureMismatch));
}

#[test]
fn signature_without_version_prefix_is_mismatch() {
    let validator = SignatureValidator::new(SECRET, None);
    let body = b"body";
    let mut headers = signed_headers(&validator, 1_600_000_000, body);
    let raw = validator.sign(1_600_000_000, body);
    let stripped = raw.trim_start_matches("v0=").to_owned();
    headers.insert(
        header_name(SIGNATURE_HEADER),
        HeaderValue::from_str(&stripped).expect("valid header value"),
    );

    let err = validator
        .verify_at(&headers, body, 1_600_000_000)
        .expect_err("unprefixed signature must fail");
    assert!(matches!(err, AuthError::SignatureMismatch));
}

#[test]
fn trusted_cn_in_identity_header_passes() {
    let validator = SignatureValidator::new(SECRET, Some(DN_HEADER.to_owned()));
    let body = b"text";
    let mut headers = signed_headers(&validator, 1_600_000_000, body);
    headers.insert(
        header_name(DN_HEADER),
        HeaderValue::from_str(&format!("CN={TRUSTED_CLIENT_CN},O=Slack Technologies"))
            .expect("valid header value"),
    );

    assert!(validator.verify_at(&headers, body, 1_600_000_000).is_ok());
}

#[test]
fn missing_identity_header_is_rejected() {
    let validator = SignatureValidator::new(SECRET, Some(DN_HEADER.to_owned()));
    let body = b"text";
    let headers = signed_headers(&validator, 1_600_000_000, body);

    let err = validator
        .verify_at(&headers, body, 1_600_000_000)
        .expect_err("absent identity header must fail");
    assert!(matches!(err, AuthError::InvalidIdentity));
}

#[test]
fn untrusted_cn_is_rejected() {
    let validator = SignatureValidator::new(SECRET, Some(DN_HEADER.to_owned()));
    let body = b"text";
    let mut headers = signed_headers(&validator, 1_600_000_000, body);
    headers.insert(
        header_name(DN_HEADER),
        HeaderValue::from_static("CN=not.slack.com,O=Someone Else"),
    );

    let err = validator
        .verify_at(&headers, body, 1_600_000_000)
        .expect_err("untrusted CN must fail");
    assert!(matches!(err, AuthError::InvalidIdentity));
}

#[test]
fn multiple_cn_matches_are_rejected() {
    let validator = SignatureValidator::new(SECRET, Some(DN_HEADER.to_owned()));
    let body = b"text";
    let mut headers = signed_headers(&validator, 1_600_000_000, body);
    headers.insert(
        header_name(DN_HEADER),
        HeaderValue::from_str(&format!(
            "CN={TRUSTED_CLIENT_CN},CN=second.example.com,O=Slack Technologies"
        ))
        .expect("valid header value"),
    );

    let err = validator
        .verify_at(&headers, body, 1_600_000_000)
        .expect_err("ambiguous CN must fail");
    assert!(matches!(err, AuthError::InvalidIdentity));
}

#[test]
fn identity_check_runs_before_timestamp_check() {
    let validator = SignatureValidator::new(SECRET, Some(DN_HEADER.to_owned()));
    // No identity header AND no timestamp: the identity error wins.
    let headers = HeaderMap::new();

    let err = validator
        .verify_at(&headers, b"", 1_600_000_000)
        .expect_err("must fail");
    assert!(matches!(err, AuthError::InvalidIdentity));
}
