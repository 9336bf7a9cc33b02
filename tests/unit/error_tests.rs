//! Unit tests for error display wording.
//!
//! Classification messages are part of the HTTP contract, so their exact
//! wording is pinned here.

use helpdesk_gateway::errors::{AppError, AuthError, ClassifyError, HandlerError, RouteError};

#[test]
fn missing_field_wording_is_exact() {
    let err = ClassifyError::MissingField("callback_id");
    assert_eq!(err.to_string(), "missing value for 'callback_id' key");
}

#[test]
fn missing_type_wording_is_exact() {
    let err = ClassifyError::MissingField("type");
    assert_eq!(err.to_string(), "missing value for 'type' key");
}

#[test]
fn malformed_json_carries_parser_detail() {
    let err = ClassifyError::MalformedJson("expected value at line 1 column 1".into());
    assert!(err.to_string().starts_with("error parsing payload JSON:"));
    assert!(err.to_string().contains("line 1 column 1"));
}

#[test]
fn stale_request_reports_age() {
    let err = AuthError::StaleRequest { age_seconds: 301 };
    assert_eq!(err.to_string(), "stale request: timestamp is 301s old");
}

#[test]
fn signature_mismatch_has_no_detail() {
    assert_eq!(AuthError::SignatureMismatch.to_string(), "signature mismatch");
}

#[test]
fn duplicate_route_names_the_key() {
    let err = RouteError::DuplicateRoute("command /help-me".into());
    assert_eq!(err.to_string(), "duplicate route: command /help-me");
}

#[test]
fn route_not_found_names_the_key() {
    let err = RouteError::RouteNotFound("event emoji_changed".into());
    assert_eq!(err.to_string(), "route not found: event emoji_changed");
}

#[test]
fn wrong_kind_names_both_sides() {
    let err = HandlerError::WrongKind {
        expected: "command",
        got: "event",
    };
    assert_eq!(
        err.to_string(),
        "handler context mismatch: expected command, got event"
    );
}

#[test]
fn handler_error_from_string_is_transparent() {
    let err = HandlerError::from("dialog service unavailable".to_owned());
    assert_eq!(err.to_string(), "dialog service unavailable");
}

#[test]
fn app_error_variants_have_distinct_prefixes() {
    let config = AppError::Config("x".into());
    let slack = AppError::Slack("x".into());
    let routes = AppError::Routes("x".into());
    let io = AppError::Io("x".into());
    assert!(config.to_string().starts_with("config:"));
    assert!(slack.to_string().starts_with("slack:"));
    assert!(routes.to_string().starts_with("routes:"));
    assert!(io.to_string().starts_with("io:"));
}

#[test]
fn route_error_converts_to_app_error() {
    let err: AppError = RouteError::DuplicateRoute("path /foo".into()).into();
    assert_eq!(err.to_string(), "routes: duplicate route: path /foo");
}

#[test]
fn error_messages_have_no_trailing_period() {
    let samples: Vec<String> = vec![
        AuthError::InvalidIdentity.to_string(),
        AuthError::SignatureMismatch.to_string(),
        ClassifyError::UnparseablePayload.to_string(),
        RouteError::RouteNotFound("path /x".into()).to_string(),
    ];
    for s in samples {
        assert!(!s.ends_with('.'), "error message must not end with a period: {s}");
    }
}
