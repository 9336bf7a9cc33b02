//! Payload-shape detection and typed payload values.
//!
//! After a request passes signature validation, [`classify`] inspects the
//! owned body bytes and produces exactly one [`Payload`] variant. A request
//! is classified once; category precedence among routes follows from the
//! classification, never from table iteration order.
//!
//! Interaction callbacks are kept generic until a route has matched;
//! [`InteractionCallback::refine`] then produces the interaction-specific
//! shape keyed by the `type` field.

use std::collections::HashMap;

use serde_json::Value;

use crate::errors::ClassifyError;

/// A classified inbound payload.
#[derive(Debug, Clone)]
pub enum Payload {
    /// Form-encoded slash command invocation.
    Command(SlashCommand),
    /// Interaction callback delivered as a JSON `payload` form field.
    Interaction(InteractionCallback),
    /// Events-API callback envelope.
    Event(EventCallback),
    /// One-time events-API subscription handshake.
    UrlVerification(UrlVerification),
}

impl Payload {
    /// Short name of the payload kind, for logging.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Command(_) => "command",
            Self::Interaction(_) => "interaction",
            Self::Event(_) => "event",
            Self::UrlVerification(_) => "url_verification",
        }
    }
}

/// A user-typed `/word ...` invocation forwarded as a form-encoded POST.
#[derive(Debug, Clone, Default)]
pub struct SlashCommand {
    /// Workspace identifier.
    pub team_id: String,
    /// Workspace domain.
    pub team_domain: String,
    /// Originating channel identifier.
    pub channel_id: String,
    /// Originating channel name.
    pub channel_name: String,
    /// Invoking user identifier.
    pub user_id: String,
    /// Invoking user name.
    pub user_name: String,
    /// The command itself, including the leading slash.
    pub command: String,
    /// Free text following the command.
    pub text: String,
    /// URL for delayed responses.
    pub response_url: String,
    /// Short-lived token required to open a modal in response.
    pub trigger_id: String,
}

impl SlashCommand {
    fn from_form(form: &HashMap<String, String>) -> Self {
        let field = |key: &str| form.get(key).cloned().unwrap_or_default();
        Self {
            team_id: field("team_id"),
            team_domain: field("team_domain"),
            channel_id: field("channel_id"),
            channel_name: field("channel_name"),
            user_id: field("user_id"),
            user_name: field("user_name"),
            command: field("command"),
            text: field("text"),
            response_url: field("response_url"),
            trigger_id: field("trigger_id"),
        }
    }
}

/// A generic interaction callback, matched on `(type, callback_id)`.
///
/// Carries the full decoded payload so handlers never re-parse the body.
#[derive(Debug, Clone)]
pub struct InteractionCallback {
    /// Interaction type, e.g. `dialog_submission` or `view_submission`.
    pub interaction_type: String,
    /// Application-assigned callback identifier.
    pub callback_id: String,
    /// The complete decoded `payload` JSON value.
    pub raw: Value,
}

impl InteractionCallback {
    /// Refine into an interaction-specific shape, keyed by `type`.
    ///
    /// Runs at dispatch-match time, not during classification, so
    /// unmatched callbacks never pay for the conversion.
    #[must_use]
    pub fn refine(&self) -> InteractionKind {
        match self.interaction_type.as_str() {
            "dialog_submission" => InteractionKind::DialogSubmission(DialogSubmission {
                callback_id: self.callback_id.clone(),
                user_id: str_at(&self.raw, &["user", "id"]),
                user_name: str_at(&self.raw, &["user", "name"]),
                channel_id: str_at(&self.raw, &["channel", "id"]),
                channel_name: str_at(&self.raw, &["channel", "name"]),
                response_url: str_at(&self.raw, &["response_url"]),
                state: str_at(&self.raw, &["state"]),
                submission: string_map(self.raw.get("submission")),
            }),
            "view_submission" => InteractionKind::ViewSubmission(ViewSubmission {
                callback_id: self.callback_id.clone(),
                view_id: str_at(&self.raw, &["view", "id"]),
                user_id: str_at(&self.raw, &["user", "id"]),
                trigger_id: str_at(&self.raw, &["trigger_id"]),
                values: self
                    .raw
                    .pointer("/view/state/values")
                    .cloned()
                    .unwrap_or(Value::Null),
            }),
            _ => InteractionKind::Other,
        }
    }
}

/// Interaction-specific refinement of an [`InteractionCallback`].
#[derive(Debug, Clone)]
pub enum InteractionKind {
    /// Legacy dialog submission with a flat string map of inputs.
    DialogSubmission(DialogSubmission),
    /// Modal view submission with block-structured input state.
    ViewSubmission(ViewSubmission),
    /// Any interaction type without a dedicated shape.
    Other,
}

/// A submitted legacy dialog.
#[derive(Debug, Clone)]
pub struct DialogSubmission {
    /// Application-assigned callback identifier.
    pub callback_id: String,
    /// Submitting user identifier.
    pub user_id: String,
    /// Submitting user name.
    pub user_name: String,
    /// Channel the dialog was opened from.
    pub channel_id: String,
    /// Channel name the dialog was opened from.
    pub channel_name: String,
    /// URL for delayed responses.
    pub response_url: String,
    /// Opaque state carried through the dialog round-trip.
    pub state: String,
    /// Submitted input values keyed by element name.
    pub submission: HashMap<String, String>,
}

/// A submitted modal view.
#[derive(Debug, Clone)]
pub struct ViewSubmission {
    /// Application-assigned callback identifier.
    pub callback_id: String,
    /// Platform-assigned view identifier.
    pub view_id: String,
    /// Submitting user identifier.
    pub user_id: String,
    /// Short-lived token for follow-up modals.
    pub trigger_id: String,
    /// `view.state.values`: input values keyed by block id, then action id.
    pub values: Value,
}

impl ViewSubmission {
    /// Read a plain-text input value by block and action id.
    #[must_use]
    pub fn input_value(&self, block_id: &str, action_id: &str) -> Option<&str> {
        self.values
            .get(block_id)?
            .get(action_id)?
            .get("value")?
            .as_str()
    }
}

/// An events-API callback envelope with its inner event.
#[derive(Debug, Clone)]
pub struct EventCallback {
    /// Workspace identifier.
    pub team_id: String,
    /// Application identifier the event was delivered to.
    pub api_app_id: String,
    /// Unique event delivery identifier.
    pub event_id: String,
    /// Epoch seconds the event was dispatched.
    pub event_time: i64,
    /// Inner event type, used for route matching.
    pub event_type: String,
    /// The complete inner event object.
    pub event: Value,
}

/// The one-time handshake sent when an events subscription is configured.
#[derive(Debug, Clone)]
pub struct UrlVerification {
    /// Verification token (legacy, not used for authentication).
    pub token: Option<String>,
    /// Challenge string the response must echo verbatim.
    pub challenge: String,
}

/// Classify an owned request body into a [`Payload`].
///
/// Decision order, first match wins:
/// 1. form body with a non-empty `command` field → slash command;
/// 2. JSON body with `type == "url_verification"` and a `challenge` →
///    handshake;
/// 3. form body with a `payload` field → interaction callback (requires
///    non-empty `type` and `callback_id`);
/// 4. JSON body with `type == "event_callback"` and an inner `event.type`
///    → events-API callback;
/// 5. anything else is unparseable.
///
/// # Errors
///
/// Returns [`ClassifyError::MissingField`] or
/// [`ClassifyError::MalformedJson`] for a present-but-broken `payload`
/// field, and [`ClassifyError::UnparseablePayload`] when no shape matches.
/// These messages are surfaced verbatim in the HTTP 400 body.
pub fn classify(body: &[u8]) -> Result<Payload, ClassifyError> {
    let form: HashMap<String, String> = form_urlencoded::parse(body).into_owned().collect();

    if form.get("command").is_some_and(|c| !c.is_empty()) {
        return Ok(Payload::Command(SlashCommand::from_form(&form)));
    }

    let json: Option<Value> = serde_json::from_slice(body).ok();

    if let Some(value) = &json {
        if value.get("type").and_then(Value::as_str) == Some("url_verification") {
            if let Some(challenge) = value.get("challenge").and_then(Value::as_str) {
                return Ok(Payload::UrlVerification(UrlVerification {
                    token: value
                        .get("token")
                        .and_then(Value::as_str)
                        .map(str::to_owned),
                    challenge: challenge.to_owned(),
                }));
            }
        }
    }

    if let Some(encoded) = form.get("payload") {
        return classify_interaction(encoded).map(Payload::Interaction);
    }

    if let Some(value) = json {
        if value.get("type").and_then(Value::as_str) == Some("event_callback") {
            let event_type = str_at(&value, &["event", "type"]);
            if !event_type.is_empty() {
                return Ok(Payload::Event(EventCallback {
                    team_id: str_at(&value, &["team_id"]),
                    api_app_id: str_at(&value, &["api_app_id"]),
                    event_id: str_at(&value, &["event_id"]),
                    event_time: value
                        .get("event_time")
                        .and_then(Value::as_i64)
                        .unwrap_or_default(),
                    event_type,
                    event: value.get("event").cloned().unwrap_or(Value::Null),
                }));
            }
        }
    }

    Err(ClassifyError::UnparseablePayload)
}

fn classify_interaction(encoded: &str) -> Result<InteractionCallback, ClassifyError> {
    let raw: Value =
        serde_json::from_str(encoded).map_err(|err| ClassifyError::MalformedJson(err.to_string()))?;

    let interaction_type = str_at(&raw, &["type"]);
    if interaction_type.is_empty() {
        return Err(ClassifyError::MissingField("type"));
    }

    // View-era payloads nest the callback id under `view`.
    let mut callback_id = str_at(&raw, &["callback_id"]);
    if callback_id.is_empty() {
        callback_id = str_at(&raw, &["view", "callback_id"]);
    }
    if callback_id.is_empty() {
        return Err(ClassifyError::MissingField("callback_id"));
    }

    Ok(InteractionCallback {
        interaction_type,
        callback_id,
        raw,
    })
}

fn str_at(value: &Value, path: &[&str]) -> String {
    let mut current = value;
    for key in path {
        match current.get(*key) {
            Some(next) => current = next,
            None => return String::new(),
        }
    }
    current.as_str().unwrap_or_default().to_owned()
}

fn string_map(value: Option<&Value>) -> HashMap<String, String> {
    value
        .and_then(Value::as_object)
        .map(|object| {
            object
                .iter()
                .filter_map(|(key, val)| val.as_str().map(|s| (key.clone(), s.to_owned())))
                .collect()
        })
        .unwrap_or_default()
}
