//! HTTP entry point: validation, classification, routing, and dispatch.
//!
//! A [`Dispatcher`] owns the signature validator and the route table and
//! mounts a single catch-all handler on an axum router. Per request the
//! state machine runs validation → classification → route lookup →
//! handler invocation, with early exits for authentication failures
//! (400), the URL-verification handshake (200 with the raw challenge),
//! and unmatched routes (the default 404 route).
//!
//! The dispatcher holds no request-affine state, so concurrent dispatch
//! is safe by construction while the route table stays read-only.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use bytes::Bytes;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::errors::{AppError, HandlerError, Result};
use crate::webhook::payload::{
    classify, EventCallback, InteractionCallback, InteractionKind, Payload, SlashCommand,
};
use crate::webhook::routes::{Handler, HandlerResult, RouteTable};
use crate::webhook::signature::SignatureValidator;

/// Bodies past this size fail the read step before validation.
const MAX_BODY_BYTES: usize = 1_048_576;

/// Core inputs supplied by the surrounding glue at construction.
///
/// The core reads no files or environment of its own.
#[derive(Debug, Clone)]
pub struct WebhookSettings {
    /// Base path that receives platform callbacks, e.g. `/slack`.
    pub base_path: String,
    /// Shared signing secret for request authentication.
    pub signing_secret: String,
    /// Optional mutual-TLS identity header name to enforce.
    pub identity_header: Option<String>,
}

/// Typed value passed to a matched handler. Never a raw bag of bytes
/// once classification has run.
pub enum HandlerContext {
    /// Slash command invocation.
    Command(SlashCommand),
    /// Interaction callback plus its refined shape.
    Interaction(InteractionContext),
    /// Events-API callback.
    Event(EventCallback),
    /// Exact-path route outside the base webhook path.
    Http(RawRequest),
}

impl HandlerContext {
    /// Short name of the context kind, for logs and mismatch errors.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Command(_) => "command",
            Self::Interaction(_) => "interaction",
            Self::Event(_) => "event",
            Self::Http(_) => "http",
        }
    }

    /// The slash command carried by this context.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::WrongKind`] if the context is not a
    /// slash command.
    pub fn command(&self) -> std::result::Result<&SlashCommand, HandlerError> {
        match self {
            Self::Command(sc) => Ok(sc),
            other => Err(HandlerError::WrongKind {
                expected: "command",
                got: other.kind(),
            }),
        }
    }

    /// The interaction callback carried by this context.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::WrongKind`] if the context is not an
    /// interaction.
    pub fn interaction(&self) -> std::result::Result<&InteractionContext, HandlerError> {
        match self {
            Self::Interaction(ic) => Ok(ic),
            other => Err(HandlerError::WrongKind {
                expected: "interaction",
                got: other.kind(),
            }),
        }
    }

    /// The events-API callback carried by this context.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::WrongKind`] if the context is not an
    /// event.
    pub fn event(&self) -> std::result::Result<&EventCallback, HandlerError> {
        match self {
            Self::Event(ev) => Ok(ev),
            other => Err(HandlerError::WrongKind {
                expected: "event",
                got: other.kind(),
            }),
        }
    }

    /// The raw request carried by this context (path routes only).
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::WrongKind`] if the context was classified
    /// as a platform payload.
    pub fn http(&self) -> std::result::Result<&RawRequest, HandlerError> {
        match self {
            Self::Http(raw) => Ok(raw),
            other => Err(HandlerError::WrongKind {
                expected: "http",
                got: other.kind(),
            }),
        }
    }
}

/// Interaction callback together with its dispatch-time refinement.
pub struct InteractionContext {
    /// The generic callback as classified.
    pub callback: InteractionCallback,
    /// Interaction-specific shape, keyed by the callback's `type`.
    pub kind: InteractionKind,
}

impl InteractionContext {
    fn new(callback: InteractionCallback) -> Self {
        Self {
            kind: callback.refine(),
            callback,
        }
    }
}

/// The validated request handed to exact-path handlers.
pub struct RawRequest {
    /// Request path.
    pub path: String,
    /// Owned request body.
    pub body: Bytes,
}

/// Response value produced by a handler.
///
/// Handlers return a reply instead of writing to the transport, so a
/// handler error can never leave a half-written response behind.
#[derive(Debug, Clone)]
pub struct HandlerReply {
    status: StatusCode,
    content_type: &'static str,
    body: String,
}

impl HandlerReply {
    /// An empty 200 acknowledgment.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            status: StatusCode::OK,
            content_type: "text/plain",
            body: String::new(),
        }
    }

    /// A plain-text reply with the given status.
    #[must_use]
    pub fn text(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: "text/plain",
            body: body.into(),
        }
    }

    /// A JSON reply with the given status.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError`] if the value cannot be serialized.
    pub fn json<T: serde::Serialize>(
        status: StatusCode,
        value: &T,
    ) -> std::result::Result<Self, HandlerError> {
        let body = serde_json::to_string(value)
            .map_err(|err| HandlerError::Other(format!("serializing reply: {err}")))?;
        Ok(Self {
            status,
            content_type: "application/json",
            body,
        })
    }

    /// HTTP status of the reply.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Body of the reply.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    fn into_response(self) -> Response {
        (
            self.status,
            [(header::CONTENT_TYPE, self.content_type)],
            self.body,
        )
            .into_response()
    }
}

/// The HTTP entry point over a registered route table.
pub struct Dispatcher {
    base_path: String,
    validator: SignatureValidator,
    table: RouteTable,
    default_route: Handler,
}

impl Dispatcher {
    /// Build a dispatcher over a fully registered route table.
    ///
    /// The table must not be mutated after this point; registration is a
    /// startup-time, single-threaded activity.
    #[must_use]
    pub fn new(settings: WebhookSettings, table: RouteTable) -> Self {
        Self {
            base_path: settings.base_path,
            validator: SignatureValidator::new(settings.signing_secret, settings.identity_header),
            table,
            default_route: Arc::new(|_ctx| {
                Box::pin(async { Ok(HandlerReply::text(StatusCode::NOT_FOUND, "Not found")) })
            }),
        }
    }

    /// Replace the built-in 404 route.
    ///
    /// The default route is an ordinary handler invoked whenever no
    /// route matches; it receives the classified context like any other.
    #[must_use]
    pub fn with_default_route<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(HandlerContext) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = HandlerResult> + Send + 'static,
    {
        self.default_route = Arc::new(move |ctx| Box::pin(handler(ctx)));
        self
    }

    /// Build an axum router with the dispatcher mounted as the fallback.
    ///
    /// Additional routes (health probes and the like) can be layered on
    /// the returned router; anything they do not claim reaches the
    /// dispatch state machine.
    #[must_use]
    pub fn into_router(self) -> Router {
        Router::new().fallback(dispatch).with_state(Arc::new(self))
    }
}

async fn dispatch(State(dispatcher): State<Arc<Dispatcher>>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let path = parts.uri.path().to_owned();
    let headers = parts.headers;

    // Acquire the body exactly once; validator and classifier both read
    // this owned buffer.
    let body = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(err) => {
            error!(%err, path, "failed to read request body");
            return reject_bad_request();
        }
    };

    if let Err(err) = dispatcher.validator.verify(&headers, &body) {
        // Full detail stays server-side; the response body is generic.
        error!(%err, path, "rejected unauthenticated request");
        return reject_bad_request();
    }

    if path == dispatcher.base_path {
        dispatch_platform(&dispatcher, &body).await
    } else {
        dispatch_path(&dispatcher, path, &body).await
    }
}

async fn dispatch_platform(dispatcher: &Dispatcher, body: &Bytes) -> Response {
    let payload = match classify(body) {
        Ok(payload) => payload,
        Err(err) => {
            // Classification messages are part of the HTTP contract.
            warn!(%err, "payload classification failed");
            return (StatusCode::BAD_REQUEST, err.to_string()).into_response();
        }
    };

    // The handshake bypasses the route table entirely, but only after
    // passing signature validation like every other request.
    if let Payload::UrlVerification(verification) = &payload {
        info!("answering url verification handshake");
        return (StatusCode::OK, verification.challenge.clone()).into_response();
    }

    let handler = dispatcher.table.match_payload(&payload).map_or_else(
        || Arc::clone(&dispatcher.default_route),
        |route| Arc::clone(route.handler()),
    );

    let kind = payload.kind();
    let context = match payload {
        Payload::Command(sc) => HandlerContext::Command(sc),
        Payload::Interaction(cb) => HandlerContext::Interaction(InteractionContext::new(cb)),
        Payload::Event(ev) => HandlerContext::Event(ev),
        Payload::UrlVerification(_) => unreachable!("handshake answered before dispatch"),
    };

    invoke(&handler, context, kind, body).await
}

async fn dispatch_path(dispatcher: &Dispatcher, path: String, body: &Bytes) -> Response {
    let handler = dispatcher.table.match_path(&path).map_or_else(
        || Arc::clone(&dispatcher.default_route),
        |route| Arc::clone(route.handler()),
    );

    let context = HandlerContext::Http(RawRequest {
        path,
        body: body.clone(),
    });
    invoke(&handler, context, "http", body).await
}

async fn invoke(handler: &Handler, context: HandlerContext, kind: &str, body: &Bytes) -> Response {
    match (handler.as_ref())(context).await {
        Ok(reply) => reply.into_response(),
        Err(err) => {
            // Log with the request body for diagnosis; the caller only
            // ever sees the generic failure text.
            error!(
                %err,
                kind,
                body = %String::from_utf8_lossy(body),
                "handler failed"
            );
            (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
        }
    }
}

fn reject_bad_request() -> Response {
    (StatusCode::BAD_REQUEST, "invalid request").into_response()
}

/// Serve a router until the cancellation token fires.
///
/// # Errors
///
/// Returns [`AppError::Io`] if the listener cannot bind or the server
/// fails while running.
pub async fn serve(router: Router, addr: SocketAddr, ct: CancellationToken) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| AppError::Io(format!("failed to bind {addr}: {err}")))?;

    info!(%addr, "listening for platform callbacks");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { ct.cancelled().await })
        .await
        .map_err(|err| AppError::Io(format!("server error: {err}")))?;

    info!("webhook server shut down");
    Ok(())
}
