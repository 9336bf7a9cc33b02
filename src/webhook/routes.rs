//! Route registration and matching.
//!
//! A [`RouteTable`] is an insertion-ordered collection of routes, each
//! keyed by exactly one discriminator. Registration happens
//! single-threaded at startup; while serving, the table is read-only and
//! shared freely across request tasks. Callers that ever need to mutate a
//! live table must synchronize externally.

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::errors::{HandlerError, RouteError};
use crate::webhook::dispatcher::{HandlerContext, HandlerReply};
use crate::webhook::payload::Payload;

/// Outcome of a handler invocation.
pub type HandlerResult = Result<HandlerReply, HandlerError>;

/// Boxed future returned by route handlers.
pub type HandlerFuture = BoxFuture<'static, HandlerResult>;

/// A registered handler function.
pub type Handler = Arc<dyn Fn(HandlerContext) -> HandlerFuture + Send + Sync>;

/// Route discriminator. Exactly one per route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteKey {
    /// Slash command name, including the leading slash.
    Command(String),
    /// Exact interaction type / callback identifier pair.
    Interaction {
        /// Interaction type, e.g. `dialog_submission`.
        interaction_type: String,
        /// Application-assigned callback identifier.
        callback_id: String,
    },
    /// Inner events-API event type.
    Event(String),
    /// Exact path outside the base webhook path.
    Path(String),
}

impl Display for RouteKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Command(command) => write!(f, "command {command}"),
            Self::Interaction {
                interaction_type,
                callback_id,
            } => write!(f, "interaction {interaction_type}/{callback_id}"),
            Self::Event(event_type) => write!(f, "event {event_type}"),
            Self::Path(path) => write!(f, "path {path}"),
        }
    }
}

/// A discriminator bound to a handler.
pub struct Route {
    key: RouteKey,
    handler: Handler,
}

impl Route {
    /// The route's discriminator.
    #[must_use]
    pub fn key(&self) -> &RouteKey {
        &self.key
    }

    pub(crate) fn handler(&self) -> &Handler {
        &self.handler
    }
}

/// Insertion-ordered route collection.
#[derive(Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under a discriminator.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::DuplicateRoute`] if a route with the same
    /// discriminator is already registered.
    pub fn register<F, Fut>(&mut self, key: RouteKey, handler: F) -> Result<(), RouteError>
    where
        F: Fn(HandlerContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        if self.routes.iter().any(|route| route.key == key) {
            return Err(RouteError::DuplicateRoute(key.to_string()));
        }
        self.routes.push(Route {
            key,
            handler: Arc::new(move |ctx| Box::pin(handler(ctx))),
        });
        Ok(())
    }

    /// Remove the route with the given discriminator.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::RouteNotFound`] if no such route exists.
    pub fn unregister(&mut self, key: &RouteKey) -> Result<(), RouteError> {
        let position = self
            .routes
            .iter()
            .position(|route| route.key == *key)
            .ok_or_else(|| RouteError::RouteNotFound(key.to_string()))?;
        self.routes.remove(position);
        Ok(())
    }

    /// Register a slash command handler.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::DuplicateRoute`] for a repeated command.
    pub fn on_command<F, Fut>(&mut self, command: &str, handler: F) -> Result<(), RouteError>
    where
        F: Fn(HandlerContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.register(RouteKey::Command(command.to_owned()), handler)
    }

    /// Register an interaction callback handler for an exact
    /// `(interaction type, callback id)` pair.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::DuplicateRoute`] for a repeated pair.
    pub fn on_interaction<F, Fut>(
        &mut self,
        interaction_type: &str,
        callback_id: &str,
        handler: F,
    ) -> Result<(), RouteError>
    where
        F: Fn(HandlerContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.register(
            RouteKey::Interaction {
                interaction_type: interaction_type.to_owned(),
                callback_id: callback_id.to_owned(),
            },
            handler,
        )
    }

    /// Register an events-API handler for an inner event type.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::DuplicateRoute`] for a repeated event type.
    pub fn on_event<F, Fut>(&mut self, event_type: &str, handler: F) -> Result<(), RouteError>
    where
        F: Fn(HandlerContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.register(RouteKey::Event(event_type.to_owned()), handler)
    }

    /// Register a handler for an exact path outside the base webhook path.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::DuplicateRoute`] for a repeated path.
    pub fn on_path<F, Fut>(&mut self, path: &str, handler: F) -> Result<(), RouteError>
    where
        F: Fn(HandlerContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.register(RouteKey::Path(path.to_owned()), handler)
    }

    /// Find the first route matching a classified payload.
    ///
    /// Within a category, iteration is insertion order and the first
    /// exact match wins. URL-verification payloads never match: the
    /// dispatcher answers them before consulting the table.
    #[must_use]
    pub fn match_payload(&self, payload: &Payload) -> Option<&Route> {
        self.routes.iter().find(|route| match (&route.key, payload) {
            (RouteKey::Command(command), Payload::Command(sc)) => *command == sc.command,
            (
                RouteKey::Interaction {
                    interaction_type,
                    callback_id,
                },
                Payload::Interaction(cb),
            ) => *interaction_type == cb.interaction_type && *callback_id == cb.callback_id,
            (RouteKey::Event(event_type), Payload::Event(ev)) => *event_type == ev.event_type,
            _ => false,
        })
    }

    /// Find the route registered for an exact path.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<&Route> {
        self.routes
            .iter()
            .find(|route| matches!(&route.key, RouteKey::Path(p) if p == path))
    }

    /// Number of registered routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether the table has no routes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
