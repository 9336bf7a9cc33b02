#![forbid(unsafe_code)]

//! Slack webhook intake gateway.
//!
//! Authenticates inbound platform callbacks (slash commands, interaction
//! callbacks, events-API payloads) and routes them to registered handler
//! functions. See [`webhook`] for the core engine and [`slack`] for the
//! platform client used by handlers.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod slack;
pub mod webhook;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};
