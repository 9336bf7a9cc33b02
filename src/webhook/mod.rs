//! Request authentication and routing engine.
//!
//! The four pieces run in a fixed order per request: the signature
//! validator authenticates, the classifier produces a typed payload, the
//! route table matches on the payload's discriminator, and the dispatcher
//! orchestrates the whole state machine over axum.

pub mod dispatcher;
pub mod payload;
pub mod routes;
pub mod signature;
