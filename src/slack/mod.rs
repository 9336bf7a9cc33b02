//! Platform client layer modules.

pub mod client;
pub mod views;
