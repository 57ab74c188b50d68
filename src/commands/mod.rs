//! Command handlers
//!
//! Entry points the CLI (or any other front end) calls into.

pub mod render;
pub mod tracking;
