//! rettam CLI - explore extracted metadata from the terminal
//!
//! Explorations are kept in a local JSON store; text is sent to a running
//! `rettam-api` for extraction and the result is rendered as a graph.

pub mod client;
pub mod commands;
pub mod shell;

pub use client::ApiClient;
pub use commands::GraphFormat;
