//! Shared domain types for Wayfinder.
//!
//! This crate contains the declarative inputs of a wizard session (flow
//! definition, docs manifest), the values it produces (history entries,
//! config payload), the `wayfinder.toml` configuration, and the error types
//! shared by the core and infrastructure crates.
//!
//! Zero infrastructure dependencies -- only serde, serde_json, thiserror.

pub mod config;
pub mod docs;
pub mod error;
pub mod flow;
pub mod history;
pub mod payload;
