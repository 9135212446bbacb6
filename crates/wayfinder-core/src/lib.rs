//! Flow walking and artifact derivation for Wayfinder.
//!
//! This crate holds the wizard's state machine and both derivation engines,
//! written against the collaborator traits in [`ports`]. It depends only on
//! `wayfinder-types`; HTTP, filesystem and terminal access live in
//! `wayfinder-infra` and `wayfinder-cli`.

pub mod config_deriver;
pub mod document;
pub mod expression;
pub mod flow;
pub mod input;
pub mod pipeline;
pub mod ports;
pub mod session;
pub mod state;
pub mod transition;
pub mod walker;
