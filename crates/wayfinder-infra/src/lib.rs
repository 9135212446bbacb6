//! Infrastructure layer for Wayfinder.
//!
//! Implements the collaborator traits defined in `wayfinder-core`: HTTP and
//! local-directory definition sources, the HTTP delivery client, the
//! filesystem artifact store, plus the TOML config loader.

pub mod config;
pub mod delivery;
pub mod filesystem;
pub mod source;

#[cfg(test)]
mod test_server;
