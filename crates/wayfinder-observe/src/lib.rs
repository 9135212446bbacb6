//! Observability setup for Wayfinder: tracing subscriber and optional
//! OpenTelemetry span export.

pub mod tracing_setup;
