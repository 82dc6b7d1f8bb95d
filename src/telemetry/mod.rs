//! Observability: tracing and OpenTelemetry integration.

pub mod tracing;

pub use tracing::{init_telemetry, shutdown_telemetry};
