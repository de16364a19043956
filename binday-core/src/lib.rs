//! Core types and service wiring for the binday bin-collection lookup.

/// Domain models shared by all council providers.
pub mod model;
/// Traits describing the provider interfaces.
pub mod ports;
/// Plain-text and JSON rendering of schedules.
pub mod render;
/// High-level service facade used by the HTTP API and the CLI.
pub mod service;
/// Per-lookup diagnostic log.
pub mod trace;

pub use model::*;
pub use ports::*;
pub use render::*;
pub use service::*;
pub use trace::*;
