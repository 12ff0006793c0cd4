//! Training backends.
//!
//! The backend-agnostic types live in `aerocast-training`. This module
//! contains the streaming orchestrator used by the `aerocast` binary.

pub mod streaming;

pub use streaming::StreamingTrainer;
