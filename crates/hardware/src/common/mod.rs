//! Common types used throughout the cache hierarchy simulator.
//!
//! This module provides the building blocks shared by every component. It includes:
//! 1. **Messages:** Operation kinds, requests and responses exchanged between levels.
//! 2. **Error Handling:** Configuration, protocol, trace and estimator errors.

/// Request/response message definitions.
pub mod data;

/// Error types.
pub mod error;

pub use data::{OpKind, Request, Response};
pub use error::{ConfigError, EstimateError, ProtocolError, SimError, TraceError};
