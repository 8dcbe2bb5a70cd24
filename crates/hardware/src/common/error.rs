//! Error definitions.
//!
//! This module defines every failure the simulator can report. It provides:
//! 1. **Configuration errors:** Impossible cache geometry, detected at construction.
//! 2. **Protocol errors:** Internal-consistency violations of the request/fill protocol.
//! 3. **Trace errors:** Unreadable files and malformed trace lines, with line context.
//! 4. **Estimate errors:** Failures of the timing/energy/area estimator.
//!
//! Cache misses, victim-buffer misses and dirty evictions are not errors; they are
//! ordinary branches of the lookup state machine. Nothing here is retried.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Invalid cache or hierarchy configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A parameter that must be an exact positive power of two is not.
    #[error("{level}: {what} must be a positive power of two, got {value}")]
    NotPowerOfTwo {
        /// Level name.
        level: String,
        /// Parameter name (`line_bytes`, `num_sets`).
        what: &'static str,
        /// Offending value.
        value: usize,
    },

    /// The associativity is zero.
    #[error("{level}: associativity must be at least 1")]
    ZeroAssociativity {
        /// Level name.
        level: String,
    },

    /// The cache size is zero.
    #[error("{level}: size must be non-zero")]
    ZeroSize {
        /// Level name.
        level: String,
    },

    /// `size / line_bytes / ways` does not divide evenly.
    #[error("{level}: size {size} is not a multiple of line_bytes ({line_bytes}) x ways ({ways})")]
    UnevenGeometry {
        /// Level name.
        level: String,
        /// Total size in bytes.
        size: usize,
        /// Block size in bytes.
        line_bytes: usize,
        /// Associativity.
        ways: usize,
    },

    /// Two levels share a name, so reports and timing figures cannot tell them apart.
    #[error("level name '{level}' is used by more than one level")]
    DuplicateLevel {
        /// The repeated name.
        level: String,
    },

    /// The hierarchy has no cache level to receive requests.
    #[error("hierarchy has no cache levels; at least one level must be connected to the requester")]
    EmptyHierarchy,

    /// A configuration file could not be parsed.
    #[error("invalid configuration: {0}")]
    Parse(String),
}

/// Violation of the level-to-level request/fill protocol.
///
/// These indicate a bug in the engine, or state corrupted from outside; the run must stop.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// A block was found in the victim buffer while its set still had a free way.
    #[error(
        "{level}: victim-buffer hit for {address:#x} while set {set} still has a free way"
    )]
    VictimHitWithFreeSlot {
        /// Level name.
        level: String,
        /// Requested address.
        address: u64,
        /// Set index of the request.
        set: usize,
    },

    /// A fill arrived but no miss is outstanding.
    #[error("{level}: fill {address:#x} arrived with no pending fill recorded")]
    FillWithoutPending {
        /// Level name.
        level: String,
        /// Address carried by the fill.
        address: u64,
    },

    /// A second request arrived before the first one resolved.
    #[error(
        "{level}: request for {address:#x} issued while request for {outstanding:#x} is still outstanding"
    )]
    RequestWhileOutstanding {
        /// Level name.
        level: String,
        /// Address of the rejected request.
        address: u64,
        /// Address of the unresolved request.
        outstanding: u64,
    },

    /// A fill answered a different address than the one outstanding.
    #[error("{level}: fill for {got:#x} does not answer outstanding request {expected:#x}")]
    FillAddressMismatch {
        /// Level name.
        level: String,
        /// Address of the outstanding request.
        expected: u64,
        /// Address carried by the fill.
        got: u64,
    },

    /// The level below answered with a response that is not ready.
    #[error("{level}: response for {address:#x} from the next level is not ready")]
    NotReady {
        /// Level name.
        level: String,
        /// Address carried by the response.
        address: u64,
    },

    /// A structure had to pick a block to replace but held no valid block.
    #[error("{level}: {structure} has no replacement candidate")]
    NoReplacementCandidate {
        /// Level name.
        level: String,
        /// `"set"` or `"victim buffer"`.
        structure: &'static str,
    },

    /// A level was reset while a request was in flight.
    #[error("{level}: reset while request for {outstanding:#x} is outstanding")]
    ResetWhileOutstanding {
        /// Level name.
        level: String,
        /// Address of the unresolved request.
        outstanding: u64,
    },
}

/// Failure to read or parse a request trace.
#[derive(Debug, Error)]
pub enum TraceError {
    /// The trace file could not be opened or read.
    #[error("{}: {source}", path.display())]
    Io {
        /// Path of the trace.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The operation code is neither `r` nor `w`.
    #[error("line {line}: invalid operation '{token}' (expected 'r' or 'w')")]
    InvalidOp {
        /// 1-based line number.
        line: usize,
        /// Offending token.
        token: String,
    },

    /// The address is not hexadecimal.
    #[error("line {line}: cannot parse address '{token}' as hexadecimal")]
    InvalidAddress {
        /// 1-based line number.
        line: usize,
        /// Offending token.
        token: String,
    },

    /// The line has an operation but no address.
    #[error("line {line}: missing address")]
    MissingAddress {
        /// 1-based line number.
        line: usize,
    },
}

impl TraceError {
    /// Returns the 1-based line number of a parse error, if any.
    pub const fn line(&self) -> Option<usize> {
        match self {
            Self::Io { .. } => None,
            Self::InvalidOp { line, .. }
            | Self::InvalidAddress { line, .. }
            | Self::MissingAddress { line } => Some(*line),
        }
    }
}

/// Failure of the timing/energy/area estimator.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EstimateError {
    /// No estimate is available for this geometry.
    #[error("no timing estimate for {name} ({size} B, {line_bytes} B blocks, {ways}-way)")]
    Unavailable {
        /// Level name.
        name: String,
        /// Total size in bytes.
        size: usize,
        /// Block size in bytes.
        line_bytes: usize,
        /// Associativity.
        ways: usize,
    },
}

/// Any error that ends a simulation run.
#[derive(Debug, Error)]
pub enum SimError {
    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Protocol invariant violation.
    #[error("protocol violation: {0}")]
    Protocol(#[from] ProtocolError),

    /// Unreadable or malformed trace.
    #[error("trace error: {0}")]
    Trace(#[from] TraceError),

    /// Estimator failure.
    #[error(transparent)]
    Estimate(#[from] EstimateError),
}
