//! Simulation driving.
//!
//! Provides trace ingestion and the driver that replays a request stream against a
//! hierarchy and collects its statistics.

pub mod simulator;
pub mod trace;

pub use simulator::Simulator;
pub use trace::{TraceMode, load_trace, parse_line, read_trace};
