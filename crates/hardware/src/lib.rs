//! Multi-level cache hierarchy simulator library.
//!
//! This crate models a chain of set-associative caches in front of main memory, at the
//! level of events rather than time:
//! 1. **Cache:** Set-associative line store, optional victim buffer, LRU aging, dirty
//!    writebacks, and the two-phase request/fill protocol.
//! 2. **SoC:** The interconnect that routes requests down and fills up, and the always-ready
//!    backing store.
//! 3. **Simulation:** Trace ingestion and the driver that replays a request stream.
//! 4. **Reporting:** Per-level counters, derived rates, and average access time from
//!    configured timing figures.
//!
//! # Examples
//!
//! ```
//! use cachesim_core::{Config, Simulator};
//! use cachesim_core::common::Request;
//!
//! // 64 B direct-mapped L1 with 16 B blocks, no L2.
//! let config = Config::two_level(16, 64, 1, 0, 0, 0);
//! let mut sim = Simulator::new(config).unwrap();
//! let stats = sim.run(&[Request::load(0x34), Request::load(0x34)]).unwrap();
//!
//! let l1 = stats.level("L1").unwrap();
//! assert_eq!((l1.reads, l1.read_misses), (2, 1));
//! assert_eq!(stats.memory.reads, 1);
//! ```

/// Cache level: line store, victim buffer, replacement policies and lookup engine.
pub mod cache;
/// Common types (messages and errors).
pub mod common;
/// Simulator configuration (defaults, per-level structures, validation).
pub mod config;
/// Trace ingestion and the simulation driver.
pub mod sim;
/// Hierarchy assembly (interconnect, main memory, traits).
pub mod soc;
/// Simulation statistics collection and reporting.
pub mod stats;
/// Timing, energy and area estimates.
pub mod timing;

/// One cache level; construct with `Cache::new`.
pub use crate::cache::Cache;
/// Root configuration type; use `Config::default()`, `Config::two_level` or JSON.
pub use crate::config::Config;
/// Simulation driver; holds the hierarchy and its configuration.
pub use crate::sim::Simulator;
/// Ordered cache levels in front of the backing store.
pub use crate::soc::Hierarchy;
