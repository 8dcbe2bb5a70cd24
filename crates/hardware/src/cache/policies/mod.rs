//! Cache Replacement Policies.
//!
//! A policy ages the records of one set (or of the victim buffer, which is treated as a
//! single set) and picks the record to evict when no record is free.
//!
//! # Policies
//!
//! - `Lru`: Least Recently Used, with saturating per-record recency counters.

/// Least Recently Used replacement policy.
pub mod lru;

pub use lru::LruPolicy;

use super::line::LineRecord;
use crate::config::ReplacementPolicy as PolicyType;

/// Trait for cache replacement policies.
///
/// Policies keep their state in the records themselves, so one instance serves every set
/// of a level as well as its victim buffer.
pub trait ReplacementPolicy: Send + Sync + std::fmt::Debug {
    /// Ages `lines` after a hit on `way`.
    fn hit_update(&self, lines: &mut [LineRecord], way: usize);

    /// Ages `lines` after a new block was placed in `way`.
    fn replacement_update(&self, lines: &mut [LineRecord], way: usize);

    /// Selects the valid record to evict, or `None` if no record is valid.
    fn least_recently_used(&self, lines: &[LineRecord]) -> Option<usize>;
}

/// Instantiates the policy selected by the configuration.
pub fn build(kind: PolicyType) -> Box<dyn ReplacementPolicy> {
    match kind {
        PolicyType::Lru => Box::new(LruPolicy),
    }
}
