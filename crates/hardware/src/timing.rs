//! Timing, energy and area estimates.
//!
//! The simulator itself is functional: it counts events but does not model time. Timing
//! enters only at reporting, through an [`Estimator`] that maps a level's geometry to its
//! access time, energy per access and area. [`average_access_time`] then combines those
//! with the measured miss rates.
//!
//! [`ConfiguredEstimator`] reads the figures straight from the configuration. A victim
//! buffer with no lines has no meaningful geometry; it is charged
//! [`CacheConfig::victim_fallback_latency`] instead of failing.

use std::collections::HashMap;

use crate::common::EstimateError;
use crate::config::{CacheConfig, Config, Geometry};
use crate::stats::LevelStats;

/// Physical figures of one structure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    /// Access time in nanoseconds.
    pub access_time: f64,
    /// Energy per access in nanojoules.
    pub energy: f64,
    /// Area in square millimetres.
    pub area: f64,
}

/// Source of timing, energy and area figures.
pub trait Estimator {
    /// Estimates the structure called `name` with the given geometry.
    ///
    /// # Errors
    ///
    /// Returns [`EstimateError::Unavailable`] if no figures exist for this geometry.
    fn estimate(&self, name: &str, geometry: &Geometry) -> Result<Estimate, EstimateError>;

    /// Estimates the victim buffer of the level called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`EstimateError::Unavailable`] if the buffer has lines but no figures.
    fn estimate_victim(&self, name: &str, geometry: &Geometry) -> Result<Estimate, EstimateError>;
}

#[derive(Debug, Clone)]
struct Figures {
    latency: Option<f64>,
    energy: Option<f64>,
    area: Option<f64>,
    victim_latency: Option<f64>,
}

/// Estimator backed by the `latency`, `energy`, `area` and `victim_latency` fields of
/// each [`CacheConfig`].
#[derive(Debug, Clone, Default)]
pub struct ConfiguredEstimator {
    figures: HashMap<String, Figures>,
}

impl ConfiguredEstimator {
    /// Collects the figures of every level in `config`.
    pub fn new(config: &Config) -> Self {
        let figures = config
            .levels
            .iter()
            .map(|level| (level.name.clone(), Figures::from(level)))
            .collect();
        Self { figures }
    }

    /// Returns `true` if at least one level carries a latency.
    pub fn has_timing(&self) -> bool {
        self.figures.values().any(|f| f.latency.is_some())
    }
}

impl From<&CacheConfig> for Figures {
    fn from(level: &CacheConfig) -> Self {
        Self {
            latency: level.latency,
            energy: level.energy,
            area: level.area,
            victim_latency: level.victim_latency,
        }
    }
}

fn unavailable(name: &str, size: usize, geometry: &Geometry, ways: usize) -> EstimateError {
    EstimateError::Unavailable {
        name: name.to_string(),
        size,
        line_bytes: geometry.line_bytes,
        ways,
    }
}

impl Estimator for ConfiguredEstimator {
    fn estimate(&self, name: &str, geometry: &Geometry) -> Result<Estimate, EstimateError> {
        let figures = self.figures.get(name);
        let access_time = figures
            .and_then(|f| f.latency)
            .ok_or_else(|| unavailable(name, geometry.size_bytes, geometry, geometry.ways))?;
        Ok(Estimate {
            access_time,
            energy: figures.and_then(|f| f.energy).unwrap_or_default(),
            area: figures.and_then(|f| f.area).unwrap_or_default(),
        })
    }

    fn estimate_victim(&self, name: &str, geometry: &Geometry) -> Result<Estimate, EstimateError> {
        if geometry.victim_lines == 0 {
            return Ok(Estimate {
                access_time: CacheConfig::victim_fallback_latency(),
                energy: 0.0,
                area: 0.0,
            });
        }
        let size = geometry.victim_lines * geometry.line_bytes;
        let access_time = self
            .figures
            .get(name)
            .and_then(|f| f.victim_latency)
            .ok_or_else(|| unavailable(name, size, geometry, geometry.victim_lines))?;
        Ok(Estimate {
            access_time,
            energy: 0.0,
            area: 0.0,
        })
    }
}

/// Average access time seen by the requester, in nanoseconds.
///
/// Computed from the last level upward: a level costs its hit time, plus the victim
/// buffer's time for every probe, plus the time of the level below for every miss not
/// served by the buffer. The backing store costs `memory_latency`.
///
/// `levels` and `geometries` must describe the same levels, nearest first.
///
/// # Errors
///
/// Returns the first [`EstimateError`] reported by `estimator`.
pub fn average_access_time(
    estimator: &dyn Estimator,
    levels: &[LevelStats],
    geometries: &[Geometry],
    memory_latency: f64,
) -> Result<f64, EstimateError> {
    let mut below = memory_latency;
    for (level, geometry) in levels.iter().zip(geometries).rev() {
        let hit_time = estimator.estimate(&level.name, geometry)?.access_time;
        let counters = &level.counters;
        below = if level.has_victim_buffer {
            let victim_time = estimator.estimate_victim(&level.name, geometry)?.access_time;
            hit_time
                + counters.swap_request_rate() * victim_time
                + counters.combined_miss_rate() * below
        } else {
            hit_time + counters.miss_rate() * below
        };
    }
    Ok(below)
}
