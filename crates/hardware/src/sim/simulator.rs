//! Simulator: owns the hierarchy and the configuration it was built from.
//!
//! The requester side is a plain slice of requests. Each one is issued to the first level
//! and runs to completion before the next is issued, so at most one request is ever in
//! flight per level.

use std::time::Instant;

use tracing::info;

use crate::common::{Request, SimError};
use crate::config::{Config, Geometry};
use crate::soc::{Hierarchy, MemoryLevel};
use crate::stats::{LevelStats, SimStats};
use crate::timing::{ConfiguredEstimator, Estimator, average_access_time};

/// Top-level simulator: validated geometry plus the hierarchy it describes.
#[derive(Debug)]
pub struct Simulator {
    config: Config,
    geometries: Vec<Geometry>,
    hierarchy: Hierarchy,
    requests: u64,
}

impl Simulator {
    /// Validates `config` and builds a cold hierarchy from it.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Config`] if the configuration is invalid.
    pub fn new(config: Config) -> Result<Self, SimError> {
        let geometries = config.geometries()?;
        let hierarchy = Hierarchy::new(&config)?;
        info!(levels = geometries.len(), "simulator ready");
        Ok(Self {
            config,
            geometries,
            hierarchy,
            requests: 0,
        })
    }

    /// The hierarchy being simulated.
    pub const fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    /// Issues a single request and waits for it to resolve.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Protocol`] if any level detects a protocol violation.
    pub fn step(&mut self, request: Request) -> Result<(), SimError> {
        let _ = self.hierarchy.issue(request)?;
        self.requests += 1;
        Ok(())
    }

    /// Replays `requests` in order and returns the statistics of the whole run so far.
    ///
    /// # Errors
    ///
    /// Returns the first protocol error, or [`SimError::Estimate`] if some level has
    /// timing figures and another does not.
    pub fn run(&mut self, requests: &[Request]) -> Result<SimStats, SimError> {
        let start = Instant::now();
        for &request in requests {
            self.step(request)?;
        }
        let mut stats = self.stats()?;
        stats.host_time = start.elapsed();
        info!(requests = requests.len(), "run complete");
        Ok(stats)
    }

    /// Collects the current counters of every level and of the backing store.
    ///
    /// The average access time is computed only when the configuration carries timing
    /// figures.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Estimate`] if the timing figures are incomplete.
    pub fn stats(&self) -> Result<SimStats, SimError> {
        let estimator = ConfiguredEstimator::new(&self.config);
        if estimator.has_timing() {
            self.stats_with_estimator(&estimator)
        } else {
            Ok(self.raw_stats())
        }
    }

    /// Like [`Simulator::stats`], with a caller-supplied estimator that is always
    /// consulted.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Estimate`] if the estimator fails for any level.
    pub fn stats_with_estimator(&self, estimator: &dyn Estimator) -> Result<SimStats, SimError> {
        let mut stats = self.raw_stats();
        stats.average_access_time = Some(average_access_time(
            estimator,
            &stats.levels,
            &self.geometries,
            self.config.memory.latency,
        )?);
        Ok(stats)
    }

    fn raw_stats(&self) -> SimStats {
        let levels = self
            .hierarchy
            .levels()
            .iter()
            .map(|cache| LevelStats {
                name: cache.name().to_string(),
                counters: *cache.counters(),
                has_victim_buffer: cache.victim_buffer().is_some(),
            })
            .collect();
        SimStats {
            requests: self.requests,
            levels,
            memory: self.hierarchy.memory_counters(),
            ..SimStats::default()
        }
    }

    /// Returns every level to its cold state and zeroes all counters.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Protocol`] if a level still has a request in flight.
    pub fn reset(&mut self) -> Result<(), SimError> {
        self.hierarchy.reset()?;
        self.requests = 0;
        Ok(())
    }
}
