//! Configuration system for the cache hierarchy simulator.
//!
//! This module defines the configuration structures used to parameterize a run. It provides:
//! 1. **Defaults:** Baseline geometry and latency constants.
//! 2. **Structures:** Per-level cache configuration and the ordered hierarchy around it.
//! 3. **Validation:** Conversion of a raw [`CacheConfig`] into a checked [`Geometry`].
//!
//! Configuration is supplied as JSON (see [`Config::from_json`]) or assembled by the CLI
//! from flags with [`Config::two_level`].

use std::collections::HashSet;

use serde::Deserialize;

use crate::common::ConfigError;

/// Default configuration constants for the simulator.
mod defaults {
    /// Default cache size in bytes (1 KiB).
    pub const CACHE_SIZE: usize = 1024;

    /// Default block size in bytes.
    pub const CACHE_LINE: usize = 16;

    /// Default associativity (2-way).
    pub const CACHE_WAYS: usize = 2;

    /// Victim buffer disabled by default.
    pub const VICTIM_LINES: usize = 0;

    /// Backing store access time in nanoseconds.
    pub const MEMORY_LATENCY: f64 = 20.0;

    /// Access time substituted for a victim buffer with no lines, in nanoseconds.
    pub const VICTIM_FALLBACK_LATENCY: f64 = 0.2;
}

/// Cache replacement policy algorithms.
///
/// Only LRU is modelled. The enum exists so the configuration format and the
/// [`crate::cache::policies::ReplacementPolicy`] trait can grow without touching the
/// lookup engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReplacementPolicy {
    /// Least Recently Used with saturating per-line recency counters.
    #[default]
    #[serde(alias = "Lru", alias = "lru")]
    Lru,
}

/// Root configuration structure.
///
/// # Examples
///
/// ```
/// use cachesim_core::config::{Config, ReplacementPolicy};
///
/// let json = r#"{
///     "memory": { "latency": 25.0 },
///     "levels": [
///         { "name": "L1", "size_bytes": 1024, "ways": 2, "line_bytes": 16,
///           "victim_lines": 4, "policy": "LRU", "latency": 0.5 },
///         { "name": "L2", "size_bytes": 8192, "ways": 4, "line_bytes": 16 }
///     ]
/// }"#;
///
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.levels.len(), 2);
/// assert_eq!(config.levels[0].victim_lines, 4);
/// assert_eq!(config.levels[1].policy, ReplacementPolicy::Lru);
/// assert_eq!(config.memory.latency, 25.0);
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Cache levels, nearest to the processor first.
    pub levels: Vec<CacheConfig>,
    /// Backing store parameters.
    #[serde(default)]
    pub memory: MemoryConfig,
}

impl Default for Config {
    /// A single default L1 in front of main memory.
    fn default() -> Self {
        Self {
            levels: vec![CacheConfig::default()],
            memory: MemoryConfig::default(),
        }
    }
}

impl Config {
    /// Parses a configuration from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the text is not a valid configuration document.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Builds the classic L1 (+ victim buffer) / L2 configuration.
    ///
    /// An `l2_size` of zero leaves the L1 connected directly to main memory.
    pub fn two_level(
        line_bytes: usize,
        l1_size: usize,
        l1_ways: usize,
        victim_lines: usize,
        l2_size: usize,
        l2_ways: usize,
    ) -> Self {
        let mut levels = vec![CacheConfig {
            name: "L1".to_string(),
            size_bytes: l1_size,
            ways: l1_ways,
            line_bytes,
            victim_lines,
            ..CacheConfig::default()
        }];
        if l2_size > 0 {
            levels.push(CacheConfig {
                name: "L2".to_string(),
                size_bytes: l2_size,
                ways: l2_ways,
                line_bytes,
                victim_lines: 0,
                ..CacheConfig::default()
            });
        }
        Self {
            levels,
            memory: MemoryConfig::default(),
        }
    }

    /// Validates every level and returns their geometries, nearest level first.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyHierarchy`] when no level is configured,
    /// [`ConfigError::DuplicateLevel`] when two levels share a name, or the first geometry
    /// error found.
    pub fn geometries(&self) -> Result<Vec<Geometry>, ConfigError> {
        if self.levels.is_empty() {
            return Err(ConfigError::EmptyHierarchy);
        }
        check_unique_names(self.levels.iter().map(|l| l.name.as_str()))?;
        self.levels.iter().map(CacheConfig::geometry).collect()
    }
}

/// Fails on the first name that appears twice.
///
/// # Errors
///
/// Returns [`ConfigError::DuplicateLevel`] naming the repeated level.
pub fn check_unique_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(ConfigError::DuplicateLevel {
                level: name.to_string(),
            });
        }
    }
    Ok(())
}

/// Backing store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryConfig {
    /// Access time in nanoseconds, charged to every miss out of the last level.
    #[serde(default = "MemoryConfig::default_latency")]
    pub latency: f64,
}

impl MemoryConfig {
    /// Returns the default backing store latency.
    fn default_latency() -> f64 {
        defaults::MEMORY_LATENCY
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            latency: defaults::MEMORY_LATENCY,
        }
    }
}

/// Individual cache level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Level name used in logs, errors and reports.
    #[serde(default = "CacheConfig::default_name")]
    pub name: String,

    /// Total cache size in bytes (victim buffer excluded).
    #[serde(default = "CacheConfig::default_size")]
    pub size_bytes: usize,

    /// Associativity (number of ways)
    #[serde(default = "CacheConfig::default_ways")]
    pub ways: usize,

    /// Block size in bytes
    #[serde(default = "CacheConfig::default_line")]
    pub line_bytes: usize,

    /// Victim buffer capacity in blocks; 0 disables the buffer
    #[serde(default = "CacheConfig::default_victim_lines")]
    pub victim_lines: usize,

    /// Replacement policy
    #[serde(default)]
    pub policy: ReplacementPolicy,

    /// Hit time in nanoseconds, if known.
    #[serde(default)]
    pub latency: Option<f64>,

    /// Energy per access in nanojoules, if known.
    #[serde(default)]
    pub energy: Option<f64>,

    /// Area in square millimetres, if known.
    #[serde(default)]
    pub area: Option<f64>,

    /// Hit time of the victim buffer in nanoseconds, if known.
    #[serde(default)]
    pub victim_latency: Option<f64>,
}

impl CacheConfig {
    fn default_name() -> String {
        "L1".to_string()
    }

    fn default_size() -> usize {
        defaults::CACHE_SIZE
    }

    fn default_line() -> usize {
        defaults::CACHE_LINE
    }

    fn default_ways() -> usize {
        defaults::CACHE_WAYS
    }

    fn default_victim_lines() -> usize {
        defaults::VICTIM_LINES
    }

    /// Access time charged for a victim buffer that has no lines.
    pub const fn victim_fallback_latency() -> f64 {
        defaults::VICTIM_FALLBACK_LATENCY
    }

    /// Validates this level and derives its geometry.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the associativity or size is zero, the block size is
    /// not a power of two, the size does not divide evenly into sets, or the resulting set
    /// count is not a power of two.
    pub fn geometry(&self) -> Result<Geometry, ConfigError> {
        let level = || self.name.clone();
        if self.ways == 0 {
            return Err(ConfigError::ZeroAssociativity { level: level() });
        }
        if self.size_bytes == 0 {
            return Err(ConfigError::ZeroSize { level: level() });
        }
        if !self.line_bytes.is_power_of_two() {
            return Err(ConfigError::NotPowerOfTwo {
                level: level(),
                what: "line_bytes",
                value: self.line_bytes,
            });
        }
        let uneven = || ConfigError::UnevenGeometry {
            level: level(),
            size: self.size_bytes,
            line_bytes: self.line_bytes,
            ways: self.ways,
        };
        let set_bytes = self.line_bytes.checked_mul(self.ways).ok_or_else(uneven)?;
        if self.size_bytes % set_bytes != 0 {
            return Err(uneven());
        }
        let num_sets = self.size_bytes / set_bytes;
        if !num_sets.is_power_of_two() {
            return Err(ConfigError::NotPowerOfTwo {
                level: level(),
                what: "num_sets",
                value: num_sets,
            });
        }
        Ok(Geometry {
            size_bytes: self.size_bytes,
            ways: self.ways,
            line_bytes: self.line_bytes,
            num_sets,
            victim_lines: self.victim_lines,
        })
    }
}

impl Default for CacheConfig {
    /// A 1 KiB, 2-way, 16-byte-block LRU cache without victim buffer.
    fn default() -> Self {
        Self {
            name: Self::default_name(),
            size_bytes: defaults::CACHE_SIZE,
            ways: defaults::CACHE_WAYS,
            line_bytes: defaults::CACHE_LINE,
            victim_lines: defaults::VICTIM_LINES,
            policy: ReplacementPolicy::default(),
            latency: None,
            energy: None,
            area: None,
            victim_latency: None,
        }
    }
}

/// Validated, immutable geometry of one cache level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    /// Total size in bytes.
    pub size_bytes: usize,
    /// Associativity.
    pub ways: usize,
    /// Block size in bytes (power of two).
    pub line_bytes: usize,
    /// Number of sets (power of two).
    pub num_sets: usize,
    /// Victim buffer capacity in blocks.
    pub victim_lines: usize,
}

impl Geometry {
    /// Number of block-offset bits.
    pub const fn block_bits(&self) -> u32 {
        self.line_bytes.trailing_zeros()
    }

    /// Number of set-index bits.
    pub const fn set_bits(&self) -> u32 {
        self.num_sets.trailing_zeros()
    }
}
