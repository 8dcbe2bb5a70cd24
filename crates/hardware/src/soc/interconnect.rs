//! Hierarchy interconnect.
//!
//! This module carries messages between cache levels. It provides:
//! 1. **Construction:** Builds the ordered list of levels from a [`Config`] and attaches
//!    the backing store below the last one.
//! 2. **Routing:** A request entering level `i` that must go further is handed to level
//!    `i + 1` (or to the backing store), and the answer is fed back to level `i` as a fill.
//! 3. **Inspection:** Read access to each level for reporting and contents dumps.
//!
//! Levels never reference each other; all traversal is by index.

use std::fmt;

use tracing::debug;

use super::memory::MainMemory;
use super::traits::{Action, BackingStore, MemoryLevel};
use crate::cache::Cache;
use crate::common::{ConfigError, ProtocolError, Request, Response};
use crate::config::{Config, check_unique_names};
use crate::stats::MemoryCounters;

/// Cache levels, nearest to the requester first, in front of a backing store.
pub struct Hierarchy {
    levels: Vec<Cache>,
    memory: Box<dyn BackingStore>,
}

impl Hierarchy {
    /// Builds every configured level in front of a fresh [`MainMemory`].
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if no level is configured or any geometry is invalid.
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let levels = config
            .levels
            .iter()
            .map(Cache::new)
            .collect::<Result<Vec<_>, _>>()?;
        Self::with_memory(levels, Box::new(MainMemory::new()))
    }

    /// Connects already-built levels to the given backing store.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyHierarchy`] if `levels` is empty, or
    /// [`ConfigError::DuplicateLevel`] if two levels share a name.
    pub fn with_memory(
        levels: Vec<Cache>,
        memory: Box<dyn BackingStore>,
    ) -> Result<Self, ConfigError> {
        if levels.is_empty() {
            return Err(ConfigError::EmptyHierarchy);
        }
        check_unique_names(levels.iter().map(MemoryLevel::name))?;
        Ok(Self { levels, memory })
    }

    /// Issues one request from the requester to the first level and returns the response
    /// once every level involved has resolved it.
    ///
    /// # Errors
    ///
    /// Returns the first [`ProtocolError`] raised by any level.
    pub fn issue(&mut self, request: Request) -> Result<Response, ProtocolError> {
        self.dispatch(0, request)
    }

    /// Delivers `request` to level `index` and drives it until the level responds.
    fn dispatch(&mut self, index: usize, request: Request) -> Result<Response, ProtocolError> {
        let Some(level) = self.levels.get_mut(index) else {
            return Ok(self.memory.accept_request(request));
        };
        let mut action = level.accept_request(request)?;
        loop {
            match action {
                Action::Respond(response) => return Ok(response),
                Action::Forward(next) => {
                    debug!(from = index, %next, "forwarding to next level");
                    let response = self.dispatch(index + 1, next)?;
                    action = self.levels[index].accept_fill(response)?;
                }
            }
        }
    }

    /// Cache levels, nearest first.
    pub fn levels(&self) -> &[Cache] {
        &self.levels
    }

    /// Level at `index`, if present.
    pub fn level(&self, index: usize) -> Option<&Cache> {
        self.levels.get(index)
    }

    /// Traffic served by the backing store.
    pub fn memory_counters(&self) -> MemoryCounters {
        self.memory.counters()
    }

    /// Resets every level to its cold state and zeroes the backing store counters.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::ResetWhileOutstanding`] if a level has a request in flight.
    pub fn reset(&mut self) -> Result<(), ProtocolError> {
        self.levels.iter_mut().try_for_each(Cache::reset)?;
        self.memory.reset();
        Ok(())
    }
}

impl fmt::Debug for Hierarchy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hierarchy")
            .field("levels", &self.levels)
            .field("memory", &self.memory.counters())
            .finish()
    }
}

impl fmt::Display for Hierarchy {
    /// Renders the contents of every level, nearest first.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for level in &self.levels {
            write!(f, "{level}")?;
        }
        Ok(())
    }
}
