//! Simulation statistics collection and reporting.
//!
//! This module tracks the counters of a run. It provides:
//! 1. **Per-level counters:** Reads, writes, their misses, victim-buffer swap requests
//!    and swaps, and writebacks. Each level owns its counters.
//! 2. **Backing store traffic:** Reads and writes that reached main memory.
//! 3. **Aggregation:** [`SimStats`] collects the counters of every level after a run and
//!    derives miss and swap-request rates.
//! 4. **Reporting:** Sectioned text output in the `name  value` style.

use std::fmt::Write as _;
use std::time::Duration;

use crate::common::OpKind;

/// Counters of one cache level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheCounters {
    /// Load requests received.
    pub reads: u64,
    /// Loads that missed in the sets (including those served by the victim buffer).
    pub read_misses: u64,
    /// Store requests received (including writebacks from the level above).
    pub writes: u64,
    /// Stores that missed in the sets (including those served by the victim buffer).
    pub write_misses: u64,
    /// Conflict misses that probed the victim buffer.
    pub swap_requests: u64,
    /// Victim-buffer probes that hit and swapped.
    pub swaps: u64,
    /// Dirty blocks written back to the next level.
    pub writebacks: u64,
}

impl CacheCounters {
    /// Counts an incoming request.
    #[inline]
    pub fn record_access(&mut self, op: OpKind) {
        match op {
            OpKind::Load => self.reads += 1,
            OpKind::Store => self.writes += 1,
        }
    }

    /// Counts a set miss.
    #[inline]
    pub fn record_miss(&mut self, op: OpKind) {
        match op {
            OpKind::Load => self.read_misses += 1,
            OpKind::Store => self.write_misses += 1,
        }
    }

    /// Total requests received.
    pub const fn accesses(&self) -> u64 {
        self.reads + self.writes
    }

    /// Total set misses.
    pub const fn misses(&self) -> u64 {
        self.read_misses + self.write_misses
    }

    /// Set miss rate, ignoring the victim buffer.
    pub const fn miss_rate(&self) -> f64 {
        ratio(self.misses(), self.accesses())
    }

    /// Fraction of requests that probed the victim buffer.
    pub const fn swap_request_rate(&self) -> f64 {
        ratio(self.swap_requests, self.accesses())
    }

    /// Miss rate of the sets and victim buffer together: misses that had to go to the
    /// next level, over all requests.
    pub const fn combined_miss_rate(&self) -> f64 {
        ratio(self.misses().saturating_sub(self.swaps), self.accesses())
    }

    /// Requests this level sent to the next level (misses not served by the victim
    /// buffer, plus writebacks).
    pub const fn traffic_out(&self) -> u64 {
        self.misses().saturating_sub(self.swaps) + self.writebacks
    }
}

/// Accesses served by the backing store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemoryCounters {
    /// Load requests served.
    pub reads: u64,
    /// Store requests served (writebacks and store misses).
    pub writes: u64,
}

impl MemoryCounters {
    /// Total accesses.
    pub const fn total(&self) -> u64 {
        self.reads + self.writes
    }
}

/// Counters of one level, labelled with its name.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelStats {
    /// Level name.
    pub name: String,
    /// Counters at the end of the run.
    pub counters: CacheCounters,
    /// Whether the level has a victim buffer.
    pub has_victim_buffer: bool,
}

/// Statistics of a complete run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SimStats {
    /// Requests issued by the requester.
    pub requests: u64,
    /// Per-level counters, nearest level first.
    pub levels: Vec<LevelStats>,
    /// Backing store traffic.
    pub memory: MemoryCounters,
    /// Average access time in nanoseconds, when an estimate is available.
    pub average_access_time: Option<f64>,
    /// Host time spent simulating.
    pub host_time: Duration,
}

/// Section names for selective stats output.
///
/// Pass an empty slice to [`SimStats::render_sections`] to render all sections.
pub const STATS_SECTIONS: &[&str] = &["summary", "levels", "memory", "timing"];

impl SimStats {
    /// Counters of the level named `name`.
    pub fn level(&self, name: &str) -> Option<&CacheCounters> {
        self.levels
            .iter()
            .find(|l| l.name == name)
            .map(|l| &l.counters)
    }

    /// Renders the requested sections.
    ///
    /// Each element of `sections` should be one of [`STATS_SECTIONS`]; unknown names are
    /// ignored. An empty slice renders everything.
    pub fn render_sections(&self, sections: &[String]) -> String {
        let want = |s: &str| sections.is_empty() || sections.iter().any(|x| x == s);
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_sections(&mut out, &want);
        out
    }

    fn write_sections(
        &self,
        out: &mut String,
        want: &dyn Fn(&str) -> bool,
    ) -> std::fmt::Result {
        writeln!(out, "==========================================================")?;
        writeln!(out, "CACHE HIERARCHY SIMULATION STATISTICS")?;
        writeln!(out, "==========================================================")?;
        if want("summary") {
            writeln!(out, "host_seconds             {:.4} s", self.host_time.as_secs_f64())?;
            writeln!(out, "requests                 {}", self.requests)?;
            writeln!(out, "levels                   {}", self.levels.len())?;
            writeln!(out, "----------------------------------------------------------")?;
        }
        if want("levels") {
            for level in &self.levels {
                let c = &level.counters;
                let name = &level.name;
                writeln!(out, "{name} CACHE")?;
                writeln!(out, "  {name}.reads              {}", c.reads)?;
                writeln!(out, "  {name}.read_misses        {}", c.read_misses)?;
                writeln!(out, "  {name}.writes             {}", c.writes)?;
                writeln!(out, "  {name}.write_misses       {}", c.write_misses)?;
                if level.has_victim_buffer {
                    writeln!(out, "  {name}.swap_requests      {}", c.swap_requests)?;
                    writeln!(out, "  {name}.swap_request_rate  {:.4}", c.swap_request_rate())?;
                    writeln!(out, "  {name}.swaps              {}", c.swaps)?;
                    writeln!(out, "  {name}.vc_miss_rate       {:.4}", c.combined_miss_rate())?;
                } else {
                    writeln!(out, "  {name}.miss_rate          {:.4}", c.miss_rate())?;
                }
                writeln!(out, "  {name}.writebacks         {}", c.writebacks)?;
                writeln!(out, "----------------------------------------------------------")?;
            }
        }
        if want("memory") {
            writeln!(out, "MAIN MEMORY")?;
            writeln!(out, "  memory.reads           {}", self.memory.reads)?;
            writeln!(out, "  memory.writes          {}", self.memory.writes)?;
            writeln!(out, "  memory.traffic         {}", self.memory.total())?;
            writeln!(out, "----------------------------------------------------------")?;
        }
        if want("timing") {
            writeln!(out, "TIMING")?;
            match self.average_access_time {
                Some(aat) => writeln!(out, "  average_access_time    {aat:.4} ns")?,
                None => writeln!(out, "  average_access_time    n/a")?,
            }
        }
        writeln!(out, "==========================================================")
    }

    /// Prints only the requested statistics sections to stdout.
    pub fn print_sections(&self, sections: &[String]) {
        print!("{}", self.render_sections(sections));
    }
}

const fn ratio(num: u64, den: u64) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}
