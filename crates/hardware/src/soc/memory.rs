//! Main memory model.
//!
//! The backing store holds every block, so it never misses and never stalls: each request
//! is answered immediately with a ready response. Only the traffic is counted.

use tracing::trace;

use super::traits::BackingStore;
use crate::common::{OpKind, Request, Response};
use crate::stats::MemoryCounters;

/// Terminal responder below the last cache level.
#[derive(Clone, Debug, Default)]
pub struct MainMemory {
    counters: MemoryCounters,
}

impl MainMemory {
    /// Creates a main memory with zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }
}

impl BackingStore for MainMemory {
    fn accept_request(&mut self, request: Request) -> Response {
        match request.op {
            OpKind::Load => self.counters.reads += 1,
            OpKind::Store => self.counters.writes += 1,
        }
        trace!(%request, "main memory access");
        Response::ready(request.address)
    }

    fn counters(&self) -> MemoryCounters {
        self.counters
    }

    fn reset(&mut self) {
        self.counters = MemoryCounters::default();
    }
}
