//! Interfaces between hierarchy levels.
//!
//! This module defines the capabilities the interconnect relies on. It provides:
//! 1. **Actions:** What a level wants done after accepting a message.
//! 2. **Levels:** The two inbound entry points every cache level implements.
//! 3. **Backing store:** The terminal responder below the last level.
//!
//! Levels never hold references to their neighbours. The interconnect carries every
//! message and decides which level receives it next.

use crate::common::{ProtocolError, Request, Response};
use crate::stats::MemoryCounters;

/// Outcome of a level accepting a request or a fill.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// Send this response to the level above; the level is idle again.
    Respond(Response),
    /// Send this request to the level below and hand its response back via
    /// [`MemoryLevel::accept_fill`].
    Forward(Request),
}

/// A cache level in the hierarchy.
pub trait MemoryLevel {
    /// Short name of the level (e.g. `"L1"`).
    fn name(&self) -> &str;

    /// Accepts a request from the level above.
    ///
    /// # Errors
    ///
    /// Returns a [`ProtocolError`] if a request is already outstanding or the level's
    /// state is inconsistent.
    fn accept_request(&mut self, request: Request) -> Result<Action, ProtocolError>;

    /// Accepts the response to the request this level last forwarded.
    ///
    /// # Errors
    ///
    /// Returns a [`ProtocolError`] if nothing was forwarded or the response does not
    /// answer it.
    fn accept_fill(&mut self, response: Response) -> Result<Action, ProtocolError>;
}

/// The store below the last cache level.
///
/// It must answer every request immediately with a ready response, whatever the
/// address or operation.
pub trait BackingStore {
    /// Serves a request.
    fn accept_request(&mut self, request: Request) -> Response;

    /// Accesses served so far.
    fn counters(&self) -> MemoryCounters;

    /// Zeroes the access counters.
    fn reset(&mut self);
}
