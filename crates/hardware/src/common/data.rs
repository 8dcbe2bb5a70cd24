//! Memory Request and Response Messages.
//!
//! This module defines the values exchanged between adjacent levels of the hierarchy:
//! 1. **Operation kind:** Whether a request reads (load) or writes (store) a block.
//! 2. **Requests:** Travel downward, from the processor toward the backing store.
//! 3. **Responses:** Travel upward and complete a request at the level that issued it.
//!
//! Messages are plain `Copy` values. No level keeps one beyond the call that carries it,
//! except for the copy a level records as its continuation state while a miss is in flight.

use std::fmt;

/// Kind of memory operation carried by a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
    /// Data read. Trace code `r`.
    Load,

    /// Data write. Trace code `w`.
    ///
    /// A store that hits marks the line dirty; a store that misses allocates the
    /// line (write-allocate) and fills it dirty.
    Store,
}

impl OpKind {
    /// Returns `true` for [`OpKind::Store`].
    #[inline]
    pub const fn is_store(self) -> bool {
        matches!(self, Self::Store)
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load => write!(f, "LOAD"),
            Self::Store => write!(f, "STORE"),
        }
    }
}

/// A request packet travelling toward the backing store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Request {
    /// Operation to perform.
    pub op: OpKind,
    /// Byte address of the access.
    pub address: u64,
}

impl Request {
    /// Creates a new request.
    #[inline]
    pub const fn new(op: OpKind, address: u64) -> Self {
        Self { op, address }
    }

    /// Creates a load request.
    #[inline]
    pub const fn load(address: u64) -> Self {
        Self::new(OpKind::Load, address)
    }

    /// Creates a store request.
    #[inline]
    pub const fn store(address: u64) -> Self {
        Self::new(OpKind::Store, address)
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{OP: {}, ADDR: {:#x}}}", self.op, self.address)
    }
}

/// A response packet travelling back toward the processor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Response {
    /// Whether the requested block is available.
    pub ready: bool,
    /// Address of the request being answered.
    pub address: u64,
}

impl Response {
    /// Creates a ready response for `address`.
    #[inline]
    pub const fn ready(address: u64) -> Self {
        Self {
            ready: true,
            address,
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{RDY: {}, ADDR: {:#x}}}", u8::from(self.ready), self.address)
    }
}
