//! Per-level continuation state of an in-flight miss.
//!
//! A level forwards a miss downward and finishes it later, when the fill comes back.
//! Everything it needs to finish is recorded here as plain values: the request being
//! served and an index handle to the reserved record. No references into the line store
//! are held across the nested call.

use super::line::LineSlot;
use crate::common::Request;

/// Record reserved for the block of an outstanding miss.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingFill {
    /// Reserved record.
    pub slot: LineSlot,
    /// `true` if the record was freed by evicting or demoting a block, `false` if it was
    /// already free.
    pub replacement: bool,
}

/// Link state of one level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LinkState {
    /// No request in flight.
    #[default]
    Idle,
    /// A dirty eviction is travelling down; its response must not be taken as the fill.
    Writeback {
        /// Request that caused the eviction.
        request: Request,
        /// Record that will receive the fill.
        pending: PendingFill,
        /// Block address being written back.
        address: u64,
    },
    /// The miss was forwarded and the fill is awaited.
    AwaitingFill {
        /// Request being served.
        request: Request,
        /// Record that will receive the fill.
        pending: PendingFill,
    },
}

impl LinkState {
    /// Request in flight, if any.
    pub const fn request(&self) -> Option<&Request> {
        match self {
            Self::Idle => None,
            Self::Writeback { request, .. } | Self::AwaitingFill { request, .. } => Some(request),
        }
    }

    /// Reserved record, if a miss is in flight.
    pub const fn pending(&self) -> Option<PendingFill> {
        match self {
            Self::Idle => None,
            Self::Writeback { pending, .. } | Self::AwaitingFill { pending, .. } => Some(*pending),
        }
    }

    /// Returns `true` when no request is in flight.
    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}
