//! Hierarchy assembly.
//!
//! This module connects cache levels to each other and to the backing store. It provides:
//! 1. **Interfaces:** The [`MemoryLevel`] and [`BackingStore`] traits and the [`Action`]
//!    a level returns after accepting a message.
//! 2. **Interconnect:** [`Hierarchy`], which carries requests down and responses up.
//! 3. **Main memory:** [`MainMemory`], the always-ready terminal responder.

/// Ordered chain of cache levels in front of the backing store.
pub mod interconnect;

/// Always-ready backing store.
pub mod memory;

/// Level and backing store trait definitions.
pub mod traits;

pub use interconnect::Hierarchy;
pub use memory::MainMemory;
pub use traits::{Action, BackingStore, MemoryLevel};
