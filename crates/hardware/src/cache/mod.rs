//! Set-Associative Cache Level.
//!
//! This module implements one level of the hierarchy: a set-associative line store with
//! an optional fully associative victim buffer, LRU aging, and the two-phase
//! request/fill protocol. It models:
//! 1. **Lookup:** Hits age the set and answer immediately.
//! 2. **Victim buffer:** On a conflict miss the buffer is probed; a hit swaps the block
//!    back into the set without touching the next level.
//! 3. **Eviction:** The set's LRU block is demoted to the buffer or evicted; dirty blocks
//!    leaving the level are written back first.
//! 4. **Fill:** The reserved record is completed when the next level answers.
//!
//! Only one request may be in flight per level. Starting a second one before the first
//! resolves is a [`ProtocolError`].

/// Address decomposition.
pub mod decoder;
/// Line records and the line store.
pub mod line;
/// Continuation state of in-flight misses.
pub mod pending;
/// Cache replacement policy implementations.
pub mod policies;
/// Fully associative victim buffer.
pub mod victim;

use std::fmt;

use tracing::{debug, info};

use self::decoder::AddressDecoder;
use self::line::{LineRecord, LineSlot, LineStore};
use self::pending::{LinkState, PendingFill};
use self::policies::ReplacementPolicy;
use self::victim::VictimBuffer;
use crate::common::{ConfigError, OpKind, ProtocolError, Request, Response};
use crate::config::{CacheConfig, Geometry};
use crate::soc::traits::{Action, MemoryLevel};
use crate::stats::CacheCounters;

/// One cache level: line store, victim buffer and lookup engine.
#[derive(Debug)]
pub struct Cache {
    name: String,
    geometry: Geometry,
    decoder: AddressDecoder,
    store: LineStore,
    victim: Option<VictimBuffer>,
    policy: Box<dyn ReplacementPolicy>,
    state: LinkState,
    counters: CacheCounters,
}

impl Cache {
    /// Creates a cold cache level from its configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the geometry is invalid (see [`CacheConfig::geometry`]).
    pub fn new(config: &CacheConfig) -> Result<Self, ConfigError> {
        let geometry = config.geometry()?;
        let victim = (geometry.victim_lines > 0).then(|| VictimBuffer::new(geometry.victim_lines));
        info!(
            level = %config.name,
            size = geometry.size_bytes,
            ways = geometry.ways,
            line_bytes = geometry.line_bytes,
            sets = geometry.num_sets,
            victim_lines = geometry.victim_lines,
            "constructed cache"
        );
        Ok(Self {
            name: config.name.clone(),
            geometry,
            decoder: AddressDecoder::from_geometry(&geometry),
            store: LineStore::new(geometry.num_sets, geometry.ways),
            victim,
            policy: policies::build(config.policy),
            state: LinkState::Idle,
            counters: CacheCounters::default(),
        })
    }

    /// Validated geometry of this level.
    pub const fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Address decoder of this level.
    pub const fn decoder(&self) -> &AddressDecoder {
        &self.decoder
    }

    /// Line store of this level.
    pub const fn store(&self) -> &LineStore {
        &self.store
    }

    /// Victim buffer, if one is configured.
    pub const fn victim_buffer(&self) -> Option<&VictimBuffer> {
        self.victim.as_ref()
    }

    /// Counters accumulated since construction or the last reset.
    pub const fn counters(&self) -> &CacheCounters {
        &self.counters
    }

    /// Current link state.
    pub const fn state(&self) -> &LinkState {
        &self.state
    }

    /// Reserved record of the outstanding miss, if any.
    pub const fn pending(&self) -> Option<PendingFill> {
        self.state.pending()
    }

    /// Returns `true` if the block holding `addr` is in one of the sets.
    pub fn contains(&self, addr: u64) -> bool {
        let set = self.decoder.set_index(addr);
        line::find(self.store.set(set), self.decoder.cache_tag(addr)).is_some()
    }

    /// Returns `true` if the block holding `addr` is in the victim buffer.
    pub fn victim_contains(&self, addr: u64) -> bool {
        self.victim
            .as_ref()
            .is_some_and(|v| v.find(self.decoder.victim_tag(addr)).is_some())
    }

    /// Returns `true` if the block holding `addr` is present and dirty, in a set or in
    /// the victim buffer.
    pub fn is_dirty(&self, addr: u64) -> bool {
        let set = self.decoder.set_index(addr);
        let lines = self.store.set(set);
        if let Some(way) = line::find(lines, self.decoder.cache_tag(addr)) {
            return lines[way].dirty;
        }
        self.victim.as_ref().is_some_and(|v| {
            v.find(self.decoder.victim_tag(addr))
                .is_some_and(|slot| v.lines()[slot].dirty)
        })
    }

    /// Returns the level to its cold state: every record invalid, counters zero.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::ResetWhileOutstanding`] if a request is in flight.
    pub fn reset(&mut self) -> Result<(), ProtocolError> {
        if let Some(request) = self.state.request() {
            return Err(ProtocolError::ResetWhileOutstanding {
                level: self.name.clone(),
                outstanding: request.address,
            });
        }
        self.store.clear();
        if let Some(victim) = self.victim.as_mut() {
            victim.clear();
        }
        self.counters = CacheCounters::default();
        Ok(())
    }

    /// LRU way of a full set.
    fn lru_way(&self, set: usize) -> Result<usize, ProtocolError> {
        self.policy
            .least_recently_used(self.store.set(set))
            .ok_or_else(|| self.no_candidate("set"))
    }

    fn no_candidate(&self, structure: &'static str) -> ProtocolError {
        ProtocolError::NoReplacementCandidate {
            level: self.name.clone(),
            structure,
        }
    }

    fn hit(&mut self, set: usize, way: usize, op: OpKind) {
        let lines = self.store.set_mut(set);
        if op.is_store() {
            lines[way].dirty = true;
        }
        self.policy.hit_update(lines, way);
    }

    /// Swaps the set's LRU block with the victim-buffer block in `slot`.
    fn swap_with_victim(&mut self, set: usize, slot: usize, op: OpKind) -> Result<(), ProtocolError> {
        let way = self.lru_way(set)?;
        let Some(victim) = self.victim.as_mut() else {
            return Err(self.no_candidate("victim buffer"));
        };
        let decoder = self.decoder;
        let lines = self.store.set_mut(set);
        let outgoing = lines[way];
        let incoming = victim.lines()[slot];

        lines[way] = LineRecord {
            valid: true,
            dirty: incoming.dirty || op.is_store(),
            tag: decoder.narrow(incoming.tag),
            recency: incoming.recency,
        };
        victim.lines_mut()[slot] = LineRecord {
            valid: true,
            dirty: outgoing.dirty,
            tag: decoder.widen(outgoing.tag, set),
            recency: outgoing.recency,
        };
        self.policy.replacement_update(lines, way);
        self.policy.replacement_update(victim.lines_mut(), slot);
        let promoted = decoder.victim_block_address(incoming.tag);
        let demoted = decoder.block_address(outgoing.tag, set);
        debug!(
            level = %self.name,
            set,
            way,
            slot,
            promoted = format_args!("{promoted:#x}"),
            demoted = format_args!("{demoted:#x}"),
            "victim buffer swap"
        );
        Ok(())
    }

    /// Moves the LRU block of a full `set` into the victim buffer, evicting the buffer's
    /// own LRU block if it is full. Returns the freed set record and the writeback
    /// address, if the evicted buffer block was dirty.
    fn demote(&mut self, set: usize) -> Result<(PendingFill, Option<u64>), ProtocolError> {
        let way = self.lru_way(set)?;
        let decoder = self.decoder;
        let outgoing = self.store.set(set)[way];
        let mut writeback = None;

        let Some(victim) = self.victim.as_mut() else {
            return Err(self.no_candidate("victim buffer"));
        };
        let slot = match victim.first_invalid() {
            Some(slot) => slot,
            None => {
                let Some(slot) = self.policy.least_recently_used(victim.lines()) else {
                    return Err(ProtocolError::NoReplacementCandidate {
                        level: self.name.clone(),
                        structure: "victim buffer",
                    });
                };
                let evicted = victim.lines()[slot];
                let block = decoder.victim_block_address(evicted.tag);
                if evicted.dirty {
                    writeback = Some(block);
                    self.counters.writebacks += 1;
                }
                debug!(
                    level = %self.name,
                    slot,
                    block = format_args!("{block:#x}"),
                    dirty = evicted.dirty,
                    "evicting from victim buffer"
                );
                victim.lines_mut()[slot].invalidate();
                slot
            }
        };
        victim.lines_mut()[slot] = LineRecord {
            valid: true,
            dirty: outgoing.dirty,
            tag: decoder.widen(outgoing.tag, set),
            recency: 0,
        };
        self.policy.replacement_update(victim.lines_mut(), slot);
        debug!(level = %self.name, set, way, slot, "demoted block to victim buffer");

        self.store.set_mut(set)[way].invalidate();
        let pending = PendingFill {
            slot: LineSlot { set, way },
            replacement: true,
        };
        Ok((pending, writeback))
    }

    /// Evicts the LRU block of a full `set`. Returns the freed record and the writeback
    /// address, if the block was dirty.
    fn evict(&mut self, set: usize) -> Result<(PendingFill, Option<u64>), ProtocolError> {
        let way = self.lru_way(set)?;
        let outgoing = self.store.set(set)[way];
        let block = self.decoder.block_address(outgoing.tag, set);
        let writeback = outgoing.dirty.then_some(block);
        if writeback.is_some() {
            self.counters.writebacks += 1;
        }
        debug!(
            level = %self.name,
            set,
            way,
            block = format_args!("{block:#x}"),
            dirty = outgoing.dirty,
            "evicting block"
        );
        self.store.set_mut(set)[way].invalidate();
        let pending = PendingFill {
            slot: LineSlot { set, way },
            replacement: true,
        };
        Ok((pending, writeback))
    }

    /// Records the continuation and returns the first message to send downward.
    fn forward(&mut self, request: Request, pending: PendingFill, writeback: Option<u64>) -> Action {
        if let Some(address) = writeback {
            debug!(level = %self.name, address = format_args!("{address:#x}"), "writing back dirty block");
            self.state = LinkState::Writeback {
                request,
                pending,
                address,
            };
            Action::Forward(Request::store(address))
        } else {
            debug!(level = %self.name, %request, "forwarding miss");
            self.state = LinkState::AwaitingFill { request, pending };
            Action::Forward(request)
        }
    }

    fn check_response(&self, response: Response, expected: u64) -> Result<(), ProtocolError> {
        if response.address != expected {
            return Err(ProtocolError::FillAddressMismatch {
                level: self.name.clone(),
                expected,
                got: response.address,
            });
        }
        if !response.ready {
            return Err(ProtocolError::NotReady {
                level: self.name.clone(),
                address: response.address,
            });
        }
        Ok(())
    }

    /// Completes the fill of `pending` with the block of `request`.
    fn fill(&mut self, request: Request, pending: PendingFill) -> Response {
        let tag = self.decoder.cache_tag(request.address);
        let lines = self.store.set_mut(pending.slot.set);
        lines[pending.slot.way] = LineRecord {
            valid: true,
            dirty: request.op.is_store(),
            tag,
            recency: 0,
        };
        self.policy.replacement_update(lines, pending.slot.way);
        debug!(
            level = %self.name,
            set = pending.slot.set,
            way = pending.slot.way,
            replacement = pending.replacement,
            tag = format_args!("{tag:#x}"),
            "fill complete"
        );
        Response::ready(request.address)
    }
}

impl MemoryLevel for Cache {
    fn name(&self) -> &str {
        &self.name
    }

    fn accept_request(&mut self, request: Request) -> Result<Action, ProtocolError> {
        if let Some(outstanding) = self.state.request() {
            return Err(ProtocolError::RequestWhileOutstanding {
                level: self.name.clone(),
                address: request.address,
                outstanding: outstanding.address,
            });
        }
        debug!(level = %self.name, %request, "received request");
        self.counters.record_access(request.op);

        let set = self.decoder.set_index(request.address);
        let tag = self.decoder.cache_tag(request.address);

        if let Some(way) = line::find(self.store.set(set), tag) {
            debug!(level = %self.name, set, way, "hit");
            self.hit(set, way, request.op);
            return Ok(Action::Respond(Response::ready(request.address)));
        }
        self.counters.record_miss(request.op);

        if let Some(way) = line::first_invalid(self.store.set(set)) {
            if self.victim_contains(request.address) {
                return Err(ProtocolError::VictimHitWithFreeSlot {
                    level: self.name.clone(),
                    address: request.address,
                    set,
                });
            }
            let pending = PendingFill {
                slot: LineSlot { set, way },
                replacement: false,
            };
            return Ok(self.forward(request, pending, None));
        }

        let (pending, writeback) = match self.victim.as_ref() {
            Some(victim) => {
                self.counters.swap_requests += 1;
                if let Some(slot) = victim.find(self.decoder.victim_tag(request.address)) {
                    self.counters.swaps += 1;
                    self.swap_with_victim(set, slot, request.op)?;
                    return Ok(Action::Respond(Response::ready(request.address)));
                }
                debug!(level = %self.name, "victim buffer miss");
                self.demote(set)?
            }
            None => self.evict(set)?,
        };
        Ok(self.forward(request, pending, writeback))
    }

    fn accept_fill(&mut self, response: Response) -> Result<Action, ProtocolError> {
        match self.state {
            LinkState::Idle => Err(ProtocolError::FillWithoutPending {
                level: self.name.clone(),
                address: response.address,
            }),
            LinkState::Writeback {
                request,
                pending,
                address,
            } => {
                self.check_response(response, address)?;
                debug!(level = %self.name, %response, "writeback acknowledged; not a fill");
                self.state = LinkState::AwaitingFill { request, pending };
                Ok(Action::Forward(request))
            }
            LinkState::AwaitingFill { request, pending } => {
                self.check_response(response, request.address)?;
                let response = self.fill(request, pending);
                self.state = LinkState::Idle;
                Ok(Action::Respond(response))
            }
        }
    }
}

impl fmt::Display for Cache {
    /// Renders the contents of every set, most recently used block first, then the
    /// victim buffer. Dirty blocks are marked `D`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "===== {} contents =====", self.name)?;
        for (index, lines) in self.store.sets().enumerate() {
            write!(f, "  set {index:>6}:")?;
            write_by_recency(f, lines)?;
            writeln!(f)?;
        }
        if let Some(victim) = &self.victim {
            writeln!(f, "===== {} victim buffer contents =====", self.name)?;
            write!(f, "  set {:>6}:", 0)?;
            write_by_recency(f, victim.lines())?;
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Writes the valid records of `lines`, most recently used first.
fn write_by_recency(f: &mut fmt::Formatter<'_>, lines: &[LineRecord]) -> fmt::Result {
    let mut valid: Vec<&LineRecord> = lines.iter().filter(|l| l.valid).collect();
    valid.sort_by_key(|l| l.recency);
    for line in valid {
        write!(f, " {:>8x} {}", line.tag, if line.dirty { 'D' } else { ' ' })?;
    }
    Ok(())
}
