//! Far-side timing memory.
//!
//! A fixed-latency responder with bounded occupancy. It provides:
//! 1. **Timing access:** requests complete after a fixed latency and are handed back to the
//!    relay as responses. Once `max_outstanding` requests are held (pending or blocked),
//!    further requests are refused and a retry is owed.
//! 2. **Response ordering:** completed responses leave in arrival order, or pair-swapped to
//!    exercise reorder detection.
//! 3. **Atomic and functional access:** served immediately, with no timing state touched.

use std::collections::VecDeque;

use tracing::{debug, trace, warn};

use crate::common::{AddrRange, Tick};
use crate::config::{MemoryConfig, ResponseOrder};
use crate::sim::clock::ClockDomain;
use crate::soc::packet::Packet;
use crate::soc::traits::{Responder, RetryGrant};

/// Fixed-latency memory on the far side of a relay.
#[derive(Debug)]
pub struct TimingMemory {
    range: AddrRange,
    latency: Tick,
    max_outstanding: usize,
    order: ResponseOrder,
    now: Tick,

    pending: VecDeque<(Tick, Packet)>,
    blocked: Option<Packet>,
    owe_req_retry: bool,
    // Set after releasing the second entry of a pair; the front goes next.
    owe_front: bool,

    received: Vec<u64>,
    atomic_accesses: u64,
    functional_accesses: u64,
}

impl TimingMemory {
    /// Creates an empty memory.
    ///
    /// # Arguments
    ///
    /// * `config` - Served range, latency, occupancy limit, and release order.
    /// * `clock` - Clock used to convert the latency to ticks.
    pub fn new(config: &MemoryConfig, clock: ClockDomain) -> Self {
        Self {
            range: config.range(),
            latency: clock.ticks(config.latency),
            max_outstanding: config.max_outstanding,
            order: config.response_order,
            now: 0,
            pending: VecDeque::new(),
            blocked: None,
            owe_req_retry: false,
            owe_front: false,
            received: Vec::new(),
            atomic_accesses: 0,
            functional_accesses: 0,
        }
    }

    /// Updates the memory's view of simulation time.
    pub fn advance_to(&mut self, now: Tick) {
        self.now = now;
    }

    /// Requests held, counting a response the relay refused.
    pub fn outstanding(&self) -> usize {
        self.pending.len() + usize::from(self.blocked.is_some())
    }

    fn has_room(&self) -> bool {
        self.outstanding() < self.max_outstanding
    }

    /// Time the next response may be released, if one can be.
    fn release_time(&self) -> Option<Tick> {
        if self.blocked.is_some() {
            return None;
        }
        let (front_ready, _) = self.pending.front()?;
        match (self.order, self.pending.get(1)) {
            (ResponseOrder::PairSwapped, Some((second_ready, _))) if !self.owe_front => {
                Some((*front_ready).max(*second_ready))
            }
            _ => Some(*front_ready),
        }
    }

    /// Removes the next completed response, if one is due and none is blocked.
    pub fn pop_ready_response(&mut self) -> Option<Packet> {
        if self.release_time()? > self.now {
            return None;
        }
        let swap = self.order == ResponseOrder::PairSwapped
            && !self.owe_front
            && self.pending.len() >= 2;
        let index = usize::from(swap);
        self.owe_front = swap;
        let (_, mut pkt) = self.pending.remove(index)?;
        pkt.make_response();
        trace!(%pkt, swapped = swap, "response ready");
        Some(pkt)
    }

    /// Keeps a response the relay refused until its retry signal arrives.
    pub fn hold_response(&mut self, pkt: Packet) {
        debug!(%pkt, "response refused; waiting for retry");
        self.blocked = Some(pkt);
    }

    /// Consumes an owed request retry if there is room to accept the resend.
    ///
    /// # Returns
    ///
    /// `true` if the caller must now deliver the retry signal to the relay.
    pub fn take_req_retry(&mut self) -> bool {
        if self.owe_req_retry && self.has_room() {
            self.owe_req_retry = false;
            return true;
        }
        false
    }

    /// Returns the earliest time the memory has something to do.
    pub fn next_wakeup(&self) -> Option<Tick> {
        let retry = (self.owe_req_retry && self.has_room()).then_some(self.now);
        match (self.release_time(), retry) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Returns `true` if nothing is pending or blocked.
    pub fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.blocked.is_none()
    }

    /// Ids of accepted timing requests, in arrival order.
    pub fn received_ids(&self) -> &[u64] {
        &self.received
    }

    /// Number of atomic accesses served.
    pub const fn atomic_accesses(&self) -> u64 {
        self.atomic_accesses
    }

    /// Number of functional accesses served.
    pub const fn functional_accesses(&self) -> u64 {
        self.functional_accesses
    }

    fn check_range(&self, pkt: &Packet) {
        if !self.range.contains(pkt.addr()) {
            warn!(%pkt, range = %self.range, "access outside served range");
        }
    }
}

impl Responder for TimingMemory {
    fn recv_timing_req(&mut self, pkt: Packet) -> Result<(), Packet> {
        if !self.has_room() {
            debug!(%pkt, outstanding = self.outstanding(), "memory full; refusing request");
            self.owe_req_retry = true;
            return Err(pkt);
        }
        self.check_range(&pkt);
        trace!(%pkt, "accepted request");
        self.received.push(pkt.id());
        self.pending.push_back((self.now + self.latency, pkt));
        Ok(())
    }

    fn recv_atomic(&mut self, pkt: &mut Packet) -> Tick {
        self.check_range(pkt);
        self.atomic_accesses += 1;
        pkt.make_response();
        self.latency
    }

    fn recv_functional(&mut self, pkt: &mut Packet) {
        self.check_range(pkt);
        self.functional_accesses += 1;
        pkt.make_response();
    }

    fn recv_resp_retry(&mut self, grant: RetryGrant<'_>) {
        let Some(pkt) = self.blocked.take() else {
            return;
        };
        trace!(%pkt, "resending refused response");
        if let Err(pkt) = grant.resend(pkt) {
            self.blocked = Some(pkt);
        }
    }

    fn addr_ranges(&self) -> Vec<AddrRange> {
        vec![self.range]
    }
}
