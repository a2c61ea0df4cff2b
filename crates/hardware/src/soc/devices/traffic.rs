//! Near-side traffic generator.
//!
//! Issues a fixed number of requests with a linear address pattern and consumes the
//! responses. It provides:
//! 1. **Issue pacing:** one request per configured interval, stalled while a refused
//!    request waits for the relay's retry signal.
//! 2. **Response backpressure:** optionally refuses every n-th response delivery and
//!    signals retry a configurable delay later, so the relay's near-side endpoint gets
//!    exercised in both directions.
//! 3. **Range discovery:** keeps the address ranges announced by the relay.

use tracing::{debug, trace, warn};

use crate::common::{AddrRange, Tick};
use crate::config::TrafficConfig;
use crate::sim::clock::ClockDomain;
use crate::soc::packet::Packet;
use crate::soc::traits::{Requestor, RetryGrant};

/// Request source on the near side of a relay.
#[derive(Debug)]
pub struct TrafficGenerator {
    config: TrafficConfig,
    clock: ClockDomain,
    now: Tick,

    issued: u64,
    next_issue_at: Tick,
    held: Option<Packet>,

    delivery_attempts: u64,
    resp_retry_due: Option<Tick>,
    received: Vec<u64>,
    ranges: Vec<AddrRange>,
}

impl TrafficGenerator {
    /// Creates a generator that issues its first request at tick 0.
    ///
    /// # Arguments
    ///
    /// * `config` - Request count, pacing, address pattern, and response refusal policy.
    /// * `clock` - Clock used to convert cycle settings to ticks.
    pub fn new(config: &TrafficConfig, clock: ClockDomain) -> Self {
        Self {
            config: config.clone(),
            clock,
            now: 0,
            issued: 0,
            next_issue_at: 0,
            held: None,
            delivery_attempts: 0,
            resp_retry_due: None,
            received: Vec::new(),
            ranges: Vec::new(),
        }
    }

    /// Updates the generator's view of simulation time.
    pub fn advance_to(&mut self, now: Tick) {
        self.now = now;
    }

    /// Returns the next request if one is due.
    ///
    /// Nothing is issued while a refused request is held, or once every request has been
    /// issued.
    pub fn next_request(&mut self) -> Option<Packet> {
        if self.held.is_some()
            || self.issued >= self.config.num_requests
            || self.now < self.next_issue_at
        {
            return None;
        }
        let id = self.issued;
        let addr = self
            .config
            .base_addr
            .wrapping_add(id.wrapping_mul(self.config.stride));
        let is_write = self.config.write_every != 0 && (id + 1) % self.config.write_every == 0;
        let pkt = if is_write {
            Packet::write(id, addr, self.config.size)
        } else {
            Packet::read(id, addr, self.config.size)
        };
        self.issued += 1;
        self.next_issue_at = self.now + self.clock.ticks(self.config.interval);
        trace!(%pkt, "issuing request");
        Some(pkt)
    }

    /// Keeps a request the relay refused until its retry signal arrives.
    pub fn hold(&mut self, pkt: Packet) {
        debug!(%pkt, "request refused; waiting for retry");
        self.held = Some(pkt);
    }

    /// Consumes an owed response retry if it is due.
    ///
    /// # Returns
    ///
    /// `true` if the caller must now deliver the retry signal to the relay.
    pub fn take_resp_retry(&mut self) -> bool {
        match self.resp_retry_due {
            Some(due) if due <= self.now => {
                self.resp_retry_due = None;
                true
            }
            _ => false,
        }
    }

    /// Returns the earliest time the generator has something to do.
    pub fn next_wakeup(&self) -> Option<Tick> {
        let issue = (self.held.is_none() && self.issued < self.config.num_requests)
            .then_some(self.next_issue_at);
        match (issue, self.resp_retry_due) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Returns `true` once every request has been issued and answered.
    pub fn is_done(&self) -> bool {
        self.held.is_none()
            && self.issued == self.config.num_requests
            && self.received.len() as u64 == self.config.num_requests
    }

    /// Number of requests issued so far.
    pub const fn issued(&self) -> u64 {
        self.issued
    }

    /// Ids of received responses, in arrival order.
    pub fn received_ids(&self) -> &[u64] {
        &self.received
    }

    /// Address ranges last announced by the relay.
    pub fn ranges(&self) -> &[AddrRange] {
        &self.ranges
    }
}

impl Requestor for TrafficGenerator {
    fn recv_timing_resp(&mut self, pkt: Packet) -> Result<(), Packet> {
        self.delivery_attempts += 1;
        let every = self.config.reject_response_every;
        if every != 0 && self.delivery_attempts % every == 0 {
            let due = self.now + self.clock.ticks(self.config.retry_delay);
            debug!(%pkt, due, "refusing response");
            self.resp_retry_due = Some(due);
            return Err(pkt);
        }
        if !pkt.is_response() {
            warn!(%pkt, "received a request on the response path");
        }
        trace!(%pkt, "received response");
        self.received.push(pkt.id());
        Ok(())
    }

    fn recv_req_retry(&mut self, grant: RetryGrant<'_>) {
        let Some(pkt) = self.held.take() else {
            return;
        };
        trace!(%pkt, "resending refused request");
        if let Err(pkt) = grant.resend(pkt) {
            self.held = Some(pkt);
        }
    }

    fn recv_range_change(&mut self, ranges: &[AddrRange]) {
        debug!(count = ranges.len(), "address ranges updated");
        self.ranges = ranges.to_vec();
    }
}
