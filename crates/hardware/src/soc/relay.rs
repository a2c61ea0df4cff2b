//! Buffered request/response relay.
//!
//! The [`InspectorGadget`] sits between a near-side [`Requestor`] and a far-side
//! [`Responder`] and forwards traffic through three latency-gated buffers:
//!
//! ```text
//!  near side                                                     far side
//!  ─ req ─▶ [inspection] ──tag──▶ [output] ──────────────────────▶ ─ req ─▶
//!  ◀─ resp ─────────────────untag── [response] ◀─────────────────── ◀─ resp ─
//! ```
//!
//! It provides:
//! 1. **Admission:** requests and responses are refused when their buffer is full, and the
//!    refused peer is owed a retry signal.
//! 2. **Five scheduled actions:** inspection, request send, request retry, response send,
//!    and response retry. Each re-arms the others it may have unblocked.
//! 3. **Reorder detection:** requests are tagged as they leave inspection; responses are
//!    untagged and checked as they leave the response buffer.
//!
//! Every schedule helper is idempotent: it does nothing if its event is already pending,
//! and otherwise picks the earliest clock edge at which the action can succeed,
//! `align(max(when, first_ready_time))`. The relay therefore never polls and never has two
//! instances of the same action pending.
//!
//! Precondition violations surface as [`ProtocolFault`]s and are detected before any
//! buffer is touched.

use std::fmt;

use tracing::{debug, trace};

use crate::common::{AddrRange, BufferKind, ConfigError, PortKind, ProtocolFault, Tick};
use crate::config::RelayConfig;
use crate::sim::clock::ClockDomain;
use crate::sim::event::{RelayEvent, Scheduler};
use crate::stats::RelayStats;

use super::packet::Packet;
use super::port::{InboundPort, OutboundPort};
use super::tagger::{SequenceTagger, TagCheck};
use super::timed_queue::TimedQueue;
use super::traits::{Requestor, Responder, RetryGrant};

/// Collaborators a relay needs for one call: time and scheduling, and both peers.
///
/// Built fresh by the driver for each call into the relay, so the relay never stores a
/// reference to anything it does not own.
pub struct RelayContext<'a> {
    /// Clock and event sink.
    pub queue: &'a mut dyn Scheduler,
    /// Near-side peer.
    pub cpu_side: &'a mut dyn Requestor,
    /// Far-side peer.
    pub mem_side: &'a mut dyn Responder,
}

impl fmt::Debug for RelayContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayContext")
            .field("now", &self.queue.now())
            .finish_non_exhaustive()
    }
}

/// Clocked relay with finite buffering and retry-based flow control.
#[derive(Debug)]
pub struct InspectorGadget {
    name: String,
    clock: ClockDomain,

    cpu_side_port: InboundPort,
    mem_side_port: OutboundPort,

    inspection_buffer_entries: usize,
    inspection_buffer: TimedQueue<Packet>,

    output_buffer_entries: usize,
    output_buffer: TimedQueue<Packet>,

    response_buffer_entries: usize,
    response_buffer: TimedQueue<Packet>,

    tagger: SequenceTagger,
    stats: RelayStats,
}

impl InspectorGadget {
    /// Creates a relay from a validated configuration.
    ///
    /// # Arguments
    ///
    /// * `name` - Instance name used in traces and stat prefixes.
    /// * `config` - Clock period, buffer capacities, and buffer latencies.
    ///
    /// # Returns
    ///
    /// The relay, or the first configuration problem found.
    pub fn new(name: impl Into<String>, config: &RelayConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let clock = ClockDomain::new(config.clock_period);
        Ok(Self {
            name: name.into(),
            clock,
            cpu_side_port: InboundPort::new(),
            mem_side_port: OutboundPort::new(),
            inspection_buffer_entries: config.inspection_buffer_entries,
            inspection_buffer: TimedQueue::new(clock.ticks(config.inspection_latency)),
            output_buffer_entries: config.output_buffer_entries,
            output_buffer: TimedQueue::new(clock.period()),
            response_buffer_entries: config.response_buffer_entries,
            response_buffer: TimedQueue::new(clock.ticks(config.response_latency)),
            tagger: SequenceTagger::new(),
            stats: RelayStats::default(),
        })
    }

    /// Returns the instance name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the relay's clock.
    pub const fn clock(&self) -> ClockDomain {
        self.clock
    }

    /// Returns the relay's counters.
    pub const fn stats(&self) -> &RelayStats {
        &self.stats
    }

    /// Returns the sequence tagger.
    pub const fn tagger(&self) -> &SequenceTagger {
        &self.tagger
    }

    /// Returns the near-side endpoint state.
    pub const fn cpu_side_port(&self) -> &InboundPort {
        &self.cpu_side_port
    }

    /// Returns the far-side endpoint state.
    pub const fn mem_side_port(&self) -> &OutboundPort {
        &self.mem_side_port
    }

    /// Returns the inspection buffer.
    pub const fn inspection_buffer(&self) -> &TimedQueue<Packet> {
        &self.inspection_buffer
    }

    /// Returns the output buffer.
    pub const fn output_buffer(&self) -> &TimedQueue<Packet> {
        &self.output_buffer
    }

    /// Returns the response buffer.
    pub const fn response_buffer(&self) -> &TimedQueue<Packet> {
        &self.response_buffer
    }

    /// Returns the configured capacity of `buffer`.
    pub const fn capacity(&self, buffer: BufferKind) -> usize {
        match buffer {
            BufferKind::Inspection => self.inspection_buffer_entries,
            BufferKind::Output => self.output_buffer_entries,
            BufferKind::Response => self.response_buffer_entries,
        }
    }

    /// Returns `true` if no packet is buffered or held at either endpoint.
    pub fn is_idle(&self) -> bool {
        self.inspection_buffer.is_empty()
            && self.output_buffer.is_empty()
            && self.response_buffer.is_empty()
            && !self.cpu_side_port.blocked()
            && !self.mem_side_port.blocked()
    }

    /// Announces the far side's address ranges to the near side.
    pub fn init(&self, ctx: &mut RelayContext<'_>) {
        let ranges = self.addr_ranges(&*ctx.mem_side);
        debug!(relay = %self.name, count = ranges.len(), "sending range change");
        ctx.cpu_side.recv_range_change(&ranges);
    }

    /// Returns the address ranges reachable through the relay: the far side's, unchanged.
    pub fn addr_ranges(&self, mem_side: &dyn Responder) -> Vec<AddrRange> {
        mem_side.addr_ranges()
    }

    // ══════════════════════════════════════════════════════════
    // Near-side entry points
    // ══════════════════════════════════════════════════════════

    /// Offers a request from the near side.
    ///
    /// # Returns
    ///
    /// `Err` with the packet if the inspection buffer is full. The relay then owes the near
    /// side a retry signal, which it issues once an inspection frees an entry. The caller
    /// must wait for that signal rather than retrying on its own.
    pub fn recv_timing_req(
        &mut self,
        pkt: Packet,
        ctx: &mut RelayContext<'_>,
    ) -> Result<(), Packet> {
        self.cpu_side_recv_timing_req(pkt, &mut *ctx.queue)
    }

    /// Forwards an atomic access straight to the far side.
    ///
    /// # Returns
    ///
    /// One clock period plus the far side's reported latency.
    pub fn recv_atomic(&mut self, pkt: &mut Packet, ctx: &mut RelayContext<'_>) -> Tick {
        trace!(relay = %self.name, %pkt, "received pkt in atomic mode");
        self.clock.period() + ctx.mem_side.recv_atomic(pkt)
    }

    /// Forwards a functional access straight to the far side with no timing effect.
    pub fn recv_functional(&mut self, pkt: &mut Packet, ctx: &mut RelayContext<'_>) {
        trace!(relay = %self.name, %pkt, "received pkt in functional mode");
        ctx.mem_side.recv_functional(pkt);
    }

    /// Handles the near side's signal that it can accept a previously refused response.
    pub fn recv_resp_retry(&mut self, ctx: &mut RelayContext<'_>) -> Result<(), ProtocolFault> {
        let delivered = self.cpu_side_port.recv_retry(&mut *ctx.cpu_side)?;
        if delivered {
            let next = self.clock.next_cycle(ctx.queue.now());
            self.schedule_next_resp_send_event(&mut *ctx.queue, next);
        }
        Ok(())
    }

    // ══════════════════════════════════════════════════════════
    // Far-side entry points
    // ══════════════════════════════════════════════════════════

    /// Offers a response from the far side.
    ///
    /// # Returns
    ///
    /// `Err` with the packet if the response buffer is full; the far side is then owed a
    /// retry signal.
    pub fn recv_timing_resp(
        &mut self,
        pkt: Packet,
        ctx: &mut RelayContext<'_>,
    ) -> Result<(), Packet> {
        self.mem_side_recv_timing_resp(pkt, &mut *ctx.queue)
    }

    /// Handles the far side's signal that it can accept a previously refused request.
    pub fn recv_req_retry(&mut self, ctx: &mut RelayContext<'_>) -> Result<(), ProtocolFault> {
        let delivered = self.mem_side_port.recv_retry(&mut *ctx.mem_side)?;
        if delivered {
            let next = self.clock.next_cycle(ctx.queue.now());
            self.schedule_next_req_send_event(&mut *ctx.queue, next);
        }
        Ok(())
    }

    // ══════════════════════════════════════════════════════════
    // Scheduled actions
    // ══════════════════════════════════════════════════════════

    /// Runs the action for a delivered event.
    pub fn process(
        &mut self,
        event: RelayEvent,
        ctx: &mut RelayContext<'_>,
    ) -> Result<(), ProtocolFault> {
        trace!(relay = %self.name, %event, now = ctx.queue.now(), "processing event");
        match event {
            RelayEvent::Inspection => self.process_next_inspection_event(ctx),
            RelayEvent::ReqSend => self.process_next_req_send_event(ctx),
            RelayEvent::ReqRetry => self.process_next_req_retry_event(ctx),
            RelayEvent::RespSend => self.process_next_resp_send_event(ctx),
            RelayEvent::RespRetry => self.process_next_resp_retry_event(ctx),
        }
    }

    fn cpu_side_recv_timing_req(
        &mut self,
        pkt: Packet,
        queue: &mut dyn Scheduler,
    ) -> Result<(), Packet> {
        trace!(relay = %self.name, %pkt, "received pkt in timing mode");
        self.admit_request(pkt, queue).map_err(|pkt| {
            self.cpu_side_port.refuse(&pkt);
            pkt
        })
    }

    fn admit_request(&mut self, pkt: Packet, queue: &mut dyn Scheduler) -> Result<(), Packet> {
        if self.inspection_buffer.len() >= self.inspection_buffer_entries {
            return Err(pkt);
        }
        let now = queue.now();
        self.inspection_buffer.push(pkt, now);
        self.schedule_next_inspection_event(queue, self.clock.next_cycle(now));
        Ok(())
    }

    fn mem_side_recv_timing_resp(
        &mut self,
        pkt: Packet,
        queue: &mut dyn Scheduler,
    ) -> Result<(), Packet> {
        trace!(relay = %self.name, %pkt, "received pkt in timing mode");
        self.admit_response(pkt, queue).map_err(|pkt| {
            self.mem_side_port.refuse(&pkt);
            pkt
        })
    }

    fn admit_response(&mut self, pkt: Packet, queue: &mut dyn Scheduler) -> Result<(), Packet> {
        if self.response_buffer.len() >= self.response_buffer_entries {
            return Err(pkt);
        }
        let now = queue.now();
        self.response_buffer.push(pkt, now);
        self.schedule_next_resp_send_event(queue, self.clock.next_cycle(now));
        Ok(())
    }

    fn process_next_inspection_event(
        &mut self,
        ctx: &mut RelayContext<'_>,
    ) -> Result<(), ProtocolFault> {
        let nothing_ready = ProtocolFault::NothingReady {
            buffer: BufferKind::Inspection,
        };
        let now = ctx.queue.now();
        if !self.inspection_buffer.has_ready(now) {
            return Err(nothing_ready);
        }
        if self.output_buffer.len() >= self.output_buffer_entries {
            return Err(ProtocolFault::NoOutputCapacity);
        }

        let Some((front, inserted)) = self.inspection_buffer.front_entry_mut() else {
            return Err(nothing_ready);
        };
        let seq = self.tagger.tag_request(front)?;
        let Some(pkt) = self.inspection_buffer.pop() else {
            return Err(nothing_ready);
        };

        self.stats.total_inspection_buffer_latency += now - inserted;
        self.stats.num_requests_inspected += 1;
        trace!(relay = %self.name, %pkt, seq, "inspected request");
        self.output_buffer.push(pkt, now);

        let next = self.clock.next_cycle(now);
        self.schedule_next_req_send_event(&mut *ctx.queue, next);
        self.schedule_next_req_retry_event(&mut *ctx.queue, next);
        self.schedule_next_inspection_event(&mut *ctx.queue, next);
        Ok(())
    }

    fn schedule_next_inspection_event(&self, queue: &mut dyn Scheduler, when: Tick) {
        let have_entry = self.output_buffer.len() < self.output_buffer_entries;
        let Some(ready) = self.inspection_buffer.first_ready_time() else {
            return;
        };
        if have_entry && !queue.is_scheduled(RelayEvent::Inspection) {
            let schedule_time = self.clock.align(when.max(ready));
            queue.schedule(RelayEvent::Inspection, schedule_time);
        }
    }

    fn process_next_req_send_event(
        &mut self,
        ctx: &mut RelayContext<'_>,
    ) -> Result<(), ProtocolFault> {
        let now = ctx.queue.now();
        if self.mem_side_port.blocked() {
            return Err(ProtocolFault::SendWhileBlocked {
                port: PortKind::MemSide,
            });
        }
        let nothing_ready = ProtocolFault::NothingReady {
            buffer: BufferKind::Output,
        };
        if !self.output_buffer.has_ready(now) {
            return Err(nothing_ready);
        }
        let Some(pkt) = self.output_buffer.pop() else {
            return Err(nothing_ready);
        };

        self.stats.num_requests_fwded += 1;
        let delivered = self.mem_side_port.send_packet(pkt, &mut *ctx.mem_side)?;
        trace!(relay = %self.name, delivered, "forwarded request");

        let next = self.clock.next_cycle(now);
        self.schedule_next_inspection_event(&mut *ctx.queue, next);
        self.schedule_next_req_send_event(&mut *ctx.queue, next);
        Ok(())
    }

    fn schedule_next_req_send_event(&self, queue: &mut dyn Scheduler, when: Tick) {
        let port_avail = !self.mem_side_port.blocked();
        let Some(ready) = self.output_buffer.first_ready_time() else {
            return;
        };
        if port_avail && !queue.is_scheduled(RelayEvent::ReqSend) {
            let schedule_time = self.clock.align(when.max(ready));
            queue.schedule(RelayEvent::ReqSend, schedule_time);
        }
    }

    fn process_next_req_retry_event(
        &mut self,
        ctx: &mut RelayContext<'_>,
    ) -> Result<(), ProtocolFault> {
        self.cpu_side_port.begin_retry()?;
        let queue: &mut dyn Scheduler = &mut *ctx.queue;
        let mut resend = |pkt: Packet| self.cpu_side_recv_timing_req(pkt, &mut *queue);
        ctx.cpu_side.recv_req_retry(RetryGrant::new(&mut resend));
        Ok(())
    }

    fn schedule_next_req_retry_event(&self, queue: &mut dyn Scheduler, when: Tick) {
        if self.cpu_side_port.needs_retry() && !queue.is_scheduled(RelayEvent::ReqRetry) {
            queue.schedule(RelayEvent::ReqRetry, self.clock.align(when));
        }
    }

    fn process_next_resp_send_event(
        &mut self,
        ctx: &mut RelayContext<'_>,
    ) -> Result<(), ProtocolFault> {
        let now = ctx.queue.now();
        if self.cpu_side_port.blocked() {
            return Err(ProtocolFault::SendWhileBlocked {
                port: PortKind::CpuSide,
            });
        }
        let nothing_ready = ProtocolFault::NothingReady {
            buffer: BufferKind::Response,
        };
        if !self.response_buffer.has_ready(now) {
            return Err(nothing_ready);
        }

        let Some((front, inserted)) = self.response_buffer.front_entry_mut() else {
            return Err(nothing_ready);
        };
        if let TagCheck::Displaced { expected, found } = self.tagger.untag_response(front)? {
            self.stats.num_req_resp_displacements += 1;
            debug!(relay = %self.name, expected, found, "request/response displacement");
        }
        let Some(pkt) = self.response_buffer.pop() else {
            return Err(nothing_ready);
        };

        self.stats.num_responses_fwded += 1;
        self.stats.total_response_buffer_latency += now - inserted;
        let delivered = self.cpu_side_port.send_packet(pkt, &mut *ctx.cpu_side)?;
        trace!(relay = %self.name, delivered, "forwarded response");

        let next = self.clock.next_cycle(now);
        self.schedule_next_resp_retry_event(&mut *ctx.queue, next);
        self.schedule_next_resp_send_event(&mut *ctx.queue, next);
        Ok(())
    }

    fn schedule_next_resp_send_event(&self, queue: &mut dyn Scheduler, when: Tick) {
        let port_avail = !self.cpu_side_port.blocked();
        let Some(ready) = self.response_buffer.first_ready_time() else {
            return;
        };
        if port_avail && !queue.is_scheduled(RelayEvent::RespSend) {
            let schedule_time = self.clock.align(when.max(ready));
            queue.schedule(RelayEvent::RespSend, schedule_time);
        }
    }

    fn process_next_resp_retry_event(
        &mut self,
        ctx: &mut RelayContext<'_>,
    ) -> Result<(), ProtocolFault> {
        self.mem_side_port.begin_retry()?;
        let queue: &mut dyn Scheduler = &mut *ctx.queue;
        let mut resend = |pkt: Packet| self.mem_side_recv_timing_resp(pkt, &mut *queue);
        ctx.mem_side.recv_resp_retry(RetryGrant::new(&mut resend));
        Ok(())
    }

    fn schedule_next_resp_retry_event(&self, queue: &mut dyn Scheduler, when: Tick) {
        if self.mem_side_port.needs_retry() && !queue.is_scheduled(RelayEvent::RespRetry) {
            queue.schedule(RelayEvent::RespRetry, self.clock.align(when));
        }
    }
}
