//! Relay link endpoints.
//!
//! Each endpoint keeps the two pieces of block/retry bookkeeping for its link:
//! 1. **Blocked packet:** a packet this endpoint tried to send and the peer refused. While
//!    it is held the endpoint must not be asked to send again; the peer's retry signal
//!    triggers exactly one resend attempt.
//! 2. **Needs retry:** set when this endpoint refused the peer's packet; cleared when the
//!    relay issues the retry signal that lets the peer try again.

use tracing::{debug, trace};

use crate::common::{PortKind, ProtocolFault};

use super::packet::Packet;
use super::traits::{Requestor, Responder};

/// Block/retry state shared by both endpoint kinds.
#[derive(Debug)]
struct LinkState {
    kind: PortKind,
    needs_retry: bool,
    blocked_packet: Option<Packet>,
}

impl LinkState {
    const fn new(kind: PortKind) -> Self {
        Self {
            kind,
            needs_retry: false,
            blocked_packet: None,
        }
    }

    fn check_unblocked(&self) -> Result<(), ProtocolFault> {
        if self.blocked_packet.is_some() {
            return Err(ProtocolFault::SendWhileBlocked { port: self.kind });
        }
        Ok(())
    }

    fn hold(&mut self, pkt: Packet) {
        debug!(port = %self.kind, %pkt, "failed to send pkt; holding until retry");
        self.blocked_packet = Some(pkt);
    }

    fn take_blocked(&mut self) -> Result<Packet, ProtocolFault> {
        let pkt = self
            .blocked_packet
            .take()
            .ok_or(ProtocolFault::RetryWhileUnblocked { port: self.kind })?;
        debug!(port = %self.kind, "received retry signal");
        Ok(pkt)
    }

    fn begin_retry(&mut self) -> Result<(), ProtocolFault> {
        if !self.needs_retry {
            return Err(ProtocolFault::RetryNotNeeded { port: self.kind });
        }
        self.needs_retry = false;
        debug!(port = %self.kind, "sending retry signal");
        Ok(())
    }
}

/// Near-side endpoint: receives requests from the [`Requestor`] and sends it responses.
#[derive(Debug)]
pub struct InboundPort {
    link: LinkState,
}

impl Default for InboundPort {
    fn default() -> Self {
        Self::new()
    }
}

impl InboundPort {
    /// Creates an idle endpoint.
    pub const fn new() -> Self {
        Self {
            link: LinkState::new(PortKind::CpuSide),
        }
    }

    /// Returns `true` if a refused request is owed a retry signal.
    #[inline]
    pub const fn needs_retry(&self) -> bool {
        self.link.needs_retry
    }

    /// Returns `true` if a refused response is being held.
    #[inline]
    pub const fn blocked(&self) -> bool {
        self.link.blocked_packet.is_some()
    }

    /// Records that a request from the peer was refused.
    pub fn refuse(&mut self, pkt: &Packet) {
        trace!(port = %self.link.kind, %pkt, "refused request; retry owed");
        self.link.needs_retry = true;
    }

    /// Clears the retry obligation ahead of signalling the peer.
    ///
    /// Fails if no retry is owed.
    pub fn begin_retry(&mut self) -> Result<(), ProtocolFault> {
        self.link.begin_retry()
    }

    /// Sends a response to the peer, holding it if refused.
    ///
    /// # Returns
    ///
    /// `Ok(true)` if delivered, `Ok(false)` if the peer refused and the endpoint is now
    /// blocked, or a fault if the endpoint was already blocked.
    pub fn send_packet(
        &mut self,
        pkt: Packet,
        peer: &mut dyn Requestor,
    ) -> Result<bool, ProtocolFault> {
        self.link.check_unblocked()?;
        trace!(port = %self.link.kind, %pkt, "sending pkt");
        match peer.recv_timing_resp(pkt) {
            Ok(()) => Ok(true),
            Err(pkt) => {
                self.link.hold(pkt);
                Ok(false)
            }
        }
    }

    /// Handles the peer's retry signal by resending the held response once.
    ///
    /// # Returns
    ///
    /// `Ok(true)` if the held response was delivered and the endpoint is free again.
    pub fn recv_retry(&mut self, peer: &mut dyn Requestor) -> Result<bool, ProtocolFault> {
        let pkt = self.link.take_blocked()?;
        self.send_packet(pkt, peer)
    }
}

/// Far-side endpoint: sends requests to the [`Responder`] and receives its responses.
#[derive(Debug)]
pub struct OutboundPort {
    link: LinkState,
}

impl Default for OutboundPort {
    fn default() -> Self {
        Self::new()
    }
}

impl OutboundPort {
    /// Creates an idle endpoint.
    pub const fn new() -> Self {
        Self {
            link: LinkState::new(PortKind::MemSide),
        }
    }

    /// Returns `true` if a refused response is owed a retry signal.
    #[inline]
    pub const fn needs_retry(&self) -> bool {
        self.link.needs_retry
    }

    /// Returns `true` if a refused request is being held.
    #[inline]
    pub const fn blocked(&self) -> bool {
        self.link.blocked_packet.is_some()
    }

    /// Records that a response from the peer was refused.
    pub fn refuse(&mut self, pkt: &Packet) {
        trace!(port = %self.link.kind, %pkt, "refused response; retry owed");
        self.link.needs_retry = true;
    }

    /// Clears the retry obligation ahead of signalling the peer.
    pub fn begin_retry(&mut self) -> Result<(), ProtocolFault> {
        self.link.begin_retry()
    }

    /// Sends a request to the peer, holding it if refused.
    pub fn send_packet(
        &mut self,
        pkt: Packet,
        peer: &mut dyn Responder,
    ) -> Result<bool, ProtocolFault> {
        self.link.check_unblocked()?;
        trace!(port = %self.link.kind, %pkt, "sending pkt");
        match peer.recv_timing_req(pkt) {
            Ok(()) => Ok(true),
            Err(pkt) => {
                self.link.hold(pkt);
                Ok(false)
            }
        }
    }

    /// Handles the peer's retry signal by resending the held request once.
    pub fn recv_retry(&mut self, peer: &mut dyn Responder) -> Result<bool, ProtocolFault> {
        let pkt = self.link.take_blocked()?;
        self.send_packet(pkt, peer)
    }
}
