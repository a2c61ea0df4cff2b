//! Peer capability traits for relay links.
//!
//! The relay talks to its two neighbours only through these interfaces. It provides:
//! 1. **Requestor:** the near-side peer that issues requests and accepts responses.
//! 2. **Responder:** the far-side peer that accepts requests, produces responses, and
//!    owns the address ranges the relay reports upstream.
//! 3. **Retry grants:** a one-shot handle through which a retried peer resends at most
//!    one packet.
//!
//! A refused packet is returned by value in `Err`, so ownership always comes back to the
//! sender and a packet can never be duplicated or dropped by a refusal.

use std::fmt;

use crate::common::{AddrRange, Tick};

use super::packet::Packet;

/// Permission to resend one previously refused packet.
///
/// Handed to a peer when the relay signals retry. [`RetryGrant::resend`] consumes the
/// grant, so a peer can act on a retry signal at most once. Dropping the grant unused is
/// allowed and means the peer has nothing to resend.
pub struct RetryGrant<'a> {
    resend: &'a mut dyn FnMut(Packet) -> Result<(), Packet>,
}

impl<'a> RetryGrant<'a> {
    /// Wraps the receiving side's admission path.
    pub fn new(resend: &'a mut dyn FnMut(Packet) -> Result<(), Packet>) -> Self {
        Self { resend }
    }

    /// Offers `pkt` to the relay again.
    ///
    /// # Returns
    ///
    /// `Ok(())` if the relay took ownership, or the packet back if it was refused again.
    /// A second refusal re-arms the relay's retry obligation toward this peer.
    pub fn resend(self, pkt: Packet) -> Result<(), Packet> {
        let Self { resend } = self;
        resend(pkt)
    }
}

impl fmt::Debug for RetryGrant<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryGrant").finish_non_exhaustive()
    }
}

/// Near-side peer: sends requests into the relay and receives its responses.
pub trait Requestor {
    /// Offers a response.
    ///
    /// # Returns
    ///
    /// `Err` with the packet if the peer cannot take it now. The peer then owes the relay a
    /// retry signal once it can.
    fn recv_timing_resp(&mut self, pkt: Packet) -> Result<(), Packet>;

    /// Receives the relay's permission to resend a refused request.
    fn recv_req_retry(&mut self, grant: RetryGrant<'_>);

    /// Receives the address ranges reachable through the relay.
    fn recv_range_change(&mut self, _ranges: &[AddrRange]) {}
}

/// Far-side peer: receives requests from the relay and sends back responses.
pub trait Responder {
    /// Offers a request.
    ///
    /// # Returns
    ///
    /// `Err` with the packet if the peer cannot take it now. The peer then owes the relay a
    /// retry signal once it can.
    fn recv_timing_req(&mut self, pkt: Packet) -> Result<(), Packet>;

    /// Performs an untimed access and returns its latency in ticks.
    ///
    /// The packet is turned into its response in place.
    fn recv_atomic(&mut self, pkt: &mut Packet) -> Tick;

    /// Performs a debug access with no timing effect.
    fn recv_functional(&mut self, pkt: &mut Packet);

    /// Receives the relay's permission to resend a refused response.
    fn recv_resp_retry(&mut self, grant: RetryGrant<'_>);

    /// Returns the address ranges this peer serves.
    fn addr_ranges(&self) -> Vec<AddrRange>;
}
