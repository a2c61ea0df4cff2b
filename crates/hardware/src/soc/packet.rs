//! Packets exchanged across relay links.
//!
//! A packet is an opaque memory transaction with a direction and a single attachment slot
//! for a [`SequenceTag`]. Packets are deliberately not `Clone`: a packet is owned by exactly
//! one component at a time, moves into a peer on a successful send, and comes back by value
//! when a send is refused.

use std::fmt;

use crate::common::Addr;

/// Whether a packet travels toward the far side or back toward the near side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Travels near side to far side.
    Request,
    /// Travels far side to near side.
    Response,
}

/// Kind of memory access a packet represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccessKind {
    /// A load.
    Read,
    /// A store.
    Write,
}

/// Ordering tag attached to a request when it leaves inspection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SequenceTag {
    /// Position of the request in the relay's forwarding order.
    pub sequence_number: u64,
}

impl SequenceTag {
    /// Creates a tag carrying `sequence_number`.
    pub const fn new(sequence_number: u64) -> Self {
        Self { sequence_number }
    }
}

/// A memory transaction in flight.
#[derive(Debug, PartialEq, Eq)]
pub struct Packet {
    id: u64,
    kind: AccessKind,
    addr: Addr,
    size: u32,
    direction: Direction,
    tag: Option<SequenceTag>,
}

impl Packet {
    /// Creates a request packet with an empty tag slot.
    ///
    /// # Arguments
    ///
    /// * `id` - Identifier chosen by the issuer; the relay never interprets it.
    /// * `kind` - Read or write.
    /// * `addr` - Target address.
    /// * `size` - Access size in bytes.
    pub const fn request(id: u64, kind: AccessKind, addr: Addr, size: u32) -> Self {
        Self {
            id,
            kind,
            addr,
            size,
            direction: Direction::Request,
            tag: None,
        }
    }

    /// Creates a read request.
    pub const fn read(id: u64, addr: Addr, size: u32) -> Self {
        Self::request(id, AccessKind::Read, addr, size)
    }

    /// Creates a write request.
    pub const fn write(id: u64, addr: Addr, size: u32) -> Self {
        Self::request(id, AccessKind::Write, addr, size)
    }

    /// Returns the issuer-assigned identifier.
    #[inline]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Returns the access kind.
    #[inline]
    pub const fn kind(&self) -> AccessKind {
        self.kind
    }

    /// Returns the target address.
    #[inline]
    pub const fn addr(&self) -> Addr {
        self.addr
    }

    /// Returns the access size in bytes.
    #[inline]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Returns the packet's direction.
    #[inline]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Returns `true` if the packet is travelling toward the far side.
    #[inline]
    pub fn is_request(&self) -> bool {
        self.direction == Direction::Request
    }

    /// Returns `true` if the packet is travelling back toward the near side.
    #[inline]
    pub fn is_response(&self) -> bool {
        self.direction == Direction::Response
    }

    /// Turns a request into its response in place; the tag slot is preserved.
    pub fn make_response(&mut self) {
        self.direction = Direction::Response;
    }

    /// Returns the attached tag, if any.
    #[inline]
    pub const fn tag(&self) -> Option<SequenceTag> {
        self.tag
    }

    /// Attaches `tag` to the empty slot.
    ///
    /// # Returns
    ///
    /// `Err` with the tag already attached if the slot is occupied; the packet is unchanged.
    pub fn push_tag(&mut self, tag: SequenceTag) -> Result<(), SequenceTag> {
        match self.tag {
            Some(existing) => Err(existing),
            None => {
                self.tag = Some(tag);
                Ok(())
            }
        }
    }

    /// Detaches and returns the tag, leaving the slot empty.
    pub fn pop_tag(&mut self) -> Option<SequenceTag> {
        self.tag.take()
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cmd = match (self.kind, self.direction) {
            (AccessKind::Read, Direction::Request) => "ReadReq",
            (AccessKind::Write, Direction::Request) => "WriteReq",
            (AccessKind::Read, Direction::Response) => "ReadResp",
            (AccessKind::Write, Direction::Response) => "WriteResp",
        };
        let last = self.addr + u64::from(self.size.max(1)) - 1;
        write!(f, "{cmd} [{:x}:{last:x}] id {}", self.addr, self.id)
    }
}
