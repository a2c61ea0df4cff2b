//! Sequence tagging for reorder detection.
//!
//! Requests are tagged with consecutive sequence numbers as they leave inspection. When
//! the matching response leaves the response buffer its tag is removed and compared with
//! the number the relay expects next. A mismatch is a displacement: it is reported to the
//! caller for counting and never stops processing.
//!
//! Detection is per response. When the k-th and (k+1)-th responses swap places, both of
//! them miss their expected number, so one swapped pair counts as two displacements.

use crate::common::ProtocolFault;

use super::packet::{Packet, SequenceTag};

/// Outcome of validating a returning response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagCheck {
    /// The response carried the expected sequence number.
    InOrder,
    /// The response carried some other sequence number.
    Displaced {
        /// The number the relay expected.
        expected: u64,
        /// The number the response carried.
        found: u64,
    },
}

/// Issues and validates sequence tags.
#[derive(Debug, Default)]
pub struct SequenceTagger {
    next_available_seq_num: u64,
    next_expected_seq_num: u64,
}

impl SequenceTagger {
    /// Creates a tagger whose first tag is 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sequence number the next tagged request will carry.
    pub const fn next_available(&self) -> u64 {
        self.next_available_seq_num
    }

    /// Sequence number the next validated response is expected to carry.
    pub const fn next_expected(&self) -> u64 {
        self.next_expected_seq_num
    }

    /// Number of tags issued whose responses have not been validated yet.
    pub const fn outstanding(&self) -> u64 {
        self.next_available_seq_num
            .saturating_sub(self.next_expected_seq_num)
    }

    /// Attaches the next sequence tag to a request.
    ///
    /// # Arguments
    ///
    /// * `pkt` - The request leaving inspection.
    ///
    /// # Returns
    ///
    /// The sequence number attached. The packet and the tagger are untouched on error.
    pub fn tag_request(&mut self, pkt: &mut Packet) -> Result<u64, ProtocolFault> {
        if !pkt.is_request() {
            return Err(ProtocolFault::WrongDirection {
                id: pkt.id(),
                expected: "request",
            });
        }
        let seq = self.next_available_seq_num;
        pkt.push_tag(SequenceTag::new(seq))
            .map_err(|_| ProtocolFault::TagOccupied { id: pkt.id() })?;
        self.next_available_seq_num += 1;
        Ok(seq)
    }

    /// Removes the tag from a response and checks it against the expected order.
    ///
    /// The expected number advances whether or not the response was displaced.
    ///
    /// # Returns
    ///
    /// Whether the response was in order. Untagged responses and requests are faults.
    pub fn untag_response(&mut self, pkt: &mut Packet) -> Result<TagCheck, ProtocolFault> {
        if !pkt.is_response() {
            return Err(ProtocolFault::WrongDirection {
                id: pkt.id(),
                expected: "response",
            });
        }
        let tag = pkt
            .pop_tag()
            .ok_or(ProtocolFault::MissingTag { id: pkt.id() })?;
        let expected = self.next_expected_seq_num;
        self.next_expected_seq_num += 1;
        if tag.sequence_number == expected {
            Ok(TagCheck::InOrder)
        } else {
            Ok(TagCheck::Displaced {
                expected,
                found: tag.sequence_number,
            })
        }
    }
}
