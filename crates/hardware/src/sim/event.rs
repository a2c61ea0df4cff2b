//! Relay event identifiers and the scheduler interface.
//!
//! The relay never holds callbacks. Each of its five scheduled actions is a plain
//! [`RelayEvent`] value submitted to whatever implements [`Scheduler`]; the driver hands
//! the value back to [`InspectorGadget::process`](crate::soc::relay::InspectorGadget::process)
//! when its time comes. Any queue honouring monotonic time and single delivery per
//! scheduled event can drive the relay, which keeps tests free of a real simulator.

use std::fmt;

use crate::common::Tick;

/// One of the relay's five self-scheduled actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RelayEvent {
    /// Move the oldest ready request from the inspection buffer to the output buffer.
    Inspection,
    /// Send the oldest ready request from the output buffer to the far side.
    ReqSend,
    /// Tell the near side it may resend a refused request.
    ReqRetry,
    /// Send the oldest ready response from the response buffer to the near side.
    RespSend,
    /// Tell the far side it may resend a refused response.
    RespRetry,
}

impl RelayEvent {
    /// All relay events, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Inspection,
        Self::ReqSend,
        Self::ReqRetry,
        Self::RespSend,
        Self::RespRetry,
    ];

    /// Returns the event's name as it appears in traces.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Inspection => "nextInspectionEvent",
            Self::ReqSend => "nextReqSendEvent",
            Self::ReqRetry => "nextReqRetryEvent",
            Self::RespSend => "nextRespSendEvent",
            Self::RespRetry => "nextRespRetryEvent",
        }
    }
}

impl fmt::Display for RelayEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Time source and event sink used by the relay.
///
/// Implementations must deliver each scheduled event exactly once, at or after its time,
/// in non-decreasing time order.
pub trait Scheduler {
    /// Returns the current simulation time.
    fn now(&self) -> Tick;

    /// Schedules `event` to be delivered at `when`.
    ///
    /// The relay only calls this when `is_scheduled(event)` is `false` and `when >= now()`.
    fn schedule(&mut self, event: RelayEvent, when: Tick);

    /// Returns `true` if `event` is pending delivery.
    fn is_scheduled(&self, event: RelayEvent) -> bool;
}
