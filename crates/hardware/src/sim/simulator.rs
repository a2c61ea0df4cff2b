//! Simulator: owns the relay and both of its peers side-by-side.
//!
//! Keeping the three components as sibling fields lets every call into the relay
//! split-borrow them into a [`RelayContext`] without shared ownership or interior
//! mutability. The simulator:
//! 1. **Dispatches** relay events to the relay, and wake-ups to the generator or memory.
//! 2. **Re-arms** the peers' wake-ups after every event, so they never poll.
//! 3. **Stops** at the first protocol fault, reporting it as a [`SimError`].

use serde::Serialize;
use tracing::{debug, info};

use crate::common::{SimError, Tick};
use crate::config::Config;
use crate::sim::event::RelayEvent;
use crate::sim::queue::EventQueue;
use crate::soc::devices::{TimingMemory, TrafficGenerator};
use crate::soc::relay::{InspectorGadget, RelayContext};
use crate::stats::RelayStats;

/// Instance name of the relay inside the simulated system.
pub const RELAY_NAME: &str = "system.inspector";

/// Anything that can be pending in the simulator's queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SimEvent {
    /// One of the relay's scheduled actions.
    Relay(RelayEvent),
    /// Traffic generator wake-up.
    Generator,
    /// Memory wake-up.
    Memory,
}

impl From<RelayEvent> for SimEvent {
    fn from(event: RelayEvent) -> Self {
        Self::Relay(event)
    }
}

/// Outcome of a bounded run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunSummary {
    /// Time of the last delivered event.
    pub final_tick: Tick,
    /// Events delivered.
    pub events: u64,
    /// Requests the generator issued.
    pub requests_issued: u64,
    /// Responses the generator accepted.
    pub responses_received: u64,
    /// `true` if every request was answered and all components drained.
    pub completed: bool,
    /// Relay counters at the end of the run.
    pub stats: RelayStats,
}

/// Top-level simulator: traffic generator, relay, and timing memory.
#[derive(Debug)]
pub struct Simulator {
    queue: EventQueue<SimEvent>,
    relay: InspectorGadget,
    generator: TrafficGenerator,
    memory: TimingMemory,
}

fn context<'a>(
    queue: &'a mut EventQueue<SimEvent>,
    generator: &'a mut TrafficGenerator,
    memory: &'a mut TimingMemory,
) -> RelayContext<'a> {
    RelayContext {
        queue,
        cpu_side: generator,
        mem_side: memory,
    }
}

impl Simulator {
    /// Builds and initializes a simulator from a configuration.
    ///
    /// The relay announces the memory's ranges to the generator, and the generator's first
    /// issue is scheduled at tick 0.
    pub fn new(config: &Config) -> Result<Self, SimError> {
        config.validate()?;
        let relay = InspectorGadget::new(RELAY_NAME, &config.relay)?;
        let clock = relay.clock();
        let mut sim = Self {
            queue: EventQueue::new(),
            relay,
            generator: TrafficGenerator::new(&config.traffic, clock),
            memory: TimingMemory::new(&config.memory, clock),
        };
        sim.init();
        Ok(sim)
    }

    fn init(&mut self) {
        let Self {
            queue,
            relay,
            generator,
            memory,
        } = self;
        relay.init(&mut context(queue, generator, memory));
        self.sync_wakeups();
    }

    /// Returns the current simulation time.
    pub const fn now(&self) -> Tick {
        self.queue.now()
    }

    /// Returns the relay.
    pub const fn relay(&self) -> &InspectorGadget {
        &self.relay
    }

    /// Returns the traffic generator.
    pub const fn generator(&self) -> &TrafficGenerator {
        &self.generator
    }

    /// Returns the timing memory.
    pub const fn memory(&self) -> &TimingMemory {
        &self.memory
    }

    /// Returns `true` if every request was answered and nothing is left in flight.
    pub fn is_complete(&self) -> bool {
        self.generator.is_done() && self.relay.is_idle() && self.memory.is_idle()
    }

    /// Delivers the earliest pending event.
    ///
    /// # Returns
    ///
    /// The event's time, or `None` if nothing is pending.
    pub fn step(&mut self) -> Result<Option<Tick>, SimError> {
        let Some((when, event)) = self.queue.pop() else {
            return Ok(None);
        };
        self.dispatch(event)?;
        self.sync_wakeups();
        Ok(Some(when))
    }

    /// Delivers every event scheduled at or before `max_tick`.
    pub fn run_until(&mut self, max_tick: Tick) -> Result<(), SimError> {
        while self.queue.next_time().is_some_and(|t| t <= max_tick) {
            let _ = self.step()?;
        }
        Ok(())
    }

    /// Runs until the queue drains or `max_tick` is passed.
    ///
    /// # Arguments
    ///
    /// * `max_tick` - Optional time limit; `None` runs until no event is pending.
    ///
    /// # Returns
    ///
    /// A summary of the run, or the first protocol fault.
    pub fn run_to_completion(&mut self, max_tick: Option<Tick>) -> Result<RunSummary, SimError> {
        info!(limit = ?max_tick, "starting run");
        match max_tick {
            Some(limit) => self.run_until(limit)?,
            None => while self.step()?.is_some() {},
        }
        let summary = self.summary();
        info!(
            tick = summary.final_tick,
            events = summary.events,
            completed = summary.completed,
            "run finished"
        );
        Ok(summary)
    }

    /// Returns a summary of the run so far.
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            final_tick: self.queue.now(),
            events: self.queue.delivered(),
            requests_issued: self.generator.issued(),
            responses_received: self.generator.received_ids().len() as u64,
            completed: self.is_complete(),
            stats: self.relay.stats().clone(),
        }
    }

    fn dispatch(&mut self, event: SimEvent) -> Result<(), SimError> {
        let now = self.queue.now();
        let Self {
            queue,
            relay,
            generator,
            memory,
        } = self;
        generator.advance_to(now);
        memory.advance_to(now);

        match event {
            SimEvent::Relay(event) => {
                relay.process(event, &mut context(queue, generator, memory))?;
            }
            SimEvent::Generator => {
                if generator.take_resp_retry() {
                    relay.recv_resp_retry(&mut context(queue, generator, memory))?;
                }
                if let Some(pkt) = generator.next_request()
                    && let Err(pkt) =
                        relay.recv_timing_req(pkt, &mut context(queue, generator, memory))
                {
                    generator.hold(pkt);
                }
            }
            SimEvent::Memory => {
                while let Some(pkt) = memory.pop_ready_response() {
                    let delivered =
                        relay.recv_timing_resp(pkt, &mut context(queue, generator, memory));
                    if let Err(pkt) = delivered {
                        memory.hold_response(pkt);
                        break;
                    }
                }
                if memory.take_req_retry() {
                    debug!("memory has room again");
                    relay.recv_req_retry(&mut context(queue, generator, memory))?;
                }
            }
        }
        Ok(())
    }

    fn sync_wakeups(&mut self) {
        if let Some(when) = self.generator.next_wakeup() {
            self.queue.schedule_no_later(SimEvent::Generator, when);
        }
        if let Some(when) = self.memory.next_wakeup() {
            self.queue.schedule_no_later(SimEvent::Memory, when);
        }
    }
}
