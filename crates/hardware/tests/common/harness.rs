use gadget_core::common::{ProtocolFault, Tick};
use gadget_core::config::RelayConfig;
use gadget_core::sim::{EventQueue, RelayEvent};
use gadget_core::soc::{InspectorGadget, Packet, RelayContext};
use tracing_subscriber::EnvFilter;

use crate::common::mocks::peers::{RecordingRequestor, RecordingResponder};

/// Upper bound on events delivered by `RelayBench::run`.
const MAX_EVENTS: usize = 100_000;

/// Installs a test-captured tracing subscriber once per process.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn ctx<'a>(
    queue: &'a mut EventQueue<RelayEvent>,
    cpu: &'a mut RecordingRequestor,
    mem: &'a mut RecordingResponder,
) -> RelayContext<'a> {
    RelayContext {
        queue,
        cpu_side: cpu,
        mem_side: mem,
    }
}

/// A relay between two recording peers, driven by a real event queue.
#[derive(Debug)]
pub struct RelayBench {
    pub queue: EventQueue<RelayEvent>,
    pub relay: InspectorGadget,
    pub cpu: RecordingRequestor,
    pub mem: RecordingResponder,
    /// Events delivered, with their times.
    pub log: Vec<(Tick, RelayEvent)>,
}

impl Default for RelayBench {
    fn default() -> Self {
        Self::new(&RelayConfig::default())
    }
}

impl RelayBench {
    pub fn new(config: &RelayConfig) -> Self {
        init_tracing();
        Self {
            queue: EventQueue::new(),
            relay: InspectorGadget::new("bench.relay", config).unwrap(),
            cpu: RecordingRequestor::default(),
            mem: RecordingResponder::default(),
            log: Vec::new(),
        }
    }

    pub fn with_capacities(inspection: usize, output: usize, response: usize) -> Self {
        Self::new(&RelayConfig::with_capacities(inspection, output, response))
    }

    /// Relay clock period.
    pub fn period(&self) -> Tick {
        self.relay.clock().period()
    }

    /// Time of the `n`-th clock edge.
    pub fn cycle(&self, n: u64) -> Tick {
        n * self.period()
    }

    pub fn now(&self) -> Tick {
        self.queue.now()
    }

    /// Moves time forward to `when`, delivering everything due before it.
    pub fn advance_to(&mut self, when: Tick) {
        self.run_until(when);
        assert!(self.queue.advance_to(when), "cannot advance to {when}");
    }

    /// Offers a request from the near side; a refused one is stashed for the next retry.
    pub fn send_req(&mut self, pkt: Packet) -> bool {
        let Self {
            queue,
            relay,
            cpu,
            mem,
            ..
        } = self;
        let result = relay.recv_timing_req(pkt, &mut ctx(queue, cpu, mem));
        match result {
            Ok(()) => true,
            Err(pkt) => {
                cpu.held_request = Some(pkt);
                false
            }
        }
    }

    /// Offers a response from the far side; a refused one is stashed for the next retry.
    pub fn send_resp(&mut self, pkt: Packet) -> bool {
        let Self {
            queue,
            relay,
            cpu,
            mem,
            ..
        } = self;
        let result = relay.recv_timing_resp(pkt, &mut ctx(queue, cpu, mem));
        match result {
            Ok(()) => true,
            Err(pkt) => {
                mem.held_response = Some(pkt);
                false
            }
        }
    }

    /// Delivers the far side's retry signal.
    pub fn req_retry(&mut self) -> Result<(), ProtocolFault> {
        let Self {
            queue,
            relay,
            cpu,
            mem,
            ..
        } = self;
        relay.recv_req_retry(&mut ctx(queue, cpu, mem))
    }

    /// Delivers the near side's retry signal.
    pub fn resp_retry(&mut self) -> Result<(), ProtocolFault> {
        let Self {
            queue,
            relay,
            cpu,
            mem,
            ..
        } = self;
        relay.recv_resp_retry(&mut ctx(queue, cpu, mem))
    }

    /// Runs an arbitrary relay call with a freshly built context.
    pub fn with_ctx<R>(
        &mut self,
        f: impl FnOnce(&mut InspectorGadget, &mut RelayContext<'_>) -> R,
    ) -> R {
        let Self {
            queue,
            relay,
            cpu,
            mem,
            ..
        } = self;
        f(relay, &mut ctx(queue, cpu, mem))
    }

    /// Delivers one event, returning it or the fault it raised.
    pub fn try_step(&mut self) -> Option<Result<(Tick, RelayEvent), ProtocolFault>> {
        let (when, event) = self.queue.pop()?;
        self.log.push((when, event));
        let Self {
            queue,
            relay,
            cpu,
            mem,
            ..
        } = self;
        Some(
            relay
                .process(event, &mut ctx(queue, cpu, mem))
                .map(|()| (when, event)),
        )
    }

    /// Delivers one event; panics on a protocol fault.
    pub fn step(&mut self) -> Option<(Tick, RelayEvent)> {
        self.try_step()
            .map(|r| r.unwrap_or_else(|fault| panic!("unexpected fault: {fault}")))
    }

    /// Delivers every event due at or before `when`.
    pub fn run_until(&mut self, when: Tick) {
        while self.queue.next_time().is_some_and(|t| t <= when) {
            let _ = self.step();
        }
    }

    /// Delivers events until none is pending.
    pub fn run(&mut self) {
        for _ in 0..MAX_EVENTS {
            if self.step().is_none() {
                return;
            }
        }
        panic!("relay did not go quiet within {MAX_EVENTS} events");
    }

    /// Times at which `event` was delivered.
    pub fn times_of(&self, event: RelayEvent) -> Vec<Tick> {
        self.log
            .iter()
            .filter(|(_, e)| *e == event)
            .map(|(t, _)| *t)
            .collect()
    }
}
