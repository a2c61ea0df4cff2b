//! Timing Tests.
//!
//! Verifies that every action fires on a relay clock edge, that no packet leaves a buffer
//! before its latency has elapsed, and that buffer latency statistics record the real
//! residence time.

use gadget_core::common::{Cycles, Tick};
use gadget_core::config::RelayConfig;
use gadget_core::sim::{ClockDomain, RelayEvent};
use gadget_core::soc::{Packet, SequenceTag};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use crate::common::harness::RelayBench;

fn config_with_latencies(inspection: u64, response: u64) -> RelayConfig {
    RelayConfig {
        inspection_latency: Cycles(inspection),
        response_latency: Cycles(response),
        ..RelayConfig::default()
    }
}

// ══════════════════════════════════════════════════════════
// 1. Request path
// ══════════════════════════════════════════════════════════

#[test]
fn single_request_takes_two_cycles_to_reach_far_side() {
    let mut bench = RelayBench::default();
    let _ = bench.send_req(Packet::read(0, 0x8000_0000, 64));
    bench.run();

    assert_eq!(bench.times_of(RelayEvent::Inspection), vec![bench.cycle(1)]);
    assert_eq!(bench.times_of(RelayEvent::ReqSend), vec![bench.cycle(2)]);
    assert_eq!(bench.relay.stats().total_inspection_buffer_latency, bench.cycle(1));
    assert_eq!(bench.relay.stats().num_requests_fwded, 1);
}

#[test]
fn inspection_average_is_exact_before_the_request_is_forwarded() {
    let mut bench = RelayBench::default();
    let _ = bench.send_req(Packet::read(0, 0x8000_0000, 64));
    bench.run_until(bench.cycle(1));

    let stats = bench.relay.stats();
    assert_eq!(stats.num_requests_inspected, 1);
    assert_eq!(stats.num_requests_fwded, 0);
    assert_eq!(stats.avg_inspection_buffer_latency(), bench.cycle(1) as f64);

    bench.run();
    assert_eq!(bench.relay.stats().num_requests_inspected, 1);
    assert_eq!(bench.relay.stats().num_requests_fwded, 1);
}

#[test]
fn longer_inspection_latency_delays_inspection() {
    let mut bench = RelayBench::new(&config_with_latencies(3, 1));
    let _ = bench.send_req(Packet::read(0, 0x8000_0000, 64));
    bench.run();

    assert_eq!(bench.times_of(RelayEvent::Inspection), vec![bench.cycle(3)]);
    assert_eq!(bench.times_of(RelayEvent::ReqSend), vec![bench.cycle(4)]);
}

#[test]
fn back_to_back_requests_inspect_one_per_cycle() {
    let mut bench = RelayBench::default();
    for id in 0..4 {
        let _ = bench.send_req(Packet::read(id, 0x8000_0000 + id * 64, 64));
    }
    bench.run();

    let inspections = bench.times_of(RelayEvent::Inspection);
    assert_eq!(inspections, (1..=4).map(|c| bench.cycle(c)).collect::<Vec<_>>());
    let sends = bench.times_of(RelayEvent::ReqSend);
    assert_eq!(sends, (2..=5).map(|c| bench.cycle(c)).collect::<Vec<_>>());
    // Each request waited one cycle longer than the one before it.
    let expected: Tick = (1..=4).map(|c| bench.cycle(c)).sum();
    assert_eq!(bench.relay.stats().total_inspection_buffer_latency, expected);
}

#[test]
fn mid_cycle_arrival_waits_for_following_edge() {
    let mut bench = RelayBench::default();
    let period = bench.period();
    bench.advance_to(period / 2);
    let _ = bench.send_req(Packet::read(0, 0x8000_0000, 64));
    bench.run();

    // Ready at 1.5 cycles; the earliest edge after the next one is cycle 2.
    assert_eq!(bench.times_of(RelayEvent::Inspection), vec![bench.cycle(2)]);
    assert_eq!(
        bench.relay.stats().total_inspection_buffer_latency,
        bench.cycle(2) - period / 2
    );
}

proptest! {
    #[test]
    fn inspection_never_precedes_latency(
        arrival in 0u64..5_000,
        latency in 0u64..4,
        period in 1u64..500,
    ) {
        let config = RelayConfig {
            clock_period: period,
            ..config_with_latencies(latency, 1)
        };
        let clock = ClockDomain::new(period);
        let mut bench = RelayBench::new(&config);
        bench.advance_to(arrival);
        let _ = bench.send_req(Packet::read(0, 0x8000_0000, 64));
        bench.run();

        let inspected = bench.times_of(RelayEvent::Inspection);
        prop_assert_eq!(inspected.len(), 1);
        let at = inspected[0];
        let expected = clock.align((clock.next_cycle(arrival)).max(arrival + latency * period));
        prop_assert_eq!(at, expected);
        prop_assert!(at >= arrival + latency * period);
        prop_assert!(at > arrival);
        prop_assert_eq!(at % period, 0);
        prop_assert_eq!(bench.relay.stats().total_inspection_buffer_latency, at - arrival);
    }
}

// ══════════════════════════════════════════════════════════
// 2. Response path
// ══════════════════════════════════════════════════════════

#[test]
fn response_latency_is_respected() {
    let mut bench = RelayBench::new(&config_with_latencies(1, 2));
    let mut pkt = Packet::read(0, 0x8000_0000, 64);
    pkt.push_tag(SequenceTag::new(0)).unwrap();
    pkt.make_response();
    bench.advance_to(100);
    let _ = bench.send_resp(pkt);
    bench.run();

    // Ready at 100 + 2 cycles, aligned up to the following edge.
    let clock = bench.relay.clock();
    let expected = clock.align(100 + 2 * bench.period());
    assert_eq!(bench.times_of(RelayEvent::RespSend), vec![expected]);
    assert_eq!(bench.relay.stats().total_response_buffer_latency, expected - 100);
    assert_eq!(bench.relay.stats().avg_response_buffer_latency(), (expected - 100) as f64);
}

// ══════════════════════════════════════════════════════════
// 3. Clock edges
// ══════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn every_action_fires_on_an_edge(arrivals in proptest::collection::vec(0u64..3_000, 1..12)) {
        let mut arrivals = arrivals;
        arrivals.sort_unstable();
        let mut bench = RelayBench::with_capacities(16, 2, 16);
        for (id, &at) in arrivals.iter().enumerate() {
            bench.advance_to(at);
            prop_assert!(bench.send_req(Packet::read(id as u64, 0x8000_0000, 64)));
        }
        bench.run();
        for pkt in bench.mem.drain_as_responses() {
            prop_assert!(bench.send_resp(pkt));
        }
        bench.run();

        let period = bench.period();
        prop_assert!(bench.log.iter().all(|(t, _)| t % period == 0));
        prop_assert_eq!(bench.cpu.responses.len(), arrivals.len());
    }
}
