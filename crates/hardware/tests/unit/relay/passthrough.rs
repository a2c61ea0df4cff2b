//! Pass-Through Tests.
//!
//! Atomic and functional accesses, address ranges, and initialization bypass the buffers
//! entirely; these tests confirm they leave the timing state alone.

use gadget_core::common::AddrRange;
use gadget_core::soc::{Direction, Packet};
use gadget_core::stats::RelayStats;
use pretty_assertions::assert_eq;

use crate::common::harness::RelayBench;

#[test]
fn atomic_access_adds_one_period_to_far_side_latency() {
    let mut bench = RelayBench::default();
    bench.mem.atomic_latency = 1_000;
    let mut pkt = Packet::write(5, 0x8000_0100, 8);

    let latency = bench.with_ctx(|relay, ctx| relay.recv_atomic(&mut pkt, ctx));

    assert_eq!(latency, bench.period() + 1_000);
    assert_eq!(pkt.direction(), Direction::Response);
    assert!(pkt.tag().is_none());
    assert!(bench.queue.is_empty());
    assert_eq!(bench.relay.stats(), &RelayStats::default());
}

#[test]
fn functional_access_is_forwarded_untimed() {
    let mut bench = RelayBench::default();
    let mut pkt = Packet::read(1, 0x8000_0000, 4);

    bench.with_ctx(|relay, ctx| relay.recv_functional(&mut pkt, ctx));

    assert_eq!(bench.mem.functional, 1);
    assert!(pkt.is_response());
    assert!(bench.queue.is_empty());
    assert!(bench.relay.is_idle());
}

#[test]
fn addr_ranges_are_the_far_sides() {
    let mut bench = RelayBench::default();
    bench.mem.ranges = vec![
        AddrRange::new(0x0, 0x1000),
        AddrRange::with_size(0x8000_0000, 0x4000),
    ];
    let ranges = bench.relay.addr_ranges(&bench.mem);
    assert_eq!(ranges, bench.mem.ranges);
}

#[test]
fn init_announces_ranges_to_near_side() {
    let mut bench = RelayBench::default();
    bench.mem.ranges = vec![AddrRange::with_size(0x4000_0000, 0x10_0000)];

    bench.with_ctx(|relay, ctx| relay.init(ctx));

    assert_eq!(bench.cpu.ranges, vec![AddrRange::new(0x4000_0000, 0x4010_0000)]);
    assert!(bench.queue.is_empty());
}

#[test]
fn timing_traffic_unaffected_by_interleaved_functional_access() {
    let mut bench = RelayBench::default();
    let _ = bench.send_req(Packet::read(0, 0x8000_0000, 64));
    let mut probe = Packet::read(99, 0x8000_0000, 64);
    bench.with_ctx(|relay, ctx| relay.recv_functional(&mut probe, ctx));
    bench.run();

    assert_eq!(bench.mem.request_ids(), vec![0]);
    assert_eq!(bench.relay.stats().num_requests_fwded, 1);
}
