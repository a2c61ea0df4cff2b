//! Timing Memory Tests.
//!
//! Verifies fixed-latency completion, occupancy-limited refusal with its retry obligation,
//! pair-swapped release order, and the untimed access paths.

use gadget_core::common::{AddrRange, Cycles};
use gadget_core::config::{MemoryConfig, ResponseOrder};
use gadget_core::sim::ClockDomain;
use gadget_core::soc::devices::TimingMemory;
use gadget_core::soc::{Packet, Responder, RetryGrant};
use pretty_assertions::assert_eq;

const PERIOD: u64 = 100;

fn memory(max_outstanding: usize, order: ResponseOrder) -> TimingMemory {
    let config = MemoryConfig {
        latency: Cycles(10),
        max_outstanding,
        response_order: order,
        ..MemoryConfig::default()
    };
    TimingMemory::new(&config, ClockDomain::new(PERIOD))
}

fn read(id: u64) -> Packet {
    Packet::read(id, 0x8000_0000 + id * 64, 64)
}

// ══════════════════════════════════════════════════════════
// 1. Latency
// ══════════════════════════════════════════════════════════

#[test]
fn response_ready_after_fixed_latency() {
    let mut mem = memory(4, ResponseOrder::InOrder);
    assert!(mem.recv_timing_req(read(0)).is_ok());
    assert_eq!(mem.next_wakeup(), Some(1_000));

    mem.advance_to(999);
    assert!(mem.pop_ready_response().is_none());
    mem.advance_to(1_000);
    let pkt = mem.pop_ready_response().unwrap();
    assert!(pkt.is_response());
    assert_eq!(pkt.id(), 0);
    assert!(mem.is_idle());
}

#[test]
fn in_order_release_follows_arrival() {
    let mut mem = memory(4, ResponseOrder::InOrder);
    for id in 0..3 {
        mem.advance_to(id * PERIOD);
        assert!(mem.recv_timing_req(read(id)).is_ok());
    }
    mem.advance_to(5_000);
    let ids: Vec<u64> = std::iter::from_fn(|| mem.pop_ready_response())
        .map(|p| p.id())
        .collect();
    assert_eq!(ids, vec![0, 1, 2]);
    assert_eq!(mem.received_ids(), &[0, 1, 2]);
}

// ══════════════════════════════════════════════════════════
// 2. Occupancy
// ══════════════════════════════════════════════════════════

#[test]
fn full_memory_refuses_and_owes_retry_once_room_frees() {
    let mut mem = memory(2, ResponseOrder::InOrder);
    assert!(mem.recv_timing_req(read(0)).is_ok());
    assert!(mem.recv_timing_req(read(1)).is_ok());
    assert!(mem.recv_timing_req(read(2)).is_err());
    assert!(!mem.take_req_retry(), "no room yet");

    mem.advance_to(1_000);
    let _ = mem.pop_ready_response().unwrap();
    assert_eq!(mem.next_wakeup(), Some(1_000));
    assert!(mem.take_req_retry());
    assert!(!mem.take_req_retry());
}

#[test]
fn blocked_response_counts_toward_occupancy() {
    let mut mem = memory(1, ResponseOrder::InOrder);
    assert!(mem.recv_timing_req(read(0)).is_ok());
    mem.advance_to(1_000);
    let pkt = mem.pop_ready_response().unwrap();
    mem.hold_response(pkt);

    assert_eq!(mem.outstanding(), 1);
    assert!(mem.recv_timing_req(read(1)).is_err());
    assert_eq!(mem.next_wakeup(), None);

    let mut accepted = Vec::new();
    let mut accept = |pkt: Packet| -> Result<(), Packet> {
        accepted.push(pkt.id());
        Ok(())
    };
    mem.recv_resp_retry(RetryGrant::new(&mut accept));
    assert_eq!(accepted, vec![0]);
    assert!(mem.is_idle());
    assert!(mem.take_req_retry());
}

#[test]
fn blocked_response_stops_further_release() {
    let mut mem = memory(4, ResponseOrder::InOrder);
    assert!(mem.recv_timing_req(read(0)).is_ok());
    assert!(mem.recv_timing_req(read(1)).is_ok());
    mem.advance_to(1_000);
    let first = mem.pop_ready_response().unwrap();
    mem.hold_response(first);
    assert!(mem.pop_ready_response().is_none());
}

// ══════════════════════════════════════════════════════════
// 3. Pair-swapped order
// ══════════════════════════════════════════════════════════

#[test]
fn pair_swapped_releases_second_first() {
    let mut mem = memory(4, ResponseOrder::PairSwapped);
    for id in 0..4 {
        mem.advance_to(id * PERIOD);
        assert!(mem.recv_timing_req(read(id)).is_ok());
    }
    // The first pair waits until its second member is ready.
    assert_eq!(mem.next_wakeup(), Some(1_100));
    mem.advance_to(1_000);
    assert!(mem.pop_ready_response().is_none());

    mem.advance_to(2_000);
    let ids: Vec<u64> = std::iter::from_fn(|| mem.pop_ready_response())
        .map(|p| p.id())
        .collect();
    assert_eq!(ids, vec![1, 0, 3, 2]);
}

#[test]
fn pair_swapped_lone_entry_is_released() {
    let mut mem = memory(4, ResponseOrder::PairSwapped);
    assert!(mem.recv_timing_req(read(0)).is_ok());
    mem.advance_to(1_000);
    assert_eq!(mem.pop_ready_response().map(|p| p.id()), Some(0));
}

// ══════════════════════════════════════════════════════════
// 4. Untimed paths
// ══════════════════════════════════════════════════════════

#[test]
fn atomic_and_functional_accesses() {
    let mut mem = memory(1, ResponseOrder::InOrder);
    let mut pkt = read(0);
    assert_eq!(mem.recv_atomic(&mut pkt), 1_000);
    assert!(pkt.is_response());

    let mut pkt = read(1);
    mem.recv_functional(&mut pkt);
    assert!(pkt.is_response());

    assert_eq!(mem.atomic_accesses(), 1);
    assert_eq!(mem.functional_accesses(), 1);
    assert!(mem.is_idle());
    assert!(mem.received_ids().is_empty());
}

#[test]
fn reports_configured_range() {
    let mem = memory(1, ResponseOrder::InOrder);
    assert_eq!(
        mem.addr_ranges(),
        vec![AddrRange::with_size(0x8000_0000, 512 * 1024 * 1024)]
    );
}
