#![allow(unused_results)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use gadget_core::common::Tick;
use gadget_core::sim::{RelayEvent, Scheduler};
use mockall::mock;

mock! {
    pub Queue {}
    impl Scheduler for Queue {
        fn now(&self) -> Tick;
        fn schedule(&mut self, event: RelayEvent, when: Tick);
        fn is_scheduled(&self, event: RelayEvent) -> bool;
    }
}

/// Builds a mock scheduler at `now` that tracks whether `event` is pending.
///
/// The first `schedule(event, ..)` call flips the pending flag, so later `is_scheduled`
/// queries see it. `is_scheduled` for any other event reports `false`, and scheduling any
/// other event is accepted without tracking.
pub fn tracking_queue(now: Tick, event: RelayEvent) -> (MockQueue, Arc<AtomicBool>) {
    let pending = Arc::new(AtomicBool::new(false));
    let mut queue = MockQueue::new();
    queue.expect_now().return_const(now);

    let probe = Arc::clone(&pending);
    queue
        .expect_is_scheduled()
        .returning(move |e| e == event && probe.load(Ordering::SeqCst));

    let flag = Arc::clone(&pending);
    queue.expect_schedule().returning(move |e, _| {
        if e == event {
            flag.store(true, Ordering::SeqCst);
        }
    });
    (queue, pending)
}
