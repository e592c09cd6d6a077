#![no_main]

use std::cell::RefCell;
use std::rc::Rc;

use arbitrary::Arbitrary;
use folio_core::{Debouncer, Duration, Edge, Throttle, TimerQueue};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Schedule {
    wait_ms: u8,
    limit_ms: u8,
    trailing: bool,
    /// Gaps between successive triggers.
    gaps_ms: Vec<u8>,
}

fuzz_target!(|schedule: Schedule| {
    if schedule.gaps_ms.len() > 512 {
        return;
    }
    let queue = Rc::new(TimerQueue::manual());
    let wait = Duration::from_millis(u64::from(schedule.wait_ms));
    let limit = Duration::from_millis(u64::from(schedule.limit_ms).max(1));
    let edge = if schedule.trailing {
        Edge::Trailing
    } else {
        Edge::Leading
    };

    let debounced = Rc::new(RefCell::new(Vec::new()));
    let throttled = Rc::new(RefCell::new(Vec::new()));
    let debouncer = {
        let (calls, q) = (Rc::clone(&debounced), Rc::clone(&queue));
        Debouncer::new(queue.clone(), wait, move |i: usize| {
            calls.borrow_mut().push((q.elapsed(), i));
        })
    };
    let throttle = {
        let (calls, q) = (Rc::clone(&throttled), Rc::clone(&queue));
        Throttle::with_edge(queue.clone(), limit, edge, move |i: usize| {
            calls.borrow_mut().push((q.elapsed(), i));
        })
        .expect("non-zero limit")
    };

    for (i, gap) in schedule.gaps_ms.iter().enumerate() {
        queue.advance(Duration::from_millis(u64::from(*gap)));
        debouncer.trigger(i);
        throttle.trigger(i);
    }
    queue.advance(Duration::from_secs(1));

    // Everything settles.
    assert!(queue.is_empty());
    assert!(!debouncer.is_pending());
    assert!(!throttle.is_cooling_down());

    // The last trigger always reaches the debounced action.
    if let Some(last) = schedule.gaps_ms.len().checked_sub(1) {
        assert_eq!(debounced.borrow().last().map(|&(_, i)| i), Some(last));
    }

    // Throttled calls are at least one window apart.
    for pair in throttled.borrow().windows(2) {
        assert!(pair[1].0 - pair[0].0 >= limit, "{pair:?}");
    }
});
