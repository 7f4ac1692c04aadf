//! Bounded worker pool for one batch of independent work.
//!
//! Workers are scoped threads pulling from a shared queue; the call returns
//! once every item is done, so no thread outlives a stage.

use parking_lot::Mutex;
use std::collections::VecDeque;

/// Run `work` over `items` on at most `max_threads` threads.
///
/// Results come back in input order regardless of completion order. A single
/// item (or `max_threads == 1`) runs on the calling thread.
pub(crate) fn run_bounded<I, O, F>(max_threads: usize, items: Vec<I>, work: F) -> Vec<O>
where
    I: Send,
    O: Send,
    F: Fn(I) -> O + Sync,
{
    let total = items.len();
    let workers = max_threads.clamp(1, total.max(1));
    if workers == 1 {
        return items.into_iter().map(work).collect();
    }

    let queue: Mutex<VecDeque<(usize, I)>> = Mutex::new(items.into_iter().enumerate().collect());
    let results: Mutex<Vec<Option<O>>> = Mutex::new((0..total).map(|_| None).collect());

    std::thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| {
                loop {
                    let next = queue.lock().pop_front();
                    let Some((idx, item)) = next else {
                        break;
                    };
                    let output = work(item);
                    results.lock()[idx] = Some(output);
                }
            });
        }
    });

    results.into_inner().into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn keeps_input_order() {
        let out = run_bounded(4, (0..50).collect(), |n: u64| {
            std::thread::sleep(std::time::Duration::from_micros(50 - n));
            n * 2
        });
        assert_eq!(out, (0..50).map(|n| n * 2).collect::<Vec<_>>());
    }

    #[test]
    fn never_exceeds_thread_budget() {
        let active = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        run_bounded(3, (0..30).collect(), |_: u32| {
            let now = active.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(1));
            active.fetch_sub(1, Ordering::SeqCst);
        });
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[test]
    fn empty_batch() {
        let out: Vec<u8> = run_bounded(8, Vec::<u8>::new(), |n| n);
        assert!(out.is_empty());
    }
}
