//! Bounded concurrent polling of many printers.

use std::net::Ipv4Addr;
use std::panic;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use crate::error::FetchError;
use crate::fetcher::{CounterFetcher, PageCount};

/// Reads every address in `targets` using at most `workers` threads.
///
/// Results come back in the same order as `targets`. A `workers` value of
/// zero is treated as one. Each read is bounded by the fetcher's own timeout,
/// so the whole poll takes roughly `ceil(n / workers)` timeouts in the worst
/// case.
pub fn poll_all<F>(
    fetcher: &F,
    targets: &[Ipv4Addr],
    workers: usize,
) -> Vec<Result<PageCount, FetchError>>
where
    F: CounterFetcher + ?Sized,
{
    let workers = workers.clamp(1, targets.len().max(1));
    if workers == 1 {
        return targets.iter().map(|address| fetcher.fetch(*address)).collect();
    }

    let next = AtomicUsize::new(0);
    let mut indexed: Vec<(usize, Result<PageCount, FetchError>)> = thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                scope.spawn(|| {
                    let mut done = Vec::new();
                    loop {
                        let index = next.fetch_add(1, Ordering::Relaxed);
                        let Some(address) = targets.get(index) else {
                            break;
                        };
                        done.push((index, fetcher.fetch(*address)));
                    }
                    done
                })
            })
            .collect();

        handles
            .into_iter()
            .flat_map(|handle| match handle.join() {
                Ok(done) => done,
                Err(payload) => panic::resume_unwind(payload),
            })
            .collect()
    });

    indexed.sort_unstable_by_key(|(index, _)| *index);
    indexed.into_iter().map(|(_, result)| result).collect()
}
