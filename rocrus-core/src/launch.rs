//! Kernel launch over the emulated device.
//!
//! A "grid" here is a rayon parallel iterator: one work item per batch, per
//! reduction block, or per chunk of columns. Work items must touch disjoint
//! output memory.

use crate::error::Error;
use crate::handle::Handle;
use rayon::prelude::*;

/// Work items smaller than this run inline on the calling thread.
pub const MIN_PARALLEL_WORK: i64 = 1 << 12;

/// Synchronises the handle's stream, then runs `kernel`.
///
/// Every launcher goes through here so kernels are ordered after pending
/// asynchronous copies on the same stream.
pub fn launch<F>(handle: &Handle, kernel: F) -> Result<(), Error>
where
    F: FnOnce() -> Result<(), Error>,
{
    handle.sync_stream()?;
    kernel()
}

/// Runs `f(b)` for every batch `b` in `[0, batch_count)`.
///
/// Returns the first error any batch reported.
pub fn launch_batches<F>(batch_count: i64, f: F) -> Result<(), Error>
where
    F: Fn(i64) -> Result<(), Error> + Sync + Send,
{
    if batch_count <= 0 {
        return Ok(());
    }
    if batch_count == 1 {
        return f(0);
    }
    (0..batch_count).into_par_iter().try_for_each(f)
}

/// Runs `f(b, blk)` for every block of every batch.
pub fn launch_blocks<F>(batch_count: i64, blocks: i64, f: F) -> Result<(), Error>
where
    F: Fn(i64, i64) -> Result<(), Error> + Sync + Send,
{
    if batch_count <= 0 || blocks <= 0 {
        return Ok(());
    }
    (0..batch_count * blocks)
        .into_par_iter()
        .try_for_each(|g| f(g / blocks, g % blocks))
}

/// Runs `f(start, end)` over chunks of `[start, end)`, in parallel once the
/// range holds at least `work_per_item * len >= MIN_PARALLEL_WORK` work.
pub fn parallel_for_chunks<F>(start: i64, end: i64, work_per_item: i64, f: F)
where
    F: Fn(i64, i64) + Sync + Send,
{
    if start >= end {
        return;
    }
    let total = end - start;
    if total * work_per_item.max(1) < MIN_PARALLEL_WORK {
        f(start, end);
        return;
    }
    let threads = rayon::current_num_threads() as i64;
    let chunk = ((total + threads - 1) / threads).max(1);
    (0..(total + chunk - 1) / chunk).into_par_iter().for_each(|c| {
        let s = start + c * chunk;
        f(s, (s + chunk).min(end));
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};

    #[test]
    fn test_launch_batches_visits_each_batch() {
        let sum = AtomicI64::new(0);
        launch_batches(100, |b| {
            sum.fetch_add(b, Ordering::Relaxed);
            Ok(())
        })
        .unwrap();
        assert_eq!(sum.load(Ordering::Relaxed), (0..100).sum::<i64>());
    }

    #[test]
    fn test_launch_batches_propagates_error() {
        let r = launch_batches(10, |b| {
            if b == 7 {
                Err(Error::InvalidPointer("x"))
            } else {
                Ok(())
            }
        });
        assert_eq!(r, Err(Error::InvalidPointer("x")));
    }

    #[test]
    fn test_launch_blocks_grid() {
        let count = AtomicI64::new(0);
        launch_blocks(3, 5, |b, blk| {
            assert!(b < 3 && blk < 5);
            count.fetch_add(1, Ordering::Relaxed);
            Ok(())
        })
        .unwrap();
        assert_eq!(count.load(Ordering::Relaxed), 15);
    }

    #[test]
    fn test_parallel_for_chunks_covers_range() {
        let counter = AtomicI64::new(0);
        parallel_for_chunks(0, 100_000, 1, |s, e| {
            counter.fetch_add(e - s, Ordering::Relaxed);
        });
        assert_eq!(counter.load(Ordering::Relaxed), 100_000);
    }

    #[test]
    fn test_empty_range() {
        let counter = AtomicI64::new(0);
        parallel_for_chunks(5, 5, 1, |_, _| {
            counter.fetch_add(1, Ordering::Relaxed);
        });
        assert_eq!(counter.load(Ordering::Relaxed), 0);
    }
}
