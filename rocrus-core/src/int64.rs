//! Chunking helpers for the `_64` API.
//!
//! Kernels index with 32-bit grids. A 64-bit call is split into chunks that
//! fit: batches in groups of [`GRID_YZ_CHUNK`], vector lengths in groups of
//! [`GRID_X_CHUNK`].

/// Largest value the 32-bit launchers accept.
pub const I32_MAX: i64 = i32::MAX as i64;

/// Vector-length chunk of the 64-bit reductions.
pub const GRID_X_CHUNK: i64 = 1 << 28;

/// Batch chunk of every 64-bit launcher.
pub const GRID_YZ_CHUNK: i64 = 1 << 15;

/// Iterator over `(base, count)` chunks of `[0, total)`.
#[derive(Debug, Clone)]
pub struct Chunks {
    next: i64,
    total: i64,
    chunk: i64,
}

impl Iterator for Chunks {
    type Item = (i64, i32);

    fn next(&mut self) -> Option<(i64, i32)> {
        if self.next >= self.total {
            return None;
        }
        let base = self.next;
        let count = (self.total - base).min(self.chunk);
        self.next += count;
        Some((base, count as i32))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = if self.next >= self.total {
            0
        } else {
            ((self.total - self.next + self.chunk - 1) / self.chunk) as usize
        };
        (left, Some(left))
    }
}

impl ExactSizeIterator for Chunks {}

/// Chunks of `[0, total)` no longer than `chunk`.
pub fn chunks(total: i64, chunk: i64) -> Chunks {
    debug_assert!(chunk > 0 && chunk <= I32_MAX);
    Chunks {
        next: 0,
        total: total.max(0),
        chunk,
    }
}

/// Batch chunks of a 64-bit batch count.
pub fn batch_chunks(batch_count: i64) -> Chunks {
    chunks(batch_count, GRID_YZ_CHUNK)
}

/// Length chunks of a 64-bit vector length.
pub fn x_chunks(n: i64) -> Chunks {
    chunks(n, GRID_X_CHUNK)
}

/// Narrows a value the caller has already range-checked.
#[inline]
pub fn to_i32(v: i64) -> i32 {
    debug_assert!(v >= i32::MIN as i64 && v <= I32_MAX);
    v as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_chunks_small() {
        let c: Vec<_> = batch_chunks(5).collect();
        assert_eq!(c, vec![(0, 5)]);
        assert_eq!(batch_chunks(0).count(), 0);
        assert_eq!(batch_chunks(-3).count(), 0);
    }

    #[test]
    fn test_batch_chunks_split() {
        let c: Vec<_> = batch_chunks(GRID_YZ_CHUNK * 2 + 7).collect();
        assert_eq!(
            c,
            vec![
                (0, GRID_YZ_CHUNK as i32),
                (GRID_YZ_CHUNK, GRID_YZ_CHUNK as i32),
                (GRID_YZ_CHUNK * 2, 7)
            ]
        );
    }

    #[test]
    fn test_x_chunks_large_length() {
        let n = I32_MAX + 10;
        let c: Vec<_> = x_chunks(n).collect();
        assert_eq!(c.len(), 9);
        assert_eq!(c.iter().map(|&(_, k)| k as i64).sum::<i64>(), n);
        assert_eq!(x_chunks(n).len(), 9);
    }

    proptest::proptest! {
        #[test]
        fn chunks_cover_range_in_order(total in 0i64..100_000, chunk in 1i64..5_000) {
            let mut expect = 0i64;
            for (base, count) in chunks(total, chunk) {
                proptest::prop_assert_eq!(base, expect);
                proptest::prop_assert!(count > 0 && count as i64 <= chunk);
                expect += count as i64;
            }
            proptest::prop_assert_eq!(expect, total);
        }
    }
}
