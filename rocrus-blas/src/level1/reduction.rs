//! Two-stage block reduction shared by nrm2 and dot.
//!
//! Stage one sums each block of `NB` elements of every batch into the
//! workspace; stage two folds the block partials of a batch into one
//! accumulator. The 64-bit launchers run stage one once per length chunk and
//! keep accumulating into the same per-batch slot.

use rocrus_core::int64::{GRID_X_CHUNK, GRID_YZ_CHUNK};
use rocrus_core::launch::{launch_batches, launch_blocks};
use rocrus_core::{Error, Scalar};

/// Elements per reduction block.
pub const NB: i64 = 512;

#[inline]
pub fn blocks(n: i64) -> i64 {
    (n + NB - 1) / NB
}

/// Workspace bytes for a reduction over `n` elements and `batch_count`
/// batches with compute type `Tc`: one partial per block plus one
/// accumulator per batch. The 64-bit launchers (`chunked`) run at most
/// `GRID_X_CHUNK` elements and `GRID_YZ_CHUNK` batches at a time.
pub fn workspace_size<Tc>(n: i64, batch_count: i64, chunked: bool) -> usize {
    if n <= 0 || batch_count <= 0 {
        return 0;
    }
    let (n, batch_count) = if chunked {
        (n.min(GRID_X_CHUNK), batch_count.min(GRID_YZ_CHUNK))
    } else {
        (n, batch_count)
    };
    ((blocks(n) + 1) * batch_count) as usize * std::mem::size_of::<Tc>()
}

/// Workspace pointers for one launch.
pub(crate) struct ReductionSpace<Tc> {
    partials: *mut Tc,
    accum: *mut Tc,
}

impl<Tc> Clone for ReductionSpace<Tc> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<Tc> Copy for ReductionSpace<Tc> {}

// SAFETY: blocks and batches write disjoint slots.
unsafe impl<Tc> Send for ReductionSpace<Tc> {}
unsafe impl<Tc> Sync for ReductionSpace<Tc> {}

impl<Tc: Scalar> ReductionSpace<Tc> {
    /// Splits a workspace for launches of at most `n` elements and
    /// `batch_count` batches.
    pub(crate) fn new(base: *mut Tc, n: i64, batch_count: i64) -> Self {
        ReductionSpace {
            partials: base,
            accum: base.wrapping_add((blocks(n) * batch_count) as usize),
        }
    }

    #[inline(always)]
    unsafe fn partial(&self, i: i64) -> *mut Tc {
        self.partials.add(i as usize)
    }

    /// Accumulator of batch `b` after [`Self::sum`].
    ///
    /// # Safety
    /// `b` must be within the launched batch count.
    pub(crate) unsafe fn accum(&self, b: i64) -> Tc {
        *self.accum_slot(b)
    }

    #[inline(always)]
    unsafe fn accum_slot(&self, b: i64) -> *mut Tc {
        self.accum.add(b as usize)
    }

    /// Sums `elem(b, i)` over `i in [0, n)` for every batch into the
    /// accumulators, adding to their previous value when `accumulate` is set.
    ///
    /// # Safety
    /// `elem` must be safe to call for every `(b, i)` in range and the
    /// workspace must hold the layout for `n` and `batch_count`.
    pub(crate) unsafe fn sum<F>(
        &self,
        n: i32,
        batch_count: i32,
        accumulate: bool,
        elem: F,
    ) -> Result<(), Error>
    where
        F: Fn(i64, i64) -> Tc + Sync + Send,
    {
        let n = n as i64;
        let batch_count = batch_count as i64;
        let nblocks = blocks(n);
        let space = *self;

        launch_blocks(batch_count, nblocks, |b, blk| {
            let start = blk * NB;
            let end = (start + NB).min(n);
            let mut acc = Tc::zero();
            for i in start..end {
                acc += elem(b, i);
            }
            *space.partial(b * nblocks + blk) = acc;
            Ok(())
        })?;

        launch_batches(batch_count, |b| {
            let mut acc = Tc::zero();
            for blk in 0..nblocks {
                acc += *space.partial(b * nblocks + blk);
            }
            let slot = space.accum_slot(b);
            *slot = if accumulate { *slot + acc } else { acc };
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_size() {
        assert_eq!(workspace_size::<f32>(0, 5, false), 0);
        assert_eq!(workspace_size::<f32>(10, 0, true), 0);
        // one block + one accumulator
        assert_eq!(workspace_size::<f32>(10, 1, false), 8);
        // 3 blocks + 1, two batches, 8-byte compute
        assert_eq!(workspace_size::<f64>(1025, 2, false), 64);
    }

    #[test]
    fn test_workspace_size_caps_only_chunked() {
        let bc = GRID_YZ_CHUNK + 7;
        assert_eq!(workspace_size::<f32>(1, bc, false), (2 * bc) as usize * 4);
        assert_eq!(workspace_size::<f32>(1, bc, true), (2 * GRID_YZ_CHUNK) as usize * 4);

        let n = GRID_X_CHUNK + 1;
        assert_eq!(workspace_size::<f32>(n, 1, false), (blocks(n) + 1) as usize * 4);
        assert_eq!(
            workspace_size::<f32>(n, 1, true),
            (blocks(GRID_X_CHUNK) + 1) as usize * 4
        );
    }

    #[test]
    fn test_sum_matches_serial() {
        let n = 2000i64;
        let batch = 3i64;
        let mut ws = vec![0.0f64; workspace_size::<f64>(n, batch, false) / 8];
        let space = ReductionSpace::new(ws.as_mut_ptr(), n, batch);
        unsafe {
            space
                .sum(n as i32, batch as i32, false, |b, i| (b * 10_000 + i) as f64)
                .unwrap();
            for b in 0..batch {
                let expect: f64 = (0..n).map(|i| (b * 10_000 + i) as f64).sum();
                assert_eq!(space.accum(b), expect);
            }
            space.sum(4, batch as i32, true, |_, _| 1.0).unwrap();
            assert_eq!(space.accum(0), (0..n).sum::<i64>() as f64 + 4.0);
        }
    }

    #[test]
    fn test_sum_past_batch_chunk() {
        let batch = GRID_YZ_CHUNK + 7;
        let mut ws = vec![-1.0f32; workspace_size::<f32>(1, batch, false) / 4];
        let space = ReductionSpace::new(ws.as_mut_ptr(), 1, batch);
        unsafe {
            space.sum(1, batch as i32, false, |b, _| b as f32).unwrap();
            for b in 0..batch {
                assert_eq!(space.accum(b), b as f32);
            }
        }
    }

    proptest::proptest! {
        // Summing a length in pieces into one workspace gives the serial sum.
        #[test]
        fn test_piecewise_sum_matches_serial(
            n in 1i64..6_000,
            batch in 1i64..6,
            piece in 1i64..2_000,
        ) {
            let mut ws = vec![0.0f64; workspace_size::<f64>(piece.min(n), batch, false) / 8];
            let space = ReductionSpace::new(ws.as_mut_ptr(), piece.min(n), batch);
            let mut off = 0i64;
            while off < n {
                let len = piece.min(n - off);
                unsafe {
                    space
                        .sum(len as i32, batch as i32, off > 0, |b, i| (b + off + i) as f64)
                        .unwrap();
                }
                off += len;
            }
            for b in 0..batch {
                let expect: f64 = (0..n).map(|i| (b + i) as f64).sum();
                proptest::prop_assert_eq!(unsafe { space.accum(b) }, expect);
            }
        }
    }
}
