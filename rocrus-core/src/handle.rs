//! Library handle: modes, stream, workspace and profile counters.

use crate::config::RuntimeConfig;
use crate::device::{DeviceAllocation, ALIGNMENT};
use crate::error::{BlasResult, Error};
use crate::status::Status;
use crate::stream::Stream;
use crate::types::{CheckNumericsMode, LayerMode, PointerMode};
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Rounds a workspace request up to the device alignment.
#[inline]
pub fn round_up(bytes: usize) -> usize {
    (bytes + ALIGNMENT - 1) / ALIGNMENT * ALIGNMENT
}

fn total_size(sizes: &[usize]) -> usize {
    sizes.iter().map(|&s| round_up(s)).sum()
}

#[derive(Debug)]
struct Workspace {
    memory: Option<DeviceAllocation>,
    /// Grow on demand instead of failing.
    managed: bool,
    /// Largest request seen while a size query is active.
    query: Option<usize>,
}

impl Workspace {
    fn capacity(&self) -> usize {
        self.memory.as_ref().map_or(0, DeviceAllocation::len_bytes)
    }
}

/// State shared by every routine call made through it.
///
/// A handle is `Sync`: routines take `&Handle`, and the workspace and
/// profile counters sit behind their own locks. Mode setters take
/// `&mut self` and are not meant to race with calls in flight.
pub struct Handle {
    pointer_mode: PointerMode,
    layer_mode: LayerMode,
    check_numerics: CheckNumericsMode,
    default_stream: Arc<Stream>,
    stream: Arc<Stream>,
    workspace: Mutex<Workspace>,
    profile: Mutex<BTreeMap<String, u64>>,
}

impl std::fmt::Debug for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handle")
            .field("pointer_mode", &self.pointer_mode)
            .field("layer_mode", &self.layer_mode)
            .field("check_numerics", &self.check_numerics)
            .field("device_memory_size", &self.get_device_memory_size())
            .finish()
    }
}

impl Handle {
    /// New handle configured from the process environment.
    pub fn new() -> Result<Self, Error> {
        Self::with_config(RuntimeConfig::global())
    }

    pub fn with_config(config: &RuntimeConfig) -> Result<Self, Error> {
        let stream = Arc::new(Stream::new()?);
        let handle = Handle {
            pointer_mode: PointerMode::Host,
            layer_mode: config.layer_mode,
            check_numerics: config.check_numerics,
            default_stream: Arc::clone(&stream),
            stream,
            workspace: Mutex::new(Workspace {
                memory: None,
                managed: true,
                query: None,
            }),
            profile: Mutex::new(BTreeMap::new()),
        };
        if let Some(bytes) = config.device_memory_size {
            handle.set_device_memory_size(bytes)?;
        }
        Ok(handle)
    }

    #[inline]
    pub fn pointer_mode(&self) -> PointerMode {
        self.pointer_mode
    }

    pub fn set_pointer_mode(&mut self, mode: PointerMode) {
        self.pointer_mode = mode;
    }

    #[inline]
    pub fn layer_mode(&self) -> LayerMode {
        self.layer_mode
    }

    pub fn set_layer_mode(&mut self, mode: LayerMode) {
        self.layer_mode = mode;
    }

    #[inline]
    pub fn check_numerics(&self) -> CheckNumericsMode {
        self.check_numerics
    }

    pub fn set_check_numerics(&mut self, mode: CheckNumericsMode) {
        self.check_numerics = mode;
    }

    pub fn stream(&self) -> &Arc<Stream> {
        &self.stream
    }

    /// Replaces the stream; `None` restores the handle's own stream.
    pub fn set_stream(&mut self, stream: Option<Arc<Stream>>) -> Result<(), Error> {
        self.stream.synchronize()?;
        self.stream = stream.unwrap_or_else(|| Arc::clone(&self.default_stream));
        Ok(())
    }

    /// Waits for pending asynchronous work before a kernel runs.
    pub fn sync_stream(&self) -> Result<(), Error> {
        self.stream.synchronize()
    }

    fn workspace(&self) -> MutexGuard<'_, Workspace> {
        self.workspace.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ------------------------------------------------------------------
    // Device memory
    // ------------------------------------------------------------------

    pub fn is_device_memory_size_query(&self) -> bool {
        self.workspace().query.is_some()
    }

    pub fn start_device_memory_size_query(&self) -> Result<(), Error> {
        let mut ws = self.workspace();
        if ws.query.is_some() {
            return Err(Error::SizeQueryMismatch("already started"));
        }
        ws.query = Some(0);
        Ok(())
    }

    /// Ends the query and returns the largest workspace requested during it.
    pub fn stop_device_memory_size_query(&self) -> Result<usize, Error> {
        self.workspace()
            .query
            .take()
            .ok_or(Error::SizeQueryMismatch("not started"))
    }

    /// Records the workspace a routine would need; only valid during a query.
    pub fn set_optimal_device_memory_size(&self, sizes: &[usize]) -> BlasResult {
        let total = total_size(sizes);
        let mut ws = self.workspace();
        let current = ws
            .query
            .as_mut()
            .ok_or(Error::SizeQueryMismatch("not started"))?;
        if total > *current {
            *current = total;
            Ok(Status::SizeIncreased)
        } else {
            Ok(Status::SizeUnchanged)
        }
    }

    /// Fixes the workspace at `bytes`; `0` hands management back to the handle.
    pub fn set_device_memory_size(&self, bytes: usize) -> Result<(), Error> {
        let mut ws = self.workspace();
        ws.memory = None;
        if bytes == 0 {
            ws.managed = true;
            return Ok(());
        }
        ws.managed = false;
        ws.memory = Some(DeviceAllocation::new(round_up(bytes))?);
        tracing::debug!(bytes, "fixed device workspace");
        Ok(())
    }

    pub fn get_device_memory_size(&self) -> usize {
        self.workspace().capacity()
    }

    pub fn is_managing_device_memory(&self) -> bool {
        self.workspace().managed
    }

    /// Carves one aligned segment per entry of `sizes` out of the workspace.
    ///
    /// A managed workspace grows to fit; a fixed one fails with
    /// [`Error::MemoryError`]. The guard holds the workspace until dropped.
    pub fn device_malloc(&self, sizes: &[usize]) -> Result<WorkspaceGuard<'_>, Error> {
        let total = total_size(sizes);
        let mut ws = self.workspace();
        if total > ws.capacity() {
            if !ws.managed {
                return Err(Error::MemoryError {
                    requested: total,
                    limit: ws.capacity(),
                });
            }
            ws.memory = None;
            ws.memory = Some(DeviceAllocation::new(total)?);
            tracing::debug!(bytes = total, "grew device workspace");
        }
        let mut offsets = SmallVec::new();
        let mut at = 0;
        for &s in sizes {
            offsets.push(at);
            at += round_up(s);
        }
        Ok(WorkspaceGuard { ws, offsets })
    }

    // ------------------------------------------------------------------
    // Profile
    // ------------------------------------------------------------------

    /// Counts one call with the given signature.
    pub fn record_profile(&self, signature: String) {
        let mut profile = self.profile.lock().unwrap_or_else(|e| e.into_inner());
        *profile.entry(signature).or_insert(0) += 1;
    }

    /// Call counts recorded so far, keyed by signature.
    pub fn profile_counts(&self) -> Vec<(String, u64)> {
        let profile = self.profile.lock().unwrap_or_else(|e| e.into_inner());
        profile.iter().map(|(k, v)| (k.clone(), *v)).collect()
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        if let Err(e) = self.stream.synchronize() {
            tracing::warn!(error = %e, "handle dropped with failed stream work");
        }
        let profile = std::mem::take(self.profile.get_mut().unwrap_or_else(|e| e.into_inner()));
        for (signature, count) in profile {
            tracing::info!(
                target: "rocrus::profile",
                "- {{ {signature}, call_count: {count} }}"
            );
        }
    }
}

/// Borrowed workspace segments returned by [`Handle::device_malloc`].
pub struct WorkspaceGuard<'a> {
    ws: MutexGuard<'a, Workspace>,
    offsets: SmallVec<[usize; 4]>,
}

impl WorkspaceGuard<'_> {
    /// Start of segment `i`, typed as `T`. Null when the workspace is empty.
    pub fn ptr<T>(&self, i: usize) -> *mut T {
        match &self.ws.memory {
            Some(m) if !m.as_ptr::<u8>().is_null() => {
                m.as_mut_ptr::<u8>().wrapping_add(self.offsets[i]) as *mut T
            }
            _ => std::ptr::null_mut(),
        }
    }

    pub fn segments(&self) -> usize {
        self.offsets.len()
    }
}
