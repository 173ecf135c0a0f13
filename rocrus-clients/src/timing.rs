//! Wall-clock helpers in microseconds.

use rocrus_core::{Error, Stream};
use std::sync::OnceLock;
use std::time::Instant;

fn epoch() -> Instant {
    static EPOCH: OnceLock<Instant> = OnceLock::new();
    *EPOCH.get_or_init(Instant::now)
}

/// Microseconds since the first call of either helper.
pub fn time_us_no_sync() -> f64 {
    epoch().elapsed().as_secs_f64() * 1e6
}

/// Like [`time_us_no_sync`], after draining `stream`.
pub fn time_us_sync(stream: &Stream) -> Result<f64, Error> {
    stream.synchronize()?;
    Ok(time_us_no_sync())
}
