//! Runtime configuration from the environment.
//!
//! | Variable | Meaning |
//! |----------|---------|
//! | `ROCRUS_LAYER` | layer-mode bitmask (1 trace, 2 bench, 4 profile) |
//! | `ROCRUS_CHECK_NUMERICS` | numerics bitmask (1 info, 2 warn, 4 fail, 8 only NaN/Inf) |
//! | `ROCRUS_DEVICE_MEMORY_SIZE` | fixed handle workspace in bytes; unset or 0 lets handles grow it |

use crate::types::{CheckNumericsMode, LayerMode};
use std::sync::OnceLock;

pub const ENV_LAYER: &str = "ROCRUS_LAYER";
pub const ENV_CHECK_NUMERICS: &str = "ROCRUS_CHECK_NUMERICS";
pub const ENV_DEVICE_MEMORY_SIZE: &str = "ROCRUS_DEVICE_MEMORY_SIZE";

/// Defaults a new handle starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RuntimeConfig {
    pub layer_mode: LayerMode,
    pub check_numerics: CheckNumericsMode,
    /// `None` means the handle manages (grows) its own workspace.
    pub device_memory_size: Option<usize>,
}

impl RuntimeConfig {
    /// Reads the environment now.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; unparsable values fall back to
    /// the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let parse = |key: &str| -> Option<u64> {
            let raw = lookup(key)?;
            match parse_number(raw.trim()) {
                Some(v) => Some(v),
                None => {
                    tracing::warn!(key, value = %raw, "ignoring unparsable environment value");
                    None
                }
            }
        };
        RuntimeConfig {
            layer_mode: LayerMode(parse(ENV_LAYER).unwrap_or(0) as u32 & 0x7),
            check_numerics: CheckNumericsMode(parse(ENV_CHECK_NUMERICS).unwrap_or(0) as u32 & 0xf),
            device_memory_size: parse(ENV_DEVICE_MEMORY_SIZE)
                .filter(|&v| v > 0)
                .map(|v| v as usize),
        }
    }

    /// Process-wide config, read on first use.
    pub fn global() -> &'static RuntimeConfig {
        static CONFIG: OnceLock<RuntimeConfig> = OnceLock::new();
        CONFIG.get_or_init(RuntimeConfig::from_env)
    }
}

/// Decimal or `0x` hexadecimal.
fn parse_number(s: &str) -> Option<u64> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> RuntimeConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RuntimeConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        assert_eq!(config(&[]), RuntimeConfig::default());
    }

    #[test]
    fn test_parses_masks_and_size() {
        let c = config(&[
            (ENV_LAYER, " 3 "),
            (ENV_CHECK_NUMERICS, "0x4"),
            (ENV_DEVICE_MEMORY_SIZE, "1048576"),
        ]);
        assert!(c.layer_mode.contains(LayerMode::LOG_TRACE));
        assert!(c.layer_mode.contains(LayerMode::LOG_BENCH));
        assert!(!c.layer_mode.contains(LayerMode::LOG_PROFILE));
        assert_eq!(c.check_numerics, CheckNumericsMode::FAIL);
        assert_eq!(c.device_memory_size, Some(1 << 20));
    }

    #[test]
    fn test_garbage_falls_back() {
        let c = config(&[(ENV_LAYER, "verbose"), (ENV_DEVICE_MEMORY_SIZE, "0")]);
        assert_eq!(c.layer_mode, LayerMode::NONE);
        assert_eq!(c.device_memory_size, None);
    }
}
