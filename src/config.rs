//! # Config — Sieve and Search Tunables
//!
//! Tunable parameters that are policy, not cryptographic recommendations
//! or hard limits — Miller-Rabin rounds, wheel size, search attempt caps.
//!
//! Mirrors a layered defaults-then-override approach minus any CLI layer:
//! this crate has no CLI surface, so `Config` is constructed
//! directly or loaded from a TOML file by the embedding application.

use serde::{Deserialize, Serialize};

/// Default Miller-Rabin rounds used by the vx6 block sieve.
pub const DEFAULT_MR_ROUNDS: u32 = 25;

/// Default cap on how many small primes `sieve_izm::choose_vx` may absorb
/// into the wheel.
pub const DEFAULT_VX_LIMIT: usize = 6;

/// Default cap on `search_p_in_iZm` attempts before a `SearchExhausted`
/// retry.
pub const DEFAULT_ATTEMPTS_LIMIT: u64 = 1_000_000;

/// Default cap on `set_random_base`'s search for an x coprime to vx.
pub const DEFAULT_COPRIME_SEARCH_LIMIT: u32 = 10_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Miller-Rabin rounds for the vx6 block sieve and random_iZprime.
    pub mr_rounds: u32,
    /// Max small primes absorbed into a segmented-sieve wheel.
    pub vx_limit: usize,
    /// Max `search_p_in_iZm` attempts before restarting the search.
    pub attempts_limit: u64,
    /// Max steps `set_random_base` takes looking for an x coprime to vx.
    pub coprime_search_limit: u32,
    /// Directory for benchmark/sieve artifacts; this crate never
    /// creates it, it is surfaced purely for caller convention.
    pub output_dir: String,
    /// Subdirectory of `output_dir` for per-block vx6 files.
    pub izm_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            mr_rounds: DEFAULT_MR_ROUNDS,
            vx_limit: DEFAULT_VX_LIMIT,
            attempts_limit: DEFAULT_ATTEMPTS_LIMIT,
            coprime_search_limit: DEFAULT_COPRIME_SEARCH_LIMIT,
            output_dir: "output".to_string(),
            izm_dir: "output/iZm".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, falling back to `Default` for
    /// any field the file omits.
    pub fn from_toml_file(path: &std::path::Path) -> anyhow::Result<Config> {
        let raw = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&raw)?;
        Ok(config)
    }

    /// The IPC receive-buffer size `random_iz_prime` uses when reading a
    /// candidate back from a worker: `bit_size / 3`, roughly one decimal
    /// digit per 3.32 bits, with slack.
    pub fn ipc_buffer_size(&self, bit_size: u32) -> usize {
        (bit_size as usize / 3).max(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values_match_documented_constants() {
        let c = Config::default();
        assert_eq!(c.mr_rounds, 25);
        assert_eq!(c.vx_limit, 6);
        assert_eq!(c.attempts_limit, 1_000_000);
        assert_eq!(c.coprime_search_limit, 10_000);
    }

    #[test]
    fn ipc_buffer_size_has_a_floor() {
        let c = Config::default();
        assert_eq!(c.ipc_buffer_size(30), 64);
        assert_eq!(c.ipc_buffer_size(3000), 1000);
    }

    #[test]
    fn toml_roundtrip_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "mr_rounds = 40\n").unwrap();
        let c = Config::from_toml_file(&path).unwrap();
        assert_eq!(c.mr_rounds, 40);
        assert_eq!(c.vx_limit, DEFAULT_VX_LIMIT);
    }
}
