//! Runtime configuration.

use serde::{Deserialize, Serialize};

/// Storage key under which the signed-in identity is persisted.
pub const DEFAULT_SESSION_KEY: &str = "hospital_user";

/// Default PBKDF2 rounds for credential hashing.
pub const DEFAULT_HASH_ITERATIONS: u32 = 100_000;

/// Default log filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "medibook_core=info";

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MedibookConfig {
    pub gate: GateConfig,
    pub ledger: LedgerConfig,
    /// Number of days (from today) covered by seeded slots
    pub seed_days: u32,
}

impl Default for MedibookConfig {
    fn default() -> Self {
        Self {
            gate: GateConfig::default(),
            ledger: LedgerConfig::default(),
            seed_days: 14,
        }
    }
}

impl MedibookConfig {
    /// Parse from JSON; missing fields fall back to defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Session/access gate settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GateConfig {
    /// Snapshot key for the current identity
    pub session_key: String,
    /// PBKDF2-SHA256 iteration count
    pub hash_iterations: u32,
    /// Minimum accepted length for a new password
    pub min_password_len: usize,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            session_key: DEFAULT_SESSION_KEY.to_string(),
            hash_iterations: DEFAULT_HASH_ITERATIONS,
            min_password_len: 8,
        }
    }
}

/// Scheduling ledger settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LedgerConfig {
    /// Reject a second slot at the same `(doctor, date, start_time)`
    pub reject_duplicate_slots: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            reject_duplicate_slots: true,
        }
    }
}
