// ── Engine configuration ──
//
// Tuning for voucher generation, credential hashing, and the sweeper.
// Core never reads config files; the CLI builds an `EngineConfig` from
// `netpass-config` and hands it in.

use std::time::Duration;

/// Voucher generation limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoucherSettings {
    /// Random characters per code (prefix not included).
    pub code_length: usize,
    pub password_length: usize,
    /// Upper bound for a single `generate` call.
    pub max_batch: u32,
    /// How often a colliding code is regenerated before giving up.
    pub collision_retries: u32,
}

impl Default for VoucherSettings {
    fn default() -> Self {
        Self {
            code_length: 8,
            password_length: 8,
            max_batch: 500,
            collision_retries: 5,
        }
    }
}

/// Argon2id cost parameters for stored password hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashCost {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashCost {
    fn default() -> Self {
        Self {
            memory_kib: argon2::Params::DEFAULT_M_COST,
            iterations: argon2::Params::DEFAULT_T_COST,
            parallelism: argon2::Params::DEFAULT_P_COST,
        }
    }
}

impl HashCost {
    /// Cheapest parameters argon2 accepts. Only suitable for tests.
    pub fn minimal() -> Self {
        Self {
            memory_kib: argon2::Params::MIN_M_COST,
            iterations: argon2::Params::MIN_T_COST,
            parallelism: argon2::Params::MIN_P_COST,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub vouchers: VoucherSettings,
    pub hash: HashCost,
    /// Expiration sweeper tick period.
    pub sweep_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            vouchers: VoucherSettings::default(),
            hash: HashCost::default(),
            sweep_interval: Duration::from_secs(60),
        }
    }
}
