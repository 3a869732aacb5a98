// ── Credential material ──
//
// Random code/password generation and Argon2id hashing for stored
// secrets. Randomness comes straight from the OS via `getrandom`.

use argon2::{Algorithm, Argon2, Params, PasswordHasher, PasswordVerifier, Version};
use password_hash::{PasswordHash, SaltString};

use crate::config::HashCost;
use crate::error::CoreError;

/// Characters for voucher codes and passwords. No 0/O, 1/I/L.
pub const UNAMBIGUOUS_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

/// Draw `length` characters uniformly from `alphabet`.
pub fn random_string(alphabet: &[u8], length: usize) -> Result<String, CoreError> {
    if alphabet.is_empty() {
        return Err(CoreError::Internal("empty alphabet".into()));
    }
    // Largest multiple of the alphabet size that fits in a byte; bytes at or
    // above it are rejected to keep the draw unbiased.
    let span = alphabet.len();
    let ceiling = 256 - (256 % span);

    let mut out = String::with_capacity(length);
    let mut buf = [0u8; 64];
    while out.len() < length {
        getrandom::getrandom(&mut buf)
            .map_err(|e| CoreError::Internal(format!("OS randomness unavailable: {e}")))?;
        for &byte in &buf {
            let value = usize::from(byte);
            if value >= ceiling {
                continue;
            }
            if let Some(&ch) = alphabet.get(value % span) {
                out.push(char::from(ch));
            }
            if out.len() == length {
                break;
            }
        }
    }
    Ok(out)
}

/// Argon2id hasher with fixed cost parameters.
#[derive(Clone)]
pub struct SecretHasher {
    argon2: Argon2<'static>,
}

impl std::fmt::Debug for SecretHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretHasher")
            .field("params", self.argon2.params())
            .finish()
    }
}

impl SecretHasher {
    pub fn new(cost: HashCost) -> Result<Self, CoreError> {
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
            .map_err(|e| CoreError::validation(format!("invalid hash parameters: {e}")))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hash `secret` into a PHC string with a fresh random salt.
    pub fn hash(&self, secret: &str) -> Result<String, CoreError> {
        let mut salt_bytes = [0u8; 16];
        getrandom::getrandom(&mut salt_bytes)
            .map_err(|e| CoreError::Internal(format!("OS randomness unavailable: {e}")))?;
        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|e| CoreError::Internal(format!("salt encoding failed: {e}")))?;
        let phc = self
            .argon2
            .hash_password(secret.as_bytes(), &salt)
            .map_err(|e| CoreError::Internal(format!("password hashing failed: {e}")))?;
        Ok(phc.to_string())
    }

    /// Check `secret` against a stored PHC string. Malformed hashes never verify.
    pub fn verify(&self, secret: &str, phc: &str) -> bool {
        PasswordHash::new(phc)
            .is_ok_and(|parsed| self.argon2.verify_password(secret.as_bytes(), &parsed).is_ok())
    }
}
