//! Salted credential hashing.

use std::fmt;

use pbkdf2::pbkdf2_hmac;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

pub const SALT_LENGTH: usize = 16;
pub const HASH_LENGTH: usize = 32;

/// PBKDF2-SHA256 hash of a secret, hex-encoded with its salt.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PasswordHash {
    salt: String,
    hash: String,
    iterations: u32,
}

impl PasswordHash {
    /// Hash `secret` under a fresh random salt.
    pub fn derive(secret: &str, iterations: u32) -> Self {
        Self::derive_with_salt(secret, &generate_salt(), iterations)
    }

    /// Hash `secret` under a caller-supplied salt.
    pub fn derive_with_salt(secret: &str, salt: &[u8], iterations: u32) -> Self {
        let iterations = iterations.max(1);
        Self {
            salt: hex::encode(salt),
            hash: hex::encode(compute(secret, salt, iterations)),
            iterations,
        }
    }

    /// Constant-time check of `secret` against the stored hash.
    pub fn verify(&self, secret: &str) -> bool {
        let (Ok(salt), Ok(expected)) = (hex::decode(&self.salt), hex::decode(&self.hash)) else {
            return false;
        };
        let actual = compute(secret, &salt, self.iterations);
        actual.as_slice().ct_eq(expected.as_slice()).into()
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordHash")
            .field("iterations", &self.iterations)
            .finish_non_exhaustive()
    }
}

fn compute(secret: &str, salt: &[u8], iterations: u32) -> [u8; HASH_LENGTH] {
    let mut out = [0u8; HASH_LENGTH];
    pbkdf2_hmac::<Sha256>(secret.as_bytes(), salt, iterations, &mut out);
    out
}

/// Generate a cryptographically random salt.
pub fn generate_salt() -> [u8; SALT_LENGTH] {
    use rand::RngCore;
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}
