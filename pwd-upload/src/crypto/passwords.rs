//! Password hashing helpers built around Argon2id.
//! Every post password goes through the same parameter set so the site runtime
//! can verify any stored hash with a single code path.

use argon2::password_hash::SaltString;
use argon2::{password_hash, Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use rand::rngs::OsRng;

/// Argon2id cost parameters. The PHC string records them alongside the salt,
/// so changing them only affects hashes produced from now on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashParams {
    /// 64 MiB, 3 passes, 4 lanes.
    fn default() -> Self {
        Self {
            memory_kib: 64 * 1024,
            iterations: 3,
            parallelism: 4,
        }
    }
}

impl HashParams {
    fn argon2(&self) -> Result<Argon2<'static>, password_hash::Error> {
        let params = Params::new(self.memory_kib, self.iterations, self.parallelism, None)?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

/// Hashes a post password with Argon2id and returns the PHC string.
/// A fresh salt is drawn on every call, so hashing the same password twice
/// yields two different strings that both verify.
pub fn hash_password(plaintext: &str, params: &HashParams) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = params.argon2()?;
    let password_hash = argon2.hash_password(plaintext.as_bytes(), &salt)?.to_string();
    Ok(password_hash)
}

/// Verifies a plaintext password against a stored PHC string.
/// Cost parameters are read from the hash itself.
pub fn verify_password(plaintext: &str, stored_hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(stored_hash) {
        Ok(hash) => hash,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed_hash)
        .is_ok()
}

#[cfg(test)]
pub(crate) fn test_params() -> HashParams {
    HashParams {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    }
}
