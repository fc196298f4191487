//! Credential hashing
//!
//! Argon2id with a deployment-tunable time cost. The cost, salt and algorithm
//! parameters are embedded in the PHC string, so verification keeps working for
//! hashes produced under an older cost.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use tracing::warn;

use crate::common::config::{AuthConfig, ConfigError};

#[derive(Debug, thiserror::Error)]
#[error("failed to hash secret: {0}")]
pub struct HashError(String);

#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
}

impl CredentialHasher {
    /// Builds the hasher from validated configuration.
    ///
    /// An out-of-range cost is reported as a configuration error so it
    /// surfaces at startup instead of on the first signup.
    pub fn new(config: &AuthConfig) -> Result<Self, ConfigError> {
        Self::with_cost(config.hash_cost)
    }

    pub fn with_cost(cost: u32) -> Result<Self, ConfigError> {
        let params = Params::new(
            Params::DEFAULT_M_COST,
            cost,
            Params::DEFAULT_P_COST,
            None,
        )
        .map_err(|e| ConfigError::Invalid {
            key: "HASH_COST",
            reason: e.to_string(),
        })?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Minimal memory cost so scenario tests stay fast in debug builds
    #[cfg(test)]
    pub(crate) fn fast_for_tests() -> Self {
        let params = Params::new(Params::MIN_M_COST.max(64), 1, 1, None)
            .expect("valid test params");
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }

    pub fn hash(&self, secret: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(secret.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| HashError(e.to_string()))
    }

    /// Returns true iff `candidate` matches `hashed`. A stored value that is not
    /// a valid PHC string counts as a mismatch.
    pub fn verify(&self, candidate: &str, hashed: &str) -> bool {
        let parsed = match PasswordHash::new(hashed) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "Stored credential hash could not be parsed");
                return false;
            }
        };

        self.argon2
            .verify_password(candidate.as_bytes(), &parsed)
            .is_ok()
    }
}
