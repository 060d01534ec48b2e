use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::{SaltString, rand_core::OsRng},
};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum HashError {
    #[error("Invalid Argon2 parameters: {0}")]
    Params(argon2::Error),

    #[error("Password hashing failed: {0}")]
    Hash(argon2::password_hash::Error),
}

/// Argon2id cost settings. Defaults follow the OWASP baseline
/// (19 MiB, 2 passes, 1 lane).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for CostParams {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

impl CostParams {
    /// Smallest settings Argon2 accepts. Only meant for test suites.
    pub fn minimal() -> Self {
        Self {
            memory_kib: Params::MIN_M_COST,
            iterations: Params::MIN_T_COST,
            parallelism: Params::MIN_P_COST,
        }
    }

    pub fn is_weaker_than(&self, other: &CostParams) -> bool {
        self.memory_kib < other.memory_kib
            || self.iterations < other.iterations
            || self.parallelism < other.parallelism
    }
}

/// Derives and checks password hashes.
///
/// Hashing uses the configured cost; verification always uses whatever salt
/// and cost are embedded in the stored string.
#[derive(Clone)]
pub struct Credentials {
    argon2: Argon2<'static>,
}

impl Credentials {
    pub fn new(cost: CostParams) -> Result<Self, HashError> {
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
            .map_err(HashError::Params)?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hash `plaintext` with a fresh random 16-byte salt into a PHC string
    /// (`$argon2id$v=19$m=..,t=..,p=..$<salt>$<hash>`).
    pub fn set_password(&self, plaintext: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(HashError::Hash)?;
        Ok(hash.to_string())
    }

    /// Constant-time check of `plaintext` against a stored hash.
    ///
    /// Fails closed: an absent or unparseable hash is `false`, never an error.
    pub fn check_password(&self, stored: Option<&str>, plaintext: &str) -> bool {
        let Some(stored) = stored.filter(|s| !s.is_empty()) else {
            return false;
        };

        let parsed = match PasswordHash::new(stored) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Stored password hash is unreadable: {}", e);
                return false;
            }
        };

        self.argon2
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }
}
