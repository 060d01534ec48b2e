/// Logbook Crypto Library
///
/// Password credentials only: Argon2id hashing and verification.
/// Stored hashes are self-describing PHC strings, so changing the cost
/// parameters never invalidates existing accounts.

pub mod password;

pub use password::{CostParams, Credentials, HashError};
