use crate::common::{DomainError, DomainResult};
use crate::domains::identity::PasswordHasher;

/// bcrypt work factor used when the configuration leaves it unset.
pub const DEFAULT_HASH_COST: u32 = 10;

/// Costs bcrypt accepts.
pub const HASH_COST_RANGE: std::ops::RangeInclusive<u32> = 4..=31;

/// bcrypt password hashes in the `$2b$<cost>$<salt+digest>` format.
/// Each stored hash carries its own cost and salt.
#[derive(Debug, Clone)]
pub struct BcryptPasswordHasher {
    cost: u32,
}

impl BcryptPasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self {
            cost: cost.clamp(*HASH_COST_RANGE.start(), *HASH_COST_RANGE.end()),
        }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }
}

impl Default for BcryptPasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_HASH_COST)
    }
}

impl PasswordHasher for BcryptPasswordHasher {
    fn hash(&self, password: &str) -> DomainResult<String> {
        if password.is_empty() {
            return Err(DomainError::validation("Password cannot be empty"));
        }
        bcrypt::hash(password, self.cost)
            .map_err(|e| DomainError::Persistence(format!("Failed to hash password: {}", e)))
    }

    fn verify(&self, password: &str, stored_hash: &str) -> bool {
        // malformed hashes are a mismatch, not an error
        bcrypt::verify(password, stored_hash).unwrap_or(false)
    }
}
