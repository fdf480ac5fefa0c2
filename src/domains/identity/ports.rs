use super::aggregate::User;
use super::otp::OtpPurpose;
use crate::common::DomainResult;
use async_trait::async_trait;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `Conflict` when the email is already registered.
    async fn create(&self, user: &User) -> DomainResult<()>;
    async fn find_by_email(&self, email: &str) -> DomainResult<Option<User>>;
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<User>>;
    /// Compare-and-swap on the stored version; a stale `expected_version` is a `Conflict`.
    async fn update(&self, user: &User, expected_version: u64) -> DomainResult<()>;
}

pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> DomainResult<String>;
    fn verify(&self, password: &str, stored_hash: &str) -> bool;
}

#[async_trait]
pub trait OtpSender: Send + Sync {
    async fn send_otp(&self, email: &str, code: &str, purpose: OtpPurpose) -> Result<(), String>;
}
