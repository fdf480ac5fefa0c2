use super::audit::commit_events;
use crate::common::{AggregateRoot, ApplicationError, ApplicationResult, DomainError, EventMetadata, EventStore};
use crate::domains::identity::{
    normalize_email, AuthenticatedUser, OtpGenerator, OtpPurpose, OtpSender, PasswordHasher,
    Registration, Role, User, UserProfile, UserRepository,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

const SOURCE: &str = "AuthService";

/// Sign-up request with a plain-text password.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationPending {
    pub user_id: String,
    pub email: String,
    pub message: String,
}

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    otp_sender: Arc<dyn OtpSender>,
    event_store: Arc<dyn EventStore>,
    otp: OtpGenerator,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        otp_sender: Arc<dyn OtpSender>,
        event_store: Arc<dyn EventStore>,
        otp: OtpGenerator,
    ) -> Self {
        Self {
            users,
            hasher,
            otp_sender,
            event_store,
            otp,
        }
    }

    /// Create an unverified account and mail it a registration passcode.
    pub async fn register(&self, request: RegisterUser) -> ApplicationResult<RegistrationPending> {
        let email = normalize_email(&request.email);
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(DomainError::conflict("Email already registered").into());
        }

        let password_hash = self.hasher.hash(&request.password)?;
        let mut user = User::register(
            Uuid::new_v4().to_string(),
            Registration {
                name: request.name,
                email,
                password_hash,
                role: request.role,
                latitude: request.latitude,
                longitude: request.longitude,
            },
        )?;

        let code = self.otp.generate();
        user.issue_otp(&code, OtpPurpose::Registration, self.otp.expiry_from(Utc::now()))?;
        self.users.create(&user).await?;
        self.commit(&mut user).await?;
        info!(user_id = %user.id, role = user.role.as_str(), "user registered");

        self.deliver_otp(&user.email, &code, OtpPurpose::Registration).await?;
        Ok(RegistrationPending {
            user_id: user.id.clone(),
            email: user.email.clone(),
            message: "User registered. Please verify OTP sent to your email.".to_string(),
        })
    }

    pub async fn verify_registration_otp(&self, email: &str, code: &str) -> ApplicationResult<UserProfile> {
        let mut user = self.load(email).await?;
        user.verify_registration(code.trim(), Utc::now())?;
        self.users.update(&user, user.committed_version()).await?;
        self.commit(&mut user).await?;
        info!(user_id = %user.id, "account verified");
        Ok(UserProfile::from(&user))
    }

    pub async fn login(&self, email: &str, password: &str) -> ApplicationResult<AuthenticatedUser> {
        let user = self.load(email).await?;
        if !self.hasher.verify(password, &user.password_hash) {
            warn!(user_id = %user.id, "login rejected: wrong password");
            return Err(DomainError::unauthorized("Invalid credentials").into());
        }
        user.ensure_can_login()?;
        Ok(AuthenticatedUser::from(&user))
    }

    /// Issue a new passcode for whatever the account is waiting on.
    pub async fn resend_otp(&self, email: &str) -> ApplicationResult<()> {
        let user = self.load(email).await?;
        let purpose = user.pending_otp_purpose();
        self.issue_and_send(user, purpose).await
    }

    pub async fn send_password_reset_otp(&self, email: &str) -> ApplicationResult<()> {
        let user = self.load(email).await?;
        self.issue_and_send(user, OtpPurpose::PasswordReset).await
    }

    /// Check a reset passcode without consuming it.
    pub async fn verify_password_reset_otp(&self, email: &str, code: &str) -> ApplicationResult<()> {
        let user = self.load(email).await?;
        user.check_otp(code.trim(), OtpPurpose::PasswordReset, Utc::now())?;
        Ok(())
    }

    pub async fn reset_password(&self, email: &str, code: &str, new_password: &str) -> ApplicationResult<()> {
        let mut user = self.load(email).await?;
        let password_hash = self.hasher.hash(new_password)?;
        user.reset_password(code.trim(), password_hash, Utc::now())?;
        self.users.update(&user, user.committed_version()).await?;
        self.commit(&mut user).await?;
        info!(user_id = %user.id, "password reset");
        Ok(())
    }

    pub async fn update_password(
        &self,
        email: &str,
        current_password: &str,
        new_password: &str,
    ) -> ApplicationResult<()> {
        let mut user = self.load(email).await?;
        if !self.hasher.verify(current_password, &user.password_hash) {
            return Err(DomainError::unauthorized("Current password is incorrect").into());
        }
        user.change_password(self.hasher.hash(new_password)?)?;
        self.users.update(&user, user.committed_version()).await?;
        self.commit(&mut user).await?;
        info!(user_id = %user.id, "password changed");
        Ok(())
    }

    async fn issue_and_send(&self, mut user: User, purpose: OtpPurpose) -> ApplicationResult<()> {
        let code = self.otp.generate();
        user.issue_otp(&code, purpose, self.otp.expiry_from(Utc::now()))?;
        self.users.update(&user, user.committed_version()).await?;
        self.commit(&mut user).await?;
        self.deliver_otp(&user.email, &code, purpose).await
    }

    async fn deliver_otp(&self, email: &str, code: &str, purpose: OtpPurpose) -> ApplicationResult<()> {
        self.otp_sender
            .send_otp(email, code, purpose)
            .await
            .map_err(|e| ApplicationError::Notification(format!("Failed to send OTP to {}: {}", email, e)))
    }

    async fn load(&self, email: &str) -> ApplicationResult<User> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(DomainError::validation("Email is required").into());
        }
        self.users
            .find_by_email(&email)
            .await?
            .ok_or_else(|| DomainError::not_found("User", email).into())
    }

    async fn commit(&self, user: &mut User) -> ApplicationResult<()> {
        let metadata = EventMetadata::from_source(SOURCE).with_actor(user.email.clone());
        commit_events(self.event_store.as_ref(), user, metadata).await
    }
}
