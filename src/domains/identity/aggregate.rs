use super::events::UserEvent;
use super::otp::{OneTimePasscode, OtpPurpose};
use crate::common::{AggregateRoot, DomainError, DomainResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Company,
    #[serde(rename = "Gig Worker")]
    GigWorker,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Company => "Company",
            Role::GigWorker => "Gig Worker",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Company" => Ok(Role::Company),
            "Gig Worker" => Ok(Role::GigWorker),
            other => Err(DomainError::validation(format!("Unknown role '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    Inactive,
    Active,
}

/// Input for a new account. The password is already hashed.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub status: AccountStatus,
    pub is_verified: bool,
    pub otp: Option<OneTimePasscode>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: u64,
    #[serde(skip)]
    uncommitted_events: Vec<UserEvent>,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_coordinate(value: Option<f64>, limit: f64, name: &str) -> DomainResult<()> {
    match value {
        Some(v) if !v.is_finite() || v.abs() > limit => {
            Err(DomainError::validation(format!("{} must be within ±{}", name, limit)))
        }
        _ => Ok(()),
    }
}

impl User {
    pub fn register(id: String, registration: Registration) -> DomainResult<Self> {
        let email = normalize_email(&registration.email);
        if email.is_empty() || !email.contains('@') {
            return Err(DomainError::validation("A valid email address is required"));
        }
        if registration.name.trim().is_empty() {
            return Err(DomainError::validation("Name is required"));
        }
        validate_coordinate(registration.latitude, 90.0, "latitude")?;
        validate_coordinate(registration.longitude, 180.0, "longitude")?;

        let now = Utc::now();
        let mut user = Self {
            id: id.clone(),
            name: String::new(),
            email: String::new(),
            password_hash: String::new(),
            role: registration.role,
            status: AccountStatus::Inactive,
            is_verified: false,
            otp: None,
            latitude: None,
            longitude: None,
            created_at: now,
            updated_at: now,
            version: 0,
            uncommitted_events: Vec::new(),
        };

        user.raise(UserEvent::UserRegistered {
            user_id: id,
            name: registration.name,
            email,
            password_hash: registration.password_hash,
            role: registration.role,
            latitude: registration.latitude,
            longitude: registration.longitude,
            timestamp: now,
        })?;
        Ok(user)
    }

    /// Store a fresh passcode, replacing any outstanding one.
    pub fn issue_otp(&mut self, code: &str, purpose: OtpPurpose, expires_at: DateTime<Utc>) -> DomainResult<()> {
        self.raise(UserEvent::OtpIssued {
            user_id: self.id.clone(),
            otp: OneTimePasscode::new(code, purpose, expires_at),
            timestamp: Utc::now(),
        })
    }

    /// Purpose a resent passcode should carry.
    pub fn pending_otp_purpose(&self) -> OtpPurpose {
        match &self.otp {
            Some(otp) => otp.purpose,
            None if !self.is_verified => OtpPurpose::Registration,
            None => OtpPurpose::PasswordReset,
        }
    }

    pub fn check_otp(&self, code: &str, purpose: OtpPurpose, now: DateTime<Utc>) -> DomainResult<()> {
        match &self.otp {
            Some(otp) if otp.matches(code, purpose, now) => Ok(()),
            _ => Err(DomainError::validation("Invalid or expired OTP")),
        }
    }

    pub fn verify_registration(&mut self, code: &str, now: DateTime<Utc>) -> DomainResult<()> {
        if self.is_verified {
            return Err(DomainError::conflict(format!("Account {} is already verified", self.email)));
        }
        self.check_otp(code, OtpPurpose::Registration, now)?;
        self.raise(UserEvent::AccountVerified {
            user_id: self.id.clone(),
            timestamp: now,
        })
    }

    pub fn reset_password(&mut self, code: &str, password_hash: String, now: DateTime<Utc>) -> DomainResult<()> {
        self.check_otp(code, OtpPurpose::PasswordReset, now)?;
        self.raise(UserEvent::PasswordReset {
            user_id: self.id.clone(),
            password_hash,
            timestamp: now,
        })
    }

    pub fn change_password(&mut self, password_hash: String) -> DomainResult<()> {
        self.raise(UserEvent::PasswordChanged {
            user_id: self.id.clone(),
            password_hash,
            timestamp: Utc::now(),
        })
    }

    pub fn update_profile(
        &mut self,
        name: Option<String>,
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> DomainResult<()> {
        if let Some(name) = &name {
            if name.trim().is_empty() {
                return Err(DomainError::validation("Name cannot be empty"));
            }
        }
        validate_coordinate(latitude, 90.0, "latitude")?;
        validate_coordinate(longitude, 180.0, "longitude")?;
        if name.is_none() && latitude.is_none() && longitude.is_none() {
            return Ok(());
        }
        self.raise(UserEvent::ProfileUpdated {
            user_id: self.id.clone(),
            name,
            latitude,
            longitude,
            timestamp: Utc::now(),
        })
    }

    pub fn ensure_can_login(&self) -> DomainResult<()> {
        if !self.is_verified || self.status != AccountStatus::Active {
            return Err(DomainError::unauthorized("Account has not been verified"));
        }
        Ok(())
    }
}

impl AggregateRoot for User {
    type Event = UserEvent;

    const AGGREGATE_TYPE: &'static str = "User";

    fn aggregate_id(&self) -> &str {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) -> DomainResult<()> {
        match event {
            UserEvent::UserRegistered {
                user_id,
                name,
                email,
                password_hash,
                role,
                latitude,
                longitude,
                timestamp,
            } => {
                self.id = user_id.clone();
                self.name = name.clone();
                self.email = email.clone();
                self.password_hash = password_hash.clone();
                self.role = *role;
                self.status = AccountStatus::Inactive;
                self.is_verified = false;
                self.latitude = *latitude;
                self.longitude = *longitude;
                self.created_at = *timestamp;
                self.updated_at = *timestamp;
            }
            UserEvent::OtpIssued { otp, timestamp, .. } => {
                self.otp = Some(otp.clone());
                self.updated_at = *timestamp;
            }
            UserEvent::AccountVerified { timestamp, .. } => {
                self.is_verified = true;
                self.status = AccountStatus::Active;
                self.otp = None;
                self.updated_at = *timestamp;
            }
            UserEvent::PasswordReset { password_hash, timestamp, .. } => {
                self.password_hash = password_hash.clone();
                self.otp = None;
                self.updated_at = *timestamp;
            }
            UserEvent::PasswordChanged { password_hash, timestamp, .. } => {
                self.password_hash = password_hash.clone();
                self.updated_at = *timestamp;
            }
            UserEvent::ProfileUpdated {
                name,
                latitude,
                longitude,
                timestamp,
                ..
            } => {
                if let Some(name) = name {
                    self.name = name.clone();
                }
                if latitude.is_some() {
                    self.latitude = *latitude;
                }
                if longitude.is_some() {
                    self.longitude = *longitude;
                }
                self.updated_at = *timestamp;
            }
        }
        self.version += 1;
        Ok(())
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        &self.uncommitted_events
    }

    fn mark_events_as_committed(&mut self) {
        self.uncommitted_events.clear();
    }

    fn add_event(&mut self, event: Self::Event) {
        self.uncommitted_events.push(event);
    }
}
