use super::aggregate::Role;
use super::otp::OneTimePasscode;
use crate::common::DomainEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum UserEvent {
    UserRegistered {
        user_id: String,
        name: String,
        email: String,
        password_hash: String,
        role: Role,
        latitude: Option<f64>,
        longitude: Option<f64>,
        timestamp: DateTime<Utc>,
    },
    OtpIssued {
        user_id: String,
        otp: OneTimePasscode,
        timestamp: DateTime<Utc>,
    },
    AccountVerified {
        user_id: String,
        timestamp: DateTime<Utc>,
    },
    PasswordReset {
        user_id: String,
        password_hash: String,
        timestamp: DateTime<Utc>,
    },
    PasswordChanged {
        user_id: String,
        password_hash: String,
        timestamp: DateTime<Utc>,
    },
    ProfileUpdated {
        user_id: String,
        name: Option<String>,
        latitude: Option<f64>,
        longitude: Option<f64>,
        timestamp: DateTime<Utc>,
    },
}

impl DomainEvent for UserEvent {
    fn event_type(&self) -> &'static str {
        match self {
            UserEvent::UserRegistered { .. } => "UserRegistered",
            UserEvent::OtpIssued { .. } => "OtpIssued",
            UserEvent::AccountVerified { .. } => "AccountVerified",
            UserEvent::PasswordReset { .. } => "PasswordReset",
            UserEvent::PasswordChanged { .. } => "PasswordChanged",
            UserEvent::ProfileUpdated { .. } => "ProfileUpdated",
        }
    }

    fn aggregate_id(&self) -> &str {
        match self {
            UserEvent::UserRegistered { user_id, .. } => user_id,
            UserEvent::OtpIssued { user_id, .. } => user_id,
            UserEvent::AccountVerified { user_id, .. } => user_id,
            UserEvent::PasswordReset { user_id, .. } => user_id,
            UserEvent::PasswordChanged { user_id, .. } => user_id,
            UserEvent::ProfileUpdated { user_id, .. } => user_id,
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            UserEvent::UserRegistered { timestamp, .. } => *timestamp,
            UserEvent::OtpIssued { timestamp, .. } => *timestamp,
            UserEvent::AccountVerified { timestamp, .. } => *timestamp,
            UserEvent::PasswordReset { timestamp, .. } => *timestamp,
            UserEvent::PasswordChanged { timestamp, .. } => *timestamp,
            UserEvent::ProfileUpdated { timestamp, .. } => *timestamp,
        }
    }
}
