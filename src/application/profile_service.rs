use super::audit::commit_events;
use crate::common::{AggregateRoot, ApplicationResult, DomainError, EventMetadata, EventStore};
use crate::domains::identity::{normalize_email, LocationProfile, User, UserProfile, UserRepository};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Fields a user may change on their own profile. Unset fields are kept.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

pub struct ProfileService {
    users: Arc<dyn UserRepository>,
    event_store: Arc<dyn EventStore>,
}

impl ProfileService {
    pub fn new(users: Arc<dyn UserRepository>, event_store: Arc<dyn EventStore>) -> Self {
        Self { users, event_store }
    }

    pub async fn get_profile(&self, email: &str) -> ApplicationResult<UserProfile> {
        let user = self.load(email).await?;
        Ok(UserProfile::from(&user))
    }

    /// Change name and coordinates. New coordinates take effect on the next task created.
    pub async fn update_profile(&self, email: &str, update: ProfileUpdate) -> ApplicationResult<LocationProfile> {
        let mut user = self.load(email).await?;
        user.update_profile(update.name, update.latitude, update.longitude)?;
        self.users.update(&user, user.committed_version()).await?;

        let metadata = EventMetadata::from_source("ProfileService").with_actor(user.email.clone());
        commit_events(self.event_store.as_ref(), &mut user, metadata).await?;
        info!(user_id = %user.id, "profile updated");
        Ok(LocationProfile::from(&user))
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
}
