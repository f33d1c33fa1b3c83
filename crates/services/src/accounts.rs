//! Accounts, profiles and principal resolution.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use domains::{
    Actor, DomainError, DomainResult, NewUser, Principal, Profile, ProfileUpdate, User,
    UserRepository,
};

use crate::gate::{authorize, Action};
use crate::views::ProfileView;

pub const MAX_USERNAME_CHARS: usize = 150;
pub const MAX_DEVICE_CHARS: usize = 120;

/// 1-150 characters of letters, digits and `_ . @ + -`.
pub fn validate_username(username: &str) -> DomainResult<()> {
    let len = username.chars().count();
    if len == 0 || len > MAX_USERNAME_CHARS {
        return Err(DomainError::invalid(
            "username",
            format!("username must be 1 to {MAX_USERNAME_CHARS} characters"),
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '@' | '+' | '-'))
    {
        return Err(DomainError::invalid(
            "username",
            "only letters, digits and _ . @ + - are allowed",
        ));
    }
    Ok(())
}

#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserRepository>,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Creates the user together with an empty profile.
    pub async fn create_user(&self, new: NewUser) -> DomainResult<User> {
        validate_username(&new.username)?;
        let user = self.users.create_user(new, Utc::now()).await?;
        tracing::info!(user_id = %user.id, username = %user.username, "user created");
        Ok(user)
    }

    /// Builds the request principal for an authenticated user id. A token for
    /// a deleted account is treated as no authentication at all.
    pub async fn principal_for(&self, user_id: Uuid) -> DomainResult<Principal> {
        let Some(user) = self.users.find_user(user_id).await? else {
            return Err(DomainError::Unauthenticated);
        };
        let profile = self.profile_of(&user).await?;
        Ok(Principal::Authenticated(Actor::from_parts(&user, &profile)))
    }

    pub async fn get_profile(
        &self,
        principal: &Principal,
        username: &str,
    ) -> DomainResult<ProfileView> {
        authorize(principal, Action::Retrieve, None, Utc::now())?;
        let user = self
            .users
            .find_user_by_username(username)
            .await?
            .ok_or(DomainError::NotFound("user"))?;
        let profile = self.profile_of(&user).await?;
        Ok(ProfileView { user, profile })
    }

    pub async fn my_profile(&self, principal: &Principal) -> DomainResult<ProfileView> {
        authorize(principal, Action::UpdateOwnProfile, None, Utc::now())?;
        let user_id = principal.user_id().ok_or(DomainError::Unauthenticated)?;
        let user = self
            .users
            .find_user(user_id)
            .await?
            .ok_or(DomainError::NotFound("user"))?;
        let profile = self.profile_of(&user).await?;
        Ok(ProfileView { user, profile })
    }

    /// Bio, device and avatar. Allowed while silenced, refused while banned.
    pub async fn update_own_profile(
        &self,
        principal: &Principal,
        update: ProfileUpdate,
    ) -> DomainResult<ProfileView> {
        authorize(principal, Action::UpdateOwnProfile, None, Utc::now())?;
        let user_id = principal.user_id().ok_or(DomainError::Unauthenticated)?;
        if update
            .device
            .as_deref()
            .is_some_and(|d| d.chars().count() > MAX_DEVICE_CHARS)
        {
            return Err(DomainError::invalid(
                "device",
                format!("device must be at most {MAX_DEVICE_CHARS} characters"),
            ));
        }
        let user = self
            .users
            .find_user(user_id)
            .await?
            .ok_or(DomainError::NotFound("user"))?;
        let profile = self.users.update_profile(user_id, update).await?;
        Ok(ProfileView { user, profile })
    }

    /// For the ban notice: when the caller's ban ends, if one is active.
    pub fn active_ban(principal: &Principal, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        principal
            .actor()
            .and_then(|a| a.banned_until)
            .filter(|until| *until > now)
    }

    async fn profile_of(&self, user: &User) -> DomainResult<Profile> {
        self.users
            .get_profile(user.id)
            .await?
            .ok_or_else(|| DomainError::Internal(format!("user {} has no profile", user.id)))
    }
}
