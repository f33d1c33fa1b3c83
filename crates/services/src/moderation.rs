//! # Moderation administration
//!
//! Staff set or clear silence/ban windows. Hierarchy:
//! - superusers may moderate anyone but themselves
//! - staff may moderate neither themselves nor other staff/superusers

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use domains::{
    Actor, DenyReason, DomainError, DomainResult, ModerationPatch, Principal, User,
    UserRepository, WindowChange,
};

use crate::gate::{authorize, Action};
use crate::views::ModerationView;

pub const SILENCED_UNTIL: &str = "silenced_until";
pub const BANNED_UNTIL: &str = "banned_until";

/// Absent key → keep; `null`, `""`, `0`, `"0"` → clear; Unix seconds → set.
pub fn parse_window(raw: Option<&Value>) -> DomainResult<WindowChange> {
    let field = "moderation window";
    let secs = match raw {
        None => return Ok(WindowChange::Keep),
        Some(Value::Null) => return Ok(WindowChange::Clear),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(WindowChange::Clear),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        Some(_) => None,
    }
    .ok_or_else(|| DomainError::invalid(field, "expected Unix seconds or null"))?;

    if secs == 0 {
        return Ok(WindowChange::Clear);
    }
    DateTime::<Utc>::from_timestamp(secs, 0)
        .map(WindowChange::Set)
        .ok_or_else(|| DomainError::invalid(field, "timestamp out of range"))
}

/// Reads `silenced_until` / `banned_until` (camelCase accepted too).
pub fn parse_moderation_patch(request: &Map<String, Value>) -> DomainResult<ModerationPatch> {
    let pick = |snake: &str, camel: &str| request.get(snake).or_else(|| request.get(camel));
    Ok(ModerationPatch {
        silenced_until: parse_window(pick(SILENCED_UNTIL, "silencedUntil"))?,
        banned_until: parse_window(pick(BANNED_UNTIL, "bannedUntil"))?,
    })
}

pub fn check_hierarchy(actor: &Actor, target: &User) -> DomainResult<()> {
    if target.id == actor.id {
        return Err(DomainError::Forbidden(DenyReason::Hierarchy));
    }
    if !actor.is_superuser && target.is_privileged() {
        return Err(DomainError::Forbidden(DenyReason::Hierarchy));
    }
    Ok(())
}

#[derive(Clone)]
pub struct ModerationService {
    users: Arc<dyn UserRepository>,
}

impl ModerationService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    pub async fn set_moderation(
        &self,
        principal: &Principal,
        target_username: &str,
        request: &Map<String, Value>,
    ) -> DomainResult<ModerationView> {
        authorize(principal, Action::Moderate, None, Utc::now())?;
        let actor = principal.actor().ok_or(DomainError::Unauthenticated)?;
        let target = self
            .users
            .find_user_by_username(target_username)
            .await?
            .ok_or(DomainError::NotFound("user"))?;
        check_hierarchy(actor, &target)?;
        let patch = parse_moderation_patch(request)?;

        let profile = self.users.apply_moderation(target.id, patch).await?;
        tracing::info!(
            moderator = %actor.username,
            target = %target.username,
            silenced_until = ?profile.silenced_until,
            banned_until = ?profile.banned_until,
            "moderation applied"
        );
        Ok(ModerationView {
            username: target.username,
            silenced_until: profile.silenced_until,
            banned_until: profile.banned_until,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{MockUserRepository, Profile};
    use serde_json::json;
    use uuid::Uuid;

    fn actor(is_staff: bool, is_superuser: bool) -> Actor {
        Actor {
            id: Uuid::now_v7(),
            username: "mod".into(),
            is_staff,
            is_superuser,
            silenced_until: None,
            banned_until: None,
        }
    }

    fn user(id: Uuid, is_staff: bool, is_superuser: bool) -> User {
        User {
            id,
            username: "target".into(),
            is_staff,
            is_superuser,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn window_parsing() {
        assert_eq!(parse_window(None).unwrap(), WindowChange::Keep);
        for clear in [json!(null), json!(""), json!(0), json!("0")] {
            assert_eq!(parse_window(Some(&clear)).unwrap(), WindowChange::Clear);
        }
        let at = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        assert_eq!(parse_window(Some(&json!(1_700_000_000))).unwrap(), WindowChange::Set(at));
        assert_eq!(parse_window(Some(&json!("1700000000"))).unwrap(), WindowChange::Set(at));
        assert!(parse_window(Some(&json!("tomorrow"))).is_err());
        assert!(parse_window(Some(&json!(true))).is_err());
    }

    #[test]
    fn hierarchy_rules() {
        let staff = actor(true, false);
        let root = actor(true, true);
        let plain = Uuid::now_v7();
        let other_staff = Uuid::now_v7();

        assert!(check_hierarchy(&staff, &user(plain, false, false)).is_ok());
        assert_eq!(
            check_hierarchy(&staff, &user(other_staff, true, false)),
            Err(DomainError::Forbidden(DenyReason::Hierarchy))
        );
        assert_eq!(
            check_hierarchy(&staff, &user(Uuid::now_v7(), false, true)),
            Err(DomainError::Forbidden(DenyReason::Hierarchy))
        );
        assert_eq!(
            check_hierarchy(&staff, &user(staff.id, true, false)),
            Err(DomainError::Forbidden(DenyReason::Hierarchy))
        );
        assert!(check_hierarchy(&root, &user(other_staff, true, false)).is_ok());
        assert_eq!(
            check_hierarchy(&root, &user(root.id, true, true)),
            Err(DomainError::Forbidden(DenyReason::Hierarchy))
        );
    }

    #[tokio::test]
    async fn absent_keys_are_left_untouched() {
        let root = actor(true, true);
        let target_id = Uuid::now_v7();
        let banned_at = DateTime::<Utc>::from_timestamp(2_000_000_000, 0).unwrap();

        let mut users = MockUserRepository::new();
        users
            .expect_find_user_by_username()
            .returning(move |_| Ok(Some(user(target_id, false, false))));
        users
            .expect_apply_moderation()
            .withf(move |id, patch| {
                *id == target_id
                    && patch.silenced_until == WindowChange::Keep
                    && patch.banned_until == WindowChange::Set(banned_at)
            })
            .returning(move |id, patch| {
                let mut profile = Profile::empty(id);
                profile.banned_until = patch.banned_until.apply(None);
                Ok(profile)
            });

        let service = ModerationService::new(Arc::new(users));
        let request = json!({ "banned_until": 2_000_000_000 });
        let view = service
            .set_moderation(
                &Principal::Authenticated(root),
                "target",
                request.as_object().unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(view.banned_until, Some(banned_at));
        assert_eq!(view.silenced_until, None);
    }
}
