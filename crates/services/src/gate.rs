//! # Authorization Gate
//!
//! One decision procedure for every mutating or listing operation on
//! threads, posts and profile comments. Rules are evaluated in order and the
//! first match wins:
//!
//! 1. auth-requiring action without a caller → `Unauthenticated`
//! 2. caller banned → `Forbidden(Banned)`
//! 3. caller silenced and the action creates or edits content → `Forbidden(Silenced)`
//! 4. edit/delete on an owned resource by a non-owner, non-staff caller → `Forbidden(NotAuthor)`
//! 5. reads are allowed
//! 6. history and moderation need staff or superuser → `Forbidden(StaffOnly)`

use chrono::{DateTime, Utc};
use uuid::Uuid;

use domains::{
    DenyReason, DomainError, DomainResult, ModerationStatus, Post, Principal, ProfileComment,
    Thread,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    List,
    Retrieve,
    Create,
    Edit,
    Delete,
    Vote,
    ViewHistory,
    Moderate,
    /// Listing and acknowledging one's own notifications.
    ReadNotifications,
    /// Self-service profile fields (bio, device, avatar).
    UpdateOwnProfile,
}

impl Action {
    pub fn requires_auth(self) -> bool {
        !matches!(self, Self::List | Self::Retrieve)
    }

    /// Actions a silenced caller may not perform.
    fn writes_content(self) -> bool {
        matches!(self, Self::Create | Self::Edit)
    }

    fn is_staff_only(self) -> bool {
        matches!(self, Self::ViewHistory | Self::Moderate)
    }
}

/// Capability interface the gate needs from a resource.
pub trait Owned {
    fn author_id(&self) -> Uuid;

    /// A user who may delete (but not edit) the resource besides its author,
    /// e.g. the owner of the profile a comment was left on.
    fn host_owner_id(&self) -> Option<Uuid> {
        None
    }
}

impl Owned for Thread {
    fn author_id(&self) -> Uuid {
        self.author_id
    }
}

impl Owned for Post {
    fn author_id(&self) -> Uuid {
        self.author_id
    }
}

impl Owned for ProfileComment {
    fn author_id(&self) -> Uuid {
        self.author_id
    }

    fn host_owner_id(&self) -> Option<Uuid> {
        Some(self.profile_user_id)
    }
}

/// Evaluates the rules above.
///
/// Without a `resource`, only the caller-level rules (1-3, 5, 6) apply; the
/// services call it that way before loading the object and again with the
/// object once it exists, so a banned caller is refused before any lookup.
pub fn authorize(
    principal: &Principal,
    action: Action,
    resource: Option<&dyn Owned>,
    now: DateTime<Utc>,
) -> DomainResult<()> {
    let actor = match principal {
        Principal::Anonymous if action.requires_auth() => {
            return Err(DomainError::Unauthenticated)
        }
        Principal::Anonymous => return Ok(()),
        Principal::Authenticated(actor) => actor,
    };

    let status = ModerationStatus::of(actor, now);
    if status.banned {
        return Err(DomainError::Forbidden(DenyReason::Banned));
    }
    if status.silenced && action.writes_content() {
        return Err(DomainError::Forbidden(DenyReason::Silenced));
    }

    match action {
        Action::Edit | Action::Delete => {
            let Some(resource) = resource else {
                return Ok(());
            };
            let owns = resource.author_id() == actor.id
                || (action == Action::Delete && resource.host_owner_id() == Some(actor.id));
            if owns || actor.is_privileged() {
                Ok(())
            } else {
                Err(DomainError::Forbidden(DenyReason::NotAuthor))
            }
        }
        _ if action.is_staff_only() && !actor.is_privileged() => {
            Err(DomainError::Forbidden(DenyReason::StaffOnly))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use domains::Actor;

    fn actor(id: Uuid) -> Actor {
        Actor {
            id,
            username: "someone".into(),
            is_staff: false,
            is_superuser: false,
            silenced_until: None,
            banned_until: None,
        }
    }

    fn post_by(author_id: Uuid) -> Post {
        Post {
            id: Uuid::now_v7(),
            thread_id: Uuid::now_v7(),
            author_id,
            body: "body".into(),
            created_at: Utc::now(),
            edited_at: None,
        }
    }

    fn comment(author_id: Uuid, profile_user_id: Uuid) -> ProfileComment {
        ProfileComment {
            id: Uuid::now_v7(),
            profile_user_id,
            author_id,
            body: "hey".into(),
            created_at: Utc::now(),
            edited_at: None,
        }
    }

    #[test]
    fn anonymous_may_read_but_not_write() {
        let now = Utc::now();
        let anon = Principal::Anonymous;
        assert!(authorize(&anon, Action::List, None, now).is_ok());
        assert!(authorize(&anon, Action::Retrieve, None, now).is_ok());
        for action in [
            Action::Create,
            Action::Edit,
            Action::Delete,
            Action::Vote,
            Action::ViewHistory,
        ] {
            assert_eq!(
                authorize(&anon, action, None, now),
                Err(DomainError::Unauthenticated)
            );
        }
    }

    #[test]
    fn banned_actor_is_refused_even_for_reads() {
        let now = Utc::now();
        let mut banned = actor(Uuid::now_v7());
        banned.banned_until = Some(now + Duration::hours(1));
        let principal = Principal::Authenticated(banned);
        for action in [Action::List, Action::Retrieve, Action::Create, Action::Vote] {
            assert_eq!(
                authorize(&principal, action, None, now),
                Err(DomainError::Forbidden(DenyReason::Banned))
            );
        }
    }

    #[test]
    fn ban_outranks_silence() {
        let now = Utc::now();
        let mut both = actor(Uuid::now_v7());
        both.banned_until = Some(now + Duration::hours(1));
        both.silenced_until = Some(now + Duration::hours(1));
        assert_eq!(
            authorize(&Principal::Authenticated(both), Action::Create, None, now),
            Err(DomainError::Forbidden(DenyReason::Banned))
        );
    }

    #[test]
    fn silenced_actor_can_delete_and_vote_only() {
        let now = Utc::now();
        let mut silenced = actor(Uuid::now_v7());
        silenced.silenced_until = Some(now + Duration::minutes(5));
        let own = post_by(silenced.id);
        let principal = Principal::Authenticated(silenced);

        assert_eq!(
            authorize(&principal, Action::Create, None, now),
            Err(DomainError::Forbidden(DenyReason::Silenced))
        );
        assert_eq!(
            authorize(&principal, Action::Edit, Some(&own), now),
            Err(DomainError::Forbidden(DenyReason::Silenced))
        );
        assert!(authorize(&principal, Action::Delete, Some(&own), now).is_ok());
        assert!(authorize(&principal, Action::Vote, None, now).is_ok());
    }

    #[test]
    fn expired_windows_do_not_apply() {
        let now = Utc::now();
        let mut former = actor(Uuid::now_v7());
        former.banned_until = Some(now - Duration::seconds(1));
        former.silenced_until = Some(now - Duration::seconds(1));
        assert!(authorize(&Principal::Authenticated(former), Action::Create, None, now).is_ok());
    }

    #[test]
    fn only_author_or_staff_may_edit() {
        let now = Utc::now();
        let author = actor(Uuid::now_v7());
        let stranger = actor(Uuid::now_v7());
        let mut staff = actor(Uuid::now_v7());
        staff.is_staff = true;
        let mut root = actor(Uuid::now_v7());
        root.is_superuser = true;
        let post = post_by(author.id);

        let (author, staff, root) = (
            Principal::Authenticated(author),
            Principal::Authenticated(staff),
            Principal::Authenticated(root),
        );
        assert!(authorize(&author, Action::Edit, Some(&post), now).is_ok());
        assert!(authorize(&staff, Action::Delete, Some(&post), now).is_ok());
        assert!(authorize(&root, Action::Edit, Some(&post), now).is_ok());
        assert_eq!(
            authorize(&Principal::Authenticated(stranger), Action::Delete, Some(&post), now),
            Err(DomainError::Forbidden(DenyReason::NotAuthor))
        );
    }

    #[test]
    fn profile_owner_may_delete_but_not_edit_foreign_comment() {
        let now = Utc::now();
        let owner = actor(Uuid::now_v7());
        let c = comment(Uuid::now_v7(), owner.id);
        let principal = Principal::Authenticated(owner);
        assert!(authorize(&principal, Action::Delete, Some(&c), now).is_ok());
        assert_eq!(
            authorize(&principal, Action::Edit, Some(&c), now),
            Err(DomainError::Forbidden(DenyReason::NotAuthor))
        );
    }

    #[test]
    fn history_and_moderation_are_staff_only() {
        let now = Utc::now();
        let user = Principal::Authenticated(actor(Uuid::now_v7()));
        let mut staff = actor(Uuid::now_v7());
        staff.is_staff = true;
        let staff = Principal::Authenticated(staff);

        for action in [Action::ViewHistory, Action::Moderate] {
            assert_eq!(
                authorize(&user, action, None, now),
                Err(DomainError::Forbidden(DenyReason::StaffOnly))
            );
            assert!(authorize(&staff, action, None, now).is_ok());
        }
    }
}
