//! Point-in-time moderation checks.
//!
//! Windows are never expired eagerly: a past `banned_until` simply stops
//! mattering once `now` moves beyond it.

use chrono::{DateTime, Utc};

use crate::models::Actor;

/// Result of evaluating an actor's windows against a single instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModerationStatus {
    pub banned: bool,
    pub silenced: bool,
}

impl ModerationStatus {
    pub fn evaluate(
        silenced_until: Option<DateTime<Utc>>,
        banned_until: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            banned: banned_until.is_some_and(|t| t > now),
            silenced: silenced_until.is_some_and(|t| t > now),
        }
    }

    pub fn of(actor: &Actor, now: DateTime<Utc>) -> Self {
        Self::evaluate(actor.silenced_until, actor.banned_until, now)
    }
}

/// What to do with one moderation window in a moderation request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WindowChange {
    /// Key absent from the request.
    #[default]
    Keep,
    Clear,
    Set(DateTime<Utc>),
}

impl WindowChange {
    pub fn apply(self, current: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
        match self {
            Self::Keep => current,
            Self::Clear => None,
            Self::Set(at) => Some(at),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModerationPatch {
    pub silenced_until: WindowChange,
    pub banned_until: WindowChange,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn past_windows_are_inert() {
        let now = Utc::now();
        let status = ModerationStatus::evaluate(
            Some(now - Duration::seconds(1)),
            Some(now - Duration::hours(1)),
            now,
        );
        assert_eq!(status, ModerationStatus::default());
    }

    #[test]
    fn future_windows_apply() {
        let now = Utc::now();
        let later = Some(now + Duration::hours(1));
        let status = ModerationStatus::evaluate(later, later, now);
        assert!(status.banned);
        assert!(status.silenced);
    }

    #[test]
    fn window_change_semantics() {
        let now = Utc::now();
        assert_eq!(WindowChange::Keep.apply(Some(now)), Some(now));
        assert_eq!(WindowChange::Clear.apply(Some(now)), None);
        assert_eq!(WindowChange::Set(now).apply(None), Some(now));
    }
}
