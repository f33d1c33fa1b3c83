//! Voting and scoring. Scores are always the live sum of rating rows; no
//! counter is cached anywhere.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use domains::{Actor, DomainError, DomainResult, RatingRepository, Subject, VoteTally, VoteValue};

/// Parses the `value` field of a vote request: an integer (or integer
/// string) equal to 1 or -1.
pub fn parse_vote_value(raw: &serde_json::Value) -> DomainResult<VoteValue> {
    let parsed = match raw {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed
        .ok_or_else(|| DomainError::invalid("value", "value must be 1 or -1"))
        .and_then(VoteValue::try_from)
}

#[derive(Clone)]
pub struct VoteService {
    ratings: Arc<dyn RatingRepository>,
}

impl VoteService {
    pub fn new(ratings: Arc<dyn RatingRepository>) -> Self {
        Self { ratings }
    }

    /// Inserts or overwrites the caller's rating.
    pub async fn set_vote(
        &self,
        actor: &Actor,
        subject: Subject,
        value: VoteValue,
    ) -> DomainResult<VoteTally> {
        self.ratings
            .upsert_rating(subject, actor.id, value, Utc::now())
            .await?;
        let score = self.ratings.score(subject).await?;
        Ok(VoteTally {
            score,
            my_vote: value.as_i64(),
        })
    }

    /// Removes the caller's rating; a missing rating is not an error.
    pub async fn clear_vote(&self, actor: &Actor, subject: Subject) -> DomainResult<VoteTally> {
        self.ratings.delete_rating(subject, actor.id).await?;
        let score = self.ratings.score(subject).await?;
        Ok(VoteTally { score, my_vote: 0 })
    }

    /// Score plus the viewer's own vote; `my_vote` is 0 for anonymous viewers.
    pub async fn tally(&self, subject: Subject, viewer: Option<Uuid>) -> DomainResult<VoteTally> {
        let score = self.ratings.score(subject).await?;
        let my_vote = match viewer {
            Some(user_id) => self
                .ratings
                .vote_of(subject, user_id)
                .await?
                .map_or(0, VoteValue::as_i64),
            None => 0,
        };
        Ok(VoteTally { score, my_vote })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::MockRatingRepository;
    use mockall::predicate::eq;
    use serde_json::json;

    fn actor() -> Actor {
        Actor {
            id: Uuid::now_v7(),
            username: "voter".into(),
            is_staff: false,
            is_superuser: false,
            silenced_until: None,
            banned_until: None,
        }
    }

    #[test]
    fn vote_values_are_validated() {
        assert_eq!(parse_vote_value(&json!(1)).unwrap(), VoteValue::Up);
        assert_eq!(parse_vote_value(&json!("-1")).unwrap(), VoteValue::Down);
        for bad in [json!(2), json!(0), json!(1.5), json!("up"), json!(null), json!(true)] {
            assert!(matches!(
                parse_vote_value(&bad),
                Err(DomainError::InvalidInput { field: "value", .. })
            ));
        }
    }

    #[tokio::test]
    async fn clear_vote_without_rating_reports_zero() {
        let subject = Subject::Post(Uuid::now_v7());
        let mut ratings = MockRatingRepository::new();
        ratings
            .expect_delete_rating()
            .returning(|_, _| Ok(false));
        ratings
            .expect_score()
            .with(eq(subject))
            .returning(|_| Ok(3));

        let service = VoteService::new(Arc::new(ratings));
        let tally = service.clear_vote(&actor(), subject).await.unwrap();
        assert_eq!(tally, VoteTally { score: 3, my_vote: 0 });
    }

    #[tokio::test]
    async fn anonymous_tally_skips_own_vote_lookup() {
        let subject = Subject::ProfileComment(Uuid::now_v7());
        let mut ratings = MockRatingRepository::new();
        ratings.expect_score().returning(|_| Ok(-2));
        ratings.expect_vote_of().never();

        let service = VoteService::new(Arc::new(ratings));
        let tally = service.tally(subject, None).await.unwrap();
        assert_eq!(tally, VoteTally { score: -2, my_vote: 0 });
    }
}
