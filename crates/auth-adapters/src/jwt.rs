//! HS256 bearer tokens carrying the user id in `sub`.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use domains::{DomainError, DomainResult, TokenVerifier};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("failed to sign token: {0}")]
    Sign(#[from] jsonwebtoken::errors::Error),
}

pub struct JwtAuthenticator {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtAuthenticator {
    pub fn new(secret: &SecretString, ttl: Duration) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            validation,
            ttl,
        }
    }

    pub fn issue(&self, user_id: Uuid) -> Result<String, JwtError> {
        self.issue_with_ttl(user_id, self.ttl)
    }

    pub fn issue_with_ttl(&self, user_id: Uuid, ttl: Duration) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }
}

impl TokenVerifier for JwtAuthenticator {
    fn verify(&self, token: &str) -> DomainResult<Uuid> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims.sub)
            .map_err(|err| {
                tracing::debug!(error = %err, "rejected bearer token");
                DomainError::Unauthenticated
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authenticator(secret: &str) -> JwtAuthenticator {
        JwtAuthenticator::new(&SecretString::from(secret.to_string()), Duration::hours(1))
    }

    #[test]
    fn issued_tokens_verify_to_their_user() {
        let auth = authenticator("test-secret");
        let user = Uuid::now_v7();
        let token = auth.issue(user).unwrap();
        assert_eq!(auth.verify(&token).unwrap(), user);
    }

    #[test]
    fn foreign_and_broken_tokens_are_rejected() {
        let ours = authenticator("test-secret");
        let theirs = authenticator("other-secret");
        let token = theirs.issue(Uuid::now_v7()).unwrap();
        assert_eq!(ours.verify(&token), Err(DomainError::Unauthenticated));
        assert_eq!(ours.verify("not.a.jwt"), Err(DomainError::Unauthenticated));
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let auth = authenticator("test-secret");
        let token = auth
            .issue_with_ttl(Uuid::now_v7(), Duration::hours(-2))
            .unwrap();
        assert_eq!(auth.verify(&token), Err(DomainError::Unauthenticated));
    }
}
