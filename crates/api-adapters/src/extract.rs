//! Request extractors.

use std::convert::Infallible;

use axum::body::Bytes;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use chrono::Utc;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use domains::{DomainError, Principal};
use services::{authorize, Action};

use crate::error::ApiError;

/// The caller resolved by the principal middleware; anonymous when absent.
pub struct CurrentPrincipal(pub Principal);

impl<S> FromRequestParts<S> for CurrentPrincipal
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            parts.extensions.get::<Principal>().cloned().unwrap_or_default(),
        ))
    }
}

/// Raw request body. It is decoded only after the caller-level gate rules
/// pass, so an anonymous, banned or silenced caller gets that denial rather
/// than a complaint about the body.
pub struct ApiBody(Bytes);

impl<S> FromRequest<S> for ApiBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Bytes::from_request(req, state)
            .await
            .map(Self)
            .map_err(|rejection| ApiError(DomainError::invalid("body", rejection.body_text())))
    }
}

impl ApiBody {
    /// Runs the gate for `action` without a resource, then parses the JSON.
    pub fn decode_for<T: DeserializeOwned>(
        &self,
        principal: &Principal,
        action: Action,
    ) -> Result<T, ApiError> {
        authorize(principal, action, None, Utc::now())?;
        serde_json::from_slice(&self.0).map_err(|e| {
            ApiError(DomainError::invalid("body", format!("invalid body: {e}")))
        })
    }
}

/// Ids in paths that do not parse address nothing.
pub fn parse_id(raw: &str, resource: &'static str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError(DomainError::NotFound(resource)))
}
