//! # auth-adapters
//!
//! Token verification for the API layer. The session/login flow that issues
//! tokens in production lives outside this service; `issue` exists for the
//! seed tool and tests.

#[cfg(feature = "auth-jwt")]
pub mod jwt;

#[cfg(feature = "auth-jwt")]
pub use jwt::{Claims, JwtAuthenticator, JwtError};
