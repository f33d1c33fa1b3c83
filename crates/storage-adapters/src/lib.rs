//! # storage-adapters
//!
//! Implementations of the `domains` repository ports.
//! - [`memory::InMemoryStore`]: always compiled, used by tests, the seed
//!   tool and `database.url = "memory"`.
//! - `postgres::PgStore`: behind the `db-postgres` feature.

pub mod memory;

#[cfg(feature = "db-postgres")]
pub mod postgres;

pub use memory::InMemoryStore;

#[cfg(feature = "db-postgres")]
pub use postgres::PgStore;
