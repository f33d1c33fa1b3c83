//! rusty-forum/crates/domains/src/lib.rs
//!
//! Entities, error taxonomy and port traits shared by every other crate.
//! Nothing in here performs I/O.

pub mod errors;
pub mod models;
pub mod moderation;
pub mod ports;

// Re-exporting for easier access in other crates
pub use errors::*;
pub use models::*;
pub use moderation::*;
pub use ports::*;
