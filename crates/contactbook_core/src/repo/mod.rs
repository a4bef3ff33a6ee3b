//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define storage contracts for the contact list and contact photos.
//! - Isolate SQLite and filesystem details from service orchestration.
//!
//! # Invariants
//! - Repository writes validate every contact before persistence.
//! - Unreadable stored data degrades to "no data" instead of an error.

pub mod contact_repo;
pub mod image_store;
pub mod kv_store;
