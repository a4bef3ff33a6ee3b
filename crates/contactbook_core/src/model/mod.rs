//! Contact domain model.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep form validation rules next to the record they guard.
//!
//! # Invariants
//! - Every contact is identified by a stable `ContactId`.

pub mod contact;
