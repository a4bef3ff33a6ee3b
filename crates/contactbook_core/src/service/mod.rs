//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository and image store calls into form-level APIs.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod contact_book;
