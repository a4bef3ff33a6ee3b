//! Core domain logic for the ContactBook app.
//! This crate is the single source of truth for contact invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod photo;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::contact::{
    Contact, ContactDraft, ContactId, ContactValidationError, Gender, ValidDraft,
};
pub use photo::{prepare_jpeg, PhotoError, PhotoSelection, SelectionToken, JPEG_QUALITY};
pub use repo::contact_repo::{
    ContactRepository, KvContactRepository, RepoError, RepoResult, CONTACTS_KEY,
};
pub use repo::image_store::{FsImageStore, ImageStore, ImageStoreError};
pub use repo::kv_store::{KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore};
pub use service::contact_book::{
    seed_contacts, ContactBook, ContactBookError, ContactBookResult, PhotoChange,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
