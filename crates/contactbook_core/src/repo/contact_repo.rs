//! Contact list persistence over a key-value slot.
//!
//! # Responsibility
//! - Load and save the whole ordered contact list as one JSON blob.
//! - Degrade unreadable stored data to "no data" instead of failing startup.
//! - Keep every readable record when some stored records are invalid.
//!
//! # Invariants
//! - Every save rewrites the full list; there is no delta persistence.
//! - Encoding is deterministic: the same list always yields the same bytes.
//! - Loaded lists never contain duplicate ids.

use crate::db::DbError;
use crate::model::contact::{Contact, ContactValidationError, ContactWire};
use crate::repo::kv_store::KeyValueStore;
use log::{debug, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Fixed key holding the serialized contact list.
pub const CONTACTS_KEY: &str = "savedContacts";

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence error for the contact list and its key-value backend.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    Serialization(serde_json::Error),
    Validation(ContactValidationError),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Serialization(err) => write!(f, "contact list serialization failed: {err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "database schema version {actual_version} is behind required {expected_version}; open it with db::open_db"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::UninitializedConnection { .. } | Self::MissingRequiredTable(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

impl From<ContactValidationError> for RepoError {
    fn from(value: ContactValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Whole-list contact persistence.
pub trait ContactRepository {
    /// Loads the stored list in saved order.
    ///
    /// Missing, unreadable or malformed data yields an empty list. Records
    /// that parse but fail validation are skipped one by one.
    fn load_all(&self) -> Vec<Contact>;
    /// Replaces the stored list with `contacts`.
    fn save_all(&self, contacts: &[Contact]) -> RepoResult<()>;
}

impl<R: ContactRepository + ?Sized> ContactRepository for &R {
    fn load_all(&self) -> Vec<Contact> {
        (**self).load_all()
    }

    fn save_all(&self, contacts: &[Contact]) -> RepoResult<()> {
        (**self).save_all(contacts)
    }
}

/// Contact repository storing the list under `CONTACTS_KEY`.
pub struct KvContactRepository<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> KvContactRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Borrows the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: KeyValueStore> ContactRepository for KvContactRepository<S> {
    fn load_all(&self) -> Vec<Contact> {
        let bytes = match self.store.get(CONTACTS_KEY) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!("event=contacts_load module=repo status=empty");
                return Vec::new();
            }
            Err(err) => {
                warn!("event=contacts_load module=repo status=error error_code=read_failed error={err}");
                return Vec::new();
            }
        };

        match decode_contacts(&bytes) {
            Ok(contacts) => {
                debug!(
                    "event=contacts_load module=repo status=ok count={}",
                    contacts.len()
                );
                contacts
            }
            Err(err) => {
                warn!(
                    "event=contacts_load module=repo status=error error_code=decode_failed bytes={} error={}",
                    bytes.len(),
                    err
                );
                Vec::new()
            }
        }
    }

    fn save_all(&self, contacts: &[Contact]) -> RepoResult<()> {
        let bytes = encode_contacts(contacts)?;
        self.store.set(CONTACTS_KEY, &bytes)?;
        debug!(
            "event=contacts_save module=repo status=ok count={} bytes={}",
            contacts.len(),
            bytes.len()
        );
        Ok(())
    }
}

/// Serializes a contact list to its stored JSON form.
pub fn encode_contacts(contacts: &[Contact]) -> RepoResult<Vec<u8>> {
    for contact in contacts {
        contact.validate()?;
    }
    Ok(serde_json::to_vec(contacts)?)
}

/// Parses a stored JSON contact list.
///
/// Only a blob that is not a JSON array of contact records is an error.
/// Records failing validation, and records repeating an earlier id, are
/// dropped with a `warn` event; the rest load in stored order.
pub fn decode_contacts(bytes: &[u8]) -> RepoResult<Vec<Contact>> {
    let records: Vec<ContactWire> = serde_json::from_slice(bytes)?;
    let mut seen = HashSet::with_capacity(records.len());
    let mut contacts = Vec::with_capacity(records.len());
    for record in records {
        let id = record.id;
        let contact = match Contact::try_from(record) {
            Ok(contact) => contact,
            Err(err) => {
                warn!(
                    "event=contacts_load module=repo status=warn error_code=invalid_record contact_id={} error={}",
                    id, err
                );
                continue;
            }
        };
        if seen.insert(contact.id) {
            contacts.push(contact);
        } else {
            warn!(
                "event=contacts_load module=repo status=warn error_code=duplicate_id contact_id={}",
                contact.id
            );
        }
    }
    Ok(contacts)
}
