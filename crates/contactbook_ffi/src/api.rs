//! FFI use-case API for the contact forms and list.
//!
//! # Responsibility
//! - Expose form-level contact operations to Dart via FRB.
//! - Resolve the on-device data directory once per process.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Failures are reported in response envelopes, never thrown.
//! - Contact list read-modify-write cycles are serialized per process.

use contactbook_core::db::open_db;
use contactbook_core::photo::{prepare_jpeg, read_photo_file};
use contactbook_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, Contact, ContactBook,
    ContactBookError, ContactBookResult, ContactDraft, FsImageStore, Gender, KvContactRepository,
    PhotoChange, SqliteKeyValueStore,
};
use log::warn;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock, PoisonError};
use uuid::Uuid;

const DATA_DIR_ENV: &str = "CONTACTBOOK_DATA_DIR";
const DEFAULT_DATA_DIR_NAME: &str = "contactbook";
const DB_FILE_NAME: &str = "contactbook.sqlite3";
const IMAGES_DIR_NAME: &str = "images";

static DATA_DIR: OnceLock<PathBuf> = OnceLock::new();
static BOOK_LOCK: Mutex<()> = Mutex::new(());

type EntryBook<'conn> = ContactBook<KvContactRepository<SqliteKeyValueStore<'conn>>, FsImageStore>;

/// Expose core crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Contact row as rendered by the list and detail views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactItem {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub company: String,
    /// `Male|Female|Unknown`.
    pub gender: String,
    /// Existing photo file, or `None` to render the placeholder.
    pub image_path: Option<String>,
}

/// List response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactListResponse {
    pub ok: bool,
    /// Filtered contacts in stored order.
    pub items: Vec<ContactItem>,
    pub message: String,
}

/// Mutation response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactActionResponse {
    pub ok: bool,
    /// Affected contact, when exactly one was affected.
    pub contact: Option<ContactItem>,
    pub message: String,
}

impl ContactActionResponse {
    fn success(message: impl Into<String>, contact: Option<ContactItem>) -> Self {
        Self {
            ok: true,
            contact,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            contact: None,
            message: message.into(),
        }
    }
}

/// Picked photo converted to the stored JPEG form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoPrepareResponse {
    pub ok: bool,
    pub jpeg: Option<Vec<u8>>,
    pub message: String,
}

/// Gender labels for the form picker, in display order.
#[flutter_rust_bridge::frb(sync)]
pub fn contact_genders() -> Vec<String> {
    Gender::ALL
        .iter()
        .map(|gender| gender.as_str().to_string())
        .collect()
}

/// Whether the add/edit form's Done button should be enabled.
#[flutter_rust_bridge::frb(sync)]
pub fn contact_draft_is_valid(first_name: String, last_name: String, gender: String) -> bool {
    ContactDraft::new(first_name, last_name, "", Gender::parse(&gender)).is_complete()
}

/// Lists contacts matching `query` (blank query lists everything).
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn contact_list(query: String) -> ContactListResponse {
    let result = with_contact_book(|book| {
        let book: &EntryBook<'_> = book;
        Ok(book
            .filter(&query)
            .into_iter()
            .map(|contact| to_contact_item(book, contact))
            .collect::<Vec<_>>())
    });

    match result {
        Ok(items) => {
            let message = if items.is_empty() && !query.is_empty() {
                format!("No results for \"{query}\".")
            } else {
                format!("{} contact(s).", items.len())
            };
            ContactListResponse {
                ok: true,
                items,
                message,
            }
        }
        Err(err) => ContactListResponse {
            ok: false,
            items: Vec::new(),
            message: format!("contact_list failed: {err}"),
        },
    }
}

/// Add-form confirmation.
///
/// `photo` holds JPEG bytes from `photo_prepare`; a photo that cannot be
/// stored is dropped and the contact is still created.
#[flutter_rust_bridge::frb(sync)]
pub fn contact_add(
    first_name: String,
    last_name: String,
    company: String,
    gender: String,
    photo: Option<Vec<u8>>,
) -> ContactActionResponse {
    let draft = match build_draft(first_name, last_name, company, &gender) {
        Ok(draft) => draft,
        Err(message) => return ContactActionResponse::failure(message),
    };

    let result = with_contact_book(|book| {
        let contact = book.create(&draft, photo.as_deref())?;
        Ok(to_contact_item(book, &contact))
    });
    match result {
        Ok(item) => ContactActionResponse::success("Contact added.", Some(item)),
        Err(err) => ContactActionResponse::failure(format!("contact_add failed: {err}")),
    }
}

/// Edit-form confirmation for contact `id`.
///
/// `photo` replaces the current photo; `remove_photo` clears it. With
/// neither, the current photo is kept.
#[flutter_rust_bridge::frb(sync)]
pub fn contact_update(
    id: String,
    first_name: String,
    last_name: String,
    company: String,
    gender: String,
    photo: Option<Vec<u8>>,
    remove_photo: bool,
) -> ContactActionResponse {
    let id = match parse_contact_id(&id) {
        Ok(id) => id,
        Err(message) => return ContactActionResponse::failure(message),
    };
    let draft = match build_draft(first_name, last_name, company, &gender) {
        Ok(draft) => draft,
        Err(message) => return ContactActionResponse::failure(message),
    };
    let change = match (photo.as_deref(), remove_photo) {
        (Some(jpeg), _) => PhotoChange::Replace(jpeg),
        (None, true) => PhotoChange::Remove,
        (None, false) => PhotoChange::Keep,
    };

    let result = with_contact_book(|book| {
        let contact = book.edit(id, &draft, change)?;
        Ok(to_contact_item(book, &contact))
    });
    match result {
        Ok(item) => ContactActionResponse::success("Contact updated.", Some(item)),
        Err(err) => ContactActionResponse::failure(format!("contact_update failed: {err}")),
    }
}

/// Swipe-to-delete on the unfiltered list: removes contacts at `indices`.
#[flutter_rust_bridge::frb(sync)]
pub fn contact_delete(indices: Vec<u32>) -> ContactActionResponse {
    let indices: Vec<usize> = indices.into_iter().map(|index| index as usize).collect();
    match with_contact_book(|book| book.delete(&indices)) {
        Ok(removed) => {
            ContactActionResponse::success(format!("Deleted {} contact(s).", removed.len()), None)
        }
        Err(err) => ContactActionResponse::failure(format!("contact_delete failed: {err}")),
    }
}

/// Deletes one contact by id; safe to use from a filtered list.
#[flutter_rust_bridge::frb(sync)]
pub fn contact_delete_by_id(id: String) -> ContactActionResponse {
    let id = match parse_contact_id(&id) {
        Ok(id) => id,
        Err(message) => return ContactActionResponse::failure(message),
    };
    match with_contact_book(|book| book.delete_by_id(id)) {
        Ok(contact) => ContactActionResponse::success(
            "Contact deleted.",
            Some(ContactItem {
                image_path: None,
                ..contact_item_fields(&contact)
            }),
        ),
        Err(err) => ContactActionResponse::failure(format!("contact_delete_by_id failed: {err}")),
    }
}

/// Converts photo-library bytes into the stored JPEG form.
#[flutter_rust_bridge::frb(sync)]
pub fn photo_prepare(bytes: Vec<u8>) -> PhotoPrepareResponse {
    to_photo_response(prepare_jpeg(&bytes))
}

/// Reads a file chosen in the file browser and converts it to JPEG.
#[flutter_rust_bridge::frb(sync)]
pub fn photo_prepare_file(path: String) -> PhotoPrepareResponse {
    to_photo_response(read_photo_file(path.trim()).and_then(|raw| prepare_jpeg(&raw)))
}

fn to_photo_response(result: contactbook_core::photo::PhotoResult<Vec<u8>>) -> PhotoPrepareResponse {
    match result {
        Ok(jpeg) => PhotoPrepareResponse {
            ok: true,
            jpeg: Some(jpeg),
            message: "Photo ready.".to_string(),
        },
        Err(err) => {
            warn!("event=photo_prepare module=ffi status=error error={err}");
            PhotoPrepareResponse {
                ok: false,
                jpeg: None,
                message: format!("photo_prepare failed: {err}"),
            }
        }
    }
}

fn build_draft(
    first_name: String,
    last_name: String,
    company: String,
    gender: &str,
) -> Result<ContactDraft, String> {
    let gender = match gender.trim() {
        "" => None,
        label => Some(
            Gender::parse(label)
                .ok_or_else(|| format!("unknown gender `{label}`; expected Male|Female|Unknown"))?,
        ),
    };
    Ok(ContactDraft::new(first_name, last_name, company, gender))
}

fn parse_contact_id(raw: &str) -> Result<Uuid, String> {
    Uuid::parse_str(raw.trim()).map_err(|_| format!("invalid contact id `{}`", raw.trim()))
}

fn contact_item_fields(contact: &Contact) -> ContactItem {
    ContactItem {
        id: contact.id.to_string(),
        first_name: contact.first_name.clone(),
        last_name: contact.last_name.clone(),
        company: contact.company.clone(),
        gender: contact.gender.as_str().to_string(),
        image_path: contact.image_path.clone(),
    }
}

fn to_contact_item(book: &EntryBook<'_>, contact: &Contact) -> ContactItem {
    ContactItem {
        image_path: book
            .photo_path(contact)
            .and_then(|path| path.to_str().map(str::to_string)),
        ..contact_item_fields(contact)
    }
}

fn resolve_data_dir() -> PathBuf {
    DATA_DIR
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(DATA_DIR_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(DEFAULT_DATA_DIR_NAME)
        })
        .clone()
}

fn with_contact_book<T>(
    f: impl FnOnce(&mut EntryBook<'_>) -> ContactBookResult<T>,
) -> Result<T, String> {
    let _guard = BOOK_LOCK.lock().unwrap_or_else(PoisonError::into_inner);

    let data_dir = resolve_data_dir();
    std::fs::create_dir_all(&data_dir).map_err(|err| {
        format!(
            "data directory `{}` unavailable: {err}",
            data_dir.display()
        )
    })?;

    let conn =
        open_db(data_dir.join(DB_FILE_NAME)).map_err(|err| format!("DB open failed: {err}"))?;
    let store =
        SqliteKeyValueStore::try_new(&conn).map_err(|err| format!("store init failed: {err}"))?;
    let mut book = ContactBook::open(
        KvContactRepository::new(store),
        FsImageStore::new(data_dir.join(IMAGES_DIR_NAME)),
    );

    f(&mut book).map_err(|err: ContactBookError| err.to_string())
}
