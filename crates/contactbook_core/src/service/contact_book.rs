//! In-memory contact collection with injected persistence.
//!
//! # Responsibility
//! - Hold the working contact list seeded once from the repository.
//! - Apply add/update/delete and re-save the full list after each change.
//! - Tie photo file lifetime to the contact that owns it.
//!
//! # Invariants
//! - Contact ids are unique within the collection.
//! - Every mutation is followed by exactly one `save_all`.
//! - Updating an unknown id fails and leaves the collection unchanged.
//! - Photo storage failures never abort a contact mutation.

use crate::model::contact::{Contact, ContactDraft, ContactId, ContactValidationError, Gender};
use crate::repo::contact_repo::{ContactRepository, RepoError};
use crate::repo::image_store::ImageStore;
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use uuid::Uuid;

const SEED_FAIZAN_ID: u128 = 0x5eed_0001_0000_4000_8000_0000_0000_0001;
const SEED_HASSAN_ID: u128 = 0x5eed_0002_0000_4000_8000_0000_0000_0002;

/// Service error for collection use-cases.
#[derive(Debug)]
pub enum ContactBookError {
    Validation(ContactValidationError),
    NotFound(ContactId),
    DuplicateId(ContactId),
    /// The in-memory change was applied but could not be persisted.
    Repo(RepoError),
}

impl Display for ContactBookError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "contact not found: {id}"),
            Self::DuplicateId(id) => write!(f, "contact id already in use: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ContactBookError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::NotFound(_) | Self::DuplicateId(_) => None,
        }
    }
}

impl From<ContactValidationError> for ContactBookError {
    fn from(value: ContactValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for ContactBookError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

pub type ContactBookResult<T> = Result<T, ContactBookError>;

/// Photo intent of an edit form confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoChange<'a> {
    Keep,
    /// JPEG bytes of the newly picked photo.
    Replace(&'a [u8]),
    Remove,
}

/// The two contacts shown on a fresh install.
///
/// Ids are fixed so the seeds keep their identity across reloads until the
/// first save.
pub fn seed_contacts() -> Vec<Contact> {
    vec![
        seed(SEED_FAIZAN_ID, "Faizan", "Shakeel", "iOS"),
        seed(SEED_HASSAN_ID, "Hassan", "Shahid", "iOS"),
    ]
}

fn seed(id: u128, first_name: &str, last_name: &str, company: &str) -> Contact {
    Contact {
        id: Uuid::from_u128(id),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        company: company.to_string(),
        gender: Gender::Unknown,
        image_path: None,
    }
}

/// Contact collection facade over a repository and an image store.
pub struct ContactBook<R: ContactRepository, I: ImageStore> {
    repo: R,
    images: I,
    contacts: Vec<Contact>,
}

impl<R: ContactRepository, I: ImageStore> ContactBook<R, I> {
    /// Loads the stored list, or the built-in seeds when nothing is stored.
    ///
    /// Seeds stay in memory until the first mutation saves them.
    pub fn open(repo: R, images: I) -> Self {
        let loaded = repo.load_all();
        let contacts = if loaded.is_empty() {
            info!("event=contact_book_open module=service status=ok source=seed");
            seed_contacts()
        } else {
            info!(
                "event=contact_book_open module=service status=ok source=store count={}",
                loaded.len()
            );
            loaded
        };

        Self {
            repo,
            images,
            contacts,
        }
    }

    /// Current list in display order.
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    pub fn get(&self, id: ContactId) -> Option<&Contact> {
        self.contacts.iter().find(|contact| contact.id == id)
    }

    pub fn position(&self, id: ContactId) -> Option<usize> {
        self.contacts.iter().position(|contact| contact.id == id)
    }

    /// Photo path to render for `contact`, or `None` for the placeholder.
    pub fn photo_path(&self, contact: &Contact) -> Option<PathBuf> {
        self.images.resolve(contact.image_path.as_deref())
    }

    /// Contacts whose first name, last name or company contains `query`,
    /// ignoring case. An empty query returns the whole list.
    ///
    /// Whitespace in `query` is significant: `"ada "` only matches fields
    /// containing the trailing space.
    pub fn filter(&self, query: &str) -> Vec<&Contact> {
        self.contacts
            .iter()
            .filter(|contact| contact.matches(query))
            .collect()
    }

    /// Appends a fully built contact and saves the list.
    pub fn add(&mut self, contact: Contact) -> ContactBookResult<()> {
        contact.validate()?;
        if self.get(contact.id).is_some() {
            return Err(ContactBookError::DuplicateId(contact.id));
        }

        let id = contact.id;
        self.contacts.push(contact);
        self.persist("contact_add")?;
        info!(
            "event=contact_add module=service status=ok contact_id={} count={}",
            id,
            self.contacts.len()
        );
        Ok(())
    }

    /// Add-form confirmation: validates the draft, mints an id, stores the
    /// optional photo and appends the new contact.
    ///
    /// A photo that cannot be written is dropped; the contact is still added.
    pub fn create(
        &mut self,
        draft: &ContactDraft,
        photo: Option<&[u8]>,
    ) -> ContactBookResult<Contact> {
        let valid = draft.validate()?;
        let id = self.mint_id();
        let mut contact = Contact::with_id(
            id,
            valid.first_name,
            valid.last_name,
            valid.company,
            valid.gender,
        )?;
        contact.image_path = photo.and_then(|jpeg| self.store_photo(jpeg, id));

        self.add(contact.clone())?;
        Ok(contact)
    }

    /// Replaces the entry with the same id, keeping its position.
    ///
    /// A superseded photo file is deleted.
    pub fn update(&mut self, contact: Contact) -> ContactBookResult<()> {
        contact.validate()?;
        let Some(index) = self.position(contact.id) else {
            warn!(
                "event=contact_update module=service status=error error_code=not_found contact_id={}",
                contact.id
            );
            return Err(ContactBookError::NotFound(contact.id));
        };

        let id = contact.id;
        let previous = std::mem::replace(&mut self.contacts[index], contact);
        if let Some(old_path) = previous.image_path.as_deref() {
            if self.contacts[index].image_path.as_deref() != Some(old_path) {
                self.discard_photo(old_path);
            }
        }

        self.persist("contact_update")?;
        info!("event=contact_update module=service status=ok contact_id={id}");
        Ok(())
    }

    /// Edit-form confirmation: applies the draft to contact `id` and the
    /// requested photo change.
    ///
    /// When a replacement photo cannot be written the previous photo is kept.
    pub fn edit(
        &mut self,
        id: ContactId,
        draft: &ContactDraft,
        photo: PhotoChange<'_>,
    ) -> ContactBookResult<Contact> {
        let valid = draft.validate()?;
        let mut updated = self
            .get(id)
            .cloned()
            .ok_or(ContactBookError::NotFound(id))?;
        updated.apply_draft(&valid);

        match photo {
            PhotoChange::Keep => {}
            PhotoChange::Replace(jpeg) => {
                if let Some(path) = self.store_photo(jpeg, id) {
                    updated.image_path = Some(path);
                }
            }
            PhotoChange::Remove => updated.image_path = None,
        }

        self.update(updated.clone())?;
        Ok(updated)
    }

    /// Removes the contacts at `indices` and their photo files.
    ///
    /// Out-of-range and repeated indices are ignored. Returns the removed
    /// contacts in their former order.
    pub fn delete(&mut self, indices: &[usize]) -> ContactBookResult<Vec<Contact>> {
        let mut targets: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|index| *index < self.contacts.len())
            .collect();
        targets.sort_unstable();
        targets.dedup();

        if targets.len() != indices.len() {
            warn!(
                "event=contact_delete module=service status=warn error_code=ignored_indices requested={} applied={}",
                indices.len(),
                targets.len()
            );
        }

        let mut removed: Vec<Contact> = targets
            .iter()
            .rev()
            .map(|index| self.contacts.remove(*index))
            .collect();
        removed.reverse();

        for contact in &removed {
            if let Some(path) = contact.image_path.as_deref() {
                self.discard_photo(path);
            }
        }

        self.persist("contact_delete")?;
        info!(
            "event=contact_delete module=service status=ok removed={} count={}",
            removed.len(),
            self.contacts.len()
        );
        Ok(removed)
    }

    /// Removes one contact by id.
    pub fn delete_by_id(&mut self, id: ContactId) -> ContactBookResult<Contact> {
        let index = self.position(id).ok_or(ContactBookError::NotFound(id))?;
        let mut removed = self.delete(&[index])?;
        removed.pop().ok_or(ContactBookError::NotFound(id))
    }

    fn mint_id(&self) -> ContactId {
        loop {
            let id = Uuid::new_v4();
            if self.get(id).is_none() {
                return id;
            }
        }
    }

    fn store_photo(&self, jpeg: &[u8], owner: ContactId) -> Option<String> {
        match self.images.save(jpeg, owner) {
            Ok(path) => Some(path),
            Err(err) => {
                warn!(
                    "event=photo_save module=service status=error error_code=image_write_failed contact_id={} error={}",
                    owner, err
                );
                None
            }
        }
    }

    fn discard_photo(&self, path: &str) {
        if let Err(err) = self.images.delete(path) {
            warn!(
                "event=photo_delete module=service status=error error_code=image_delete_failed error={err}"
            );
        }
    }

    fn persist(&self, event: &str) -> Result<(), RepoError> {
        self.repo.save_all(&self.contacts).map_err(|err| {
            error!(
                "event={} module=service status=error error_code=save_failed count={} error={}",
                event,
                self.contacts.len(),
                err
            );
            err
        })
    }
}
