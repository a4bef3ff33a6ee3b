//! Contact domain model.
//!
//! # Responsibility
//! - Define the canonical contact record persisted by core.
//! - Own the add/edit form validation rule (`ContactDraft::validate`).
//!
//! # Invariants
//! - `id` is stable, non-nil and never reused for another contact.
//! - `first_name` and `last_name` are non-empty after trimming.
//! - Persisted records are validated on decode; invalid data is rejected.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a contact.
pub type ContactId = Uuid;

/// Fixed gender tag set offered by the contact forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Unknown,
}

impl Gender {
    /// All selectable values, in form display order.
    pub const ALL: [Gender; 3] = [Gender::Male, Gender::Female, Gender::Unknown];

    /// Stable label used on the wire and in the UI picker.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
            Self::Unknown => "Unknown",
        }
    }

    /// Parses a picker/wire label. Matching ignores case and surrounding
    /// whitespace.
    pub fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|gender| gender.as_str().eq_ignore_ascii_case(trimmed))
    }
}

impl Display for Gender {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation failures for contact records and form drafts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactValidationError {
    NilId,
    EmptyFirstName,
    EmptyLastName,
    MissingGender,
    UnknownGender(String),
}

impl Display for ContactValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "contact id must not be nil"),
            Self::EmptyFirstName => write!(f, "first name must not be empty"),
            Self::EmptyLastName => write!(f, "last name must not be empty"),
            Self::MissingGender => write!(f, "gender must be selected"),
            Self::UnknownGender(value) => {
                write!(f, "unknown gender `{value}`; expected Male|Female|Unknown")
            }
        }
    }
}

impl Error for ContactValidationError {}

/// Canonical contact record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "ContactWire")]
pub struct Contact {
    pub id: ContactId,
    pub first_name: String,
    pub last_name: String,
    /// May be empty.
    pub company: String,
    pub gender: Gender,
    /// Absolute path of the stored photo. `None` renders the placeholder.
    pub image_path: Option<String>,
}

impl Contact {
    /// Creates a contact with a freshly generated id.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        company: impl Into<String>,
        gender: Gender,
    ) -> Result<Self, ContactValidationError> {
        Self::with_id(Uuid::new_v4(), first_name, last_name, company, gender)
    }

    /// Creates a contact with a caller-provided id.
    ///
    /// Used for seeds and decode paths where identity already exists.
    pub fn with_id(
        id: ContactId,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        company: impl Into<String>,
        gender: Gender,
    ) -> Result<Self, ContactValidationError> {
        let contact = Self {
            id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            company: company.into(),
            gender,
            image_path: None,
        };
        contact.validate()?;
        Ok(contact)
    }

    /// Checks record-level invariants.
    pub fn validate(&self) -> Result<(), ContactValidationError> {
        if self.id.is_nil() {
            return Err(ContactValidationError::NilId);
        }
        if self.first_name.trim().is_empty() {
            return Err(ContactValidationError::EmptyFirstName);
        }
        if self.last_name.trim().is_empty() {
            return Err(ContactValidationError::EmptyLastName);
        }
        Ok(())
    }

    /// Display name as rendered by the list row.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Case-insensitive substring match over first name, last name and
    /// company. An empty needle matches everything.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        if needle.is_empty() {
            return true;
        }
        [&self.first_name, &self.last_name, &self.company]
            .into_iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }

    /// Copies the draft's editable fields onto this record.
    ///
    /// `id` and `image_path` are left untouched.
    pub fn apply_draft(&mut self, draft: &ValidDraft) {
        self.first_name = draft.first_name.clone();
        self.last_name = draft.last_name.clone();
        self.company = draft.company.clone();
        self.gender = draft.gender;
    }
}

/// Stored record shape before validation.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ContactWire {
    pub(crate) id: ContactId,
    first_name: String,
    last_name: String,
    #[serde(default)]
    company: String,
    #[serde(default)]
    gender: String,
    #[serde(default)]
    image_path: Option<String>,
}

impl TryFrom<ContactWire> for Contact {
    type Error = ContactValidationError;

    fn try_from(wire: ContactWire) -> Result<Self, Self::Error> {
        // Older stores saved the built-in seeds with an empty gender.
        let gender = if wire.gender.trim().is_empty() {
            Gender::Unknown
        } else {
            Gender::parse(&wire.gender)
                .ok_or_else(|| ContactValidationError::UnknownGender(wire.gender.clone()))?
        };

        let mut contact =
            Self::with_id(wire.id, wire.first_name, wire.last_name, wire.company, gender)?;
        contact.image_path = wire.image_path.filter(|path| !path.is_empty());
        Ok(contact)
    }
}

/// Raw add/edit form input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactDraft {
    pub first_name: String,
    pub last_name: String,
    pub company: String,
    /// `None` while nothing is selected in the gender picker.
    pub gender: Option<Gender>,
}

/// Form input that passed `ContactDraft::validate`. Names are trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidDraft {
    pub first_name: String,
    pub last_name: String,
    pub company: String,
    pub gender: Gender,
}

impl ContactDraft {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        company: impl Into<String>,
        gender: Option<Gender>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            company: company.into(),
            gender,
        }
    }

    /// Pre-populates an edit form from an existing contact.
    pub fn from_contact(contact: &Contact) -> Self {
        Self {
            first_name: contact.first_name.clone(),
            last_name: contact.last_name.clone(),
            company: contact.company.clone(),
            gender: Some(contact.gender),
        }
    }

    /// Whether the form's confirm action should be enabled.
    pub fn is_complete(&self) -> bool {
        self.validate().is_ok()
    }

    /// Applies the confirm rule: first name, last name and gender required.
    pub fn validate(&self) -> Result<ValidDraft, ContactValidationError> {
        let first_name = self.first_name.trim();
        if first_name.is_empty() {
            return Err(ContactValidationError::EmptyFirstName);
        }
        let last_name = self.last_name.trim();
        if last_name.is_empty() {
            return Err(ContactValidationError::EmptyLastName);
        }
        let gender = self.gender.ok_or(ContactValidationError::MissingGender)?;

        Ok(ValidDraft {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            company: self.company.trim().to_string(),
            gender,
        })
    }
}
