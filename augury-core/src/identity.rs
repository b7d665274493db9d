//! Subject identity — the per-request input the root seed is built from.
//!
//! [`Identity::from_input`] is the one place caller input gets normalized.
//! Every call site goes through it so the same person always hashes the same.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::seed::Seed;

/// Wire format for birth dates.
pub const BIRTH_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("subject is required")]
    MissingSubject,
    #[error("birth date '{0}' is not a valid YYYY-MM-DD date")]
    BadBirthDate(String),
}

/// Raw identity as a caller supplies it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityInput {
    pub subject: String,
    pub birth_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

/// Normalized identity. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub subject: String,
    pub birth_date: NaiveDate,
    pub name: String,
    pub locale: String,
    /// Name as typed (trimmed, spacing collapsed) for `{name}` rendering; not hashed.
    pub display_name: String,
}

/// Trim and collapse internal whitespace runs to a single space.
fn squash(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl Identity {
    /// Validate and normalize caller input.
    ///
    /// Fields are trimmed with whitespace runs collapsed; subject, name and
    /// locale are lowercased. A missing or blank locale takes `default_locale`.
    pub fn from_input(input: &IdentityInput, default_locale: &str) -> Result<Self, InputError> {
        let subject = squash(&input.subject).to_lowercase();
        if subject.is_empty() {
            return Err(InputError::MissingSubject);
        }

        let raw_date = input.birth_date.trim();
        let birth_date = NaiveDate::parse_from_str(raw_date, BIRTH_DATE_FORMAT)
            .map_err(|_| InputError::BadBirthDate(input.birth_date.clone()))?;
        // chrono accepts unpadded fields; require the exact wire form.
        if birth_date.format(BIRTH_DATE_FORMAT).to_string() != raw_date {
            return Err(InputError::BadBirthDate(input.birth_date.clone()));
        }

        let display_name = input.name.as_deref().map(squash).unwrap_or_default();
        let name = display_name.to_lowercase();

        let locale = input
            .locale
            .as_deref()
            .map(squash)
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| squash(default_locale))
            .to_lowercase();

        Ok(Self {
            subject,
            birth_date,
            name,
            locale,
            display_name,
        })
    }

    /// Ordered seed fields: subject, birth date, name, locale.
    pub fn seed_parts(&self) -> [String; 4] {
        [
            self.subject.clone(),
            self.birth_date.format(BIRTH_DATE_FORMAT).to_string(),
            self.name.clone(),
            self.locale.clone(),
        ]
    }

    pub fn root_seed(&self) -> Seed {
        Seed::from_parts(&self.seed_parts())
    }
}
