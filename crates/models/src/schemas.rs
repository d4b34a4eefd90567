//! Request/response contracts for the contacts API.
//!
//! Create and update share one full-field contract. Partial semantics live in
//! [`ContactPatch`], which records per field whether a value was supplied so
//! the repository can leave everything else untouched.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::{entity::prelude::DateTimeWithTimeZone, ActiveValue::NotSet, Set};
use serde::{Deserialize, Deserializer, Serialize};

use crate::contact::{self, EMAIL_MAX, FIRST_NAME_MAX, LAST_NAME_MAX, NOTES_MAX, PHONE_MAX};
use crate::errors::ModelError;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*@(?:[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+[A-Za-z]{2,}$",
    )
    .expect("email pattern compiles")
});

pub fn validate_email(email: &str) -> Result<(), ModelError> {
    if email.chars().count() > EMAIL_MAX || !EMAIL_RE.is_match(email) {
        return Err(ModelError::Validation("email: value is not a valid email address".into()));
    }
    Ok(())
}

fn validate_required(field: &str, value: &str, max: usize) -> Result<(), ModelError> {
    if value.trim().is_empty() {
        return Err(ModelError::Validation(format!("{field}: must not be empty")));
    }
    validate_max(field, value, max)
}

fn validate_max(field: &str, value: &str, max: usize) -> Result<(), ModelError> {
    if value.chars().count() > max {
        return Err(ModelError::Validation(format!("{field}: must be at most {max} characters")));
    }
    Ok(())
}

fn validate_fields(
    first_name: &str,
    last_name: &str,
    email: &str,
    phone: &str,
    notes: Option<&str>,
) -> Result<(), ModelError> {
    validate_required("first_name", first_name, FIRST_NAME_MAX)?;
    validate_required("last_name", last_name, LAST_NAME_MAX)?;
    validate_email(email)?;
    validate_required("phone", phone, PHONE_MAX)?;
    if let Some(n) = notes {
        validate_max("notes", n, NOTES_MAX)?;
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactCreate {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub birth_date: NaiveDate,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ContactCreate {
    pub fn validate(&self) -> Result<(), ModelError> {
        validate_fields(&self.first_name, &self.last_name, &self.email, &self.phone, self.notes.as_deref())
    }

    /// Insertable row; `id` and timestamps are left for the database and
    /// `ActiveModelBehavior` to fill.
    pub fn into_active_model(self) -> contact::ActiveModel {
        contact::ActiveModel {
            id: NotSet,
            first_name: Set(self.first_name),
            last_name: Set(self.last_name),
            email: Set(self.email),
            phone: Set(self.phone),
            birth_date: Set(self.birth_date),
            notes: Set(self.notes),
            created_at: NotSet,
            updated_at: NotSet,
        }
    }
}

/// Maps a present JSON key to `Some(..)`, so `null` becomes `Some(None)` and
/// an absent key (via `#[serde(default)]`) stays `None`.
fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactUpdate {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub birth_date: NaiveDate,
    #[serde(default, deserialize_with = "deserialize_present", skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
}

impl ContactUpdate {
    pub fn validate(&self) -> Result<(), ModelError> {
        let notes = self.notes.as_ref().and_then(|n| n.as_deref());
        validate_fields(&self.first_name, &self.last_name, &self.email, &self.phone, notes)
    }
}

/// Field-by-field change set. `None` means "not supplied"; for `notes`,
/// `Some(None)` clears the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub notes: Option<Option<String>>,
}

impl ContactPatch {
    /// Mark supplied fields as `Set`; the rest keep their loaded state.
    pub fn apply(self, am: &mut contact::ActiveModel) {
        if let Some(v) = self.first_name { am.first_name = Set(v); }
        if let Some(v) = self.last_name { am.last_name = Set(v); }
        if let Some(v) = self.email { am.email = Set(v); }
        if let Some(v) = self.phone { am.phone = Set(v); }
        if let Some(v) = self.birth_date { am.birth_date = Set(v); }
        if let Some(v) = self.notes { am.notes = Set(v); }
    }

    /// Same as [`apply`](Self::apply) but on a plain row, for stores that
    /// keep `Model`s directly.
    pub fn apply_to_model(self, m: &mut contact::Model) {
        if let Some(v) = self.first_name { m.first_name = v; }
        if let Some(v) = self.last_name { m.last_name = v; }
        if let Some(v) = self.email { m.email = v; }
        if let Some(v) = self.phone { m.phone = v; }
        if let Some(v) = self.birth_date { m.birth_date = v; }
        if let Some(v) = self.notes { m.notes = v; }
    }
}

impl From<ContactUpdate> for ContactPatch {
    fn from(u: ContactUpdate) -> Self {
        ContactPatch {
            first_name: Some(u.first_name),
            last_name: Some(u.last_name),
            email: Some(u.email),
            phone: Some(u.phone),
            birth_date: Some(u.birth_date),
            notes: u.notes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactResponse {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub birth_date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: Option<DateTimeWithTimeZone>,
}

impl From<contact::Model> for ContactResponse {
    fn from(m: contact::Model) -> Self {
        ContactResponse {
            id: m.id,
            first_name: m.first_name,
            last_name: m.last_name,
            email: m.email,
            phone: m.phone,
            birth_date: m.birth_date,
            notes: m.notes,
            created_at: m.created_at,
            updated_at: Some(m.updated_at),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactListResponse {
    pub total_count: u64,
    pub items: Vec<ContactResponse>,
}
