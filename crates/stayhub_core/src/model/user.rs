//! User domain model.
//!
//! # Responsibility
//! - Define the account record owning places and reviews.
//! - Normalize and validate email addresses on every write path.
//! - Keep the password as a one-way bcrypt hash, never as plaintext.
//!
//! # Invariants
//! - `email` is stored lower-cased and trimmed.
//! - `password_hash` never appears in serialized output.
//! - Email uniqueness across users is enforced by the facade, not here.

use crate::model::entity::{validate_text, AttrValue, Entity, EntityMeta, ValidationError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

const NAME_MAX_CHARS: usize = 50;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
});

/// Request shape for creating a user through the facade.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Plaintext credential; hashed during construction and then dropped.
    pub password: String,
    #[serde(default)]
    pub is_admin: bool,
}

/// Account record with personal information and admin flag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    #[serde(flatten)]
    pub meta: EntityMeta,
    pub first_name: String,
    pub last_name: String,
    /// Lower-cased, pattern-checked address.
    pub email: String,
    /// Bcrypt digest of the credential. Excluded from serialization.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_admin: bool,
}

/// Partial update for `User`. Absent fields are left untouched.
///
/// Deserialization ignores unknown keys, so unrecognized payload fields are
/// no-ops rather than errors.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    /// Plaintext replacement credential; re-hashed on application.
    pub password: Option<String>,
    pub is_admin: Option<bool>,
}

impl User {
    /// Validates the request, hashes the credential and builds the record.
    pub fn new(req: NewUser) -> Result<Self, ValidationError> {
        let email = normalize_email(&req.email)?;
        let password_hash = hash_password(&req.password)?;

        let user = Self {
            meta: EntityMeta::new(),
            first_name: req.first_name,
            last_name: req.last_name,
            email,
            password_hash,
            is_admin: req.is_admin,
        };
        user.validate()?;
        Ok(user)
    }

    /// Checks a plaintext credential against the stored hash.
    ///
    /// An undecodable stored hash counts as a failed check.
    pub fn verify_password(&self, password: &str) -> bool {
        bcrypt::verify(password, &self.password_hash).unwrap_or(false)
    }
}

impl Entity for User {
    type Patch = UserPatch;

    fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut EntityMeta {
        &mut self.meta
    }

    fn apply_patch(&mut self, patch: &UserPatch) -> Result<(), ValidationError> {
        // Merge into a scratch copy so a rejected patch leaves `self` intact.
        let mut updated = self.clone();
        if let Some(first_name) = &patch.first_name {
            updated.first_name = first_name.clone();
        }
        if let Some(last_name) = &patch.last_name {
            updated.last_name = last_name.clone();
        }
        if let Some(email) = &patch.email {
            updated.email = normalize_email(email)?;
        }
        if let Some(password) = &patch.password {
            updated.password_hash = hash_password(password)?;
        }
        if let Some(is_admin) = patch.is_admin {
            updated.is_admin = is_admin;
        }
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    fn validate(&self) -> Result<(), ValidationError> {
        validate_text("first_name", &self.first_name, NAME_MAX_CHARS)?;
        validate_text("last_name", &self.last_name, NAME_MAX_CHARS)?;
        if !is_normalized_email(&self.email) {
            return Err(ValidationError::InvalidEmail {
                value: self.email.clone(),
            });
        }
        if self.password_hash.is_empty() {
            return Err(ValidationError::EmptyField {
                field: "password_hash",
            });
        }
        Ok(())
    }

    fn attribute(&self, name: &str) -> Option<AttrValue> {
        match name {
            "id" => Some(AttrValue::Id(self.meta.id)),
            "first_name" => Some(AttrValue::Str(self.first_name.clone())),
            "last_name" => Some(AttrValue::Str(self.last_name.clone())),
            "email" => Some(AttrValue::Str(self.email.clone())),
            "is_admin" => Some(AttrValue::Bool(self.is_admin)),
            _ => None,
        }
    }
}

/// Trims, lower-cases and pattern-checks an email address.
///
/// Every write path goes through this so lookups can compare normalized
/// values directly.
pub fn normalize_email(raw: &str) -> Result<String, ValidationError> {
    let normalized = raw.trim().to_ascii_lowercase();
    if !EMAIL_RE.is_match(&normalized) {
        return Err(ValidationError::InvalidEmail {
            value: raw.to_string(),
        });
    }
    Ok(normalized)
}

fn is_normalized_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
        && email == email.trim()
        && !email.bytes().any(|byte| byte.is_ascii_uppercase())
}

fn hash_password(password: &str) -> Result<String, ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::EmptyField { field: "password" });
    }
    bcrypt::hash(password, bcrypt::DEFAULT_COST).map_err(|err| ValidationError::PasswordHash {
        reason: err.to_string(),
    })
}
