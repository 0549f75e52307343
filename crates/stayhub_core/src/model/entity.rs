//! Shared entity identity, timestamps and update plumbing.
//!
//! # Responsibility
//! - Define the identity/timestamp component composed into every entity.
//! - Define the `Entity` contract used by repositories and the facade.
//! - Define the dynamic attribute value used by attribute lookups.
//!
//! # Invariants
//! - `EntityMeta::id` is assigned once at creation and never reassigned.
//! - `updated_at` moves forward on every successful mutation, including an
//!   empty patch.
//! - Patch application is all-or-nothing: no field is assigned before every
//!   present field has validated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier shared by every stored entity.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type EntityId = Uuid;

/// Identity and audit timestamps composed into each entity.
///
/// Concrete entity types embed this struct instead of inheriting from a base
/// record, so the shared fields stay in one place without a type hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityMeta {
    /// Stable global ID used for linking and lookups.
    pub id: EntityId,
    /// Creation instant, fixed for the entity lifetime.
    pub created_at: DateTime<Utc>,
    /// Last successful mutation instant.
    pub updated_at: DateTime<Utc>,
}

impl EntityMeta {
    /// Creates fresh metadata with a generated ID and `now` timestamps.
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4())
    }

    /// Creates metadata with a caller-provided stable ID.
    ///
    /// Used by storage decode paths where identity already exists.
    pub fn with_id(id: EntityId) -> Self {
        let now = Utc::now();
        Self {
            id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Refreshes `updated_at` to the current instant.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Default for EntityMeta {
    fn default() -> Self {
        Self::new()
    }
}

/// Dynamic value handed to `get_by_attribute` lookups.
///
/// Lookups compare this against `Entity::attribute`; a type mismatch is just
/// an unequal value, never an error.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Id(EntityId),
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<EntityId> for AttrValue {
    fn from(value: EntityId) -> Self {
        Self::Id(value)
    }
}

/// Field-level validation failure raised before any mutation is committed.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A required string field is empty or whitespace-only.
    EmptyField { field: &'static str },
    /// A string field exceeds its maximum length in characters.
    TooLong { field: &'static str, max: usize },
    /// The email does not match the accepted address pattern.
    InvalidEmail { value: String },
    /// Price must be strictly positive.
    NonPositivePrice { value: f64 },
    /// Latitude must lie in [-90, 90].
    LatitudeOutOfRange { value: f64 },
    /// Longitude must lie in [-180, 180].
    LongitudeOutOfRange { value: f64 },
    /// Rating must lie in [1, 5].
    RatingOutOfRange { value: u8 },
    /// Password hashing backend rejected the input.
    PasswordHash { reason: String },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField { field } => write!(f, "{field} cannot be empty"),
            Self::TooLong { field, max } => {
                write!(f, "{field} must be at most {max} characters")
            }
            Self::InvalidEmail { value } => write!(f, "invalid email format: `{value}`"),
            Self::NonPositivePrice { value } => {
                write!(f, "price must be positive, got {value}")
            }
            Self::LatitudeOutOfRange { value } => {
                write!(f, "latitude must be between -90 and 90, got {value}")
            }
            Self::LongitudeOutOfRange { value } => {
                write!(f, "longitude must be between -180 and 180, got {value}")
            }
            Self::RatingOutOfRange { value } => {
                write!(f, "rating must be between 1 and 5, got {value}")
            }
            Self::PasswordHash { reason } => write!(f, "password hashing failed: {reason}"),
        }
    }
}

impl Error for ValidationError {}

/// Contract every stored domain record satisfies.
///
/// Repositories are polymorphic over this trait: they key storage by
/// `meta().id`, merge typed patches through `apply_patch`, and answer
/// attribute lookups through `attribute`.
pub trait Entity: Clone {
    /// Typed partial-update shape for this entity.
    type Patch;

    /// Shared identity/timestamp component.
    fn meta(&self) -> &EntityMeta;

    /// Mutable access for repository-side timestamp refreshes.
    fn meta_mut(&mut self) -> &mut EntityMeta;

    /// Stable identifier, immutable once assigned.
    fn id(&self) -> EntityId {
        self.meta().id
    }

    /// Merges every field present in `patch` into `self`.
    ///
    /// All-or-nothing: on error the entity is left untouched. Does not
    /// refresh `updated_at` — that is the repository's job on successful
    /// persistence.
    fn apply_patch(&mut self, patch: &Self::Patch) -> Result<(), ValidationError>;

    /// Checks every field rule against the current state.
    ///
    /// Constructors and patch application go through this before committing;
    /// storage read paths use it to reject invalid persisted state instead
    /// of masking it.
    fn validate(&self) -> Result<(), ValidationError>;

    /// Returns the named public field as a dynamic value.
    ///
    /// Unknown names return `None`, which lookup paths treat as a no-match.
    fn attribute(&self, name: &str) -> Option<AttrValue>;
}

/// Rejects empty/whitespace-only values and values longer than `max` chars.
pub(crate) fn validate_text(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField { field });
    }
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}
