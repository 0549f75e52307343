//! Repository layer abstractions and storage implementations.
//!
//! # Responsibility
//! - Define the uniform CRUD + attribute-lookup contract over one entity
//!   type.
//! - Isolate storage details (map or SQL) from facade orchestration.
//!
//! # Invariants
//! - Not-found is an `Ok(None)`/`Ok(false)` outcome, never an error.
//! - `update` merges a typed patch all-or-nothing and refreshes
//!   `updated_at` on success, including for an empty patch.

use crate::db::DbError;
use crate::model::entity::{AttrValue, Entity, EntityId, ValidationError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod memory;
pub mod sqlite;

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// A patch was rejected before any mutation was committed.
    Validation(ValidationError),
    /// Backing-store transport failure.
    Db(DbError),
    /// Persisted state failed to decode into a valid entity.
    InvalidData(String),
    /// Connection has not been migrated to the supported schema version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Migrated connection is missing a table this repository requires.
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "required table `{table}` is missing")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
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

/// Uniform storage contract for one entity type.
///
/// The facade composes one implementation per entity; implementations know
/// nothing about cross-entity relationships.
pub trait Repository<T: Entity> {
    /// Inserts `entity` keyed by its identifier.
    ///
    /// Overwrites silently when the identifier already exists.
    fn add(&mut self, entity: T) -> RepoResult<()>;

    /// Looks an entity up by identifier.
    fn get(&self, id: EntityId) -> RepoResult<Option<T>>;

    /// Returns every stored entity.
    ///
    /// The in-memory backend yields insertion order; ordering is otherwise
    /// not part of the contract.
    fn get_all(&self) -> RepoResult<Vec<T>>;

    /// Merges the fields present in `patch` into the stored entity.
    ///
    /// Returns `Ok(None)` for an unknown id. On success the stored entity's
    /// `updated_at` is refreshed and the updated entity returned. A rejected
    /// patch leaves the stored entity untouched.
    fn update(&mut self, id: EntityId, patch: &T::Patch) -> RepoResult<Option<T>>;

    /// Removes the entity, reporting whether removal occurred.
    fn delete(&mut self, id: EntityId) -> RepoResult<bool>;

    /// Returns the first entity whose named field equals `value`.
    ///
    /// Unknown attribute names and missing matches both yield `Ok(None)`.
    fn get_by_attribute(&self, name: &str, value: &AttrValue) -> RepoResult<Option<T>>;
}
