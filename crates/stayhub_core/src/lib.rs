//! Core domain logic for the stayhub rental platform.
//! This crate is the single source of truth for business invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::amenity::{Amenity, AmenityPatch, NewAmenity};
pub use model::entity::{AttrValue, Entity, EntityId, EntityMeta, ValidationError};
pub use model::place::{NewPlace, Place, PlacePatch};
pub use model::review::{NewReview, Review, ReviewPatch};
pub use model::user::{NewUser, User, UserPatch};
pub use repo::memory::InMemoryRepository;
pub use repo::sqlite::{SqlRecord, SqliteRepository};
pub use repo::{RepoError, RepoResult, Repository};
pub use service::facade::{FacadeError, FacadeResult, InMemoryFacade, StayFacade};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
