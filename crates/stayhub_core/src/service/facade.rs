//! Cross-entity orchestration facade.
//!
//! # Responsibility
//! - Enforce invariants spanning more than one entity type: owner existence,
//!   email uniqueness, self-review and duplicate-review rules, cascades.
//! - Compose one repository per entity type behind use-case APIs.
//!
//! # Invariants
//! - Referential and business-rule checks run before any repository write.
//! - Repositories stay unaware of each other; only the facade sees
//!   relationships.
//! - Uniqueness/duplicate checks are check-then-act over two repository
//!   calls; `&mut self` keeps the sequence atomic within one facade
//!   instance, and the cross-instance race of the original design is
//!   documented as accepted behavior.

use crate::model::amenity::{Amenity, AmenityPatch, NewAmenity};
use crate::model::entity::{AttrValue, Entity, EntityId, ValidationError};
use crate::model::place::{NewPlace, Place, PlacePatch};
use crate::model::review::{NewReview, Review, ReviewPatch};
use crate::model::user::{normalize_email, NewUser, User, UserPatch};
use crate::repo::memory::InMemoryRepository;
use crate::repo::{RepoError, Repository};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type FacadeResult<T> = Result<T, FacadeError>;

/// Failure raised by facade orchestration before or during persistence.
#[derive(Debug)]
pub enum FacadeError {
    /// Entity-level field validation rejected the input.
    Validation(ValidationError),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Referenced user does not exist.
    UnknownUser(EntityId),
    /// Referenced place does not exist.
    UnknownPlace(EntityId),
    /// Another user already registered this email.
    EmailTaken(String),
    /// A user attempted to review their own place.
    SelfReview {
        user_id: EntityId,
        place_id: EntityId,
    },
    /// The user already reviewed this place.
    DuplicateReview {
        user_id: EntityId,
        place_id: EntityId,
    },
    /// The acting user is neither owner nor admin of the target.
    Forbidden { actor_id: EntityId },
}

impl Display for FacadeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::UnknownUser(id) => write!(f, "user not found: {id}"),
            Self::UnknownPlace(id) => write!(f, "place not found: {id}"),
            Self::EmailTaken(email) => write!(f, "email already registered: {email}"),
            Self::SelfReview { user_id, place_id } => {
                write!(f, "user {user_id} cannot review their own place {place_id}")
            }
            Self::DuplicateReview { user_id, place_id } => {
                write!(f, "user {user_id} already reviewed place {place_id}")
            }
            Self::Forbidden { actor_id } => {
                write!(f, "user {actor_id} is not allowed to modify this resource")
            }
        }
    }
}

impl Error for FacadeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for FacadeError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for FacadeError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Orchestration layer over one repository per entity type.
///
/// Explicitly constructed and passed by the caller; the crate keeps no
/// global instance.
pub struct StayFacade<U, P, R, A>
where
    U: Repository<User>,
    P: Repository<Place>,
    R: Repository<Review>,
    A: Repository<Amenity>,
{
    users: U,
    places: P,
    reviews: R,
    amenities: A,
}

/// Facade wired entirely to map-backed repositories.
pub type InMemoryFacade = StayFacade<
    InMemoryRepository<User>,
    InMemoryRepository<Place>,
    InMemoryRepository<Review>,
    InMemoryRepository<Amenity>,
>;

impl InMemoryFacade {
    /// Builds a facade over fresh in-memory repositories.
    pub fn in_memory() -> Self {
        Self::new(
            InMemoryRepository::new(),
            InMemoryRepository::new(),
            InMemoryRepository::new(),
            InMemoryRepository::new(),
        )
    }
}

impl<U, P, R, A> StayFacade<U, P, R, A>
where
    U: Repository<User>,
    P: Repository<Place>,
    R: Repository<Review>,
    A: Repository<Amenity>,
{
    /// Wires one repository instance per entity type.
    pub fn new(users: U, places: P, reviews: R, amenities: A) -> Self {
        Self {
            users,
            places,
            reviews,
            amenities,
        }
    }

    // ---- users ----

    /// Creates a user, enforcing email uniqueness across all users.
    pub fn create_user(&mut self, req: NewUser) -> FacadeResult<User> {
        let user = User::new(req)?;
        if self
            .users
            .get_by_attribute("email", &AttrValue::Str(user.email.clone()))?
            .is_some()
        {
            return Err(FacadeError::EmailTaken(user.email));
        }

        self.users.add(user.clone())?;
        info!("event=user_created module=facade status=ok user_id={}", user.id());
        Ok(user)
    }

    pub fn get_user(&self, user_id: EntityId) -> FacadeResult<Option<User>> {
        Ok(self.users.get(user_id)?)
    }

    /// Looks a user up by email, comparing normalized forms.
    ///
    /// A malformed lookup address cannot belong to any stored user, so it
    /// yields `None` rather than an error.
    pub fn get_user_by_email(&self, email: &str) -> FacadeResult<Option<User>> {
        let Ok(email) = normalize_email(email) else {
            return Ok(None);
        };
        Ok(self.users.get_by_attribute("email", &AttrValue::Str(email))?)
    }

    pub fn get_all_users(&self) -> FacadeResult<Vec<User>> {
        Ok(self.users.get_all()?)
    }

    /// Updates a user, re-checking email uniqueness when the patch touches
    /// the address. Returns `None` for an unknown id.
    pub fn update_user(
        &mut self,
        user_id: EntityId,
        patch: &UserPatch,
    ) -> FacadeResult<Option<User>> {
        if self.users.get(user_id)?.is_none() {
            return Ok(None);
        }

        if let Some(raw) = &patch.email {
            let email = normalize_email(raw)?;
            if let Some(existing) = self
                .users
                .get_by_attribute("email", &AttrValue::Str(email.clone()))?
            {
                if existing.id() != user_id {
                    return Err(FacadeError::EmailTaken(email));
                }
            }
        }

        Ok(self.users.update(user_id, patch)?)
    }

    /// Deletes a user together with their owned places, those places'
    /// reviews, and the user's own reviews.
    pub fn delete_user(&mut self, user_id: EntityId) -> FacadeResult<bool> {
        if self.users.get(user_id)?.is_none() {
            return Ok(false);
        }

        let owned: Vec<EntityId> = self
            .places
            .get_all()?
            .iter()
            .filter(|place| place.owner_id == user_id)
            .map(|place| place.id())
            .collect();
        for place_id in owned {
            self.delete_place(place_id)?;
        }

        let authored: Vec<EntityId> = self
            .reviews
            .get_all()?
            .iter()
            .filter(|review| review.user_id == user_id)
            .map(|review| review.id())
            .collect();
        for review_id in authored {
            self.reviews.delete(review_id)?;
        }

        let deleted = self.users.delete(user_id)?;
        info!("event=user_deleted module=facade status=ok user_id={user_id}");
        Ok(deleted)
    }

    /// Checks a credential pair, returning the user on success.
    pub fn authenticate_user(&self, email: &str, password: &str) -> FacadeResult<Option<User>> {
        let Some(user) = self.get_user_by_email(email)? else {
            return Ok(None);
        };
        if user.verify_password(password) {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    // ---- places ----

    /// Creates a place after resolving its owner; amenity ids that do not
    /// resolve are skipped silently.
    pub fn create_place(&mut self, req: NewPlace) -> FacadeResult<Place> {
        if self.users.get(req.owner_id)?.is_none() {
            return Err(FacadeError::UnknownUser(req.owner_id));
        }

        let amenity_ids = req.amenity_ids.clone();
        let mut place = Place::new(req)?;
        for amenity_id in amenity_ids {
            if self.amenities.get(amenity_id)?.is_some() {
                place.add_amenity(amenity_id);
            } else {
                warn!(
                    "event=amenity_skipped module=facade status=ok place_id={} amenity_id={amenity_id}",
                    place.id()
                );
            }
        }

        self.places.add(place.clone())?;
        info!(
            "event=place_created module=facade status=ok place_id={} owner_id={}",
            place.id(),
            place.owner_id
        );
        Ok(place)
    }

    pub fn get_place(&self, place_id: EntityId) -> FacadeResult<Option<Place>> {
        Ok(self.places.get(place_id)?)
    }

    pub fn get_all_places(&self) -> FacadeResult<Vec<Place>> {
        Ok(self.places.get_all()?)
    }

    /// Updates a place. An unresolvable owner or amenity reference in the
    /// patch is dropped rather than applied.
    pub fn update_place(
        &mut self,
        place_id: EntityId,
        patch: &PlacePatch,
    ) -> FacadeResult<Option<Place>> {
        let mut patch = patch.clone();

        if let Some(owner_id) = patch.owner_id {
            if self.users.get(owner_id)?.is_none() {
                warn!(
                    "event=owner_skipped module=facade status=ok place_id={place_id} owner_id={owner_id}"
                );
                patch.owner_id = None;
            }
        }

        if let Some(requested) = patch.amenity_ids.take() {
            let mut resolved = Vec::with_capacity(requested.len());
            for amenity_id in requested {
                if self.amenities.get(amenity_id)?.is_some() {
                    resolved.push(amenity_id);
                } else {
                    warn!(
                        "event=amenity_skipped module=facade status=ok place_id={place_id} amenity_id={amenity_id}"
                    );
                }
            }
            patch.amenity_ids = Some(resolved);
        }

        Ok(self.places.update(place_id, &patch)?)
    }

    /// Deletes a place together with its reviews.
    pub fn delete_place(&mut self, place_id: EntityId) -> FacadeResult<bool> {
        let attached: Vec<EntityId> = self
            .reviews
            .get_all()?
            .iter()
            .filter(|review| review.place_id == place_id)
            .map(|review| review.id())
            .collect();
        for review_id in attached {
            self.reviews.delete(review_id)?;
        }

        let deleted = self.places.delete(place_id)?;
        if deleted {
            info!("event=place_deleted module=facade status=ok place_id={place_id}");
        }
        Ok(deleted)
    }

    /// Owner-or-admin gate in front of `update_place`.
    pub fn update_place_authorized(
        &mut self,
        place_id: EntityId,
        patch: &PlacePatch,
        actor_id: EntityId,
    ) -> FacadeResult<Option<Place>> {
        let Some(place) = self.places.get(place_id)? else {
            return Ok(None);
        };
        self.check_actor(actor_id, place.owner_id)?;
        self.update_place(place_id, patch)
    }

    /// Owner-or-admin gate in front of `delete_place`.
    pub fn delete_place_authorized(
        &mut self,
        place_id: EntityId,
        actor_id: EntityId,
    ) -> FacadeResult<bool> {
        let Some(place) = self.places.get(place_id)? else {
            return Ok(false);
        };
        self.check_actor(actor_id, place.owner_id)?;
        self.delete_place(place_id)
    }

    // ---- reviews ----

    /// Creates a review after resolving author and place, rejecting
    /// self-reviews and duplicate (user, place) pairs.
    pub fn create_review(&mut self, req: NewReview) -> FacadeResult<Review> {
        if self.users.get(req.user_id)?.is_none() {
            return Err(FacadeError::UnknownUser(req.user_id));
        }
        let Some(place) = self.places.get(req.place_id)? else {
            return Err(FacadeError::UnknownPlace(req.place_id));
        };
        if place.owner_id == req.user_id {
            return Err(FacadeError::SelfReview {
                user_id: req.user_id,
                place_id: req.place_id,
            });
        }

        // Scan of all reviews; no (user, place) index is maintained.
        let duplicate = self
            .reviews
            .get_all()?
            .iter()
            .any(|review| review.user_id == req.user_id && review.place_id == req.place_id);
        if duplicate {
            return Err(FacadeError::DuplicateReview {
                user_id: req.user_id,
                place_id: req.place_id,
            });
        }

        let review = Review::new(req)?;
        self.reviews.add(review.clone())?;
        info!(
            "event=review_created module=facade status=ok review_id={} place_id={}",
            review.id(),
            review.place_id
        );
        Ok(review)
    }

    pub fn get_review(&self, review_id: EntityId) -> FacadeResult<Option<Review>> {
        Ok(self.reviews.get(review_id)?)
    }

    pub fn get_all_reviews(&self) -> FacadeResult<Vec<Review>> {
        Ok(self.reviews.get_all()?)
    }

    /// Returns the reviews of one place in storage order.
    pub fn get_reviews_by_place(&self, place_id: EntityId) -> FacadeResult<Vec<Review>> {
        if self.places.get(place_id)?.is_none() {
            return Err(FacadeError::UnknownPlace(place_id));
        }
        Ok(self
            .reviews
            .get_all()?
            .into_iter()
            .filter(|review| review.place_id == place_id)
            .collect())
    }

    pub fn update_review(
        &mut self,
        review_id: EntityId,
        patch: &ReviewPatch,
    ) -> FacadeResult<Option<Review>> {
        Ok(self.reviews.update(review_id, patch)?)
    }

    pub fn delete_review(&mut self, review_id: EntityId) -> FacadeResult<bool> {
        Ok(self.reviews.delete(review_id)?)
    }

    /// Author-or-admin gate in front of `update_review`.
    pub fn update_review_authorized(
        &mut self,
        review_id: EntityId,
        patch: &ReviewPatch,
        actor_id: EntityId,
    ) -> FacadeResult<Option<Review>> {
        let Some(review) = self.reviews.get(review_id)? else {
            return Ok(None);
        };
        self.check_actor(actor_id, review.user_id)?;
        self.update_review(review_id, patch)
    }

    /// Author-or-admin gate in front of `delete_review`.
    pub fn delete_review_authorized(
        &mut self,
        review_id: EntityId,
        actor_id: EntityId,
    ) -> FacadeResult<bool> {
        let Some(review) = self.reviews.get(review_id)? else {
            return Ok(false);
        };
        self.check_actor(actor_id, review.user_id)?;
        self.delete_review(review_id)
    }

    // ---- amenities ----

    pub fn create_amenity(&mut self, req: NewAmenity) -> FacadeResult<Amenity> {
        let amenity = Amenity::new(req)?;
        self.amenities.add(amenity.clone())?;
        Ok(amenity)
    }

    pub fn get_amenity(&self, amenity_id: EntityId) -> FacadeResult<Option<Amenity>> {
        Ok(self.amenities.get(amenity_id)?)
    }

    pub fn get_all_amenities(&self) -> FacadeResult<Vec<Amenity>> {
        Ok(self.amenities.get_all()?)
    }

    pub fn update_amenity(
        &mut self,
        amenity_id: EntityId,
        patch: &AmenityPatch,
    ) -> FacadeResult<Option<Amenity>> {
        Ok(self.amenities.update(amenity_id, patch)?)
    }

    /// Deletes an amenity and detaches it from every place referencing it.
    pub fn delete_amenity(&mut self, amenity_id: EntityId) -> FacadeResult<bool> {
        if !self.amenities.delete(amenity_id)? {
            return Ok(false);
        }

        let referencing: Vec<Place> = self
            .places
            .get_all()?
            .into_iter()
            .filter(|place| place.amenity_ids.contains(&amenity_id))
            .collect();
        for place in referencing {
            let remaining: Vec<EntityId> = place
                .amenity_ids
                .iter()
                .copied()
                .filter(|id| *id != amenity_id)
                .collect();
            let patch = PlacePatch {
                amenity_ids: Some(remaining),
                ..PlacePatch::default()
            };
            self.places.update(place.id(), &patch)?;
        }
        Ok(true)
    }

    /// Admits the actor when they are an admin or the referenced owner.
    fn check_actor(&self, actor_id: EntityId, owner_id: EntityId) -> FacadeResult<()> {
        let Some(actor) = self.users.get(actor_id)? else {
            return Err(FacadeError::UnknownUser(actor_id));
        };
        if !actor.is_admin && actor_id != owner_id {
            return Err(FacadeError::Forbidden { actor_id });
        }
        Ok(())
    }
}
