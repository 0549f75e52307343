//! Place domain model.
//!
//! # Responsibility
//! - Define the rentable-location record with geo and pricing constraints.
//! - Track the many-to-many amenity association as an id set.
//!
//! # Invariants
//! - `price` is strictly positive; latitude/longitude bounds are inclusive.
//! - `owner_id` referential integrity is enforced by the facade at creation.

use crate::model::entity::{
    validate_text, AttrValue, Entity, EntityId, EntityMeta, ValidationError,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

const TITLE_MAX_CHARS: usize = 100;

/// Request shape for creating a place through the facade.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPlace {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub owner_id: EntityId,
    /// Amenity references; the facade silently skips ids that do not resolve.
    #[serde(default)]
    pub amenity_ids: Vec<EntityId>,
}

/// Rentable location owned by a user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Place {
    #[serde(flatten)]
    pub meta: EntityMeta,
    pub title: String,
    pub description: Option<String>,
    pub price: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub owner_id: EntityId,
    /// Unordered amenity association. BTreeSet keeps serialization stable.
    pub amenity_ids: BTreeSet<EntityId>,
}

/// Partial update for `Place`. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlacePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Applied by the facade only after the new owner resolves.
    pub owner_id: Option<EntityId>,
    /// Full replacement of the amenity set; unknown ids are filtered out by
    /// the facade before the patch reaches the entity.
    pub amenity_ids: Option<Vec<EntityId>>,
}

impl Place {
    /// Validates the request and builds the record.
    ///
    /// The amenity ids of the request are not attached here: the facade
    /// resolves them against the amenity repository first.
    pub fn new(req: NewPlace) -> Result<Self, ValidationError> {
        let place = Self {
            meta: EntityMeta::new(),
            title: req.title,
            description: req.description,
            price: req.price,
            latitude: req.latitude,
            longitude: req.longitude,
            owner_id: req.owner_id,
            amenity_ids: BTreeSet::new(),
        };
        place.validate()?;
        Ok(place)
    }

    /// Adds one amenity reference. Re-adding an existing id is a no-op.
    pub fn add_amenity(&mut self, amenity_id: EntityId) {
        self.amenity_ids.insert(amenity_id);
    }

    /// Removes one amenity reference, reporting whether it was present.
    pub fn remove_amenity(&mut self, amenity_id: EntityId) -> bool {
        self.amenity_ids.remove(&amenity_id)
    }
}

impl Entity for Place {
    type Patch = PlacePatch;

    fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut EntityMeta {
        &mut self.meta
    }

    fn apply_patch(&mut self, patch: &PlacePatch) -> Result<(), ValidationError> {
        // Merge into a scratch copy so a rejected patch leaves `self` intact.
        let mut updated = self.clone();
        if let Some(title) = &patch.title {
            updated.title = title.clone();
        }
        if let Some(description) = &patch.description {
            updated.description = Some(description.clone());
        }
        if let Some(price) = patch.price {
            updated.price = price;
        }
        if let Some(latitude) = patch.latitude {
            updated.latitude = latitude;
        }
        if let Some(longitude) = patch.longitude {
            updated.longitude = longitude;
        }
        if let Some(owner_id) = patch.owner_id {
            updated.owner_id = owner_id;
        }
        if let Some(amenity_ids) = &patch.amenity_ids {
            updated.amenity_ids = amenity_ids.iter().copied().collect();
        }
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    fn validate(&self) -> Result<(), ValidationError> {
        validate_text("title", &self.title, TITLE_MAX_CHARS)?;
        validate_price(self.price)?;
        validate_latitude(self.latitude)?;
        validate_longitude(self.longitude)?;
        Ok(())
    }

    fn attribute(&self, name: &str) -> Option<AttrValue> {
        match name {
            "id" => Some(AttrValue::Id(self.meta.id)),
            "title" => Some(AttrValue::Str(self.title.clone())),
            "price" => Some(AttrValue::Float(self.price)),
            "latitude" => Some(AttrValue::Float(self.latitude)),
            "longitude" => Some(AttrValue::Float(self.longitude)),
            "owner_id" => Some(AttrValue::Id(self.owner_id)),
            _ => None,
        }
    }
}

fn validate_price(price: f64) -> Result<(), ValidationError> {
    if !price.is_finite() || price <= 0.0 {
        return Err(ValidationError::NonPositivePrice { value: price });
    }
    Ok(())
}

fn validate_latitude(latitude: f64) -> Result<(), ValidationError> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(ValidationError::LatitudeOutOfRange { value: latitude });
    }
    Ok(())
}

fn validate_longitude(longitude: f64) -> Result<(), ValidationError> {
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(ValidationError::LongitudeOutOfRange { value: longitude });
    }
    Ok(())
}
