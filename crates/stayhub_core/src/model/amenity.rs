//! Amenity domain model.

use crate::model::entity::{validate_text, AttrValue, Entity, EntityMeta, ValidationError};
use serde::{Deserialize, Serialize};

const NAME_MAX_CHARS: usize = 50;

/// Request shape for creating an amenity through the facade.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAmenity {
    pub name: String,
}

/// Feature a place can offer. Names are not required to be unique.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Amenity {
    #[serde(flatten)]
    pub meta: EntityMeta,
    pub name: String,
}

/// Partial update for `Amenity`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AmenityPatch {
    pub name: Option<String>,
}

impl Amenity {
    pub fn new(req: NewAmenity) -> Result<Self, ValidationError> {
        let amenity = Self {
            meta: EntityMeta::new(),
            name: req.name,
        };
        amenity.validate()?;
        Ok(amenity)
    }
}

impl Entity for Amenity {
    type Patch = AmenityPatch;

    fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut EntityMeta {
        &mut self.meta
    }

    fn apply_patch(&mut self, patch: &AmenityPatch) -> Result<(), ValidationError> {
        if let Some(name) = &patch.name {
            validate_text("name", name, NAME_MAX_CHARS)?;
            self.name = name.clone();
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ValidationError> {
        validate_text("name", &self.name, NAME_MAX_CHARS)
    }

    fn attribute(&self, name: &str) -> Option<AttrValue> {
        match name {
            "id" => Some(AttrValue::Id(self.meta.id)),
            "name" => Some(AttrValue::Str(self.name.clone())),
            _ => None,
        }
    }
}
