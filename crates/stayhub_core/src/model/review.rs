//! Review domain model.
//!
//! # Invariants
//! - `rating` lies in [1, 5].
//! - Self-review and duplicate-review rules live in the facade; this record
//!   only validates its own fields.

use crate::model::entity::{AttrValue, Entity, EntityId, EntityMeta, ValidationError};
use serde::{Deserialize, Serialize};

/// Request shape for creating a review through the facade.
#[derive(Debug, Clone, Deserialize)]
pub struct NewReview {
    pub text: String,
    pub rating: u8,
    pub user_id: EntityId,
    pub place_id: EntityId,
}

/// Rating left by a user on a place they do not own.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Review {
    #[serde(flatten)]
    pub meta: EntityMeta,
    pub text: String,
    pub rating: u8,
    pub user_id: EntityId,
    pub place_id: EntityId,
}

/// Partial update for `Review`.
///
/// Author and place references are deliberately not patchable: moving a
/// review between users or places would bypass the facade's business rules.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewPatch {
    pub text: Option<String>,
    pub rating: Option<u8>,
}

impl Review {
    pub fn new(req: NewReview) -> Result<Self, ValidationError> {
        let review = Self {
            meta: EntityMeta::new(),
            text: req.text,
            rating: req.rating,
            user_id: req.user_id,
            place_id: req.place_id,
        };
        review.validate()?;
        Ok(review)
    }
}

impl Entity for Review {
    type Patch = ReviewPatch;

    fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut EntityMeta {
        &mut self.meta
    }

    fn apply_patch(&mut self, patch: &ReviewPatch) -> Result<(), ValidationError> {
        let mut updated = self.clone();
        if let Some(text) = &patch.text {
            updated.text = text.clone();
        }
        if let Some(rating) = patch.rating {
            updated.rating = rating;
        }
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.text.trim().is_empty() {
            return Err(ValidationError::EmptyField { field: "text" });
        }
        if !(1..=5).contains(&self.rating) {
            return Err(ValidationError::RatingOutOfRange { value: self.rating });
        }
        Ok(())
    }

    fn attribute(&self, name: &str) -> Option<AttrValue> {
        match name {
            "id" => Some(AttrValue::Id(self.meta.id)),
            "text" => Some(AttrValue::Str(self.text.clone())),
            "rating" => Some(AttrValue::Int(i64::from(self.rating))),
            "user_id" => Some(AttrValue::Id(self.user_id)),
            "place_id" => Some(AttrValue::Id(self.place_id)),
            _ => None,
        }
    }
}
