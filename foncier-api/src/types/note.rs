//! Note-related API types

use foncier_core::{new_entity_id, EntityId, ParcelNote, Timestamp};
use serde::{Deserialize, Serialize};

use super::DEFAULT_ACTOR;
use crate::error::ApiResult;
use crate::validation::{normalize_optional, required_text};

/// Request to annotate a parcel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateNoteRequest {
    /// Note body
    pub note: Option<String>,
    /// Author, `Agent` when omitted
    pub author: Option<String>,
}

impl CreateNoteRequest {
    pub fn into_note(self, parcel_id: EntityId, now: Timestamp) -> ApiResult<ParcelNote> {
        Ok(ParcelNote {
            id: new_entity_id(),
            parcel_id,
            note: required_text(&self.note, "note")?,
            author: normalize_optional(self.author).unwrap_or_else(|| DEFAULT_ACTOR.to_string()),
            created_at: now,
            updated_at: now,
        })
    }
}

/// Request to edit a note's text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateNoteRequest {
    pub note: Option<String>,
}

impl UpdateNoteRequest {
    pub fn apply(self, current: &ParcelNote, now: Timestamp) -> ApiResult<ParcelNote> {
        Ok(ParcelNote {
            note: required_text(&self.note, "note")?,
            updated_at: now,
            ..current.clone()
        })
    }
}
