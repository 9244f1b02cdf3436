//! Audit trail API types

use foncier_core::{new_entity_id, ChangeSet, EntityId, HistoryFilter, ParcelHistory, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{ApiError, ApiResult};
use crate::validation::{normalize_optional, parse_date};

/// Actor recorded when none is supplied.
pub const DEFAULT_ACTOR: &str = "Agent";

/// Query parameters for a parcel's history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema, utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct HistoryQuery {
    /// Matches field names, values and the user
    pub q: Option<String>,
    /// Inclusive lower bound, `YYYY-MM-DD`
    pub from: Option<String>,
    /// Inclusive upper bound, `YYYY-MM-DD`
    pub to: Option<String>,
}

impl HistoryQuery {
    pub fn into_filter(self) -> ApiResult<HistoryFilter> {
        let from = normalize_optional(self.from)
            .map(|raw| parse_date("from", &raw))
            .transpose()?;
        let to = normalize_optional(self.to)
            .map(|raw| parse_date("to", &raw))
            .transpose()?;
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(ApiError::invalid_input("'from' must not be after 'to'"));
            }
        }
        Ok(HistoryFilter {
            query: normalize_optional(self.q),
            from,
            to,
        })
    }
}

/// Manually recorded history entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateHistoryRequest {
    /// `{ "<field>": { "from": ..., "to": ... } }`
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub changes: JsonValue,
    pub user: Option<String>,
}

impl CreateHistoryRequest {
    pub fn into_entry(self, parcel_id: EntityId, now: Timestamp) -> ApiResult<ParcelHistory> {
        if !self.changes.is_object() {
            return Err(ApiError::missing_field("changes"));
        }
        let changes: ChangeSet = serde_json::from_value(self.changes).map_err(|_| {
            ApiError::invalid_input("Field 'changes' must map field names to {from, to}")
        })?;
        Ok(ParcelHistory {
            id: new_entity_id(),
            parcel_id,
            changes,
            user: normalize_optional(self.user).unwrap_or_else(|| DEFAULT_ACTOR.to_string()),
            changed_at: now,
        })
    }
}
