//! Citizen document request API types

use foncier_core::{
    new_entity_id, DocumentRequest, RequestStatus, Timestamp, ValidationError,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::validation::{normalize_optional, parse_label, required_text};

/// Request to file a citizen document request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateDocumentRequest {
    pub citizen_name: Option<String>,
    pub parcel_reference: Option<String>,
    pub document_type: Option<String>,
    /// Defaults to `En attente`
    pub status: Option<String>,
}

impl CreateDocumentRequest {
    pub fn into_request(self, now: Timestamp) -> ApiResult<DocumentRequest> {
        let citizen_name = required_text(&self.citizen_name, "citizen_name")?;
        let parcel_reference = required_text(&self.parcel_reference, "parcel_reference")?;
        let document_type = required_text(&self.document_type, "document_type")?;
        let status = match normalize_optional(self.status) {
            Some(label) => parse_label(&label)?,
            None => RequestStatus::default(),
        };
        Ok(DocumentRequest {
            id: new_entity_id(),
            citizen_name,
            parcel_reference,
            document_type,
            status,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Workflow transition of a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateRequestStatus {
    /// `Approuvé` or `Rejeté`
    pub status: Option<String>,
}

impl UpdateRequestStatus {
    /// Target status of the transition.
    pub fn target(&self) -> ApiResult<RequestStatus> {
        parse_label(&required_text(&self.status, "status")?)
    }
}

/// Move `current` to `next`, or report the illegal transition.
///
/// Returns `None` when `next` is already the current status.
pub fn transition_request(
    current: &DocumentRequest,
    next: RequestStatus,
    now: Timestamp,
) -> Result<Option<DocumentRequest>, ValidationError> {
    if !current.status.can_transition_to(next) {
        return Err(ValidationError::InvalidTransition {
            from: current.status.to_string(),
            to: next.to_string(),
        });
    }
    if current.status == next {
        return Ok(None);
    }
    Ok(Some(DocumentRequest {
        status: next,
        updated_at: now,
        ..current.clone()
    }))
}

/// Query parameters for request listings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema, utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct RequestListQuery {
    /// Status label, or `all`
    pub status: Option<String>,
}

impl RequestListQuery {
    pub fn status(&self) -> ApiResult<Option<RequestStatus>> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") | Some("all") => Ok(None),
            Some(label) => parse_label(label).map(Some),
        }
    }
}
