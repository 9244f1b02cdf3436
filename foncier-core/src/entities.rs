//! Registry entity structures

use crate::{
    AcquisitionType, ChangeSet, EntityId, LandUse, ParcelStatus, RequestStatus, Timestamp,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A cadastral parcel record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Parcel {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: EntityId,
    /// Cadastral reference, unique across the registry
    pub reference: String,
    pub parcel_number: String,

    // Location hierarchy
    pub province: String,
    pub territory_or_city: String,
    pub commune_or_sector: String,
    pub quartier_or_cheflieu: String,
    pub avenue: String,
    pub gps_lat: f64,
    pub gps_long: f64,
    /// Surface in square metres
    pub area: f64,
    pub location: Option<String>,

    // Legal status and title
    pub status: ParcelStatus,
    pub land_use: LandUse,
    pub certificate_number: String,
    pub issuing_authority: String,
    pub acquisition_type: AcquisitionType,
    pub acquisition_act_ref: String,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date"))]
    pub title_date: NaiveDate,

    // Ownership
    pub owner_name: String,
    pub owner_id_number: String,
    pub company_name: Option<String>,
    pub rccm: Option<String>,
    pub nif: Option<String>,

    // Survey
    pub surveying_pv_ref: String,
    pub surveyor_name: String,
    pub surveyor_license: String,
    pub cadastral_plan_ref: String,

    // Encumbrances
    pub servitudes: Option<String>,
    pub charges: Option<String>,
    pub litigation: Option<String>,

    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

impl Parcel {
    /// Title or survey references still need to be filled in.
    pub fn needs_validation(&self) -> bool {
        self.certificate_number.is_empty()
            || self.issuing_authority.is_empty()
            || self.cadastral_plan_ref.is_empty()
    }

    /// Disputed parcels, or parcels with recorded litigation.
    pub fn has_boundary_conflict(&self) -> bool {
        self.status == ParcelStatus::Disputed
            || self
                .litigation
                .as_deref()
                .is_some_and(|l| !l.trim().is_empty())
    }

    /// Case-insensitive match on reference, parcel number or owner name.
    pub fn matches_query(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        [&self.reference, &self.parcel_number, &self.owner_name]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// A file attached to a parcel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Document {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: EntityId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub parcel_id: EntityId,
    /// Document kind, e.g. "Titre foncier" or "PV de bornage"
    #[serde(rename = "type")]
    pub doc_type: String,
    pub mime: String,
    /// Path relative to the upload root
    pub file_path: String,
    pub original_name: String,
    pub size_bytes: i64,
    /// Hex-encoded SHA-256 of the stored bytes
    pub sha256: String,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

/// One entry of the append-only parcel audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ParcelHistory {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: EntityId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub parcel_id: EntityId,
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub changes: ChangeSet,
    pub user: String,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub changed_at: Timestamp,
}

/// Free-text annotation on a parcel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ParcelNote {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: EntityId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub parcel_id: EntityId,
    pub note: String,
    pub author: String,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

/// A citizen's request for a registry document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DocumentRequest {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: EntityId,
    pub citizen_name: String,
    pub parcel_reference: String,
    pub document_type: String,
    pub status: RequestStatus,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_parcel() -> Parcel {
        let now = Utc::now();
        Parcel {
            id: Uuid::nil(),
            reference: "KIN-GOM-0001".to_string(),
            parcel_number: "1234".to_string(),
            province: "Kinshasa".to_string(),
            territory_or_city: "Kinshasa".to_string(),
            commune_or_sector: "Gombe".to_string(),
            quartier_or_cheflieu: "Golf".to_string(),
            avenue: "Avenue des Aviateurs".to_string(),
            gps_lat: -4.3,
            gps_long: 15.3,
            area: 450.0,
            location: None,
            status: ParcelStatus::Free,
            land_use: LandUse::Residential,
            certificate_number: "CE-001".to_string(),
            issuing_authority: "Direction des Titres Immobiliers".to_string(),
            acquisition_type: AcquisitionType::Concession,
            acquisition_act_ref: "ACT-1".to_string(),
            title_date: NaiveDate::from_ymd_opt(2020, 1, 15).unwrap(),
            owner_name: "Mbuyi Kalala".to_string(),
            owner_id_number: "ID-77".to_string(),
            company_name: None,
            rccm: None,
            nif: None,
            surveying_pv_ref: "PV-1".to_string(),
            surveyor_name: "Ilunga".to_string(),
            surveyor_license: "GEO-9".to_string(),
            cadastral_plan_ref: "PLAN-3".to_string(),
            servitudes: None,
            charges: None,
            litigation: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_needs_validation_when_certificate_missing() {
        let mut parcel = sample_parcel();
        assert!(!parcel.needs_validation());
        parcel.certificate_number.clear();
        assert!(parcel.needs_validation());
    }

    #[test]
    fn test_boundary_conflict_from_status_or_litigation() {
        let mut parcel = sample_parcel();
        assert!(!parcel.has_boundary_conflict());
        parcel.litigation = Some("   ".to_string());
        assert!(!parcel.has_boundary_conflict());
        parcel.litigation = Some("Contestation de limite".to_string());
        assert!(parcel.has_boundary_conflict());
        parcel.litigation = None;
        parcel.status = ParcelStatus::Disputed;
        assert!(parcel.has_boundary_conflict());
    }

    #[test]
    fn test_matches_query_is_case_insensitive() {
        let parcel = sample_parcel();
        assert!(parcel.matches_query("kin-gom"));
        assert!(parcel.matches_query("KALALA"));
        assert!(parcel.matches_query(""));
        assert!(!parcel.matches_query("Lubumbashi"));
    }

    #[test]
    fn test_document_serializes_kind_as_type() {
        let doc = Document {
            id: Uuid::nil(),
            parcel_id: Uuid::nil(),
            doc_type: "Titre foncier".to_string(),
            mime: "application/pdf".to_string(),
            file_path: "x/y.pdf".to_string(),
            original_name: "y.pdf".to_string(),
            size_bytes: 3,
            sha256: String::new(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["type"], "Titre foncier");
        assert!(json.get("doc_type").is_none());
    }

    #[test]
    fn test_title_date_serializes_as_plain_date() {
        let json = serde_json::to_value(sample_parcel()).unwrap();
        assert_eq!(json["title_date"], "2020-01-15");
        assert_eq!(json["status"], "Libre");
    }
}
