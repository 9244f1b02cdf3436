//! e-Foncier Test Utilities
//!
//! Shared test infrastructure for the e-Foncier workspace:
//! - Proptest generators for registry entities
//! - Fixtures for parcels, notes and requests
//! - JSON bodies matching what the browser client sends
//! - Custom assertions

pub use foncier_storage::{MemoryStore, RegistryStore};

pub use foncier_core::{
    AcquisitionType, Document, DocumentRequest, EntityId, FoncierError, FoncierResult, LandUse,
    Parcel, ParcelHistory, ParcelNote, ParcelStatus, RequestStatus, StorageError, Timestamp,
};

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for registry entity types.

    use super::*;
    use proptest::prelude::*;

    /// Generate a random UUID.
    pub fn arb_uuid() -> impl Strategy<Value = Uuid> {
        any::<[u8; 16]>().prop_map(Uuid::from_bytes)
    }

    /// Generate a Timestamp between 2020 and 2030.
    pub fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
        (1577836800i64..1893456000i64).prop_map(|secs| {
            chrono::DateTime::from_timestamp(secs, 0).unwrap_or_else(Utc::now)
        })
    }

    /// Generate a title date between 1960 and 2025.
    pub fn arb_title_date() -> impl Strategy<Value = NaiveDate> {
        (1960i32..2025, 1u32..=12, 1u32..=28).prop_map(|(y, m, d)| {
            NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
        })
    }

    // === Enum Generators ===

    pub fn arb_parcel_status() -> impl Strategy<Value = ParcelStatus> {
        prop::sample::select(ParcelStatus::ALL.to_vec())
    }

    pub fn arb_land_use() -> impl Strategy<Value = LandUse> {
        prop::sample::select(LandUse::ALL.to_vec())
    }

    pub fn arb_acquisition_type() -> impl Strategy<Value = AcquisitionType> {
        prop::sample::select(AcquisitionType::ALL.to_vec())
    }

    pub fn arb_request_status() -> impl Strategy<Value = RequestStatus> {
        prop::sample::select(RequestStatus::ALL.to_vec())
    }

    // === Text Generators ===

    /// Non-blank single-line text, as typed into a form field.
    pub fn arb_field_text() -> impl Strategy<Value = String> {
        "[A-Za-z][A-Za-z0-9 .-]{0,30}".prop_map(|s| s.trim_end().to_string())
    }

    /// Optional text where `None` stands for a field left empty.
    pub fn arb_optional_text() -> impl Strategy<Value = Option<String>> {
        prop::option::of(arb_field_text())
    }

    /// Cadastral reference in the registry's `PROV-SEC-NNNN` shape.
    pub fn arb_reference() -> impl Strategy<Value = String> {
        ("[A-Z]{3}", "[A-Z]{2}", 1u32..10000)
            .prop_map(|(prov, sec, n)| format!("{}-{}-{:04}", prov, sec, n))
    }

    // === Entity Generators ===

    /// Generate a complete parcel with valid coordinates and area.
    pub fn arb_parcel() -> impl Strategy<Value = Parcel> {
        let location = (
            arb_reference(),
            arb_field_text(),
            arb_field_text(),
            arb_field_text(),
            -13.45f64..5.38,
            12.2f64..31.3,
            1.0f64..100_000.0,
        );
        let legal = (
            arb_parcel_status(),
            arb_land_use(),
            arb_acquisition_type(),
            arb_title_date(),
            arb_optional_text(),
            arb_optional_text(),
        );
        (location, legal, arb_timestamp()).prop_map(
            |(
                (reference, province, city, owner, lat, long, area),
                (status, land_use, acquisition_type, title_date, servitudes, litigation),
                created_at,
            )| {
                let mut parcel = fixtures::sample_parcel();
                parcel.id = Uuid::now_v7();
                parcel.reference = reference;
                parcel.province = province;
                parcel.territory_or_city = city;
                parcel.owner_name = owner;
                parcel.gps_lat = lat;
                parcel.gps_long = long;
                parcel.area = area;
                parcel.status = status;
                parcel.land_use = land_use;
                parcel.acquisition_type = acquisition_type;
                parcel.title_date = title_date;
                parcel.servitudes = servitudes;
                parcel.litigation = litigation;
                parcel.created_at = created_at;
                parcel.updated_at = created_at;
                parcel
            },
        )
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built registry records and request bodies.

    use super::*;
    use serde_json::{json, Value as JsonValue};

    /// A complete, unencumbered residential parcel in Kinshasa.
    pub fn sample_parcel() -> Parcel {
        let now = Utc::now();
        Parcel {
            id: Uuid::now_v7(),
            reference: "KIN-GOM-0001".to_string(),
            parcel_number: "PN-0001".to_string(),
            province: "Kinshasa".to_string(),
            territory_or_city: "Kinshasa".to_string(),
            commune_or_sector: "Gombe".to_string(),
            quartier_or_cheflieu: "Golf".to_string(),
            avenue: "Avenue des Aviateurs".to_string(),
            gps_lat: -4.3017,
            gps_long: 15.3136,
            area: 500.0,
            location: None,
            status: ParcelStatus::Free,
            land_use: LandUse::Residential,
            certificate_number: "CERT-0001".to_string(),
            issuing_authority: "Conservation des Titres Immobiliers".to_string(),
            acquisition_type: AcquisitionType::Sale,
            acquisition_act_ref: "ACT-0001".to_string(),
            title_date: NaiveDate::from_ymd_opt(2021, 6, 1).unwrap_or_default(),
            owner_name: "Kalala Mbuyi".to_string(),
            owner_id_number: "ID-0001".to_string(),
            company_name: None,
            rccm: None,
            nif: None,
            surveying_pv_ref: "PV-0001".to_string(),
            surveyor_name: "Ilunga".to_string(),
            surveyor_license: "GEO-0001".to_string(),
            cadastral_plan_ref: "PLAN-0001".to_string(),
            servitudes: None,
            charges: None,
            litigation: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sample parcel with the given reference and a fresh id.
    pub fn parcel_with_reference(reference: &str) -> Parcel {
        Parcel {
            id: Uuid::now_v7(),
            reference: reference.to_string(),
            ..sample_parcel()
        }
    }

    /// Sample parcel in the given province and status.
    pub fn parcel_in(reference: &str, province: &str, status: ParcelStatus) -> Parcel {
        Parcel {
            province: province.to_string(),
            status,
            ..parcel_with_reference(reference)
        }
    }

    /// A note written by the default agent.
    pub fn sample_note(parcel_id: EntityId) -> ParcelNote {
        let now = Utc::now();
        ParcelNote {
            id: Uuid::now_v7(),
            parcel_id,
            note: "Visite de terrain effectuée".to_string(),
            author: "Agent".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    /// A pending citizen request against the given reference.
    pub fn pending_request(parcel_reference: &str) -> DocumentRequest {
        let now = Utc::now();
        DocumentRequest {
            id: Uuid::now_v7(),
            citizen_name: "Nadège Kasongo".to_string(),
            parcel_reference: parcel_reference.to_string(),
            document_type: "Extrait cadastral".to_string(),
            status: RequestStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// JSON body for `POST /api/parcels` carrying every required field.
    pub fn create_parcel_body() -> JsonValue {
        json!({
            "parcel_number": "PN-001",
            "province": "Kinshasa",
            "territory_or_city": "Kinshasa",
            "commune_or_sector": "Gombe",
            "quartier_or_cheflieu": "Golf",
            "avenue": "Avenue des Aviateurs",
            "gps_lat": -4.3017,
            "gps_long": 15.3136,
            "area": 500,
            "status": "Libre",
            "land_use": "Résidentiel",
            "acquisition_type": "Vente",
            "acquisition_act_ref": "ACT-9",
            "title_date": "2021-06-01",
            "owner_name": "Kalala",
            "owner_id_number": "ID-1",
            "surveying_pv_ref": "PV-1",
            "surveyor_name": "Ilunga",
            "surveyor_license": "GEO-1"
        })
    }

    /// Create body with an explicit cadastral reference.
    pub fn create_parcel_body_with_reference(reference: &str) -> JsonValue {
        let mut body = create_parcel_body();
        if let Some(obj) = body.as_object_mut() {
            obj.insert("reference".to_string(), json!(reference));
        }
        body
    }

    /// JSON body for `POST /api/requests`.
    pub fn create_request_body(parcel_reference: &str) -> JsonValue {
        json!({
            "citizen_name": "Nadège Kasongo",
            "parcel_reference": parcel_reference,
            "document_type": "Extrait cadastral"
        })
    }

    /// In-memory store holding the given parcels.
    pub async fn store_with_parcels(parcels: &[Parcel]) -> FoncierResult<MemoryStore> {
        let store = MemoryStore::new();
        for parcel in parcels {
            store.parcel_insert(parcel).await?;
        }
        Ok(store)
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions for registry-specific results.

    use super::*;

    /// Assert that a FoncierResult is Ok.
    #[track_caller]
    pub fn assert_ok<T: std::fmt::Debug>(result: &FoncierResult<T>) {
        assert!(result.is_ok(), "Expected Ok, got Err: {:?}", result);
    }

    /// Assert that a FoncierResult is a storage conflict.
    #[track_caller]
    pub fn assert_conflict<T: std::fmt::Debug>(result: &FoncierResult<T>) {
        match result {
            Err(FoncierError::Storage(StorageError::Conflict { .. })) => {}
            other => panic!("Expected Conflict error, got: {:?}", other),
        }
    }

    /// Assert that a list is ordered newest first by the given key.
    #[track_caller]
    pub fn assert_newest_first<T>(items: &[T], key: impl Fn(&T) -> Timestamp) {
        for pair in items.windows(2) {
            assert!(
                key(&pair[0]) >= key(&pair[1]),
                "Items are not ordered newest first"
            );
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
