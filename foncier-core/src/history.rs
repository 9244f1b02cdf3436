//! Field-level diffs for the parcel audit trail

use crate::Parcel;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// Server-managed columns that never appear in a diff.
const UNTRACKED_FIELDS: &[&str] = &["id", "created_at", "updated_at"];

/// Before/after values of one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FieldChange {
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub from: JsonValue,
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub to: JsonValue,
}

/// Changed fields keyed by field name, serialized as
/// `{ "<field>": { "from": ..., "to": ... } }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeSet(BTreeMap<String, FieldChange>);

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, from: JsonValue, to: JsonValue) {
        self.0.insert(field.into(), FieldChange { from, to });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn touches(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&FieldChange> {
        self.0.get(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldChange)> {
        self.0.iter()
    }

    /// Case-insensitive search over field names and rendered values.
    pub fn mentions(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.0.iter().any(|(field, change)| {
            field.to_lowercase().contains(&needle)
                || render(&change.from).to_lowercase().contains(&needle)
                || render(&change.to).to_lowercase().contains(&needle)
        })
    }
}

fn render(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

/// Compare two versions of a parcel field by field.
///
/// Returns an empty change set when every tracked field is equal.
pub fn diff_parcels(before: &Parcel, after: &Parcel) -> ChangeSet {
    let mut changes = ChangeSet::new();

    let (Ok(JsonValue::Object(old)), Ok(JsonValue::Object(new))) =
        (serde_json::to_value(before), serde_json::to_value(after))
    else {
        return changes;
    };

    for (field, new_value) in new {
        if UNTRACKED_FIELDS.contains(&field.as_str()) {
            continue;
        }
        let old_value = old.get(&field).cloned().unwrap_or(JsonValue::Null);
        if old_value != new_value {
            changes.insert(field, old_value, new_value);
        }
    }

    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AcquisitionType, LandUse, ParcelStatus};
    use chrono::{NaiveDate, Utc};
    use serde_json::json;
    use proptest::prelude::*;
    use uuid::Uuid;

    fn parcel() -> Parcel {
        let now = Utc::now();
        Parcel {
            id: Uuid::now_v7(),
            reference: "REF-1".to_string(),
            parcel_number: "12".to_string(),
            province: "Haut-Katanga".to_string(),
            territory_or_city: "Lubumbashi".to_string(),
            commune_or_sector: "Lubumbashi".to_string(),
            quartier_or_cheflieu: "Makutano".to_string(),
            avenue: "Avenue Lumumba".to_string(),
            gps_lat: -11.66,
            gps_long: 27.48,
            area: 600.0,
            location: None,
            status: ParcelStatus::Free,
            land_use: LandUse::Commercial,
            certificate_number: String::new(),
            issuing_authority: String::new(),
            acquisition_type: AcquisitionType::Sale,
            acquisition_act_ref: "ACT".to_string(),
            title_date: NaiveDate::from_ymd_opt(2019, 6, 1).unwrap(),
            owner_name: "Kabila".to_string(),
            owner_id_number: "X".to_string(),
            company_name: None,
            rccm: None,
            nif: None,
            surveying_pv_ref: "PV".to_string(),
            surveyor_name: "S".to_string(),
            surveyor_license: "L".to_string(),
            cadastral_plan_ref: String::new(),
            servitudes: None,
            charges: None,
            litigation: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_identical_parcels_produce_empty_diff() {
        let p = parcel();
        assert!(diff_parcels(&p, &p.clone()).is_empty());
    }

    #[test]
    fn test_timestamps_are_not_tracked() {
        let before = parcel();
        let mut after = before.clone();
        after.updated_at = before.updated_at + chrono::Duration::hours(1);
        assert!(diff_parcels(&before, &after).is_empty());
    }

    #[test]
    fn test_diff_records_from_and_to() {
        let before = parcel();
        let mut after = before.clone();
        after.status = ParcelStatus::Mortgaged;
        after.area = 650.5;
        after.charges = Some("Hypothèque BCDC".to_string());

        let changes = diff_parcels(&before, &after);
        assert_eq!(changes.len(), 3);
        let status = changes.get("status").unwrap();
        assert_eq!(status.from, json!("Libre"));
        assert_eq!(status.to, json!("Hypothéqué"));
        assert_eq!(changes.get("charges").unwrap().from, JsonValue::Null);
        assert!(changes.touches("area"));
        assert!(!changes.touches("owner_name"));
    }

    #[test]
    fn test_change_set_wire_shape() {
        let mut changes = ChangeSet::new();
        changes.insert("owner_name", json!("A"), json!("B"));
        let value = serde_json::to_value(&changes).unwrap();
        assert_eq!(value, json!({"owner_name": {"from": "A", "to": "B"}}));
    }

    #[test]
    fn test_mentions_searches_names_and_values() {
        let mut changes = ChangeSet::new();
        changes.insert("owner_name", json!("Tshibanda"), json!("Mukendi"));
        assert!(changes.mentions("owner"));
        assert!(changes.mentions("mukendi"));
        assert!(!changes.mentions("area"));
    }

    proptest! {
        #[test]
        fn prop_diff_tracks_exactly_the_edited_fields(
            area in 1.0f64..1e6,
            owner in "[A-Za-z ]{1,24}",
        ) {
            let before = parcel();
            let mut after = before.clone();
            after.area = area;
            after.owner_name = owner.clone();

            let changes = diff_parcels(&before, &after);
            let expected = usize::from(area != before.area) + usize::from(owner != before.owner_name);
            prop_assert_eq!(changes.len(), expected);
            prop_assert!(changes.fields().all(|f| f == "area" || f == "owner_name"));
        }
    }
}
