//! Parcel-related API types

use foncier_core::{generate_reference, new_entity_id, Parcel, ParcelFilter, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::ApiResult;
use crate::validation::{
    coordinate, json_number, normalize_optional, parse_date, parse_label, present,
    required_text, validate_coordinates, ValidateNonEmpty, ValidateRange,
};

/// Upper bound on `limit` for parcel listings.
pub const MAX_PAGE_SIZE: usize = 1000;

/// Largest `offset` the stores can page to.
pub const MAX_OFFSET: usize = i64::MAX as usize;

/// Fields a new parcel must carry, in the order they are checked.
pub const REQUIRED_PARCEL_FIELDS: &[&str] = &[
    "parcel_number",
    "province",
    "territory_or_city",
    "commune_or_sector",
    "quartier_or_cheflieu",
    "avenue",
    "area",
    "status",
    "land_use",
    "acquisition_type",
    "acquisition_act_ref",
    "title_date",
    "owner_name",
    "owner_id_number",
    "surveying_pv_ref",
    "surveyor_name",
    "surveyor_license",
];

/// Request to register a parcel.
///
/// Everything is optional at the serde level so that a missing field is
/// reported by name rather than as a generic deserialization failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateParcelRequest {
    /// Cadastral reference; generated as `AUTO-xxxxxxxx` when blank
    pub reference: Option<String>,
    pub parcel_number: Option<String>,
    pub province: Option<String>,
    pub territory_or_city: Option<String>,
    pub commune_or_sector: Option<String>,
    pub quartier_or_cheflieu: Option<String>,
    pub avenue: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<f64>))]
    pub gps_lat: Option<JsonValue>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<f64>))]
    pub gps_long: Option<JsonValue>,
    /// Surface in square metres
    #[cfg_attr(feature = "openapi", schema(value_type = f64))]
    pub area: Option<JsonValue>,
    pub location: Option<String>,
    /// `Libre`, `En litige` or `Hypothéqué`
    pub status: Option<String>,
    pub land_use: Option<String>,
    pub certificate_number: Option<String>,
    pub issuing_authority: Option<String>,
    pub acquisition_type: Option<String>,
    pub acquisition_act_ref: Option<String>,
    /// `YYYY-MM-DD`
    pub title_date: Option<String>,
    pub owner_name: Option<String>,
    pub owner_id_number: Option<String>,
    pub company_name: Option<String>,
    pub rccm: Option<String>,
    pub nif: Option<String>,
    pub surveying_pv_ref: Option<String>,
    pub surveyor_name: Option<String>,
    pub surveyor_license: Option<String>,
    pub cadastral_plan_ref: Option<String>,
    pub servitudes: Option<String>,
    pub charges: Option<String>,
    pub litigation: Option<String>,
}

impl CreateParcelRequest {
    fn check_required(&self) -> ApiResult<()> {
        self.parcel_number.validate_non_empty("parcel_number")?;
        self.province.validate_non_empty("province")?;
        self.territory_or_city.validate_non_empty("territory_or_city")?;
        self.commune_or_sector.validate_non_empty("commune_or_sector")?;
        self.quartier_or_cheflieu.validate_non_empty("quartier_or_cheflieu")?;
        self.avenue.validate_non_empty("avenue")?;
        self.area.validate_non_empty("area")?;
        self.status.validate_non_empty("status")?;
        self.land_use.validate_non_empty("land_use")?;
        self.acquisition_type.validate_non_empty("acquisition_type")?;
        self.acquisition_act_ref.validate_non_empty("acquisition_act_ref")?;
        self.title_date.validate_non_empty("title_date")?;
        self.owner_name.validate_non_empty("owner_name")?;
        self.owner_id_number.validate_non_empty("owner_id_number")?;
        self.surveying_pv_ref.validate_non_empty("surveying_pv_ref")?;
        self.surveyor_name.validate_non_empty("surveyor_name")?;
        self.surveyor_license.validate_non_empty("surveyor_license")
    }

    /// Validate and build the parcel row.
    pub fn into_parcel(self, now: Timestamp) -> ApiResult<Parcel> {
        self.check_required()?;

        let area = json_number(self.area.as_ref().unwrap_or(&JsonValue::Null))?;
        let gps_lat = coordinate(self.gps_lat.as_ref())?;
        let gps_long = coordinate(self.gps_long.as_ref())?;

        area.validate_positive("area")?;
        validate_coordinates(gps_lat, gps_long)?;

        let status = parse_label(self.status.as_deref().unwrap_or_default())?;
        let land_use = parse_label(self.land_use.as_deref().unwrap_or_default())?;
        let acquisition_type = parse_label(self.acquisition_type.as_deref().unwrap_or_default())?;
        let title_date = parse_date("title_date", self.title_date.as_deref().unwrap_or_default())?;

        Ok(Parcel {
            id: new_entity_id(),
            reference: normalize_optional(self.reference).unwrap_or_else(generate_reference),
            parcel_number: required_text(&self.parcel_number, "parcel_number")?,
            province: required_text(&self.province, "province")?,
            territory_or_city: required_text(&self.territory_or_city, "territory_or_city")?,
            commune_or_sector: required_text(&self.commune_or_sector, "commune_or_sector")?,
            quartier_or_cheflieu: required_text(&self.quartier_or_cheflieu, "quartier_or_cheflieu")?,
            avenue: required_text(&self.avenue, "avenue")?,
            gps_lat,
            gps_long,
            area,
            location: normalize_optional(self.location),
            status,
            land_use,
            certificate_number: normalize_optional(self.certificate_number).unwrap_or_default(),
            issuing_authority: normalize_optional(self.issuing_authority).unwrap_or_default(),
            acquisition_type,
            acquisition_act_ref: required_text(&self.acquisition_act_ref, "acquisition_act_ref")?,
            title_date,
            owner_name: required_text(&self.owner_name, "owner_name")?,
            owner_id_number: required_text(&self.owner_id_number, "owner_id_number")?,
            company_name: normalize_optional(self.company_name),
            rccm: normalize_optional(self.rccm),
            nif: normalize_optional(self.nif),
            surveying_pv_ref: required_text(&self.surveying_pv_ref, "surveying_pv_ref")?,
            surveyor_name: required_text(&self.surveyor_name, "surveyor_name")?,
            surveyor_license: required_text(&self.surveyor_license, "surveyor_license")?,
            cadastral_plan_ref: normalize_optional(self.cadastral_plan_ref).unwrap_or_default(),
            servitudes: normalize_optional(self.servitudes),
            charges: normalize_optional(self.charges),
            litigation: normalize_optional(self.litigation),
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial parcel update.
///
/// Absent fields are left alone. `null` clears optional text and resets
/// coordinates to 0; on a required field it is rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateParcelRequest {
    #[serde(default, deserialize_with = "present")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
    pub reference: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
    pub parcel_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
    pub province: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
    pub territory_or_city: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
    pub commune_or_sector: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
    pub quartier_or_cheflieu: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
    pub avenue: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<f64>))]
    pub gps_lat: Option<JsonValue>,
    #[serde(default, deserialize_with = "present")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<f64>))]
    pub gps_long: Option<JsonValue>,
    #[serde(default, deserialize_with = "present")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<f64>))]
    pub area: Option<JsonValue>,
    #[serde(default, deserialize_with = "present")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
    pub status: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
    pub land_use: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
    pub certificate_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
    pub issuing_authority: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
    pub acquisition_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
    pub acquisition_act_ref: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
    pub title_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
    pub owner_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
    pub owner_id_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
    pub company_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
    pub rccm: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
    pub nif: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
    pub surveying_pv_ref: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
    pub surveyor_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
    pub surveyor_license: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
    pub cadastral_plan_ref: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
    pub servitudes: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
    pub charges: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
    pub litigation: Option<Option<String>>,
}

fn set_required(target: &mut String, value: Option<Option<String>>, field: &str) -> ApiResult<()> {
    if let Some(value) = value {
        *target = required_text(&value, field)?;
    }
    Ok(())
}

fn set_optional(target: &mut Option<String>, value: Option<Option<String>>) {
    if let Some(value) = value {
        *target = normalize_optional(value);
    }
}

fn set_defaulted(target: &mut String, value: Option<Option<String>>) {
    if let Some(value) = value {
        *target = normalize_optional(value).unwrap_or_default();
    }
}

/// A required label or date: present, so it must not be null or blank.
fn required_present(value: Option<String>, field: &str) -> ApiResult<String> {
    required_text(&value, field)
}

impl UpdateParcelRequest {
    /// Apply the update to a copy of `current`.
    ///
    /// Server-managed fields (`id`, `created_at`, `updated_at`) are not
    /// touched; the caller bumps `updated_at` when the diff is non-empty.
    pub fn apply(self, current: &Parcel) -> ApiResult<Parcel> {
        let mut parcel = current.clone();

        set_required(&mut parcel.reference, self.reference, "reference")?;
        set_required(&mut parcel.parcel_number, self.parcel_number, "parcel_number")?;
        set_required(&mut parcel.province, self.province, "province")?;
        set_required(&mut parcel.territory_or_city, self.territory_or_city, "territory_or_city")?;
        set_required(&mut parcel.commune_or_sector, self.commune_or_sector, "commune_or_sector")?;
        set_required(
            &mut parcel.quartier_or_cheflieu,
            self.quartier_or_cheflieu,
            "quartier_or_cheflieu",
        )?;
        set_required(&mut parcel.avenue, self.avenue, "avenue")?;
        set_required(
            &mut parcel.acquisition_act_ref,
            self.acquisition_act_ref,
            "acquisition_act_ref",
        )?;
        set_required(&mut parcel.owner_name, self.owner_name, "owner_name")?;
        set_required(&mut parcel.owner_id_number, self.owner_id_number, "owner_id_number")?;
        set_required(&mut parcel.surveying_pv_ref, self.surveying_pv_ref, "surveying_pv_ref")?;
        set_required(&mut parcel.surveyor_name, self.surveyor_name, "surveyor_name")?;
        set_required(&mut parcel.surveyor_license, self.surveyor_license, "surveyor_license")?;

        if let Some(area) = &self.area {
            area.validate_non_empty("area")?;
            parcel.area = json_number(area)?;
        }
        if let Some(lat) = &self.gps_lat {
            parcel.gps_lat = coordinate(Some(lat))?;
        }
        if let Some(long) = &self.gps_long {
            parcel.gps_long = coordinate(Some(long))?;
        }
        parcel.area.validate_positive("area")?;
        validate_coordinates(parcel.gps_lat, parcel.gps_long)?;

        if let Some(status) = self.status {
            parcel.status = parse_label(&required_present(status, "status")?)?;
        }
        if let Some(land_use) = self.land_use {
            parcel.land_use = parse_label(&required_present(land_use, "land_use")?)?;
        }
        if let Some(acquisition_type) = self.acquisition_type {
            parcel.acquisition_type =
                parse_label(&required_present(acquisition_type, "acquisition_type")?)?;
        }
        if let Some(title_date) = self.title_date {
            parcel.title_date =
                parse_date("title_date", &required_present(title_date, "title_date")?)?;
        }

        set_defaulted(&mut parcel.certificate_number, self.certificate_number);
        set_defaulted(&mut parcel.issuing_authority, self.issuing_authority);
        set_defaulted(&mut parcel.cadastral_plan_ref, self.cadastral_plan_ref);

        set_optional(&mut parcel.location, self.location);
        set_optional(&mut parcel.company_name, self.company_name);
        set_optional(&mut parcel.rccm, self.rccm);
        set_optional(&mut parcel.nif, self.nif);
        set_optional(&mut parcel.servitudes, self.servitudes);
        set_optional(&mut parcel.charges, self.charges);
        set_optional(&mut parcel.litigation, self.litigation);

        Ok(parcel)
    }
}

/// Query parameters for parcel listings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema, utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct ParcelListQuery {
    /// Status label, or `all`
    pub status: Option<String>,
    pub province: Option<String>,
    /// Free text over reference, parcel number and owner name
    pub q: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl ParcelListQuery {
    pub fn into_filter(self) -> ApiResult<ParcelFilter> {
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") | Some("all") => None,
            Some(label) => Some(parse_label(label)?),
        };
        if let Some(limit) = self.limit {
            limit.validate_range("limit", 1, MAX_PAGE_SIZE)?;
        }
        if let Some(offset) = self.offset {
            offset.validate_range("offset", 0, MAX_OFFSET)?;
        }
        Ok(ParcelFilter {
            status,
            province: normalize_optional(self.province),
            query: normalize_optional(self.q),
            limit: self.limit,
            offset: self.offset,
        })
    }
}
