//! Validation Traits
//!
//! Field checks shared by the request types. Messages are the ones the
//! browser client shows verbatim.

use crate::error::{ApiError, ApiResult, ErrorCode};
use chrono::NaiveDate;
use foncier_core::LabelParseError;
use serde::{Deserialize, Deserializer};
use serde_json::Value as JsonValue;
use std::str::FromStr;

/// Message for non-numeric `area`, `gps_lat` or `gps_long`.
pub const INVALID_NUMERIC: &str = "Invalid numeric fields";

/// Trait for validating non-empty strings.
pub trait ValidateNonEmpty {
    /// Returns `Missing field: <name>` if the value is absent or blank.
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()>;
}

impl ValidateNonEmpty for str {
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()> {
        if self.trim().is_empty() {
            return Err(ApiError::missing_field(field_name));
        }
        Ok(())
    }
}

impl ValidateNonEmpty for String {
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()> {
        self.as_str().validate_non_empty(field_name)
    }
}

impl<T: ValidateNonEmpty> ValidateNonEmpty for Option<T> {
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()> {
        match self {
            Some(value) => value.validate_non_empty(field_name),
            None => Err(ApiError::missing_field(field_name)),
        }
    }
}

/// Absent, `null` and blank strings count as missing.
impl ValidateNonEmpty for JsonValue {
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()> {
        match self {
            JsonValue::Null => Err(ApiError::missing_field(field_name)),
            JsonValue::String(s) => s.validate_non_empty(field_name),
            _ => Ok(()),
        }
    }
}

/// Trait for validating numeric ranges.
pub trait ValidateRange {
    /// Validate that the value is strictly positive.
    fn validate_positive(&self, field_name: &str) -> ApiResult<()>;

    /// Validate that the value is within an inclusive range.
    fn validate_range(&self, field_name: &str, min: Self, max: Self) -> ApiResult<()>
    where
        Self: Sized;
}

impl ValidateRange for f64 {
    fn validate_positive(&self, field_name: &str) -> ApiResult<()> {
        if !self.is_finite() || *self <= 0.0 {
            return Err(ApiError::new(
                ErrorCode::InvalidRange,
                format!("Field '{}' must be greater than 0", field_name),
            ));
        }
        Ok(())
    }

    fn validate_range(&self, field_name: &str, min: f64, max: f64) -> ApiResult<()> {
        if !self.is_finite() || *self < min || *self > max {
            return Err(ApiError::invalid_range(field_name, min, max));
        }
        Ok(())
    }
}

impl ValidateRange for usize {
    fn validate_positive(&self, field_name: &str) -> ApiResult<()> {
        if *self == 0 {
            return Err(ApiError::new(
                ErrorCode::InvalidRange,
                format!("Field '{}' must be greater than 0", field_name),
            ));
        }
        Ok(())
    }

    fn validate_range(&self, field_name: &str, min: usize, max: usize) -> ApiResult<()> {
        if *self < min || *self > max {
            return Err(ApiError::invalid_range(field_name, min, max));
        }
        Ok(())
    }
}

/// A JSON number as `f64`; strings and other types are rejected.
pub fn json_number(value: &JsonValue) -> ApiResult<f64> {
    match value {
        JsonValue::Number(n) => n
            .as_f64()
            .ok_or_else(|| ApiError::invalid_input(INVALID_NUMERIC)),
        _ => Err(ApiError::invalid_input(INVALID_NUMERIC)),
    }
}

/// Optional coordinate: absent or `null` means 0.
pub fn coordinate(value: Option<&JsonValue>) -> ApiResult<f64> {
    match value {
        None | Some(JsonValue::Null) => Ok(0.0),
        Some(v) => json_number(v),
    }
}

pub fn validate_coordinates(lat: f64, long: f64) -> ApiResult<()> {
    lat.validate_range("gps_lat", -90.0, 90.0)?;
    long.validate_range("gps_long", -180.0, 180.0)
}

/// Parse one of the registry's French labels.
pub fn parse_label<T>(raw: &str) -> ApiResult<T>
where
    T: FromStr<Err = LabelParseError>,
{
    raw.parse()
        .map_err(|e: LabelParseError| ApiError::invalid_input(e.to_string()))
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(field_name: &str, raw: &str) -> ApiResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ApiError::invalid_format(field_name, "YYYY-MM-DD"))
}

/// Trimmed text, with blank collapsed to `None`.
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Required text that was present in the payload, trimmed.
pub fn required_text(value: &Option<String>, field_name: &str) -> ApiResult<String> {
    value.validate_non_empty(field_name)?;
    Ok(value.as_deref().unwrap_or_default().trim().to_string())
}

/// Deserialize a field so that `null` and absence can be told apart.
///
/// Used with `#[serde(default, deserialize_with = "present")]` on an
/// `Option<Option<T>>`: absent gives `None`, `null` gives `Some(None)`.
pub fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use foncier_core::ParcelStatus;
    use serde_json::json;

    #[test]
    fn test_blank_strings_are_missing() {
        let err = "   ".validate_non_empty("avenue").unwrap_err();
        assert_eq!(err.message, "Missing field: avenue");
        assert!(None::<String>.validate_non_empty("x").is_err());
        assert!(Some("ok".to_string()).validate_non_empty("x").is_ok());
    }

    #[test]
    fn test_json_presence() {
        assert!(JsonValue::Null.validate_non_empty("area").is_err());
        assert!(json!(" ").validate_non_empty("area").is_err());
        assert!(json!(0).validate_non_empty("area").is_ok());
        assert!(json!("abc").validate_non_empty("area").is_ok());
    }

    #[test]
    fn test_json_number_rejects_strings() {
        assert_eq!(json_number(&json!(12.5)).unwrap(), 12.5);
        let err = json_number(&json!("12.5")).unwrap_err();
        assert_eq!(err.message, INVALID_NUMERIC);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_coordinate_defaults_to_zero() {
        assert_eq!(coordinate(None).unwrap(), 0.0);
        assert_eq!(coordinate(Some(&JsonValue::Null)).unwrap(), 0.0);
        assert!(coordinate(Some(&json!("north"))).is_err());
    }

    #[test]
    fn test_ranges() {
        assert!(0.0_f64.validate_positive("area").is_err());
        assert!(f64::NAN.validate_positive("area").is_err());
        assert!(1.5_f64.validate_positive("area").is_ok());
        assert!(validate_coordinates(-4.3, 15.3).is_ok());
        assert!(validate_coordinates(91.0, 0.0).is_err());
        assert!(validate_coordinates(0.0, -180.5).is_err());
    }

    #[test]
    fn test_labels_and_dates() {
        assert_eq!(
            parse_label::<ParcelStatus>("En litige").unwrap(),
            ParcelStatus::Disputed
        );
        assert!(parse_label::<ParcelStatus>("Vendu").is_err());
        assert!(parse_date("title_date", "2020-02-30").is_err());
        assert_eq!(
            parse_date("title_date", "2020-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2020, 2, 29).unwrap()
        );
    }

    #[test]
    fn test_normalize_optional() {
        assert_eq!(normalize_optional(Some("  ".to_string())), None);
        assert_eq!(
            normalize_optional(Some(" SARL ".to_string())),
            Some("SARL".to_string())
        );
    }

    #[derive(Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "present")]
        charges: Option<Option<String>>,
    }

    #[test]
    fn test_present_distinguishes_null_from_absent() {
        let absent: Patch = serde_json::from_value(json!({})).unwrap();
        assert_eq!(absent.charges, None);
        let null: Patch = serde_json::from_value(json!({"charges": null})).unwrap();
        assert_eq!(null.charges, Some(None));
        let set: Patch = serde_json::from_value(json!({"charges": "x"})).unwrap();
        assert_eq!(set.charges, Some(Some("x".to_string())));
    }
}
