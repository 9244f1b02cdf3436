//! Enum types for registry entities
//!
//! Wire and database values are the ministry's French labels; the Rust
//! variants use English names.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error when parsing an unknown enum label.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid {kind}: {value}")]
pub struct LabelParseError {
    pub kind: &'static str,
    pub value: String,
}

/// Declares a label-backed enum with `as_str`, `ALL`, `Display` and `FromStr`.
macro_rules! label_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Wire/database label.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = LabelParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == trimmed)
                    .ok_or_else(|| LabelParseError {
                        kind: $kind,
                        value: s.to_string(),
                    })
            }
        }
    };
}

label_enum! {
    /// Legal status of a parcel.
    ParcelStatus, "parcel status" {
        /// Unencumbered
        Free => "Libre",
        /// Subject to an open dispute
        Disputed => "En litige",
        /// Pledged as collateral
        Mortgaged => "Hypothéqué",
    }
}

label_enum! {
    /// Intended use of the land.
    LandUse, "land use" {
        Residential => "Résidentiel",
        Commercial => "Commercial",
        Agricultural => "Agricole",
        Mixed => "Mixte",
    }
}

label_enum! {
    /// How the current holder acquired the parcel.
    AcquisitionType, "acquisition type" {
        Concession => "Concession",
        Sale => "Vente",
        Donation => "Donation",
        Succession => "Succession",
    }
}

label_enum! {
    /// Workflow state of a citizen document request.
    RequestStatus, "request status" {
        Pending => "En attente",
        Approved => "Approuvé",
        Rejected => "Rejeté",
    }
}

impl Default for ParcelStatus {
    fn default() -> Self {
        ParcelStatus::Free
    }
}

impl Default for LandUse {
    fn default() -> Self {
        LandUse::Residential
    }
}

impl Default for AcquisitionType {
    fn default() -> Self {
        AcquisitionType::Concession
    }
}

impl Default for RequestStatus {
    fn default() -> Self {
        RequestStatus::Pending
    }
}

impl RequestStatus {
    /// Whether no further transitions are allowed.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }

    /// Pending requests may be approved or rejected; decisions are final.
    /// Re-asserting the current status is always allowed.
    pub fn can_transition_to(&self, next: RequestStatus) -> bool {
        *self == next || (*self == RequestStatus::Pending && next.is_terminal())
    }
}

/// Entity type discriminator used in error context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum EntityType {
    Parcel,
    Document,
    History,
    Note,
    Request,
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            EntityType::Parcel => "Parcel",
            EntityType::Document => "Document",
            EntityType::History => "History",
            EntityType::Note => "Note",
            EntityType::Request => "Request",
        };
        f.write_str(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parcel_status_labels_round_trip() {
        for status in ParcelStatus::ALL {
            let parsed: ParcelStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, *status);
        }
        assert_eq!(ParcelStatus::Disputed.as_str(), "En litige");
    }

    #[test]
    fn test_unknown_label_is_rejected() {
        let err = "Vendu".parse::<ParcelStatus>().unwrap_err();
        assert_eq!(err.kind, "parcel status");
        assert!(err.to_string().contains("Vendu"));
    }

    #[test]
    fn test_label_parsing_trims_whitespace() {
        assert_eq!(" Agricole ".parse::<LandUse>().unwrap(), LandUse::Agricultural);
    }

    #[test]
    fn test_serde_uses_french_labels() {
        let json = serde_json::to_string(&RequestStatus::Approved).unwrap();
        assert_eq!(json, "\"Approuvé\"");
        let back: AcquisitionType = serde_json::from_str("\"Vente\"").unwrap();
        assert_eq!(back, AcquisitionType::Sale);
    }

    #[test]
    fn test_request_status_transitions() {
        use RequestStatus::*;
        assert!(Pending.can_transition_to(Approved));
        assert!(Pending.can_transition_to(Rejected));
        assert!(Pending.can_transition_to(Pending));
        assert!(Approved.can_transition_to(Approved));
        assert!(!Approved.can_transition_to(Rejected));
        assert!(!Rejected.can_transition_to(Pending));
    }

    #[test]
    fn test_defaults_match_registration_form() {
        assert_eq!(ParcelStatus::default(), ParcelStatus::Free);
        assert_eq!(LandUse::default(), LandUse::Residential);
        assert_eq!(AcquisitionType::default(), AcquisitionType::Concession);
        assert_eq!(RequestStatus::default(), RequestStatus::Pending);
    }
}
