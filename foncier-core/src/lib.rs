//! e-Foncier Core - Registry Domain Types
//!
//! Entities, enumerations and errors of the land registry, plus the pure
//! helpers every store shares: parcel diffing, list filters, statistics
//! aggregation and the seed data generator. No I/O lives here.

pub mod catalog;
pub mod entities;
pub mod enums;
pub mod error;
pub mod filter;
pub mod history;
pub mod identity;
pub mod seed;
pub mod stats;

pub use entities::{Document, DocumentRequest, Parcel, ParcelHistory, ParcelNote};
pub use enums::{AcquisitionType, EntityType, LabelParseError, LandUse, ParcelStatus, RequestStatus};
pub use error::{FoncierError, FoncierResult, StorageError, ValidationError};
pub use filter::{HistoryFilter, ParcelFilter};
pub use history::{diff_parcels, ChangeSet, FieldChange};
pub use identity::{
    compute_content_hash, content_hash_hex, generate_reference, new_entity_id, ContentHash,
    EntityId, Timestamp, AUTO_REFERENCE_PREFIX,
};
pub use seed::SeedGenerator;
pub use stats::{
    compute_extended_stats, compute_stats, fill_monthly_evolution, monthly_window, window_start,
    CityCount,
    ExtendedStats, MonthlyCount, ProvinceCount, RegistryStats,
};
