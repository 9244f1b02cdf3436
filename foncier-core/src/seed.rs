//! Synthetic registry data for demos and load testing

use crate::catalog::{cities_of, ISSUING_AUTHORITIES, PROVINCES, REQUEST_DOCUMENT_TYPES};
use crate::stats::window_start;
use crate::{
    new_entity_id, AcquisitionType, DocumentRequest, LandUse, Parcel, ParcelStatus,
    RequestStatus, Timestamp,
};
use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

/// National bounding box, (min, max) degrees.
pub const LAT_RANGE: (f64, f64) = (-13.45, 5.38);
pub const LONG_RANGE: (f64, f64) = (12.2, 31.3);

/// Prefix of generated cadastral references.
pub const SEED_REFERENCE_PREFIX: &str = "SEED-";

const FIRST_NAMES: &[&str] = &[
    "Jean", "Marie", "Joseph", "Esther", "Patrice", "Grâce", "Didier", "Chantal", "Fiston",
    "Nadège", "Héritier", "Rachel",
];

const LAST_NAMES: &[&str] = &[
    "Mbuyi", "Kabamba", "Tshibanda", "Ilunga", "Mukendi", "Kalala", "Lukusa", "Mwamba",
    "Nzuzi", "Kasongo", "Bokungu", "Lokombe",
];

const QUARTIERS: &[&str] = &[
    "Matonge", "Righini", "Kauka", "Mbanza-Lemba", "Makutano", "Golf", "Himbi", "Kimbangu",
];

const AVENUES: &[&str] = &[
    "Avenue Lumumba",
    "Avenue Kasa-Vubu",
    "Avenue de la Paix",
    "Avenue du Commerce",
    "Avenue des Écoles",
    "Boulevard du 30 Juin",
];

const COMPANIES: &[&str] = &["Congo Agro SARL", "Batiment Plus SA", "Mines du Sud SPRL"];

/// Deterministic generator when built from a seed.
pub struct SeedGenerator {
    rng: StdRng,
    run_tag: String,
    counter: u32,
}

impl SeedGenerator {
    /// `seed` fixes the sequence; `None` draws from the OS.
    pub fn new(seed: Option<u64>, now: Timestamp) -> Self {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let run_tag = format!("{}{:04X}", now.format("%y%m%d%H%M%S"), rng.random::<u16>());
        Self {
            rng,
            run_tag,
            counter: 0,
        }
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items.choose(&mut self.rng).copied().unwrap_or_default()
    }

    fn person(&mut self) -> String {
        format!("{} {}", self.pick(FIRST_NAMES), self.pick(LAST_NAMES))
    }

    /// A creation time inside the statistics month window.
    fn created_within_window(&mut self, now: Timestamp) -> Timestamp {
        let span = (now - window_start(&now)).num_minutes().max(1);
        now - Duration::minutes(self.rng.random_range(0..span))
    }

    /// A plausible parcel created at some point in the last 12 months.
    pub fn parcel(&mut self, now: Timestamp) -> Parcel {
        self.counter += 1;
        let n = self.counter;

        let province = self.pick(PROVINCES).to_string();
        let city = cities_of(&province)
            .choose(&mut self.rng)
            .map(|c| c.to_string())
            .unwrap_or_else(|| province.clone());
        let status = match self.rng.random_range(0..10) {
            0 => ParcelStatus::Disputed,
            1 | 2 => ParcelStatus::Mortgaged,
            _ => ParcelStatus::Free,
        };
        let land_use = *LandUse::ALL.choose(&mut self.rng).unwrap_or(&LandUse::Residential);
        let acquisition_type =
            *AcquisitionType::ALL.choose(&mut self.rng).unwrap_or(&AcquisitionType::Concession);
        let company_name = self
            .rng
            .random_bool(0.15)
            .then(|| self.pick(COMPANIES).to_string());
        let certified = self.rng.random_bool(0.8);
        let created_at = self.created_within_window(now);
        let title_date = NaiveDate::from_ymd_opt(
            self.rng.random_range(1990..=2024),
            self.rng.random_range(1..=12),
            self.rng.random_range(1..=28),
        )
        .unwrap_or(NaiveDate::MIN);

        Parcel {
            id: new_entity_id(),
            reference: format!("{SEED_REFERENCE_PREFIX}{}-{n:04}", self.run_tag),
            parcel_number: self.rng.random_range(1..100_000).to_string(),
            province,
            territory_or_city: city.clone(),
            commune_or_sector: city,
            quartier_or_cheflieu: self.pick(QUARTIERS).to_string(),
            avenue: self.pick(AVENUES).to_string(),
            gps_lat: self.rng.random_range(LAT_RANGE.0..=LAT_RANGE.1),
            gps_long: self.rng.random_range(LONG_RANGE.0..=LONG_RANGE.1),
            area: (self.rng.random_range(150.0..20_000.0_f64) * 100.0).round() / 100.0,
            location: None,
            status,
            land_use,
            certificate_number: if certified {
                format!("CE-{:06}", self.rng.random_range(0..1_000_000))
            } else {
                String::new()
            },
            issuing_authority: if certified {
                self.pick(ISSUING_AUTHORITIES).to_string()
            } else {
                String::new()
            },
            acquisition_type,
            acquisition_act_ref: format!("ACT-{:05}", self.rng.random_range(0..100_000)),
            title_date,
            owner_name: company_name.clone().unwrap_or_else(|| self.person()),
            owner_id_number: format!("ID-{:08}", self.rng.random_range(0..100_000_000)),
            rccm: company_name.as_ref().map(|_| {
                format!(
                    "CD/KIN/RCCM/{:02}-B-{:05}",
                    self.rng.random_range(10..25),
                    self.rng.random_range(0..100_000)
                )
            }),
            nif: company_name
                .as_ref()
                .map(|_| format!("A{:07}K", self.rng.random_range(0..10_000_000))),
            company_name,
            surveying_pv_ref: format!("PV-{:05}", self.rng.random_range(0..100_000)),
            surveyor_name: self.person(),
            surveyor_license: format!("GEO-{:04}", self.rng.random_range(0..10_000)),
            cadastral_plan_ref: if self.rng.random_bool(0.9) {
                format!("PLAN-{:05}", self.rng.random_range(0..100_000))
            } else {
                String::new()
            },
            servitudes: None,
            charges: (status == ParcelStatus::Mortgaged)
                .then(|| "Hypothèque en faveur d'une banque commerciale".to_string()),
            litigation: (status == ParcelStatus::Disputed)
                .then(|| "Contestation de limites avec la parcelle voisine".to_string()),
            created_at,
            updated_at: created_at,
        }
    }

    /// A citizen request against an existing reference.
    pub fn request(&mut self, now: Timestamp, parcel_reference: &str) -> DocumentRequest {
        let status = match self.rng.random_range(0..4) {
            0 => RequestStatus::Approved,
            1 => RequestStatus::Rejected,
            _ => RequestStatus::Pending,
        };
        let created_at = self.created_within_window(now);
        DocumentRequest {
            id: new_entity_id(),
            citizen_name: self.person(),
            parcel_reference: parcel_reference.to_string(),
            document_type: self.pick(REQUEST_DOCUMENT_TYPES).to_string(),
            status,
            created_at,
            updated_at: created_at,
        }
    }
}
