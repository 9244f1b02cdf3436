//! Dashboard statistics
//!
//! The wire format is camelCase to match what the dashboard consumes.
//! Aggregation helpers here are pure so every store computes the same
//! numbers the same way.

use crate::{Document, DocumentRequest, EntityId, Parcel, ParcelStatus, RequestStatus, Timestamp};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Number of months shown in the evolution chart.
pub const MONTHLY_WINDOW: usize = 12;

/// Headline counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct RegistryStats {
    pub total_parcels: i64,
    pub free_parcels: i64,
    pub disputed_parcels: i64,
    pub mortgaged_parcels: i64,
    pub pending_requests: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ProvinceCount {
    pub province: String,
    pub c: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CityCount {
    pub city: String,
    pub c: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MonthlyCount {
    /// `YYYY-MM`
    pub month: String,
    pub count: i64,
}

/// Reporting figures for the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ExtendedStats {
    pub parcels_this_month: i64,
    pub parcels_missing_docs: i64,
    pub parcels_in_validation: i64,
    pub parcels_boundary_conflicts: i64,
    pub parcels_by_province: Vec<ProvinceCount>,
    pub parcels_by_city: Vec<CityCount>,
    pub monthly_evolution: Vec<MonthlyCount>,
    pub pending_requests_avg_days: f64,
}

/// `YYYY-MM` key for a timestamp.
pub fn month_key(ts: &Timestamp) -> String {
    format!("{:04}-{:02}", ts.year(), ts.month())
}

/// The last [`MONTHLY_WINDOW`] month keys, oldest first, ending with the
/// month containing `now`.
pub fn monthly_window(now: &Timestamp) -> Vec<String> {
    let current = now.year() * 12 + now.month0() as i32;
    (0..MONTHLY_WINDOW as i32)
        .rev()
        .map(|back| {
            let idx = current - back;
            format!("{:04}-{:02}", idx.div_euclid(12), idx.rem_euclid(12) + 1)
        })
        .collect()
}

/// First instant (UTC) of the oldest month in the chart window.
pub fn window_start(now: &Timestamp) -> Timestamp {
    let idx = now.year() * 12 + now.month0() as i32 - (MONTHLY_WINDOW as i32 - 1);
    NaiveDate::from_ymd_opt(idx.div_euclid(12), idx.rem_euclid(12) as u32 + 1, 1)
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|start| start.and_utc())
        .unwrap_or(*now)
}

/// Zero-fill grouped month counts over the chart window.
///
/// Counts for months outside the window are ignored.
pub fn fill_monthly_evolution(now: &Timestamp, counts: &[(String, i64)]) -> Vec<MonthlyCount> {
    let by_month: BTreeMap<&str, i64> = counts.iter().map(|(m, c)| (m.as_str(), *c)).collect();
    monthly_window(now)
        .into_iter()
        .map(|month| {
            let count = by_month.get(month.as_str()).copied().unwrap_or(0);
            MonthlyCount { month, count }
        })
        .collect()
}

/// Group by key, ordered by count descending then key ascending.
fn group_counts<'a>(keys: impl Iterator<Item = &'a str>) -> Vec<(String, i64)> {
    let mut counts: BTreeMap<&str, i64> = BTreeMap::new();
    for key in keys {
        *counts.entry(key).or_default() += 1;
    }
    let mut grouped: Vec<(String, i64)> =
        counts.into_iter().map(|(k, c)| (k.to_string(), c)).collect();
    grouped.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    grouped
}

fn count_where<T>(items: &[T], pred: impl Fn(&T) -> bool) -> i64 {
    items.iter().filter(|item| pred(item)).count() as i64
}

/// Headline counters over in-memory rows.
pub fn compute_stats(parcels: &[Parcel], requests: &[DocumentRequest]) -> RegistryStats {
    RegistryStats {
        total_parcels: parcels.len() as i64,
        free_parcels: count_where(parcels, |p| p.status == ParcelStatus::Free),
        disputed_parcels: count_where(parcels, |p| p.status == ParcelStatus::Disputed),
        mortgaged_parcels: count_where(parcels, |p| p.status == ParcelStatus::Mortgaged),
        pending_requests: count_where(requests, |r| r.status == RequestStatus::Pending),
    }
}

/// Mean age in days of the given timestamps, 0 when empty.
pub fn average_age_days<'a>(now: &Timestamp, created: impl Iterator<Item = &'a Timestamp>) -> f64 {
    let (total, n) = created.fold((0.0_f64, 0_u32), |(sum, n), ts| {
        let secs = (*now - *ts).num_milliseconds() as f64 / 1000.0;
        (sum + secs / 86_400.0, n + 1)
    });
    if n == 0 {
        0.0
    } else {
        total / f64::from(n)
    }
}

/// Reporting figures over in-memory rows.
pub fn compute_extended_stats(
    now: &Timestamp,
    parcels: &[Parcel],
    documents: &[Document],
    requests: &[DocumentRequest],
) -> ExtendedStats {
    let this_month = month_key(now);
    let documented: HashSet<EntityId> = documents.iter().map(|d| d.parcel_id).collect();

    let monthly: Vec<(String, i64)> = group_counts(
        parcels
            .iter()
            .map(|p| month_key(&p.created_at))
            .collect::<Vec<_>>()
            .iter()
            .map(String::as_str),
    );

    ExtendedStats {
        parcels_this_month: count_where(parcels, |p| month_key(&p.created_at) == this_month),
        parcels_missing_docs: count_where(parcels, |p| !documented.contains(&p.id)),
        parcels_in_validation: count_where(parcels, Parcel::needs_validation),
        parcels_boundary_conflicts: count_where(parcels, Parcel::has_boundary_conflict),
        parcels_by_province: group_counts(parcels.iter().map(|p| p.province.as_str()))
            .into_iter()
            .map(|(province, c)| ProvinceCount { province, c })
            .collect(),
        parcels_by_city: group_counts(parcels.iter().map(|p| p.territory_or_city.as_str()))
            .into_iter()
            .map(|(city, c)| CityCount { city, c })
            .collect(),
        monthly_evolution: fill_monthly_evolution(now, &monthly),
        pending_requests_avg_days: average_age_days(
            now,
            requests
                .iter()
                .filter(|r| r.status == RequestStatus::Pending)
                .map(|r| &r.created_at),
        ),
    }
}
