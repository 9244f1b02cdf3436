//! List filters shared by every store implementation

use crate::{Parcel, ParcelHistory, ParcelStatus};
use chrono::NaiveDate;

/// Filter for parcel listings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParcelFilter {
    pub status: Option<ParcelStatus>,
    pub province: Option<String>,
    /// Free text over reference, parcel number and owner name
    pub query: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl ParcelFilter {
    pub fn matches(&self, parcel: &Parcel) -> bool {
        if let Some(status) = self.status {
            if parcel.status != status {
                return false;
            }
        }
        if let Some(province) = &self.province {
            if !parcel.province.eq_ignore_ascii_case(province.trim()) {
                return false;
            }
        }
        match &self.query {
            Some(q) => parcel.matches_query(q),
            None => true,
        }
    }
}

/// Filter for a parcel's audit trail. Date bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryFilter {
    pub query: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl HistoryFilter {
    pub fn matches(&self, entry: &ParcelHistory) -> bool {
        let day = entry.changed_at.date_naive();
        if self.from.is_some_and(|from| day < from) {
            return false;
        }
        if self.to.is_some_and(|to| day > to) {
            return false;
        }
        match self.query.as_deref().map(str::trim) {
            Some(q) if !q.is_empty() => {
                entry.user.to_lowercase().contains(&q.to_lowercase()) || entry.changes.mentions(q)
            }
            _ => true,
        }
    }
}
