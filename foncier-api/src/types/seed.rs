//! Test-data generator API types

use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::validation::ValidateRange;

pub const DEFAULT_SEED_PARCELS: usize = 20;
pub const DEFAULT_SEED_REQUESTS: usize = 10;
pub const MAX_SEED_BATCH: usize = 500;

/// Request to generate synthetic registry data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SeedRequest {
    /// Parcels to create, 1 to 500 (default 20)
    pub parcels: Option<usize>,
    /// Requests to create, 0 to 500 (default 10)
    pub requests: Option<usize>,
    /// Fixes the generated sequence
    pub seed: Option<u64>,
}

impl SeedRequest {
    /// Validated `(parcels, requests)` counts.
    pub fn counts(&self) -> ApiResult<(usize, usize)> {
        let parcels = self.parcels.unwrap_or(DEFAULT_SEED_PARCELS);
        let requests = self.requests.unwrap_or(DEFAULT_SEED_REQUESTS);
        parcels.validate_range("parcels", 1, MAX_SEED_BATCH)?;
        requests.validate_range("requests", 0, MAX_SEED_BATCH)?;
        Ok((parcels, requests))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct SeedResponse {
    pub parcels_created: usize,
    pub requests_created: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_defaults() {
        assert_eq!(SeedRequest::default().counts().unwrap(), (20, 10));
    }

    #[test]
    fn test_seed_bounds() {
        let req = SeedRequest {
            parcels: Some(0),
            ..Default::default()
        };
        assert!(req.counts().is_err());
        let req = SeedRequest {
            parcels: Some(1),
            requests: Some(0),
            seed: None,
        };
        assert_eq!(req.counts().unwrap(), (1, 0));
        let req = SeedRequest {
            requests: Some(501),
            ..Default::default()
        };
        assert!(req.counts().is_err());
    }

    #[test]
    fn test_response_is_camel_case() {
        let json = serde_json::to_value(SeedResponse {
            parcels_created: 2,
            requests_created: 1,
        })
        .unwrap();
        assert_eq!(json["parcelsCreated"], 2);
        assert_eq!(json["requestsCreated"], 1);
    }
}
