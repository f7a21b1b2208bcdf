//! Geocoding of candidate location strings.

pub mod fallback;
pub mod google;

pub use fallback::{place_candidates, place_location, query_variants, sanitize_candidate, QueryVariant};
pub use google::GoogleGeocoder;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::GeoPoint;

/// One successful lookup: the top result's geometry and type tags.
#[derive(Debug, Clone)]
pub struct GeocodeHit {
    pub point: GeoPoint,
    pub types: Vec<String>,
}

/// Backend resolving a free-text query to coordinates.
///
/// `Ok(None)` means the provider answered but had nothing usable for this
/// query; `Err` is a provider or transport failure. The fallback cascade
/// treats both as a failed attempt and moves on to the next variant.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolve `query`, optionally biased towards a region (ccTLD code).
    async fn geocode(&self, query: &str, region: Option<&str>) -> Result<Option<GeocodeHit>>;
}
