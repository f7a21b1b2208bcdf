//! Google Geocoding API client.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{GeocodeHit, Geocoder};
use crate::error::{Error, Result};
use crate::models::GeoPoint;

/// Environment variable holding the Google Maps API key.
pub const ENV_MAPS_API_KEY: &str = "GOOGLE_MAPS_API_KEY";

const GEOCODE_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/geocode/json";

/// Forward geocoder backed by the Google Geocoding web service.
pub struct GoogleGeocoder {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
    #[serde(default)]
    types: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

impl GoogleGeocoder {
    pub fn new(client: reqwest::Client, api_key: String) -> Self {
        Self {
            client,
            api_key,
            endpoint: GEOCODE_ENDPOINT.to_string(),
        }
    }

    /// Build from the environment. The key is required here, at the point of
    /// first use, not at process startup.
    pub fn from_env(client: reqwest::Client) -> Result<Self> {
        let api_key = std::env::var(ENV_MAPS_API_KEY)
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or(Error::MissingCredential(ENV_MAPS_API_KEY))?;
        Ok(Self::new(client, api_key))
    }

    /// Override the endpoint (proxies, test doubles).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    async fn geocode(&self, query: &str, region: Option<&str>) -> Result<Option<GeocodeHit>> {
        let mut params = vec![("address", query), ("key", self.api_key.as_str())];
        if let Some(region) = region {
            params.push(("region", region));
        }

        let response = self
            .client
            .get(&self.endpoint)
            .query(&params)
            .send()
            .await
            .map_err(|e| Error::Geocode(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::Geocode(format!(
                "geocoder returned HTTP {}",
                response.status()
            )));
        }

        let body: GeocodeResponse = response
            .json()
            .await
            .map_err(|e| Error::Geocode(format!("unreadable geocoder response: {e}")))?;

        if body.status != "OK" {
            debug!("geocoder status {} for `{}`", body.status, query);
            // REQUEST_DENIED and friends carry a message worth surfacing;
            // ZERO_RESULTS is just an unproductive attempt.
            if let Some(message) = body.error_message {
                return Err(Error::Geocode(message));
            }
            return Ok(None);
        }

        let Some(top) = body.results.into_iter().next() else {
            return Ok(None);
        };

        Ok(Some(GeocodeHit {
            point: GeoPoint {
                lat: top.geometry.location.lat,
                lng: top.geometry.location.lng,
            },
            types: top.types,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geocode_response_deserialize() {
        let json = r#"{
            "status": "OK",
            "results": [{
                "geometry": { "location": { "lat": 48.8584, "lng": 2.2945 } },
                "types": ["establishment", "point_of_interest"]
            }]
        }"#;

        let response: GeocodeResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.status, "OK");
        assert_eq!(response.results.len(), 1);
        assert_eq!(response.results[0].geometry.location.lat, 48.8584);
        assert_eq!(response.results[0].types[0], "establishment");
    }

    #[test]
    fn test_geocode_response_zero_results() {
        let json = r#"{ "status": "ZERO_RESULTS", "results": [] }"#;
        let response: GeocodeResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.status, "ZERO_RESULTS");
        assert!(response.results.is_empty());
        assert!(response.error_message.is_none());
    }

    #[test]
    fn test_geocode_response_denied_carries_message() {
        let json = r#"{
            "status": "REQUEST_DENIED",
            "results": [],
            "error_message": "The provided API key is invalid."
        }"#;
        let response: GeocodeResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            response.error_message.as_deref(),
            Some("The provided API key is invalid.")
        );
    }

    #[test]
    fn test_from_env_requires_key() {
        std::env::remove_var(ENV_MAPS_API_KEY);
        let result = GoogleGeocoder::from_env(reqwest::Client::new());
        assert!(matches!(
            result,
            Err(Error::MissingCredential(ENV_MAPS_API_KEY))
        ));
    }
}
