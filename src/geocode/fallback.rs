//! Fallback cascade for placing a candidate location string.
//!
//! A single geocoding query over AI-extracted text misses often, so each
//! candidate is retried as a fixed sequence of query variants, most specific
//! first. The first variant that produces a usable result wins and the rest
//! are skipped.

use std::time::Duration;

use regex::Regex;
use tracing::{debug, warn};

use super::Geocoder;
use crate::error::{Error, Result};
use crate::models::{Accuracy, PlacedLocation};

/// Region bias (ccTLD code) used by the first variant.
const REGION_BIAS: &str = "us";

/// Country suffix appended by the third variant.
const COUNTRY_SUFFIX: &str = ", USA";

/// Pause between successive candidates to stay inside provider quota.
const STAGGER_DELAY: Duration = Duration::from_millis(700);

/// Candidates shorter than this after sanitizing are dropped outright.
const MIN_CANDIDATE_LEN: usize = 3;

/// One attempt in the fallback cascade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryVariant {
    pub query: String,
    pub region: Option<&'static str>,
}

/// Strip quote characters, surrounding whitespace and leading enumeration
/// markers ("1. ", "- ", bullets) that extraction tends to leave behind.
pub fn sanitize_candidate(raw: &str) -> String {
    let leading_number = Regex::new(r"^\d+\.\s*").unwrap();
    let leading_dash = Regex::new(r"^-\s*").unwrap();
    let leading_bullet = Regex::new(r"^[•\-*]\s*").unwrap();

    let text = raw.trim_matches(|c: char| c == '"' || c == '\'' || c.is_whitespace());
    let text = leading_number.replace(text, "");
    let text = leading_dash.replace(&text, "");
    let text = leading_bullet.replace(&text, "");
    text.trim().to_string()
}

/// Build the query variants for one sanitized location, in priority order:
/// region-biased, unbiased, country-suffixed, first-segment-only, and
/// first + last segment.
pub fn query_variants(location: &str) -> Vec<QueryVariant> {
    let segments: Vec<&str> = location.split(',').map(str::trim).collect();
    let head = segments[0];
    let tail = segments[segments.len() - 1];

    vec![
        QueryVariant {
            query: location.to_string(),
            region: Some(REGION_BIAS),
        },
        QueryVariant {
            query: location.to_string(),
            region: None,
        },
        QueryVariant {
            query: format!("{location}{COUNTRY_SUFFIX}"),
            region: None,
        },
        QueryVariant {
            query: head.to_string(),
            region: None,
        },
        QueryVariant {
            query: format!("{head}, {tail}"),
            region: None,
        },
    ]
}

/// Resolve one candidate through the variant cascade.
///
/// Returns [`Error::GeocodeExhausted`] when every variant fails; callers
/// drop the candidate rather than aborting the request.
pub async fn place_location<G: Geocoder + ?Sized>(
    geocoder: &G,
    candidate: &str,
) -> Result<PlacedLocation> {
    let location = sanitize_candidate(candidate);
    if location.len() < MIN_CANDIDATE_LEN {
        debug!("candidate `{}` too short after sanitizing, skipping", candidate);
        return Err(Error::GeocodeExhausted(candidate.to_string()));
    }

    for (index, variant) in query_variants(&location).into_iter().enumerate() {
        match geocoder.geocode(&variant.query, variant.region).await {
            Ok(Some(hit)) => {
                debug!(
                    "geocoded `{}` with variant {} (`{}`)",
                    location,
                    index + 1,
                    variant.query
                );
                return Ok(PlacedLocation {
                    location: location.clone(),
                    point: hit.point,
                    accuracy: Accuracy::from_types(&hit.types),
                    types: hit.types,
                });
            }
            Ok(None) => {
                debug!("variant {} (`{}`) returned no result", index + 1, variant.query);
            }
            Err(e) => {
                warn!("variant {} (`{}`) failed: {}", index + 1, variant.query, e);
            }
        }
    }

    Err(Error::GeocodeExhausted(location))
}

/// Place a list of candidates sequentially, pausing between them to respect
/// provider quota. Unplaceable candidates are logged and dropped.
pub async fn place_candidates<G: Geocoder + ?Sized>(
    geocoder: &G,
    candidates: &[String],
) -> Vec<PlacedLocation> {
    let mut placed = Vec::new();

    for (index, candidate) in candidates.iter().enumerate() {
        if index > 0 {
            tokio::time::sleep(STAGGER_DELAY).await;
        }

        match place_location(geocoder, candidate).await {
            Ok(location) => placed.push(location),
            Err(e) => warn!("could not place `{}`: {}", candidate, e),
        }
    }

    placed
}
