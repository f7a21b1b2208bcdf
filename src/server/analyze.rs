//! Analysis pipeline: vision call, candidate extraction, placement.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use geospy::error::Result;
use geospy::extract::extract_candidates;
use geospy::geocode::{place_candidates, GoogleGeocoder};
use geospy::models::PlacedLocation;
use geospy::vision::{request_analysis, EncodedImage, GeminiVision};

/// Inbound analysis request body.
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    /// Data URL or raw base64 image payload.
    pub image_data: Option<String>,
    /// Fallback MIME type for payloads that do not carry one.
    pub mime_type: Option<String>,
}

/// Outcome of one analysis.
#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    /// The model's literal text answer.
    pub result: String,
    /// Candidate strings in extraction order.
    pub candidates: Vec<String>,
    /// Resolved placements for the primary candidate.
    pub placements: Vec<PlacedLocation>,
}

/// Endpoint overrides for the outbound providers.
#[derive(Debug, Default, Clone)]
pub struct ProviderEndpoints {
    pub vision: Option<String>,
    pub geocoder: Option<String>,
}

/// Run the full pipeline for one submitted image.
///
/// Provider credentials are resolved here, on first use. An empty candidate
/// list is a valid outcome and yields empty placements; an unplaceable
/// primary candidate likewise leaves placements empty without failing the
/// request.
pub async fn run_analysis(
    http: &reqwest::Client,
    model: &str,
    endpoints: &ProviderEndpoints,
    image: EncodedImage,
) -> Result<AnalyzeResponse> {
    let mut vision = GeminiVision::from_env(http.clone(), model)?;
    if let Some(endpoint) = &endpoints.vision {
        vision = vision.with_endpoint(endpoint);
    }

    let result = request_analysis(&vision, &image).await?;
    info!("vision answered with {} chars", result.len());

    let candidates = extract_candidates(&result);
    debug!("candidates: {:?}", candidates);

    // Only the first (highest extraction confidence) candidate is placed;
    // the full list still goes back to the caller.
    let placements = match candidates.first() {
        Some(primary) => {
            let mut geocoder = GoogleGeocoder::from_env(http.clone())?;
            if let Some(endpoint) = &endpoints.geocoder {
                geocoder = geocoder.with_endpoint(endpoint);
            }
            place_candidates(&geocoder, std::slice::from_ref(primary)).await
        }
        None => {
            info!("no usable location in vision answer");
            Vec::new()
        }
    };

    Ok(AnalyzeResponse {
        result,
        candidates,
        placements,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_tolerates_missing_image_field() {
        // The handler turns this into a 400; deserialization must not.
        let request: AnalyzeRequest = serde_json::from_str("{}").unwrap();
        assert!(request.image_data.is_none());
        assert!(request.mime_type.is_none());
    }

    #[test]
    fn test_request_accepts_data_url_payload() {
        let request: AnalyzeRequest = serde_json::from_str(
            r#"{ "image_data": "data:image/png;base64,iVBORw0KGgo=", "mime_type": "image/png" }"#,
        )
        .unwrap();
        assert_eq!(
            request.image_data.as_deref(),
            Some("data:image/png;base64,iVBORw0KGgo=")
        );
    }

    #[test]
    fn test_response_serializes_empty_placements() {
        let response = AnalyzeResponse {
            result: "no idea".to_string(),
            candidates: Vec::new(),
            placements: Vec::new(),
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["result"], "no idea");
        assert!(json["candidates"].as_array().unwrap().is_empty());
        assert!(json["placements"].as_array().unwrap().is_empty());
    }
}
