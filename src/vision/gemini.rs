//! Gemini generateContent client for image location analysis.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{EncodedImage, VisionBackend};
use crate::error::{Error, Result};

/// Environment variable holding the Gemini API key.
pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Fixed prompt asking for the single most specific location, formatted as
/// a one-element JSON array so the extraction cascade's first strategy can
/// usually take it whole.
const LOCATION_PROMPT: &str = r#"Analyze this image to determine the most precise location where it was taken. Look for:

1. Readable street signs, building numbers, or addresses
2. Distinctive landmarks, monuments, or recognizable buildings
3. License plates with regional identifiers
4. Business names, storefronts, or signage
5. Architectural styles specific to regions
6. Natural landmarks or geographical features
7. Public transportation signs or station names
8. Language on signs or text visible in the image

Provide the SINGLE most specific and accurate location you can determine. Format your response as a JSON array with one location string. Examples:
- ["1600 Pennsylvania Avenue NW, Washington, DC, USA"]
- ["Eiffel Tower, Champ de Mars, Paris, France"]
- ["Times Square, New York, NY, USA"]

If you cannot determine a specific location with reasonable confidence, return ["Unknown location - insufficient visual markers"].

Be as specific as possible (street address > landmark > neighborhood > city > country)."#;

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: String,
}

/// Vision backend calling the Gemini generateContent endpoint.
pub struct GeminiVision {
    client: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl GeminiVision {
    pub fn new(client: reqwest::Client, api_key: String, model: String) -> Self {
        Self {
            client,
            api_key,
            model,
            endpoint: GEMINI_ENDPOINT.to_string(),
        }
    }

    /// Build from the environment. The key is required here, at the point of
    /// first use, not at process startup.
    pub fn from_env(client: reqwest::Client, model: &str) -> Result<Self> {
        let api_key = std::env::var(ENV_GEMINI_API_KEY)
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or(Error::MissingCredential(ENV_GEMINI_API_KEY))?;
        Ok(Self::new(client, api_key, model.to_string()))
    }

    /// Override the endpoint (proxies, test doubles).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl VisionBackend for GeminiVision {
    async fn analyze_image(&self, image: &EncodedImage) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: LOCATION_PROMPT.to_string(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: image.mime_type.clone(),
                            data: image.data.clone(),
                        },
                    },
                ],
            }],
        };

        let url = format!(
            "{}/{}:generateContent?key={}",
            self.endpoint, self.model, self.api_key
        );

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Vision {
                status: e.status().map(|s| s.as_u16()),
                message: format!("request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Vision {
                status: Some(status.as_u16()),
                message: format!("vision API returned {status}: {body}"),
            });
        }

        let body: GenerateResponse = response.json().await.map_err(|e| Error::Vision {
            status: None,
            message: format!("unreadable vision response: {e}"),
        })?;

        body.candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.clone())
            .ok_or_else(|| Error::Vision {
                status: None,
                message: "empty vision response".to_string(),
            })
    }
}
