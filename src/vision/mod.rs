//! Vision model analysis of submitted images.
//!
//! The retry driver lives here, above the provider seam: backends make one
//! attempt per call and report overload through the error's status code, so
//! the schedule below is the only place retries happen.

pub mod gemini;

pub use gemini::GeminiVision;

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use tracing::warn;

use crate::error::{Error, Result};

/// Attempts made against the vision provider before giving up on overload.
const MAX_ATTEMPTS: u32 = 3;

/// Pause between overloaded attempts.
const RETRY_DELAY: Duration = Duration::from_millis(2000);

/// HTTP status the provider uses to signal transient overload.
const OVERLOADED_STATUS: u16 = 503;

/// An image re-encoded for transmission to the vision provider.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    /// Base64-encoded image bytes.
    pub data: String,
    pub mime_type: String,
}

impl EncodedImage {
    /// Encode raw image bytes for transmission.
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        Self {
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            mime_type: mime_type.into(),
        }
    }

    /// Accept a browser data URL ("data:image/png;base64,...") or raw
    /// base64. The data URL's own MIME type wins; `default_mime` covers bare
    /// payloads and data URLs without one.
    pub fn from_data_url(payload: &str, default_mime: &str) -> Result<Self> {
        let payload = payload.trim();
        if payload.is_empty() {
            return Err(Error::InvalidImage("empty image payload".to_string()));
        }

        let Some(rest) = payload.strip_prefix("data:") else {
            return Ok(Self {
                data: payload.to_string(),
                mime_type: default_mime.to_string(),
            });
        };

        let (header, data) = rest
            .split_once(',')
            .ok_or_else(|| Error::InvalidImage("malformed data URL".to_string()))?;

        let mime_type = header
            .split(';')
            .next()
            .filter(|m| !m.is_empty())
            .unwrap_or(default_mime);

        Ok(Self {
            data: data.to_string(),
            mime_type: mime_type.to_string(),
        })
    }
}

/// Backend answering the fixed location prompt about one image.
///
/// Implementations make exactly one provider call per invocation; retrying
/// is the caller's business.
#[async_trait]
pub trait VisionBackend: Send + Sync {
    async fn analyze_image(&self, image: &EncodedImage) -> Result<String>;
}

/// Ask the backend where the image was taken, retrying on transient
/// overload.
///
/// Overload is retried up to three total attempts with a fixed pause
/// between them; exhaustion surfaces as [`Error::Overloaded`] so the caller
/// can advise trying again later. Any other failure returns immediately.
pub async fn request_analysis<B: VisionBackend + ?Sized>(
    backend: &B,
    image: &EncodedImage,
) -> Result<String> {
    for attempt in 1..=MAX_ATTEMPTS {
        match backend.analyze_image(image).await {
            Ok(text) => return Ok(text),
            Err(Error::Vision {
                status: Some(OVERLOADED_STATUS),
                message,
            }) => {
                warn!(
                    "vision attempt {}/{} overloaded: {}",
                    attempt, MAX_ATTEMPTS, message
                );
                if attempt < MAX_ATTEMPTS {
                    tokio::time::sleep(RETRY_DELAY).await;
                }
            }
            Err(other) => return Err(other),
        }
    }

    Err(Error::Overloaded)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use tokio::time::Instant;

    use super::*;

    struct ScriptedBackend {
        responses: Mutex<Vec<Result<String>>>,
        calls: AtomicU32,
    }

    impl ScriptedBackend {
        fn new(responses: Vec<Result<String>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }

        fn remaining(&self) -> usize {
            self.responses.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl VisionBackend for ScriptedBackend {
        async fn analyze_image(&self, _image: &EncodedImage) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses.lock().unwrap().remove(0)
        }
    }

    fn overloaded() -> Error {
        Error::Vision {
            status: Some(503),
            message: "the model is overloaded".to_string(),
        }
    }

    fn test_image() -> EncodedImage {
        EncodedImage::from_bytes(b"not a real jpeg", "image/jpeg")
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_through_transient_overload() {
        let backend = ScriptedBackend::new(vec![
            Err(overloaded()),
            Err(overloaded()),
            Ok(r#"["Paris, France"]"#.to_string()),
        ]);

        let started = Instant::now();
        let answer = request_analysis(&backend, &test_image()).await.unwrap();

        assert_eq!(answer, r#"["Paris, France"]"#);
        assert_eq!(backend.calls(), 3);
        // One pause after each of the two failures, none after the success.
        assert_eq!(started.elapsed(), RETRY_DELAY * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overload_exhausts_after_three_attempts() {
        // A fourth scripted response proves no fourth attempt happens.
        let backend = ScriptedBackend::new(vec![
            Err(overloaded()),
            Err(overloaded()),
            Err(overloaded()),
            Ok("never reached".to_string()),
        ]);

        let result = request_analysis(&backend, &test_image()).await;

        assert!(matches!(result, Err(Error::Overloaded)));
        assert_eq!(backend.calls(), 3);
        assert_eq!(backend.remaining(), 1);
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried() {
        let backend = ScriptedBackend::new(vec![
            Err(Error::Vision {
                status: Some(400),
                message: "bad request".to_string(),
            }),
            Ok("never reached".to_string()),
        ]);

        let result = request_analysis(&backend, &test_image()).await;

        assert!(matches!(result, Err(Error::Vision { status: Some(400), .. })));
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_missing_credential_is_not_retried() {
        let backend = ScriptedBackend::new(vec![Err(Error::MissingCredential("SOME_KEY"))]);

        let result = request_analysis(&backend, &test_image()).await;
        assert!(matches!(result, Err(Error::MissingCredential(_))));
        assert_eq!(backend.calls(), 1);
    }

    #[test]
    fn test_from_data_url_extracts_mime_and_payload() {
        let image = EncodedImage::from_data_url(
            "data:image/png;base64,iVBORw0KGgo=",
            "image/jpeg",
        )
        .unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.data, "iVBORw0KGgo=");
    }

    #[test]
    fn test_from_data_url_accepts_raw_base64() {
        let image = EncodedImage::from_data_url("/9j/4AAQSkZJRg==", "image/jpeg").unwrap();
        assert_eq!(image.mime_type, "image/jpeg");
        assert_eq!(image.data, "/9j/4AAQSkZJRg==");
    }

    #[test]
    fn test_from_data_url_rejects_empty_payload() {
        let result = EncodedImage::from_data_url("   ", "image/jpeg");
        assert!(matches!(result, Err(Error::InvalidImage(_))));
    }

    #[test]
    fn test_from_data_url_rejects_header_without_payload() {
        let result = EncodedImage::from_data_url("data:image/png;base64", "image/jpeg");
        assert!(matches!(result, Err(Error::InvalidImage(_))));
    }

    #[test]
    fn test_from_bytes_encodes_base64() {
        let image = EncodedImage::from_bytes(b"abc", "image/webp");
        assert_eq!(image.data, "YWJj");
        assert_eq!(image.mime_type, "image/webp");
    }
}
