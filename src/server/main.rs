//! HTTP server for photo geolocation.
//!
//! Accepts an encoded image, forwards it to the vision model, extracts
//! candidate locations from the answer and resolves the primary candidate
//! through the geocoding fallback cascade. Map rendering is the caller's
//! business; this server only returns coordinates and accuracy tags.

use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use clap::Parser;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use url::Url;

use geospy::error::Error;
use geospy::geocode::google::ENV_MAPS_API_KEY;
use geospy::vision::gemini::{DEFAULT_MODEL, ENV_GEMINI_API_KEY};
use geospy::vision::EncodedImage;

mod analyze;
use analyze::{run_analysis, AnalyzeRequest, AnalyzeResponse, ProviderEndpoints};

#[derive(Parser, Debug)]
#[command(name = "server")]
#[command(about = "Photo geolocation server")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:3000")]
    listen: String,

    /// Vision model used for analysis
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Vision endpoint override (proxies, test doubles)
    #[arg(long)]
    vision_endpoint: Option<Url>,

    /// Geocoder endpoint override (proxies, test doubles)
    #[arg(long)]
    geocoder_endpoint: Option<Url>,
}

/// Application state shared across handlers
struct AppState {
    http: reqwest::Client,
    model: String,
    endpoints: ProviderEndpoints,
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    info!("Geospy analysis server");
    info!("Vision model: {}", args.model);

    let http = reqwest::Client::builder()
        .user_agent(concat!("geospy/", env!("CARGO_PKG_VERSION")))
        .timeout(std::time::Duration::from_secs(60))
        .build()?;

    let state = Arc::new(AppState {
        http,
        model: args.model,
        endpoints: ProviderEndpoints {
            vision: args.vision_endpoint.map(|u| u.to_string()),
            geocoder: args.geocoder_endpoint.map(|u| u.to_string()),
        },
    });

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/v1/analyze", post(analyze_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("Starting server on {}", args.listen);

    let listener = tokio::net::TcpListener::bind(&args.listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint. Reports whether the provider keys are configured
/// without requiring them; keys are only enforced at first use.
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        gemini_key: env_key_present(ENV_GEMINI_API_KEY),
        maps_key: env_key_present(ENV_MAPS_API_KEY),
    })
}

fn env_key_present(name: &str) -> bool {
    std::env::var(name).map(|v| !v.is_empty()).unwrap_or(false)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    gemini_key: bool,
    maps_key: bool,
}

/// Analyze one submitted image.
async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, (StatusCode, Json<ErrorResponse>)> {
    let Some(image_data) = request
        .image_data
        .as_deref()
        .filter(|data| !data.trim().is_empty())
    else {
        return Err(reject(StatusCode::BAD_REQUEST, "Image data is required"));
    };

    let default_mime = request.mime_type.as_deref().unwrap_or("image/jpeg");
    let image = EncodedImage::from_data_url(image_data, default_mime)
        .map_err(|e| reject(StatusCode::BAD_REQUEST, &e.to_string()))?;

    run_analysis(&state.http, &state.model, &state.endpoints, image)
        .await
        .map(Json)
        .map_err(|e| {
            error!("analysis failed: {}", e);
            match e {
                Error::Overloaded => reject(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "The AI service is currently overloaded. Please try again in a few minutes.",
                ),
                other => reject(StatusCode::INTERNAL_SERVER_ERROR, &other.to_string()),
            }
        })
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn reject(status: StatusCode, message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}
