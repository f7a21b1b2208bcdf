//! Error taxonomy for the analysis pipeline.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A required credential is absent. Raised at the point of first use,
    /// before any network call is attempted.
    #[error("required credential {0} is not set")]
    MissingCredential(&'static str),

    /// The vision provider kept signalling transient overload through the
    /// whole retry schedule.
    #[error("the vision service is overloaded, try again later")]
    Overloaded,

    /// Any other vision provider failure. `status` carries the HTTP status
    /// code when the provider answered at all.
    #[error("vision provider error: {message}")]
    Vision {
        status: Option<u16>,
        message: String,
    },

    /// Geocoding provider or transport failure for a single attempt.
    #[error("geocoding error: {0}")]
    Geocode(String),

    /// Every query variant failed for this candidate. Recovered locally by
    /// dropping the candidate; never fatal to the surrounding request.
    #[error("no geocoding strategy could place `{0}`")]
    GeocodeExhausted(String),

    /// The inbound image payload was unusable.
    #[error("invalid image payload: {0}")]
    InvalidImage(String),
}

pub type Result<T> = std::result::Result<T, Error>;
