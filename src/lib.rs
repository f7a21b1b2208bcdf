//! Geospy - AI photo geolocation service
//!
//! This library provides the analysis pipeline behind the server binary:
//! vision model calls with overload retry, candidate extraction from
//! free-form answers, and geocoding with a fallback cascade.

pub mod error;
pub mod extract;
pub mod geocode;
pub mod models;
pub mod vision;

pub use error::{Error, Result};
pub use models::{Accuracy, GeoPoint, PlacedLocation};
