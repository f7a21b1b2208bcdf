//! Core data models for the geolocation pipeline.

pub mod location;

pub use location::{Accuracy, GeoPoint, PlacedLocation, HIGH_ACCURACY_TYPES};
