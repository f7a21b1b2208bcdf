//! Resolved location types shared between the geocoder and the HTTP surface.

use serde::{Deserialize, Serialize};

/// Geographic point (lat/lng)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Result type tags that indicate a street- or building-level match.
pub const HIGH_ACCURACY_TYPES: &[&str] =
    &["street_address", "premise", "route", "establishment"];

/// Confidence tag derived from a geocoding result's type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accuracy {
    High,
    Moderate,
}

impl Accuracy {
    /// High iff any type tag is in the street/building-level set.
    pub fn from_types<S: AsRef<str>>(types: &[S]) -> Self {
        if types
            .iter()
            .any(|t| HIGH_ACCURACY_TYPES.contains(&t.as_ref()))
        {
            Accuracy::High
        } else {
            Accuracy::Moderate
        }
    }
}

impl std::fmt::Display for Accuracy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Accuracy::High => write!(f, "high"),
            Accuracy::Moderate => write!(f, "moderate"),
        }
    }
}

/// A candidate location resolved to a coordinate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacedLocation {
    /// The sanitized query text that was resolved.
    pub location: String,
    pub point: GeoPoint,
    pub accuracy: Accuracy,
    /// Type tags reported for the top geocoding result.
    pub types: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy_high_for_establishment() {
        let types = vec!["establishment".to_string(), "point_of_interest".to_string()];
        assert_eq!(Accuracy::from_types(&types), Accuracy::High);
    }

    #[test]
    fn test_accuracy_high_for_street_address() {
        assert_eq!(Accuracy::from_types(&["street_address"]), Accuracy::High);
    }

    #[test]
    fn test_accuracy_moderate_for_locality() {
        let types = vec!["locality".to_string(), "political".to_string()];
        assert_eq!(Accuracy::from_types(&types), Accuracy::Moderate);
    }

    #[test]
    fn test_accuracy_moderate_for_no_types() {
        let types: Vec<String> = vec![];
        assert_eq!(Accuracy::from_types(&types), Accuracy::Moderate);
    }

    #[test]
    fn test_accuracy_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Accuracy::High).unwrap(), "\"high\"");
        assert_eq!(
            serde_json::to_string(&Accuracy::Moderate).unwrap(),
            "\"moderate\""
        );
    }
}
