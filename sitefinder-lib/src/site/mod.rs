//! Catalog data model
//!
//! A [`SiteRecord`] is a row exactly as the catalog store keeps it: the
//! embedding is serialized text and the coordinates may be numbers or
//! numeric strings. Reading a record yields a [`Site`] once its coordinates
//! parse; a search pairs sites with scores as [`ScoredSite`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A coordinate as stored: a JSON number, a numeric string, or nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Coordinate {
    Number(f64),
    Text(String),
    #[default]
    Missing,
}

impl Coordinate {
    /// Parse to a finite number, if possible.
    #[must_use]
    pub fn value(&self) -> Option<f64> {
        let value = match self {
            Coordinate::Number(n) => *n,
            Coordinate::Text(s) => s.trim().parse().ok()?,
            Coordinate::Missing => return None,
        };
        value.is_finite().then_some(value)
    }
}

impl From<f64> for Coordinate {
    fn from(value: f64) -> Self {
        Coordinate::Number(value)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Coordinate::Number(n) => write!(f, "{n}"),
            Coordinate::Text(s) => f.write_str(s),
            Coordinate::Missing => f.write_str("<missing>"),
        }
    }
}

/// A catalog row as persisted by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteRecord {
    /// Unique display name
    #[serde(rename = "site_name")]
    pub name: String,
    /// Free-text description the embedding was computed from
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub latitude: Coordinate,
    #[serde(default)]
    pub longitude: Coordinate,
    /// Photo reference, if one was found
    #[serde(default)]
    pub photo_url: Option<String>,
    /// Serialized embedding, see [`crate::embed::codec`]
    #[serde(rename = "embeddings", default)]
    pub embedding: String,
}

impl SiteRecord {
    /// Interpret the row as a [`Site`].
    ///
    /// Fails with [`Error::MalformedCandidate`] if a coordinate is not a
    /// finite number.
    pub fn to_site(&self) -> Result<Site> {
        let latitude = self.latitude.value().ok_or_else(|| {
            Error::MalformedCandidate(format!(
                "site '{}' has unusable latitude '{}'",
                self.name, self.latitude
            ))
        })?;
        let longitude = self.longitude.value().ok_or_else(|| {
            Error::MalformedCandidate(format!(
                "site '{}' has unusable longitude '{}'",
                self.name, self.longitude
            ))
        })?;

        Ok(Site {
            name: self.name.clone(),
            description: self.description.clone(),
            latitude,
            longitude,
            photo_url: self.photo_url.clone(),
        })
    }
}

/// A point of interest with parsed coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub name: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    pub photo_url: Option<String>,
}

/// A site paired with its similarity to one query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredSite {
    #[serde(flatten)]
    pub site: Site,
    /// Cosine similarity, in [-1, 1]
    pub score: f32,
}

/// A new site offered for the catalog, before enrichment and embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteSubmission {
    pub name: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub photo_url: Option<String>,
}

impl SiteSubmission {
    /// Check the fields a catalog row needs.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidInput("site name is required".to_string()));
        }
        if self.description.trim().is_empty() {
            return Err(Error::InvalidInput(format!(
                "site '{}' needs a description",
                self.name
            )));
        }
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(Error::InvalidInput(format!(
                "latitude {} is outside [-90, 90]",
                self.latitude
            )));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(Error::InvalidInput(format!(
                "longitude {} is outside [-180, 180]",
                self.longitude
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(lat: Coordinate, lon: Coordinate) -> SiteRecord {
        SiteRecord {
            name: "Yosemite National Park".to_string(),
            description: "Granite cliffs and waterfalls".to_string(),
            latitude: lat,
            longitude: lon,
            photo_url: None,
            embedding: "0.1 0.2 0.3".to_string(),
        }
    }

    fn submission() -> SiteSubmission {
        SiteSubmission {
            name: "Zion".to_string(),
            description: "Red rock canyons".to_string(),
            latitude: 37.2982,
            longitude: -113.0263,
            photo_url: None,
        }
    }

    #[test]
    fn test_coordinate_accepts_numeric_text() {
        assert_eq!(Coordinate::Text(" 37.8651 ".into()).value(), Some(37.8651));
        assert_eq!(Coordinate::Number(-119.5).value(), Some(-119.5));
    }

    #[test]
    fn test_coordinate_rejects_garbage_and_non_finite() {
        assert_eq!(Coordinate::Text("north".into()).value(), None);
        assert_eq!(Coordinate::Text("NaN".into()).value(), None);
        assert_eq!(Coordinate::Number(f64::INFINITY).value(), None);
    }

    #[test]
    fn test_to_site_parses_coordinates() {
        let site = record(Coordinate::Text("37.8651".into()), (-119.5383).into())
            .to_site()
            .unwrap();
        assert_eq!(site.latitude, 37.8651);
        assert_eq!(site.longitude, -119.5383);
    }

    #[test]
    fn test_to_site_rejects_bad_coordinates() {
        let err = record(Coordinate::Text("".into()), 0.0.into()).to_site().unwrap_err();
        assert!(matches!(err, Error::MalformedCandidate(_)));
    }

    #[test]
    fn test_record_uses_stored_column_names() {
        let json = r#"{
            "site_name": "Everest",
            "description": "Highest mountain",
            "latitude": "27.9881",
            "longitude": 86.925,
            "photo_url": null,
            "embeddings": "0 1 0"
        }"#;
        let record: SiteRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.name, "Everest");
        assert_eq!(record.latitude, Coordinate::Text("27.9881".into()));
        assert_eq!(record.longitude, Coordinate::Number(86.925));
        assert_eq!(record.embedding, "0 1 0");

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["site_name"], "Everest");
        assert_eq!(back["embeddings"], "0 1 0");
    }

    #[test]
    fn test_missing_embedding_deserializes_empty() {
        let json = r#"{"site_name": "Everest", "latitude": 1, "longitude": 2}"#;
        let record: SiteRecord = serde_json::from_str(json).unwrap();
        assert!(record.embedding.is_empty());
        assert!(record.photo_url.is_none());
    }

    #[test]
    fn test_null_or_absent_coordinates_load_as_missing() {
        let json = r#"{"site_name": "Nowhere", "latitude": null}"#;
        let record: SiteRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.latitude, Coordinate::Missing);
        assert_eq!(record.longitude, Coordinate::Missing);
        assert!(record.to_site().is_err());
    }

    #[test]
    fn test_scored_site_serializes_flat() {
        let scored = ScoredSite {
            site: record(1.0.into(), 2.0.into()).to_site().unwrap(),
            score: 0.5,
        };
        let value = serde_json::to_value(&scored).unwrap();
        assert_eq!(value["name"], "Yosemite National Park");
        assert_eq!(value["latitude"], 1.0);
        assert_eq!(value["score"], 0.5);
    }

    #[test]
    fn test_validate_accepts_good_submission() {
        assert!(submission().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_blank_name() {
        let mut s = submission();
        s.name = "   ".to_string();
        assert!(matches!(s.validate(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_validate_rejects_out_of_range_coordinates() {
        let mut s = submission();
        s.latitude = 91.0;
        assert!(s.validate().is_err());

        let mut s = submission();
        s.longitude = f64::NAN;
        assert!(s.validate().is_err());
    }
}
