// plot.rs

use chrono::{DateTime, Utc};
use geojson::Geometry;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder stored when a plot is saved without a description.
pub const DEFAULT_DESCRIPTION: &str = "No description";

/// Label rendered for plots whose culture type is missing.
pub const UNKNOWN_CULTURE_LABEL: &str = "unknown";

/// Identifier assigned to a plot by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlotId(pub u64);

impl fmt::Display for PlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Crop grown on a plot. Stored as its display label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CultureType {
    #[default]
    Wheat,
    Maize,
    Olives,
    MarketGardening,
    Unknown,
    Other(String),
}

impl CultureType {
    /// Labels offered by the form, in cycling order.
    pub fn choices() -> &'static [CultureType] {
        &[
            CultureType::Wheat,
            CultureType::Maize,
            CultureType::Olives,
            CultureType::MarketGardening,
        ]
    }

    pub fn label(&self) -> &str {
        match self {
            CultureType::Wheat => "Wheat",
            CultureType::Maize => "Maize",
            CultureType::Olives => "Olives",
            CultureType::MarketGardening => "Market gardening",
            CultureType::Unknown => UNKNOWN_CULTURE_LABEL,
            CultureType::Other(label) => label,
        }
    }

    /// Next entry of `choices()`, wrapping around. Custom labels restart the cycle.
    pub fn next_choice(&self) -> CultureType {
        let choices = Self::choices();
        match choices.iter().position(|c| c == self) {
            Some(i) => choices[(i + 1) % choices.len()].clone(),
            None => choices[0].clone(),
        }
    }
}

impl From<String> for CultureType {
    fn from(label: String) -> Self {
        let label = label.trim();
        match label {
            "" => CultureType::Unknown,
            "Wheat" => CultureType::Wheat,
            "Maize" => CultureType::Maize,
            "Olives" => CultureType::Olives,
            "Market gardening" => CultureType::MarketGardening,
            l if l.eq_ignore_ascii_case(UNKNOWN_CULTURE_LABEL) => CultureType::Unknown,
            other => CultureType::Other(other.to_string()),
        }
    }
}

impl From<CultureType> for String {
    fn from(culture: CultureType) -> Self {
        culture.label().to_string()
    }
}

impl fmt::Display for CultureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A persisted land parcel. Never edited once saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plot {
    pub id: PlotId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "unknown_culture")]
    pub culture_type: CultureType,
    /// Surface in square meters, computed when the drawing session was created.
    #[serde(default)]
    pub surface: f64,
    pub geometry: Geometry,
    pub created_at: DateTime<Utc>,
}

fn unknown_culture() -> CultureType {
    CultureType::Unknown
}

/// Fields entered by the user when confirming a drawing session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlotFields {
    pub name: String,
    pub description: Option<String>,
    pub culture_type: CultureType,
}

/// Payload sent to the store to create a plot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotDraft {
    pub name: String,
    pub description: String,
    pub culture_type: CultureType,
    pub surface: f64,
    pub geometry: Geometry,
}

impl PlotDraft {
    /// Builds a draft from form fields, applying the description placeholder.
    pub fn new(fields: PlotFields, surface: f64, geometry: Geometry) -> Self {
        let description = fields
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string());
        PlotDraft {
            name: fields.name.trim().to_string(),
            description,
            culture_type: fields.culture_type,
            surface,
            geometry,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geojson::Value;

    fn square() -> Geometry {
        Geometry::new(Value::Polygon(vec![vec![
            vec![0.0, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 1.0],
            vec![0.0, 0.0],
        ]]))
    }

    #[test]
    fn test_draft_uses_placeholder_for_blank_description() {
        let fields = PlotFields {
            name: "  North field ".to_string(),
            description: Some("   ".to_string()),
            culture_type: CultureType::Olives,
        };
        let draft = PlotDraft::new(fields, 42.0, square());
        assert_eq!(draft.name, "North field");
        assert_eq!(draft.description, DEFAULT_DESCRIPTION);
        assert_eq!(draft.surface, 42.0);
    }

    #[test]
    fn test_culture_type_labels_roundtrip_through_strings() {
        assert_eq!(CultureType::from("Maize".to_string()), CultureType::Maize);
        assert_eq!(CultureType::from(String::new()), CultureType::Unknown);
        assert_eq!(
            CultureType::from("Barley".to_string()),
            CultureType::Other("Barley".to_string())
        );
        assert_eq!(String::from(CultureType::MarketGardening), "Market gardening");
    }

    #[test]
    fn test_culture_cycle_wraps() {
        assert_eq!(CultureType::Wheat.next_choice(), CultureType::Maize);
        assert_eq!(CultureType::MarketGardening.next_choice(), CultureType::Wheat);
        assert_eq!(CultureType::Unknown.next_choice(), CultureType::Wheat);
    }

    #[test]
    fn test_plot_without_culture_deserializes_as_unknown() {
        let json = r#"{
            "id": 7,
            "name": "Orchard",
            "geometry": {"type": "Polygon", "coordinates": [[[0,0],[0,1],[1,1],[0,0]]]},
            "created_at": "2024-05-01T10:00:00Z"
        }"#;
        let plot: Plot = serde_json::from_str(json).unwrap();
        assert_eq!(plot.id, PlotId(7));
        assert_eq!(plot.culture_type, CultureType::Unknown);
        assert_eq!(plot.surface, 0.0);
    }
}
