//! Pan geometry resolution
//!
//! Turns a shape name plus shape-specific measures into a [`Pan`] with its area
//! (square centimetres) and a display name used to label split results.
//!
//! Supported shapes:
//! - round: area = π × (diameter / 2)²
//! - square: area = edge²
//! - rectangular: area = width × length
//!
//! Measures are positive integer centimetres. On the wire they arrive as
//! string-encoded integers (`"28"`), bare JSON integers are accepted too.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::f64::consts::PI;
use std::fmt;

use crate::{Error, Result};

/// Pan shape with exactly the measures that shape needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanGeometry {
    Round { diameter: u32 },
    Square { edge: u32 },
    Rectangular { width: u32, length: u32 },
}

impl PanGeometry {
    /// Parse a shape name and its raw measures
    ///
    /// Fails with `UnsupportedShape` for unknown names and `InvalidMeasurement`
    /// for a missing, non-numeric or non-positive measure.
    pub fn from_measures(shape: &str, measures: &Map<String, Value>) -> Result<Self> {
        match shape {
            "round" => Ok(PanGeometry::Round {
                diameter: measure(shape, measures, "diameter")?,
            }),
            "square" => Ok(PanGeometry::Square {
                edge: measure(shape, measures, "edge")?,
            }),
            "rectangular" => Ok(PanGeometry::Rectangular {
                width: measure(shape, measures, "width")?,
                length: measure(shape, measures, "length")?,
            }),
            other => Err(Error::UnsupportedShape {
                shape: other.to_string(),
            }),
        }
    }

    /// Surface area in square centimetres
    pub fn area(&self) -> f64 {
        match *self {
            PanGeometry::Round { diameter } => {
                let radius = f64::from(diameter) / 2.0;
                PI * radius * radius
            }
            PanGeometry::Square { edge } => f64::from(edge) * f64::from(edge),
            PanGeometry::Rectangular { width, length } => f64::from(width) * f64::from(length),
        }
    }

    /// Wire name of the shape
    pub fn shape_name(&self) -> &'static str {
        match self {
            PanGeometry::Round { .. } => "round",
            PanGeometry::Square { .. } => "square",
            PanGeometry::Rectangular { .. } => "rectangular",
        }
    }
}

impl fmt::Display for PanGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shape = self.shape_name();
        match self {
            PanGeometry::Round { diameter } => write!(f, "{} {} cm", shape, diameter),
            PanGeometry::Square { edge } => write!(f, "{} {} cm", shape, edge),
            PanGeometry::Rectangular { width, length } => {
                write!(f, "{} {} x {} cm", shape, width, length)
            }
        }
    }
}

/// Extract one positive integer measure
fn measure(shape: &str, measures: &Map<String, Value>, field: &str) -> Result<u32> {
    let invalid = |value: String| Error::InvalidMeasurement {
        shape: shape.to_string(),
        field: field.to_string(),
        value,
    };

    let parsed = match measures.get(field) {
        None | Some(Value::Null) => return Err(invalid("<missing>".to_string())),
        Some(Value::String(s)) => s.trim().parse::<i64>().map_err(|_| invalid(s.clone()))?,
        Some(Value::Number(n)) => n.as_i64().ok_or_else(|| invalid(n.to_string()))?,
        Some(other) => return Err(invalid(other.to_string())),
    };

    if parsed <= 0 {
        return Err(invalid(parsed.to_string()));
    }
    u32::try_from(parsed).map_err(|_| invalid(parsed.to_string()))
}

/// Pan as it arrives in a request: shape name plus untyped measures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPan {
    pub shape: String,
    #[serde(default)]
    pub measures: Map<String, Value>,
}

impl RawPan {
    pub fn new(shape: impl Into<String>, measures: &[(&str, &str)]) -> Self {
        Self {
            shape: shape.into(),
            measures: measures
                .iter()
                .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
                .collect(),
        }
    }
}

/// Resolved pan with derived name and area
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pan {
    pub geometry: PanGeometry,
    pub name: String,
    pub area: f64,
}

impl Pan {
    pub fn new(geometry: PanGeometry) -> Self {
        Self {
            name: geometry.to_string(),
            area: geometry.area(),
            geometry,
        }
    }
}

/// Resolve one raw pan into its geometry, name and area
pub fn resolve_pan(raw: &RawPan) -> Result<Pan> {
    PanGeometry::from_measures(&raw.shape, &raw.measures).map(Pan::new)
}

/// Resolved pans with their summed area
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pans {
    pub pans: Vec<Pan>,
    pub total_area: f64,
}
