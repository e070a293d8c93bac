//! Domain types for the vegetation index dashboard.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---

/// The three spectral indices the dashboard can compute.
///
/// The band name used by the remote service to key reduction results is the
/// index name itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpectralIndex {
    Ndvi,
    Savi,
    Ndwi,
}

/// Visualization parameters sent to the remote tile endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct VisParams {
    pub min: f64,
    pub max: f64,
    pub palette: [&'static str; 3],
}

/// Band arithmetic delegated to the remote imagery service.
///
/// Mirrors the two operations the service exposes: a two-band normalized
/// difference, and a free-form expression with named band inputs and scalar
/// parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BandMath {
    NormalizedDifference {
        name: String,
        bands: [String; 2],
    },
    Expression {
        name: String,
        expression: String,
        inputs: BTreeMap<String, String>,
        params: BTreeMap<String, f64>,
    },
}

impl SpectralIndex {
    // ---

    /// Parse a user-supplied index name. Exact match only; anything else is
    /// rejected by the handler with a 400 before any remote call.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "NDVI" => Some(Self::Ndvi),
            "SAVI" => Some(Self::Savi),
            "NDWI" => Some(Self::Ndwi),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Ndvi => "NDVI",
            Self::Savi => "SAVI",
            Self::Ndwi => "NDWI",
        }
    }

    /// All indices, in the order they appear in the dashboard form.
    pub fn all() -> [Self; 3] {
        [Self::Ndvi, Self::Savi, Self::Ndwi]
    }

    /// Fixed display range: also the y-axis bounds of the trend chart.
    pub fn display_range(self) -> (f64, f64) {
        match self {
            Self::Ndvi | Self::Savi => (0.0, 1.0),
            Self::Ndwi => (-1.0, 1.0),
        }
    }

    pub fn vis_params(self) -> VisParams {
        let (min, max) = self.display_range();
        let palette = match self {
            Self::Ndvi => ["blue", "white", "green"],
            Self::Savi => ["purple", "white", "orange"],
            Self::Ndwi => ["brown", "white", "blue"],
        };
        VisParams { min, max, palette }
    }

    /// Band arithmetic as submitted to the remote service.
    ///
    /// NDVI and NDWI are plain normalized differences; SAVI uses the
    /// soil-adjusted expression with L = 0.5.
    pub fn band_math(self) -> BandMath {
        match self {
            Self::Ndvi => BandMath::NormalizedDifference {
                name: "NDVI".into(),
                bands: ["B8".into(), "B4".into()],
            },
            Self::Ndwi => BandMath::NormalizedDifference {
                name: "NDWI".into(),
                bands: ["B3".into(), "B8".into()],
            },
            Self::Savi => BandMath::Expression {
                name: "SAVI".into(),
                expression: "((NIR - RED) / (NIR + RED + L)) * (1 + L)".into(),
                inputs: BTreeMap::from([
                    ("NIR".into(), "B8".into()),
                    ("RED".into(), "B4".into()),
                ]),
                params: BTreeMap::from([("L".into(), 0.5)]),
            },
        }
    }

    /// Single-pixel reference evaluation of the band math.
    ///
    /// The remote service applies this per pixel at scale; this local form
    /// pins down the exact formulas the service is asked to run.
    pub fn evaluate(self, b3: f64, b4: f64, b8: f64) -> f64 {
        match self {
            Self::Ndvi => (b8 - b4) / (b8 + b4),
            Self::Savi => ((b8 - b4) / (b8 + b4 + 0.5)) * 1.5,
            Self::Ndwi => (b3 - b8) / (b3 + b8),
        }
    }
}

// ---

/// The fixed study polygon: a closed ring of [lon, lat] pairs, first = last.
#[derive(Debug, Clone)]
pub struct StudyArea {
    ring: [[f64; 2]; 5],
}

/// Monitored site near Mohammedia, Morocco.
pub static STUDY_AREA: StudyArea = StudyArea {
    ring: [
        [-7.055722052035492, 33.74347514551762],
        [-7.055722052035492, 33.720217304441604],
        [-7.025360624366215, 33.720217304441604],
        [-7.025360624366215, 33.74347514551762],
        [-7.055722052035492, 33.74347514551762],
    ],
};

impl StudyArea {
    pub fn ring(&self) -> &[[f64; 2]] {
        &self.ring
    }

    /// Centroid as (lat, lon), the order map libraries expect.
    ///
    /// Average of the four distinct corners; the closing vertex is skipped so
    /// it does not count twice.
    pub fn centroid(&self) -> (f64, f64) {
        let corners = &self.ring[..self.ring.len() - 1];
        let n = corners.len() as f64;
        let lon = corners.iter().map(|c| c[0]).sum::<f64>() / n;
        let lat = corners.iter().map(|c| c[1]).sum::<f64>() / n;
        (lat, lon)
    }
}

// ---

/// A scene as returned by the imagery service's search endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Scene {
    pub id: String,
    pub captured_at: DateTime<Utc>,
    pub cloud_pct: f32,
}

/// Outcome of one historical year of the trend computation.
///
/// No-data and failure are distinct outcomes: both leave a gap in the
/// chart, but failures carry a reason for the logs.
#[derive(Debug, Clone)]
pub enum YearValue {
    Value(f64),
    NoData,
    Failed(String),
}

impl YearValue {
    pub fn mean(&self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(*v),
            _ => None,
        }
    }
}

/// One point of the six-point trend series.
#[derive(Debug, Clone)]
pub struct TrendPoint {
    pub year: i32,
    pub value: YearValue,
}

// ---
