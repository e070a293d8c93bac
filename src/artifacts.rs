//! Map and chart artifacts written under the static directory.
//!
//! Each request produces two self-contained HTML files: a Leaflet map with
//! the remote service's tile overlay, and a Plotly trend chart. File names
//! carry a fresh UUID so concurrent requests for the same index never write
//! over each other; old artifacts are left in place.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde_json::json;
use uuid::Uuid;

use crate::{SpectralIndex, TrendPoint};

// ---

const MAP_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="fr">
<head>
  <meta charset="UTF-8" />
  <title>Carte __INDEX__</title>
  <link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css" />
  <script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
  <style>
    html, body { height: 100%; margin: 0; padding: 0; }
    #map { height: 100%; width: 100%; }
  </style>
</head>
<body>
  <div id="map"></div>
  <script>
    var map = L.map('map').setView([__LAT__, __LON__], 10);
    L.tileLayer('https://tile.openstreetmap.org/{z}/{x}/{y}.png', {
      attribution: '&copy; OpenStreetMap'
    }).addTo(map);
    L.tileLayer(__TILE_URL__, {
      attribution: '__INDEX__ - imagerie satellite',
      opacity: 0.8
    }).addTo(map);
  </script>
</body>
</html>
"#;

const CHART_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="fr">
<head>
  <meta charset="UTF-8" />
  <title>Graphique __INDEX__</title>
  <script src="https://cdn.plot.ly/plotly-2.35.2.min.js" charset="utf-8"></script>
  <style>
    html, body { height: 100%; margin: 0; padding: 0; }
    #chart { height: 100%; width: 100%; }
  </style>
</head>
<body>
  <div id="chart"></div>
  <script>
    Plotly.newPlot('chart', __DATA__, __LAYOUT__);
  </script>
</body>
</html>
"#;

// ---

/// Writer for the per-request HTML artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// Create the store, making sure the output directory exists.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        // ---
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("cannot create artifact directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    /// Write the Leaflet map for `index`, centered on `(lat, lon)` with the
    /// remote tile overlay. Returns the generated file name.
    pub fn write_map(
        &self,
        index: SpectralIndex,
        center: (f64, f64),
        tile_url: &str,
    ) -> Result<String> {
        // ---
        let (lat, lon) = center;
        // The tile URL goes through JSON so its quoting survives; the {z}/{x}/{y}
        // placeholders are left for Leaflet.
        let html = MAP_TEMPLATE
            .replace("__INDEX__", index.name())
            .replace("__LAT__", &lat.to_string())
            .replace("__LON__", &lon.to_string())
            .replace("__TILE_URL__", &serde_json::to_string(tile_url)?);

        self.persist("carte", index, &html)
    }

    /// Write the Plotly trend chart: one lines+markers trace of mean value
    /// per year, y-axis pinned to the index display range. Years without a
    /// value appear as gaps. Returns the generated file name.
    pub fn write_chart(&self, index: SpectralIndex, trend: &[TrendPoint]) -> Result<String> {
        // ---
        let years: Vec<String> = trend.iter().map(|p| p.year.to_string()).collect();
        let means: Vec<serde_json::Value> = trend
            .iter()
            .map(|p| p.value.mean().map_or(serde_json::Value::Null, |v| json!(v)))
            .collect();

        let (min, max) = index.display_range();
        let name = index.name();

        let data = json!([{
            "x": years,
            "y": means,
            "mode": "lines+markers",
            "name": name,
        }]);
        let layout = json!({
            "title": { "text": format!("Évolution de {name} moyen (5 dernières années + actuel)") },
            "xaxis": { "title": { "text": "Année" } },
            "yaxis": { "title": { "text": format!("{name} moyen") }, "range": [min, max] },
            "template": "plotly_white",
        });

        let html = CHART_TEMPLATE
            .replace("__INDEX__", name)
            .replace("__DATA__", &data.to_string())
            .replace("__LAYOUT__", &layout.to_string());

        self.persist("graphique", index, &html)
    }

    fn persist(&self, kind: &str, index: SpectralIndex, html: &str) -> Result<String> {
        // ---
        let file_name = format!(
            "{kind}_{}_{}.html",
            index.name().to_lowercase(),
            Uuid::new_v4().simple()
        );
        let path = self.dir.join(&file_name);
        fs::write(&path, html)
            .with_context(|| format!("cannot write artifact {}", path.display()))?;

        tracing::debug!("wrote artifact {}", path.display());
        Ok(file_name)
    }
}

// ---

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::YearValue;

    fn sample_trend() -> Vec<TrendPoint> {
        // ---
        vec![
            TrendPoint { year: 2021, value: YearValue::Value(0.31) },
            TrendPoint { year: 2022, value: YearValue::NoData },
            TrendPoint { year: 2023, value: YearValue::Failed("timeout".into()) },
            TrendPoint { year: 2024, value: YearValue::Value(0.42) },
            TrendPoint { year: 2025, value: YearValue::Value(0.39) },
            TrendPoint { year: 2026, value: YearValue::Value(0.44) },
        ]
    }

    #[test]
    fn map_artifact_embeds_center_and_overlay() {
        // ---
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path()).unwrap();

        let name = store
            .write_map(
                SpectralIndex::Ndvi,
                (33.73, -7.04),
                "https://tiles.example/{z}/{x}/{y}.png",
            )
            .unwrap();

        assert!(name.starts_with("carte_ndvi_"), "unexpected name: {name}");
        assert!(name.ends_with(".html"));

        let html = fs::read_to_string(dir.path().join(&name)).unwrap();
        assert!(html.contains("[33.73, -7.04]"));
        assert!(html.contains("https://tiles.example/{z}/{x}/{y}.png"));
        assert!(html.contains("NDVI"));
    }

    #[test]
    fn chart_artifact_has_gaps_and_pinned_axis() {
        // ---
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path()).unwrap();

        let name = store
            .write_chart(SpectralIndex::Ndwi, &sample_trend())
            .unwrap();
        assert!(name.starts_with("graphique_ndwi_"), "unexpected name: {name}");

        let html = fs::read_to_string(dir.path().join(&name)).unwrap();
        // NoData and Failed years both render as chart gaps.
        assert!(html.contains("null"));
        assert!(html.contains("\"range\":[-1.0,1.0]"));
        for year in ["2021", "2022", "2023", "2024", "2025", "2026"] {
            assert!(html.contains(year), "missing year {year}");
        }
    }

    #[test]
    fn chart_axis_follows_index_range() {
        // ---
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path()).unwrap();

        let name = store
            .write_chart(SpectralIndex::Savi, &sample_trend())
            .unwrap();
        let html = fs::read_to_string(dir.path().join(&name)).unwrap();
        assert!(html.contains("\"range\":[0.0,1.0]"));
    }

    #[test]
    fn repeated_writes_never_collide() {
        // ---
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path()).unwrap();

        let a = store
            .write_map(SpectralIndex::Ndvi, (33.73, -7.04), "https://t/{z}/{x}/{y}")
            .unwrap();
        let b = store
            .write_map(SpectralIndex::Ndvi, (33.73, -7.04), "https://t/{z}/{x}/{y}")
            .unwrap();

        assert_ne!(a, b);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }
}
