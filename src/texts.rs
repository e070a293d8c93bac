//! Explanation paragraphs and conclusion rules for the dashboard page.
//!
//! These were hardcoded dictionaries in an earlier iteration; they now live
//! in a configuration mapping so the wording and thresholds can change
//! without touching code. The built-in defaults apply the same vegetation
//! buckets to every index, NDWI included, even though NDWI measures water —
//! deployments that want NDWI-specific wording override the JSON file.

use std::collections::BTreeMap;
use std::fs;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::SpectralIndex;

// ---

/// One conclusion bucket: chosen when the current mean is strictly greater
/// than `min_exclusive`, or unconditionally when `min_exclusive` is absent.
/// Buckets are evaluated in order; the catch-all goes last.
#[derive(Debug, Clone, Deserialize)]
pub struct ConclusionBucket {
    #[serde(default)]
    pub min_exclusive: Option<f64>,
    pub template: String,
}

/// Full text mapping: per-index explanation paragraphs plus the shared
/// conclusion rule set. Templates substitute `{indice}` with the index name.
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardTexts {
    pub explanations: BTreeMap<String, String>,
    pub conclusions: Vec<ConclusionBucket>,
}

impl Default for DashboardTexts {
    fn default() -> Self {
        // ---
        let explanations = BTreeMap::from([
            (
                "NDVI".to_string(),
                "L'indice NDVI (Normalized Difference Vegetation Index) est utilisé pour \
                 surveiller la végétation. Il varie entre -1 et 1. Une valeur proche de 1 \
                 indique une forte végétation."
                    .to_string(),
            ),
            (
                "SAVI".to_string(),
                "L'indice SAVI (Soil Adjusted Vegetation Index) est similaire au NDVI, mais \
                 ajuste l'effet du sol. Il est plus précis dans les zones semi-arides."
                    .to_string(),
            ),
            (
                "NDWI".to_string(),
                "L'indice NDWI (Normalized Difference Water Index) est utilisé pour identifier \
                 l'eau. Il varie entre -1 et 1. Une valeur proche de 1 indique une grande \
                 quantité d'eau."
                    .to_string(),
            ),
        ]);

        let conclusions = vec![
            ConclusionBucket {
                min_exclusive: Some(0.6),
                template: "La zone présente une végétation dense avec un indice {indice} \
                           élevé, ce qui indique une bonne couverture végétale."
                    .to_string(),
            },
            ConclusionBucket {
                min_exclusive: Some(0.3),
                template: "L'indice {indice} montre une végétation modérée dans la zone."
                    .to_string(),
            },
            ConclusionBucket {
                min_exclusive: None,
                template: "L'indice {indice} est faible, suggérant une faible couverture \
                           végétale ou une zone semi-aride."
                    .to_string(),
            },
        ];

        Self {
            explanations,
            conclusions,
        }
    }
}

impl DashboardTexts {
    // ---

    /// Built-in defaults, or the JSON mapping at `path` when one is given.
    pub fn load(path: Option<&str>) -> Result<Self> {
        match path {
            None => Ok(Self::default()),
            Some(path) => {
                let raw = fs::read_to_string(path)
                    .with_context(|| format!("cannot read dashboard texts at {path}"))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("invalid dashboard texts in {path}"))
            }
        }
    }

    pub fn explanation(&self, index: SpectralIndex) -> &str {
        self.explanations
            .get(index.name())
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Conclusion sentence for the current mean. Selection depends only on
    /// the mean and the bucket bounds, never on the index; the index name is
    /// substituted into the chosen template afterwards.
    pub fn conclusion(&self, index: SpectralIndex, mean: f64) -> String {
        let template = self
            .conclusions
            .iter()
            .find(|b| b.min_exclusive.map_or(true, |min| mean > min))
            .map(|b| b.template.as_str())
            .unwrap_or("");
        template.replace("{indice}", index.name())
    }
}

// ---

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn high_mean_selects_the_dense_bucket() {
        // ---
        let texts = DashboardTexts::default();
        let sentence = texts.conclusion(SpectralIndex::Ndvi, 0.72);
        assert!(sentence.contains("dense"), "got: {sentence}");
        assert!(sentence.contains("NDVI"));
    }

    #[test]
    fn moderate_mean_selects_the_middle_bucket() {
        // ---
        let texts = DashboardTexts::default();
        let sentence = texts.conclusion(SpectralIndex::Savi, 0.45);
        assert!(sentence.contains("modérée"), "got: {sentence}");
        assert!(sentence.contains("SAVI"));
    }

    #[test]
    fn low_mean_selects_the_catch_all_bucket() {
        // ---
        let texts = DashboardTexts::default();
        let sentence = texts.conclusion(SpectralIndex::Ndvi, 0.12);
        assert!(sentence.contains("faible"), "got: {sentence}");
    }

    #[test]
    fn bucket_bounds_are_exclusive() {
        // ---
        let texts = DashboardTexts::default();
        assert!(texts.conclusion(SpectralIndex::Ndvi, 0.6).contains("modérée"));
        assert!(texts.conclusion(SpectralIndex::Ndvi, 0.3).contains("faible"));
    }

    #[test]
    fn conclusion_ignores_index_identity() {
        // ---
        // NDWI measures water, yet a low mean still yields the semi-arid
        // wording: bucket selection is a pure function of the mean.
        let texts = DashboardTexts::default();
        let sentence = texts.conclusion(SpectralIndex::Ndwi, 0.10);
        assert!(sentence.contains("faible"), "got: {sentence}");
        assert!(sentence.contains("NDWI"));
    }

    #[test]
    fn every_index_has_an_explanation() {
        // ---
        let texts = DashboardTexts::default();
        for index in SpectralIndex::all() {
            assert!(
                !texts.explanation(index).is_empty(),
                "missing explanation for {}",
                index.name()
            );
        }
    }

    #[test]
    fn override_file_replaces_the_defaults() {
        // ---
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("texts.json");
        fs::write(
            &path,
            r#"{
                "explanations": { "NDWI": "Indice d'eau." },
                "conclusions": [
                    { "min_exclusive": 0.0, "template": "Présence d'eau ({indice})." },
                    { "template": "Pas d'eau détectée." }
                ]
            }"#,
        )
        .unwrap();

        let texts = DashboardTexts::load(path.to_str()).unwrap();
        assert_eq!(texts.explanation(SpectralIndex::Ndwi), "Indice d'eau.");
        assert_eq!(
            texts.conclusion(SpectralIndex::Ndwi, 0.4),
            "Présence d'eau (NDWI)."
        );
        assert_eq!(
            texts.conclusion(SpectralIndex::Ndwi, -0.2),
            "Pas d'eau détectée."
        );
    }
}
