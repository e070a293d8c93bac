//! HTTP client for the remote imagery analysis service.
//!
//! Every numerically significant operation of the dashboard happens on the
//! remote side: scene cataloging and cloud filtering, per-pixel band math,
//! spatial mean reduction and tile generation. This module is the only place
//! that knows the service's wire format.

use std::collections::HashMap;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{BandMath, Scene, SpectralIndex, StudyArea, VisParams};

// ---

/// Scene collection queried for every request.
pub const SCENE_COLLECTION: &str = "COPERNICUS/S2_HARMONIZED";

/// Ground sampling distance (in the service's ground units) for reductions.
const REDUCE_SCALE: u32 = 10;

/// Cap on the number of sampled points per reduction.
const REDUCE_MAX_PIXELS: f64 = 1e9;

/// Client for the imagery service. Cheap to clone; the underlying
/// `reqwest::Client` shares its connection pool.
#[derive(Debug, Clone)]
pub struct ImageryClient {
    http: reqwest::Client,
    base_url: String,
}

// ---

#[derive(Serialize)]
struct SearchRequest<'a> {
    collection: &'static str,
    geometry: &'a [[f64; 2]],
    start_date: NaiveDate,
    end_date: NaiveDate,
    max_cloud_pct: u32,
    newest_first: bool,
}

#[derive(Deserialize)]
struct SearchResponse {
    scenes: Vec<Scene>,
}

#[derive(Serialize)]
struct ReduceRequest<'a> {
    scene_ids: &'a [String],
    band_math: BandMath,
    geometry: &'a [[f64; 2]],
    scale: u32,
    max_pixels: f64,
}

#[derive(Deserialize)]
struct ReduceResponse {
    values: HashMap<String, f64>,
}

#[derive(Serialize)]
struct TilesRequest<'a> {
    scene_id: &'a str,
    band_math: BandMath,
    vis: VisParams,
}

#[derive(Deserialize)]
struct TilesResponse {
    url_template: String,
}

// ---

impl ImageryClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Search the collection for scenes intersecting the study area within
    /// [start, end], below the cloud cutoff. With `newest_first` the service
    /// orders by capture time descending so the first result is the latest.
    pub async fn search_scenes(
        &self,
        area: &StudyArea,
        start: NaiveDate,
        end: NaiveDate,
        max_cloud_pct: u32,
        newest_first: bool,
    ) -> Result<Vec<Scene>> {
        // ---
        let url = format!("{}/v1/scenes:search", self.base_url);
        let body = SearchRequest {
            collection: SCENE_COLLECTION,
            geometry: area.ring(),
            start_date: start,
            end_date: end,
            max_cloud_pct,
            newest_first,
        };

        tracing::debug!("scenes:search {} -> {} [{start}..{end}]", SCENE_COLLECTION, url);

        let response: SearchResponse = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("scene search request failed")?
            .error_for_status()
            .context("scene search rejected by service")?
            .json()
            .await
            .context("malformed scene search response")?;

        tracing::debug!("scenes:search returned {} scene(s)", response.scenes.len());
        Ok(response.scenes)
    }

    /// Spatial mean of the index over the study area, keyed by band name.
    ///
    /// With a single scene id the service reduces that scene directly. With
    /// several, it maps the band math over every scene and mean-composites
    /// them before reducing — the historical-year path.
    pub async fn mean_index(
        &self,
        scene_ids: &[String],
        index: SpectralIndex,
        area: &StudyArea,
    ) -> Result<f64> {
        // ---
        let url = format!("{}/v1/images:reduce", self.base_url);
        let body = ReduceRequest {
            scene_ids,
            band_math: index.band_math(),
            geometry: area.ring(),
            scale: REDUCE_SCALE,
            max_pixels: REDUCE_MAX_PIXELS,
        };

        tracing::debug!("images:reduce {} over {} scene(s)", index.name(), scene_ids.len());

        let response: ReduceResponse = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("reduction request failed")?
            .error_for_status()
            .context("reduction rejected by service")?
            .json()
            .await
            .context("malformed reduction response")?;

        response
            .values
            .get(index.name())
            .copied()
            .ok_or_else(|| anyhow!("reduction response is missing the {} band", index.name()))
    }

    /// Slippy-map tile URL template for the computed index on one scene,
    /// visualized with the index's display range and palette.
    pub async fn tile_template(&self, scene_id: &str, index: SpectralIndex) -> Result<String> {
        // ---
        let url = format!("{}/v1/images:tiles", self.base_url);
        let body = TilesRequest {
            scene_id,
            band_math: index.band_math(),
            vis: index.vis_params(),
        };

        let response: TilesResponse = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("tile endpoint request failed")?
            .error_for_status()
            .context("tile endpoint rejected by service")?
            .json()
            .await
            .context("malformed tile endpoint response")?;

        Ok(response.url_template)
    }
}

// ---
