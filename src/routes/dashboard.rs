//! The dashboard endpoint: `GET/POST /`.
//!
//! One request runs the whole pipeline sequentially: resolve the latest
//! low-cloud scene over the study area, ask the imagery service for the
//! index mean, write the map artifact, rebuild the same 10-day window in
//! each of the five previous years for the trend, write the chart artifact,
//! and return the rendered dashboard page. Every remote call blocks the
//! request; only per-year trend failures are tolerated.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Form, Router,
};
use chrono::{Datelike, Duration, NaiveDate, Utc};
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::{SpectralIndex, TrendPoint, YearValue, STUDY_AREA};

use super::AppState;

// ---

/// Length of the rolling scene-selection window, in days.
const WINDOW_DAYS: i64 = 10;

/// Number of historical years in the trend, newest last.
const TREND_YEARS: i32 = 5;

pub fn router() -> Router<Arc<AppState>> {
    // ---
    Router::new().route("/", get(show).post(submit))
}

#[derive(Debug, Deserialize)]
struct IndexParams {
    indice: Option<String>,
}

async fn show(
    State(state): State<Arc<AppState>>,
    Query(params): Query<IndexParams>,
) -> Response {
    // ---
    respond(&state, params).await
}

async fn submit(
    State(state): State<Arc<AppState>>,
    Form(params): Form<IndexParams>,
) -> Response {
    // ---
    respond(&state, params).await
}

async fn respond(state: &AppState, params: IndexParams) -> Response {
    // ---
    let raw = params.indice.as_deref().unwrap_or("NDVI");

    // Rejected before any remote call or file write.
    let Some(index) = SpectralIndex::parse(raw) else {
        info!("rejecting unsupported index {:?}", raw);
        return (StatusCode::BAD_REQUEST, "Indice non supporté").into_response();
    };

    info!("dashboard request for {}", index.name());

    match run_pipeline(state, index).await {
        Ok(page) => Html(page).into_response(),
        Err(e) => {
            error!("dashboard pipeline for {} failed: {e:#}", index.name());
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Échec du traitement de la requête",
            )
                .into_response()
        }
    }
}

// ---

async fn run_pipeline(state: &AppState, index: SpectralIndex) -> Result<String> {
    // ---
    let end = Utc::now().date_naive();
    let start = end - Duration::days(WINDOW_DAYS);

    // Step 1: latest low-cloud scene in the trailing window. No scene is a
    // hard failure; there is nothing to compute without one.
    debug!("dashboard step 1: scene search [{start}..{end}]");
    let scenes = state
        .imagery
        .search_scenes(&STUDY_AREA, start, end, state.config.max_cloud_pct, true)
        .await?;
    let latest = scenes
        .first()
        .ok_or_else(|| anyhow!("no scene over the study area between {start} and {end}"))?;

    debug!(
        "latest scene {} captured {} ({}% clouds)",
        latest.id, latest.captured_at, latest.cloud_pct
    );

    // Step 2: spatial mean of the index on that scene.
    let scene_ids = [latest.id.clone()];
    let current_mean = state
        .imagery
        .mean_index(&scene_ids, index, &STUDY_AREA)
        .await?;
    info!("current {} mean: {current_mean:.4}", index.name());

    // Step 3: map artifact with the remote tile overlay.
    let tile_url = state.imagery.tile_template(&latest.id, index).await?;
    let map_file = state
        .artifacts
        .write_map(index, STUDY_AREA.centroid(), &tile_url)?;

    // Step 4: five-year trend, then the chart artifact.
    let trend = build_trend(state, index, start, end, current_mean).await;
    let chart_file = state.artifacts.write_chart(index, &trend)?;

    // Step 5: the page itself.
    let explanation = state.texts.explanation(index);
    let conclusion = state.texts.conclusion(index, current_mean);
    Ok(render_page(
        index,
        &map_file,
        &chart_file,
        explanation,
        &conclusion,
    ))
}

/// Six-point trend: the same day-of-year window in each of the five previous
/// years, then the already-computed current mean.
///
/// A year with no matching scenes is NoData; any error in a year is recorded
/// and skipped so one bad year never aborts the request.
async fn build_trend(
    state: &AppState,
    index: SpectralIndex,
    start: NaiveDate,
    end: NaiveDate,
    current_mean: f64,
) -> Vec<TrendPoint> {
    // ---
    let current_year = end.year();
    let mut points = Vec::with_capacity(TREND_YEARS as usize + 1);

    for offset in (1..=TREND_YEARS).rev() {
        let year = current_year - offset;
        let value = match year_mean(state, index, start, end, year).await {
            Ok(Some(mean)) => {
                debug!("{} mean for {year}: {mean:.4}", index.name());
                YearValue::Value(mean)
            }
            Ok(None) => {
                debug!("no scenes for {year}, recording a gap");
                YearValue::NoData
            }
            Err(e) => {
                warn!("trend year {year} failed: {e:#}");
                YearValue::Failed(format!("{e:#}"))
            }
        };
        points.push(TrendPoint { year, value });
    }

    points.push(TrendPoint {
        year: current_year,
        value: YearValue::Value(current_mean),
    });
    points
}

/// Composite mean of the index over every matching scene of one past year,
/// or None when the year has no scenes below the cloud cutoff.
async fn year_mean(
    state: &AppState,
    index: SpectralIndex,
    start: NaiveDate,
    end: NaiveDate,
    year: i32,
) -> Result<Option<f64>> {
    // ---
    let start = shift_to_year(start, year)?;
    let end = shift_to_year(end, year)?;

    let scenes = state
        .imagery
        .search_scenes(&STUDY_AREA, start, end, state.config.max_cloud_pct, false)
        .await?;
    if scenes.is_empty() {
        return Ok(None);
    }

    let ids: Vec<String> = scenes.into_iter().map(|s| s.id).collect();
    let mean = state.imagery.mean_index(&ids, index, &STUDY_AREA).await?;
    Ok(Some(mean))
}

/// Replace only the year component of a window bound. Fails for dates with
/// no equivalent in the target year (Feb 29 outside leap years).
fn shift_to_year(date: NaiveDate, year: i32) -> Result<NaiveDate> {
    // ---
    date.with_year(year)
        .ok_or_else(|| anyhow!("{date} has no equivalent in year {year}"))
}

// ---

const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="fr">
<head>
  <meta charset="UTF-8" />
  <title>Suivi des indices spectraux</title>
  <style>
    body { font-family: sans-serif; margin: 2rem auto; max-width: 60rem; }
    iframe { width: 100%; height: 28rem; border: 1px solid #ccc; }
    form { margin-bottom: 1.5rem; }
  </style>
</head>
<body>
  <h1>Suivi de la zone d'étude — __INDEX__</h1>
  <form method="post" action="/">
    <label for="indice">Indice :</label>
    <select name="indice" id="indice">
__OPTIONS__
    </select>
    <button type="submit">Analyser</button>
  </form>

  <h2>Carte</h2>
  <iframe src="/static/__MAP__" title="Carte __INDEX__"></iframe>

  <h2>Évolution sur 5 ans</h2>
  <iframe src="/static/__CHART__" title="Graphique __INDEX__"></iframe>

  <h2>Interprétation</h2>
  <p>__EXPLANATION__</p>
  <p><strong>__CONCLUSION__</strong></p>
</body>
</html>
"#;

fn render_page(
    index: SpectralIndex,
    map_file: &str,
    chart_file: &str,
    explanation: &str,
    conclusion: &str,
) -> String {
    // ---
    let options: String = SpectralIndex::all()
        .iter()
        .map(|i| {
            let selected = if *i == index { " selected" } else { "" };
            format!(
                "      <option value=\"{name}\"{selected}>{name}</option>\n",
                name = i.name()
            )
        })
        .collect();

    PAGE_TEMPLATE
        .replace("__INDEX__", index.name())
        .replace("__OPTIONS__", options.trim_end())
        .replace("__MAP__", map_file)
        .replace("__CHART__", chart_file)
        .replace("__EXPLANATION__", explanation)
        .replace("__CONCLUSION__", conclusion)
}

// ---

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn shift_replaces_only_the_year() {
        // ---
        let date = NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();
        let shifted = shift_to_year(date, 2023).unwrap();
        assert_eq!(shifted, NaiveDate::from_ymd_opt(2023, 8, 30).unwrap());
    }

    #[test]
    fn shift_fails_for_missing_leap_day() {
        // ---
        let leap = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert!(shift_to_year(leap, 2023).is_err());
        assert!(shift_to_year(leap, 2020).is_ok());
    }

    #[test]
    fn page_references_both_artifacts() {
        // ---
        let page = render_page(
            SpectralIndex::Ndvi,
            "carte_ndvi_abc.html",
            "graphique_ndvi_abc.html",
            "Explication.",
            "Conclusion.",
        );

        assert!(page.contains("/static/carte_ndvi_abc.html"));
        assert!(page.contains("/static/graphique_ndvi_abc.html"));
        assert!(page.contains("Explication."));
        assert!(page.contains("Conclusion."));
    }

    #[test]
    fn page_marks_the_requested_index_as_selected() {
        // ---
        let page = render_page(SpectralIndex::Savi, "m.html", "g.html", "", "");
        assert!(page.contains("<option value=\"SAVI\" selected>SAVI</option>"));
        assert!(page.contains("<option value=\"NDVI\">NDVI</option>"));
        assert!(page.contains("<option value=\"NDWI\">NDWI</option>"));
    }
}
