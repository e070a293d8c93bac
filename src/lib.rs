//! `vegwatch` — single-endpoint dashboard proxying a remote satellite
//! imagery analysis service.
//!
//! The crate is a thin orchestration layer: the remote service does the
//! cloud filtering, band math, spatial reduction and tile generation; this
//! code sequences those calls, writes two HTML artifacts per request and
//! renders the dashboard page.
//!
//! Module boundaries follow the Explicit Module Boundary Pattern (EMBP):
//! each concern lives in its own module and the pieces the routes need are
//! re-exported here, so `routes/*.rs` only ever import from the crate root.

mod artifacts;
mod config;
mod imagery;
mod models;
mod routes;
mod texts;

pub use artifacts::ArtifactStore;
pub use config::{load_from_env, Config};
pub use imagery::{ImageryClient, SCENE_COLLECTION};
pub use models::{
    BandMath, Scene, SpectralIndex, StudyArea, TrendPoint, VisParams, YearValue, STUDY_AREA,
};
pub use routes::{router, AppState};
pub use texts::{ConclusionBucket, DashboardTexts};
