use std::sync::Arc;

use axum::Router;
use tower_http::services::ServeDir;

use crate::{ArtifactStore, Config, DashboardTexts, ImageryClient};

mod dashboard;
mod health;

// ---

/// State shared by every route.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub imagery: ImageryClient,
    pub artifacts: ArtifactStore,
    pub texts: DashboardTexts,
}

pub fn router(state: AppState) -> Router {
    // ---
    let static_dir = state.config.static_dir.clone();
    Router::new()
        .merge(dashboard::router())
        .merge(health::router())
        .nest_service("/static", ServeDir::new(static_dir))
        .with_state(Arc::new(state))
}
