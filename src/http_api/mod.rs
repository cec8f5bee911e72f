use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::NaiveDate;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::analyzer::{PlanAnalyzer, ServiceError};
use crate::config::AnalyzerConfig;
use crate::error::AnalysisError;
use crate::persistence::{PersistenceError, PlanStore};
use crate::plan::PlanId;
use crate::progress::ReleaseProgress;
use crate::resource_load::{ResourceLoad, WindowPolicy};
use crate::schedule::{CriticalPathReport, ScheduleAnalysis};

pub type SharedStore = Arc<RwLock<Box<dyn PlanStore + Send + Sync>>>;

#[derive(Clone)]
pub struct AppState {
    store: SharedStore,
    config: AnalyzerConfig,
}

impl AppState {
    pub fn new<S>(store: S) -> Self
    where
        S: PlanStore + Send + Sync + 'static,
    {
        Self {
            store: Arc::new(RwLock::new(Box::new(store))),
            config: AnalyzerConfig::default(),
        }
    }

    pub fn with_shared(store: SharedStore) -> Self {
        Self {
            store,
            config: AnalyzerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: AnalyzerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn store(&self) -> SharedStore {
        self.store.clone()
    }

    fn read<T>(
        &self,
        f: impl FnOnce(&PlanAnalyzer<'_, dyn PlanStore + Send + Sync>) -> Result<T, ServiceError>,
    ) -> Result<T, ApiError> {
        let guard = self.store.read();
        let analyzer = PlanAnalyzer::new(guard.as_ref()).with_config(self.config);
        f(&analyzer).map_err(ApiError::from)
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    Invalid { kind: &'static str, message: String },
    Internal(String),
}

impl From<ServiceError> for ApiError {
    fn from(value: ServiceError) -> Self {
        match value {
            ServiceError::Analysis(AnalysisError::NotFound(message)) => ApiError::NotFound(message),
            ServiceError::Analysis(err) => ApiError::Invalid {
                kind: err.kind(),
                message: err.to_string(),
            },
            ServiceError::Persistence(PersistenceError::NotFound(message)) => {
                ApiError::NotFound(message)
            }
            ServiceError::Persistence(err) => ApiError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(message) => {
                let body = Json(ErrorBody {
                    error: "not_found",
                    message,
                });
                (StatusCode::NOT_FOUND, body).into_response()
            }
            ApiError::Invalid { kind, message } => {
                let body = Json(ErrorBody {
                    error: kind,
                    message,
                });
                (StatusCode::BAD_REQUEST, body).into_response()
            }
            ApiError::Internal(message) => {
                warn!(%message, "request failed");
                let body = Json(ErrorBody {
                    error: "internal_error",
                    message,
                });
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ResourceLoadQuery {
    start_date: NaiveDate,
    end_date: NaiveDate,
    #[serde(default)]
    clip: Option<bool>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/release-plans/:id/critical-path", get(get_critical_path))
        .route("/release-plans/:id/schedule", get(get_schedule))
        .route("/release-plans/:id/progress", get(get_progress))
        .route("/users/:id/resource-load", get(get_resource_load))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "release-schedule HTTP API listening");
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn get_critical_path(
    State(state): State<AppState>,
    Path(plan_id): Path<PlanId>,
) -> Result<Json<CriticalPathReport>, ApiError> {
    let report = state.read(|analyzer| analyzer.critical_path(plan_id))?;
    Ok(Json(report))
}

async fn get_schedule(
    State(state): State<AppState>,
    Path(plan_id): Path<PlanId>,
) -> Result<Json<ScheduleAnalysis>, ApiError> {
    let analysis = state.read(|analyzer| analyzer.schedule(plan_id))?;
    Ok(Json(analysis))
}

async fn get_progress(
    State(state): State<AppState>,
    Path(plan_id): Path<PlanId>,
) -> Result<Json<ReleaseProgress>, ApiError> {
    let progress = state.read(|analyzer| analyzer.progress(plan_id))?;
    Ok(Json(progress))
}

async fn get_resource_load(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<ResourceLoadQuery>,
) -> Result<Json<ResourceLoad>, ApiError> {
    let policy = query.clip.map(|clip| {
        if clip {
            WindowPolicy::Clipped
        } else {
            WindowPolicy::Unclipped
        }
    });
    let load = state.read(|analyzer| {
        analyzer.resource_load(&user_id, query.start_date, query.end_date, policy)
    })?;
    Ok(Json(load))
}
