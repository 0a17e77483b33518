//! Import API handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

use fetchcycle_core::{FetchStatus, ImportCycle, StatusDocument, StatusFilter, StatusStore};

use crate::metrics::{IMPORTS_ACTIVE, IMPORTS_STARTED_TOTAL};
use crate::state::{AppState, GetterFactory};

/// Maximum allowed limit for list queries
const MAX_LIMIT: i64 = 1000;

/// Default limit for list queries
const DEFAULT_LIMIT: i64 = 100;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Response for a started import
#[derive(Debug, Serialize)]
pub struct StartImportResponse {
    pub fetch_id: String,
    pub status: FetchStatus,
}

/// Query parameters for listing imports
#[derive(Debug, Deserialize)]
pub struct ListImportsParams {
    /// Filter by tenant
    pub tenant_id: Option<String>,
    /// Filter by status (RUNNING, SUCCESS, FAIL)
    pub status: Option<String>,
    /// Maximum number of documents to return
    pub limit: Option<i64>,
    /// Pagination offset
    pub offset: Option<i64>,
}

/// Response for listing imports
#[derive(Debug, Serialize)]
pub struct ListImportsResponse {
    pub imports: Vec<StatusDocument>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ImportErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ImportErrorResponse>);

fn api_error(status: StatusCode, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ImportErrorResponse {
            error: error.into(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// Start an import for a tenant. Returns as soon as the run is registered.
pub async fn start_import(
    State(state): State<Arc<AppState>>,
    Path(tenant_id): Path<String>,
) -> Result<(StatusCode, Json<StartImportResponse>), ApiError> {
    let (factory, storer) = match (state.getter_factory(), state.storer()) {
        (Some(factory), Some(storer)) => (Arc::clone(factory), Arc::clone(storer)),
        _ => {
            return Err(api_error(
                StatusCode::SERVICE_UNAVAILABLE,
                "Imports require both [source] and [sink] to be configured",
            ));
        }
    };

    let getter = factory.getter_for(&tenant_id).map_err(|e| {
        error!("Failed to create getter for tenant {}: {}", tenant_id, e);
        api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    let cycle_config = state.config().cycle.clone();
    let cycle = ImportCycle::new(
        cycle_config.import_type.clone(),
        tenant_id.clone(),
        cycle_config,
        getter,
        storer,
        Arc::clone(state.notifier()),
        Arc::clone(state.status_store()),
    );
    let fetch_id = cycle.fetch_id().to_string();

    IMPORTS_STARTED_TOTAL.inc();
    IMPORTS_ACTIVE.inc();
    let handle = cycle.start().await;
    tokio::spawn(async move {
        match handle.await {
            Ok(doc) => info!("Import {} finished with {}", doc.fetch_id, doc.status),
            Err(e) => error!("Import task panicked: {}", e),
        }
        IMPORTS_ACTIVE.dec();
    });

    info!("Started import {} for tenant {}", fetch_id, tenant_id);
    Ok((
        StatusCode::ACCEPTED,
        Json(StartImportResponse {
            fetch_id,
            status: FetchStatus::Running,
        }),
    ))
}

/// Get the status document of a run
pub async fn get_import_status(
    State(state): State<Arc<AppState>>,
    Path(fetch_id): Path<String>,
) -> Result<Json<StatusDocument>, ApiError> {
    match state.status_store().get(&fetch_id) {
        Ok(Some(doc)) => Ok(Json(doc)),
        Ok(None) => Err(api_error(
            StatusCode::NOT_FOUND,
            format!("Import not found: {}", fetch_id),
        )),
        Err(e) => Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}

/// List status documents with optional filters
pub async fn list_imports(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListImportsParams>,
) -> Result<Json<ListImportsResponse>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);

    let mut filter = StatusFilter::new().with_limit(limit).with_offset(offset);

    if let Some(ref tenant_id) = params.tenant_id {
        filter = filter.with_tenant_id(tenant_id);
    }

    if let Some(ref status) = params.status {
        match FetchStatus::parse(status) {
            Some(status) => filter = filter.with_status(status),
            None => {
                return Err(api_error(
                    StatusCode::BAD_REQUEST,
                    format!("Unknown status: {}", status),
                ));
            }
        }
    }

    let imports = state
        .status_store()
        .list(&filter)
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let total = state
        .status_store()
        .count(&filter)
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(ListImportsResponse {
        imports,
        total,
        limit,
        offset,
    }))
}
