//! Listing and move handlers.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{Json, body::Bytes, extract::State};
use ferry_fsops::{DirectoryIndex, TransferEngine, TransferKind, TransferRequest};
use ferry_telemetry::{Metrics, current_request_id, current_route};
use tracing::{debug, error, info, warn};

use crate::http::errors::ApiError;
use crate::models::{DataResponse, MoveRequest, OperationResult};
use crate::state::ApiState;

/// `GET /data`: current listing, never failing on unreadable roots.
pub(crate) async fn data(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<DataResponse>, ApiError> {
    let response = snapshot(&state, Vec::new()).await?;
    Ok(Json(response))
}

/// `POST /move`: move each item independently and report the failures.
pub(crate) async fn move_items(
    State(state): State<Arc<ApiState>>,
    body: Bytes,
) -> Result<Json<DataResponse>, ApiError> {
    let request: MoveRequest = serde_json::from_slice(&body).map_err(|err| {
        debug!(error = %err, "rejecting malformed move request");
        ApiError::bad_request("Invalid request body")
    })?;

    let request_id = current_request_id().unwrap_or_default();
    let route = current_route().unwrap_or_default();
    let requested = request.items.len();
    info!(
        request_id = %request_id,
        route = %route,
        src = %request.src,
        dest = %request.dest,
        items = requested,
        "move batch received"
    );

    let engine = state.engine.clone();
    let results = tokio::task::spawn_blocking(move || run_moves(&engine, &request))
        .await
        .map_err(|err| {
            error!(request_id = %request_id, error = %err, "move task failed");
            ApiError::internal("move task failed")
        })?;
    info!(
        request_id = %request_id,
        route = %route,
        items = requested,
        failed = results.len(),
        "move batch finished"
    );

    let response = snapshot(&state, results).await?;
    Ok(Json(response))
}

fn run_moves(engine: &TransferEngine, request: &MoveRequest) -> Vec<OperationResult> {
    request
        .items
        .iter()
        .filter_map(|item| {
            let transfer =
                TransferRequest::new(request.src.as_str(), item.as_str(), request.dest.as_str());
            engine.move_item(&transfer).err().map(|err| OperationResult {
                src: format!("{}/{item}", request.src),
                dest: request.dest.clone(),
                operation: TransferKind::Move.as_str().to_string(),
                message: err.describe(),
            })
        })
        .collect()
}

async fn snapshot(
    state: &ApiState,
    operation_results: Vec<OperationResult>,
) -> Result<DataResponse, ApiError> {
    let index = state.index.clone();
    let telemetry = state.telemetry.clone();
    tokio::task::spawn_blocking(move || build_listing(&index, &telemetry, operation_results))
        .await
        .map_err(|err| {
            error!(error = %err, "listing task failed");
            ApiError::internal("listing task failed")
        })
}

/// Assemble a response, degrading unreadable listings to empty values plus the error flag.
pub(crate) fn build_listing(
    index: &DirectoryIndex,
    telemetry: &Metrics,
    operation_results: Vec<OperationResult>,
) -> DataResponse {
    let mut listing_errors = false;

    let source_contents = match index.source_contents() {
        Ok(listing) => listing
            .into_iter()
            .map(|(root, names)| (root.to_string_lossy().into_owned(), names))
            .collect(),
        Err(err) => {
            listing_errors = true;
            telemetry.inc_listing_failure("source");
            warn!(error = %err.describe(), "source listing failed");
            BTreeMap::new()
        }
    };

    let destinations = index.destination_dirs().unwrap_or_else(|err| {
        listing_errors = true;
        telemetry.inc_listing_failure("destination");
        warn!(error = %err.describe(), "destination listing failed");
        Vec::new()
    });

    DataResponse {
        operation_results,
        listing_errors,
        source_contents,
        destinations,
    }
}
