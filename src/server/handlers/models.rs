//! `GET /v1/models`.

use std::collections::HashSet;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::error::ErrorKind;
use crate::server::handlers::error_response;
use crate::server::state::AppState;
use crate::types::{ModelInfo, ModelsQuery, paginate};

/// Merges `list_models` from every provider (falling back to the static
/// `models()` list on a live-listing failure), rewrites each raw id to its
/// public `<provider>/<raw>` form, then paginates.
pub async fn list_models(State(state): State<Arc<AppState>>, Query(query): Query<ModelsQuery>) -> Response {
    let mut seen = HashSet::new();
    let mut models = Vec::new();

    for provider in state.registry.all() {
        let raw_ids = match provider.list_models().await {
            Ok(ids) => ids,
            Err(_) => provider.models(),
        };
        for raw_id in raw_ids {
            let public_id = format!("{}/{}", provider.name(), raw_id);
            if seen.insert(public_id.clone()) {
                models.push(ModelInfo::new(public_id));
            }
        }
    }

    match paginate(models, &query) {
        Ok(page) => axum::Json(page).into_response(),
        Err(_) => error_response(StatusCode::BAD_REQUEST, ErrorKind::InvalidRequest, "invalid limit"),
    }
}
