//! `POST /v1/images/generate`. Routes unconditionally to the `antigravity`
//! provider.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::error::ErrorKind;
use crate::providers::resolver::DEFAULT_PROVIDER;
use crate::server::handlers::{error_response, shape_provider_error};
use crate::server::state::AppState;
use crate::types::ImageGenerateRequest;

const DEFAULT_IMAGE_MODEL: &str = "antigravity/image-default";
const MAX_IMAGE_COUNT: u32 = 4;

pub async fn generate_image(State(state): State<Arc<AppState>>, Json(mut request): Json<ImageGenerateRequest>) -> Response {
    if !request.is_valid() {
        return error_response(StatusCode::BAD_REQUEST, ErrorKind::InvalidRequest, "prompt must not be empty");
    }
    request.normalize(DEFAULT_IMAGE_MODEL, MAX_IMAGE_COUNT);

    let provider = match state.registry.get_by_name(DEFAULT_PROVIDER) {
        Some(p) => p,
        None => {
            return error_response(
                StatusCode::NOT_FOUND,
                ErrorKind::NotFound,
                format!("provider '{DEFAULT_PROVIDER}' is not registered"),
            );
        }
    };

    match provider.generate_image(&request).await {
        Ok(resp) => Json(resp).into_response(),
        Err(err) => shape_provider_error(&state.accounts, &err),
    }
}
