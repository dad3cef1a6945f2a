//! Wire types for `GET /v1/models`.

use serde::{Deserialize, Serialize};

/// One entry in the model catalog, keyed by the public `<provider>/<raw>` id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub display_name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub created_at: Option<String>,
}

impl ModelInfo {
    pub fn new(public_id: impl Into<String>) -> Self {
        let public_id = public_id.into();
        Self {
            display_name: public_id.clone(),
            kind: "model".to_string(),
            created_at: None,
            id: public_id,
        }
    }
}

/// A cursor-paginated page of models, sorted ascending by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsPage {
    pub data: Vec<ModelInfo>,
    pub first_id: String,
    pub has_more: bool,
    pub last_id: String,
}

/// Query parameters accepted by `GET /v1/models`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelsQuery {
    pub after_id: Option<String>,
    pub before_id: Option<String>,
    pub limit: Option<String>,
}

const DEFAULT_LIMIT: usize = 20;
const MAX_LIMIT: usize = 1000;

/// Paginate a sorted model list per §4.5: `limit` defaults to 20, clamps to
/// `[1, 1000]`, and a non-numeric `limit` is a caller error. Cursors
/// reference ids; an unknown cursor yields an empty page rather than an
/// error.
pub fn paginate(
    mut models: Vec<ModelInfo>,
    query: &ModelsQuery,
) -> Result<ModelsPage, String> {
    models.sort_by(|a, b| a.id.cmp(&b.id));

    let limit = match &query.limit {
        None => DEFAULT_LIMIT,
        Some(raw) => match raw.parse::<i64>() {
            Ok(n) => n.clamp(1, MAX_LIMIT as i64) as usize,
            Err(_) => return Err("invalid limit".to_string()),
        },
    };

    let start = match &query.after_id {
        Some(cursor) => match models.iter().position(|m| &m.id == cursor) {
            Some(idx) => idx + 1,
            None => models.len(), // unknown cursor -> empty page
        },
        None => 0,
    };

    let end = match &query.before_id {
        Some(cursor) => models
            .iter()
            .position(|m| &m.id == cursor)
            .unwrap_or(models.len()),
        None => models.len(),
    };

    let end = end.max(start);
    let window = &models[start..end];
    let has_more = window.len() > limit;
    let page: Vec<ModelInfo> = window.iter().take(limit).cloned().collect();

    let first_id = page.first().map(|m| m.id.clone()).unwrap_or_default();
    let last_id = page.last().map(|m| m.id.clone()).unwrap_or_default();

    Ok(ModelsPage {
        data: page,
        first_id,
        has_more,
        last_id,
    })
}
