use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::app::AppState;

/// GET /api/v1/config — public config the frontend needs before connecting.
pub async fn config_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "success",
        "config": {
            "API_BASE_URL": state.config.gateway.api_base_url,
            "DEFAULT_CLIENT_LANG": state.config.chat.default_client_lang,
            "TRANSLATION_ENABLED": state.config.translation.enabled,
            "MAX_MESSAGE_LENGTH": state.config.chat.max_message_length,
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
