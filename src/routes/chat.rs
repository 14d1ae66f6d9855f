use axum::{
    Json,
    body::Bytes,
    extract::{Path, RawQuery, State},
    http::{HeaderMap, Method, header::AUTHORIZATION},
};
use serde_json::Value;
use tracing::Instrument;
use uuid::Uuid;

use crate::{
    config::DEV_REWRITE_PREFIX,
    error::{AppError, METHOD_NOT_ALLOWED},
    services::relay::{bearer, forward_json},
    state::SharedState,
};

/// `POST /api/chat`: attach the runner credential and relay the body untouched.
pub async fn chat_proxy_handler(
    State(state): State<SharedState>,
    method: Method,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    if method != Method::POST {
        return Err(AppError::MethodNotAllowed(METHOD_NOT_ALLOWED));
    }

    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("chat_proxy", %request_id, bytes = body.len());

    async move {
        let relayed = async {
            let url = state.cfg.runner_url()?;
            let auth = bearer(&state.cfg.api_key)?;
            forward_json(&state.http, url, Some(auth), body).await
        }
        .await;

        match relayed {
            Ok(data) => {
                tracing::info!("relayed chat request");
                Ok(Json(data))
            }
            Err(e) => {
                tracing::error!(error = %e, "proxy error");
                Err(e)
            }
        }
    }
    .instrument(span)
    .await
}

/// `POST /chatapi/{*path}`: development passthrough. Strips the prefix and
/// forwards to the runner host with the caller's own credential.
pub async fn dev_rewrite_handler(
    State(state): State<SharedState>,
    method: Method,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    if method != Method::POST {
        return Err(AppError::MethodNotAllowed(METHOD_NOT_ALLOWED));
    }

    let mut url = state.cfg.runner_base_url.clone();
    url.set_path(&format!("/{path}"));
    url.set_query(query.as_deref());
    tracing::debug!(from = %format!("{DEV_REWRITE_PREFIX}/{path}"), to = %url.path(), "rewriting dev request");

    let data = forward_json(&state.http, url, headers.get(AUTHORIZATION).cloned(), body)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "dev rewrite error"))?;
    Ok(Json(data))
}
