//! `POST /admin/reindex` handler.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::ApiState;
use crate::error::{AppError, DomainError};
use crate::indexer;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReindexBody {
    chain_id: u64,
    token: String,
    from_block: Option<u64>,
}

#[derive(Debug, Serialize)]
struct ReindexAccepted {
    ok: bool,
}

/// Validate and enqueue an admin-triggered reindex.
///
/// Returns `202 {ok: true}` on success, `400 {"error": "<code>"}` on any
/// validation failure.
pub async fn reindex(State(state): State<ApiState>, Json(body): Json<ReindexBody>) -> Response {
    let result = indexer::enqueue_reindex(
        state.store.as_ref(),
        &state.supported_chain_ids,
        body.chain_id,
        &body.token,
        body.from_block,
    )
    .await;

    match result {
        Ok(_) => (StatusCode::ACCEPTED, Json(ReindexAccepted { ok: true })).into_response(),
        Err(AppError::Domain(DomainError::UnsupportedChain(_))) => {
            bad_request("unsupported_chain")
        }
        Err(AppError::Domain(DomainError::InvalidToken(_))) => bad_request("invalid_token"),
        Err(AppError::Domain(DomainError::InvalidFromBlock(_))) => {
            bad_request("invalid_from_block")
        }
        Err(AppError::Domain(_)) => bad_request("invalid_chain"),
        Err(err) => internal_error(&err),
    }
}

fn bad_request(code: &'static str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": code }))).into_response()
}

fn internal_error(err: &AppError) -> Response {
    tracing::error!(error = %err, "internal error serving reindex request");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "internal_error" })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reindex_body_deserializes_camel_case() {
        let body: ReindexBody = serde_json::from_str(
            r#"{"chainId": 137, "token": "0x0000000000000000000000000000000000000001", "fromBlock": 100}"#,
        )
        .expect("valid body");
        assert_eq!(body.chain_id, 137);
        assert_eq!(body.from_block, Some(100));
    }

    #[test]
    fn reindex_body_from_block_is_optional() {
        let body: ReindexBody = serde_json::from_str(
            r#"{"chainId": 1, "token": "0x0000000000000000000000000000000000000001"}"#,
        )
        .expect("valid body");
        assert_eq!(body.from_block, None);
    }
}
