//! `GET /token/:address/holders` handler.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::json;

use super::ApiState;
use crate::error::AppError;
use crate::ports::CursorStore;
use crate::query;
use crate::types::primitives::EthAddress;

#[derive(Debug, Deserialize)]
pub struct HoldersQuery {
    #[serde(rename = "chainId")]
    chain_id: Option<u64>,
    cursor: Option<String>,
    limit: Option<u32>,
}

/// Serve one page of a token's holder listing.
///
/// Returns `200 {items, nextCursor?, status}` on success, `400
/// {"error": "<code>"}` if `chainId` is missing, not a configured chain,
/// or `address` is not a well-formed token address.
pub async fn get_holders(
    State(state): State<ApiState>,
    Path(address): Path<String>,
    Query(params): Query<HoldersQuery>,
) -> Response {
    let Some(chain_id) = params.chain_id else {
        return bad_request("missing_chain");
    };

    if !state.supported_chain_ids.contains(&chain_id) {
        return bad_request("unsupported_chain");
    }

    let Ok(token) = EthAddress::from_hex(&address) else {
        return bad_request("invalid_chain");
    };

    let tracked = match state.store.get_cursor(chain_id, token).await {
        Ok(tracked) => tracked,
        Err(err) => return internal_error(&err),
    };

    let result = query::get_token_holders(
        state.store.as_ref(),
        state.cache.as_ref(),
        tracked.as_ref(),
        chain_id,
        token,
        params.cursor.as_deref(),
        params.limit,
    )
    .await;

    match result {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(AppError::Domain(_)) => bad_request("invalid_chain"),
        Err(err) => internal_error(&err),
    }
}

fn bad_request(code: &'static str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": code }))).into_response()
}

fn internal_error(err: &AppError) -> Response {
    tracing::error!(error = %err, "internal error serving holders query");
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
    fn holders_query_deserializes_camel_case_chain_id() {
        let params: HoldersQuery =
            serde_json::from_str(r#"{"chainId": 137, "limit": 10}"#).expect("valid query");
        assert_eq!(params.chain_id, Some(137));
        assert_eq!(params.limit, Some(10));
    }
}
