use std::collections::HashMap;

use serde::Deserialize;

use crate::{
    decode, frame,
    transport::{HttpTransport, RpcTransport, TransportClient},
    Frame,
};

/// Per-query request payload.
///
/// Stable schema: `{"queryText": "...", "params": [...]}`.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct QueryModel {
    #[serde(rename = "queryText")]
    pub sql_text: String,
    #[serde(default)]
    pub params: Vec<serde_json::Value>,
}

/// One query of a batch request.
#[derive(Clone, Debug, PartialEq)]
pub struct DataQuery {
    /// Identifier unique within the batch; the response entry is keyed by it.
    pub ref_id: String,
    /// Raw JSON payload, parsed into a [`QueryModel`] at execution time.
    pub json: String,
}

impl DataQuery {
    pub fn new(ref_id: impl Into<String>, json: impl Into<String>) -> Self {
        Self {
            ref_id: ref_id.into(),
            json: json.into(),
        }
    }
}

/// Batch of independent queries.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryDataRequest {
    pub queries: Vec<DataQuery>,
}

/// HTTP-like status class attached to a failed query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorStatus {
    BadRequest,
    Internal,
}

/// Failure outcome of one query, surfaced verbatim to the caller.
#[derive(Clone, Debug, PartialEq)]
pub struct ResponseError {
    pub status: ErrorStatus,
    pub message: String,
}

impl ResponseError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: ErrorStatus::BadRequest,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: ErrorStatus::Internal,
            message: message.into(),
        }
    }
}

/// Outcome of one query: a frame or a status-classed error.
pub type DataResponse = std::result::Result<Frame, ResponseError>;

/// Batch outcome, addressed by query identifier rather than position.
#[derive(Debug, Default)]
pub struct QueryDataResponse {
    pub responses: HashMap<String, DataResponse>,
}

/// Runs one query against the transport bound to the instance.
///
/// A malformed payload never reaches the transport. One query's failure is
/// contained in its own response entry.
pub(crate) async fn execute(client: &TransportClient, query: &DataQuery) -> DataResponse {
    let model: QueryModel = serde_json::from_str(&query.json)
        .map_err(|err| ResponseError::bad_request(format!("query json unmarshal: {err}")))?;

    tracing::debug!(
        ref_id = %query.ref_id,
        transport = client.kind(),
        "executing query"
    );

    match client {
        TransportClient::Rpc(rpc) => execute_rpc(rpc, &model).await,
        TransportClient::Http(http) => execute_http(http, &model).await,
    }
}

async fn execute_rpc(rpc: &RpcTransport, model: &QueryModel) -> DataResponse {
    let mut cursor = rpc
        .query(&model.sql_text, &model.params)
        .await
        .map_err(|err| ResponseError::bad_request(err.to_string()))?;

    // The boxed cursor drops on every path out of this scope, releasing the
    // server-side result set whether decoding succeeded or not.
    let cols = cursor
        .columns()
        .map_err(|err| ResponseError::internal(err.to_string()))?;
    let series = decode::decode_cursor_rows(&cols, cursor.as_mut())
        .map_err(|err| ResponseError::internal(err.to_string()))?;

    Ok(frame::build_frame(cols.into_iter().map(|c| c.name), series))
}

async fn execute_http(http: &HttpTransport, model: &QueryModel) -> DataResponse {
    let data = http
        .fetch(&model.sql_text)
        .await
        .map_err(|err| ResponseError::bad_request(err.to_string()))?;

    let series = decode::decode_json_rows(&data)
        .map_err(|err| ResponseError::internal(err.to_string()))?;

    Ok(frame::build_frame(data.columns, series))
}
