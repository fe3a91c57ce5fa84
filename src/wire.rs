use serde::Deserialize;

use crate::BridgeError;

/// Result payload of the HTTP query endpoint.
///
/// Rows are row-major with one generic JSON scalar per cell; `types` aligns
/// with `columns` and carries the declared type strings.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct ResultData {
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub lengths: Vec<i32>,
    #[serde(default)]
    pub rows: Vec<Vec<serde_json::Value>>,
}

/// Splits the `data` member out of a query response body.
///
/// The endpoint wraps the payload in an envelope (`{"success": .., "data":
/// {..}}`); when no `data` member is present the whole body is treated as the
/// payload.
pub(crate) fn extract_data(body: &[u8]) -> Result<ResultData, BridgeError> {
    let mut value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|err| BridgeError::Decode(format!("response body is not JSON: {err}")))?;

    let payload = if value.get("data").is_some() {
        value["data"].take()
    } else {
        value
    };

    serde_json::from_value(payload)
        .map_err(|err| BridgeError::Decode(format!("invalid result payload: {err}")))
}
