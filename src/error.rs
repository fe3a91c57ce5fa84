/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// Network or request execution error from `reqwest`.
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
    /// Non-success HTTP status code with raw response body.
    #[error("http error {status}: {body}")]
    Http { status: u16, body: String },
    /// Failure reported by the RPC channel provider.
    #[error("channel error: {0}")]
    Channel(String),
    /// Declared column type with no holder mapping.
    #[error("unknown column type: {0}")]
    UnknownColumnType(String),
    /// JSON cell that contradicts its column's declared type.
    #[error("coercion error in column '{column}': {detail}")]
    Coercion {
        /// Name of the column being coerced.
        column: String,
        /// What was expected and what arrived.
        detail: String,
    },
    /// Response decoding or result-shape validation error.
    #[error("decode error: {0}")]
    Decode(String),
}
