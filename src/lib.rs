//! `machneo-bridge` executes SQL against a Machbase Neo server and converts
//! the row-oriented, per-column-typed result set into strongly-typed,
//! column-major frames.
//!
//! Two transports feed the same frame representation:
//! - a persistent binary RPC channel (injected behind [`RpcConnector`],
//!   delivering pre-typed cells through a scoped [`RowCursor`]);
//! - the stateless HTTP `/db/query` endpoint (JSON rows whose generic
//!   scalars are coerced per declared column type).
//!
//! Entry points:
//! - [`DatasourceInstance::query_data`] — run a batch of independent queries
//! - [`DatasourceInstance::check_health`] — probe the active transport
//! - [`QueryBuilder`] — generate dashboard-style query text

mod channel;
mod decode;
mod error;
mod executor;
mod frame;
mod health;
mod instance;
mod query_builder;
mod transport;
mod types;
mod value;
mod wire;

pub use channel::{RowCursor, RpcChannel, RpcConnector};
pub use decode::{decode_cursor_rows, decode_json_rows};
pub use error::BridgeError;
pub use executor::{
    DataQuery, DataResponse, ErrorStatus, QueryDataRequest, QueryDataResponse, QueryModel,
    ResponseError,
};
pub use frame::{build_frame, Field, Frame, SeriesValues, FRAME_NAME};
pub use health::{HealthResult, HealthStatus};
pub use instance::{DatasourceInstance, DatasourceSettings};
pub use query_builder::{interval_expr, Aggregate, Filter, QueryBuilder};
pub use transport::{HttpTransport, RpcTransport, TransportClient};
pub use types::{Col, TypeTag};
pub use value::Cell;
pub use wire::ResultData;

pub type Result<T> = std::result::Result<T, BridgeError>;
