//! Seam to the RPC client library.
//!
//! The concrete binary-protocol client lives outside this crate; hosts
//! inject an implementation of these traits at instance construction.

use async_trait::async_trait;

use crate::{Cell, Col, Result};

/// Establishes RPC channels to a server address.
#[async_trait]
pub trait RpcConnector: Send + Sync {
    async fn connect(&self, address: &str) -> Result<Box<dyn RpcChannel>>;
}

/// An established RPC connection capable of running queries.
#[async_trait]
pub trait RpcChannel: Send + Sync {
    /// Submits query text with bind parameters and returns a row cursor.
    async fn query(
        &self,
        sql: &str,
        params: &[serde_json::Value],
    ) -> Result<Box<dyn RowCursor + Send>>;

    /// Runs a query expected to yield a single integer cell.
    async fn query_int(&self, sql: &str) -> Result<i64>;

    /// Releases the connection. Called at most once per channel.
    fn disconnect(&mut self);
}

/// Scoped, sequential reader over one query's result rows.
///
/// Cursors are drained and dropped before the query result is returned, on
/// every exit path; implementations release server-side resources in `Drop`.
pub trait RowCursor: Send {
    /// Column manifest of the result set, in result order.
    fn columns(&self) -> Result<Vec<Col>>;

    /// Reads the next row of concretely-typed cells, `None` once exhausted.
    fn fetch(&mut self) -> Result<Option<Vec<Cell>>>;
}
