use std::fmt;

use reqwest::StatusCode;

use crate::{
    channel::{RpcChannel, RowCursor},
    wire::{self, ResultData},
    BridgeError, Result,
};

/// Row-count probe used by health checks on both transports.
pub(crate) const PROBE_QUERY: &str = "SELECT count(*) FROM V$TABLES";

/// Query endpoint path on the HTTP transport.
pub(crate) const QUERY_PATH: &str = "/db/query";

/// Wire-level mechanism bound to one datasource instance.
///
/// Exactly one variant is selected at construction from the configured
/// address's scheme and kept for the instance's lifetime.
pub enum TransportClient {
    Rpc(RpcTransport),
    Http(HttpTransport),
}

impl TransportClient {
    /// Transport name for log events.
    pub fn kind(&self) -> &'static str {
        match self {
            TransportClient::Rpc(_) => "rpc",
            TransportClient::Http(_) => "http",
        }
    }
}

impl fmt::Debug for TransportClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportClient::Rpc(_) => f.write_str("TransportClient::Rpc"),
            TransportClient::Http(http) => f
                .debug_struct("TransportClient::Http")
                .field("address", &http.address)
                .finish(),
        }
    }
}

/// Stateless HTTP client for the `/db/query` endpoint.
pub struct HttpTransport {
    http: reqwest::Client,
    address: String,
}

impl HttpTransport {
    pub fn new(address: impl Into<String>) -> Self {
        let mut address = address.into();
        while address.ends_with('/') {
            address.pop();
        }
        Self {
            http: reqwest::Client::new(),
            address,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Issues the query GET and returns the parsed result payload.
    ///
    /// Bind parameters are not supported on this transport; only the query
    /// text travels, percent-encoded as the `q` parameter.
    pub async fn fetch(&self, sql: &str) -> Result<ResultData> {
        let body = self.get(sql).await?;
        wire::extract_data(body.as_bytes())
    }

    /// Cheap liveness probe: the row-count query must answer 200.
    pub async fn probe(&self) -> Result<()> {
        self.get(PROBE_QUERY).await.map(|_| ())
    }

    async fn get(&self, sql: &str) -> Result<String> {
        let url = format!("{}{}", self.address, QUERY_PATH);
        let response = self
            .http
            .get(&url)
            .query(&[("q", sql)])
            .send()
            .await
            .map_err(BridgeError::Transport)?;

        let status = response.status();
        let body = response.text().await.map_err(BridgeError::Transport)?;

        if status != StatusCode::OK {
            return Err(BridgeError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

/// Persistent connection-oriented client over the injected RPC channel.
pub struct RpcTransport {
    channel: Box<dyn RpcChannel>,
}

impl RpcTransport {
    pub fn new(channel: Box<dyn RpcChannel>) -> Self {
        Self { channel }
    }

    /// Submits a query and returns its scoped row cursor.
    pub async fn query(
        &self,
        sql: &str,
        params: &[serde_json::Value],
    ) -> Result<Box<dyn RowCursor + Send>> {
        self.channel.query(sql, params).await
    }

    /// Probes the server and returns the catalog row count.
    pub async fn probe(&self) -> Result<i64> {
        self.channel.query_int(PROBE_QUERY).await
    }

    /// Releases the underlying connection.
    pub fn disconnect(&mut self) {
        self.channel.disconnect();
    }
}
