use serde::Deserialize;

use crate::{
    channel::RpcConnector,
    executor::{self, QueryDataRequest, QueryDataResponse, ResponseError},
    health::HealthResult,
    transport::{HttpTransport, RpcTransport, TransportClient},
    BridgeError, Result,
};

/// Connection settings, parsed from the instance's JSON configuration.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct DatasourceSettings {
    /// Server address. A value containing an HTTP indicator selects the HTTP
    /// transport, any other non-empty value selects the RPC transport, and
    /// an empty value yields an instance with no transport.
    #[serde(default)]
    pub address: String,
}

/// One configured datasource: a transport (or none) plus the error recorded
/// when the transport could not be established.
///
/// Instances are never reconfigured in place; new settings build a new
/// instance and the old one is disposed.
#[derive(Debug)]
pub struct DatasourceInstance {
    settings: DatasourceSettings,
    client: Option<TransportClient>,
    client_error: Option<String>,
}

impl DatasourceInstance {
    /// Builds an instance from raw settings JSON.
    ///
    /// The transport is connected eagerly. A connect or probe failure is
    /// recorded for later health reporting and leaves the instance degraded
    /// rather than failing construction.
    pub async fn create(settings_json: &str, connector: &dyn RpcConnector) -> Result<Self> {
        let settings: DatasourceSettings = serde_json::from_str(settings_json)
            .map_err(|err| BridgeError::Decode(format!("invalid datasource settings: {err}")))?;
        Ok(Self::from_settings(settings, connector).await)
    }

    /// Builds an instance from already-parsed settings.
    pub async fn from_settings(
        settings: DatasourceSettings,
        connector: &dyn RpcConnector,
    ) -> Self {
        let mut client = None;
        let mut client_error = None;

        if !settings.address.is_empty() {
            if settings.address.contains("http") {
                let transport = HttpTransport::new(settings.address.clone());
                match transport.probe().await {
                    Ok(()) => client = Some(TransportClient::Http(transport)),
                    Err(err) => client_error = Some(err.to_string()),
                }
            } else {
                match connector.connect(&settings.address).await {
                    Ok(channel) => {
                        client = Some(TransportClient::Rpc(RpcTransport::new(channel)))
                    }
                    Err(err) => client_error = Some(err.to_string()),
                }
            }
        }

        if let Some(error) = &client_error {
            tracing::warn!(address = %settings.address, error = %error, "datasource connect failed");
        }

        Self {
            settings,
            client,
            client_error,
        }
    }

    pub fn settings(&self) -> &DatasourceSettings {
        &self.settings
    }

    /// Whether a transport was established at construction.
    pub fn has_client(&self) -> bool {
        self.client.is_some()
    }

    /// Error recorded when the transport could not be established.
    pub fn client_error(&self) -> Option<&str> {
        self.client_error.as_deref()
    }

    /// Runs a batch of independent queries sequentially and keys each
    /// outcome by its query identifier.
    pub async fn query_data(&self, request: QueryDataRequest) -> QueryDataResponse {
        tracing::debug!(queries = request.queries.len(), "query_data called");

        let mut response = QueryDataResponse::default();
        for query in request.queries {
            let outcome = match &self.client {
                Some(client) => executor::execute(client, &query).await,
                None => Err(ResponseError::internal("datasource has no active transport")),
            };
            response.responses.insert(query.ref_id, outcome);
        }

        tracing::debug!(responses = response.responses.len(), "query_data done");
        response
    }

    /// Probes the active transport and reports tri-state health.
    ///
    /// `name` is the instance's configured display name, embedded in the Ok
    /// message.
    pub async fn check_health(&self, name: &str) -> HealthResult {
        tracing::info!(address = %self.settings.address, "check_health called");

        let client = match &self.client {
            Some(client) => client,
            None => {
                return match &self.client_error {
                    Some(message) => HealthResult::error(message.clone()),
                    None => HealthResult::unknown("no connection"),
                };
            }
        };

        match client {
            TransportClient::Rpc(rpc) => match rpc.probe().await {
                Ok(count) => HealthResult::ok(format!(
                    "data source '{name}' is working ({count} tables)"
                )),
                Err(err) => HealthResult::error(err.to_string()),
            },
            TransportClient::Http(http) => match http.probe().await {
                Ok(()) => HealthResult::ok(format!("data source '{name}' is working")),
                Err(err) => HealthResult::error(err.to_string()),
            },
        }
    }

    /// Releases the transport connection. Safe to call repeatedly; only the
    /// first call reaches the channel.
    pub fn dispose(&mut self) {
        if let Some(TransportClient::Rpc(mut rpc)) = self.client.take() {
            rpc.disconnect();
        }
        // The HTTP transport holds no connection state to release.
    }
}

#[cfg(test)]
mod tests {
    use super::DatasourceSettings;

    #[test]
    fn settings_parse_address() {
        let settings: DatasourceSettings =
            serde_json::from_str(r#"{"address": "127.0.0.1:5655"}"#).expect("must parse");
        assert_eq!(settings.address, "127.0.0.1:5655");
    }

    #[test]
    fn settings_default_to_empty_address() {
        let settings: DatasourceSettings = serde_json::from_str("{}").expect("must parse");
        assert!(settings.address.is_empty());
    }
}
