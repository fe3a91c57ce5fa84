use std::{
    collections::{HashMap, VecDeque},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use chrono::DateTime;
use machneo_bridge::{
    BridgeError, Cell, Col, DataQuery, DatasourceInstance, DatasourceSettings, ErrorStatus,
    HealthStatus, QueryDataRequest, Result, RowCursor, RpcChannel, RpcConnector, SeriesValues,
};
use serde_json::json;

#[derive(Default)]
struct ChannelState {
    connects: AtomicUsize,
    disconnects: AtomicUsize,
    probes: AtomicUsize,
    cursors_dropped: AtomicUsize,
}

type ResultSet = (Vec<Col>, Vec<Vec<Cell>>);

/// In-memory stand-in for the binary RPC client library.
#[derive(Default)]
struct MockConnector {
    state: Arc<ChannelState>,
    results: HashMap<String, ResultSet>,
    fail_connect: Option<String>,
    fail_query: Option<String>,
    table_count: i64,
}

impl MockConnector {
    fn with_result(mut self, sql: &str, cols: Vec<Col>, rows: Vec<Vec<Cell>>) -> Self {
        self.results.insert(sql.to_owned(), (cols, rows));
        self
    }

    fn with_table_count(mut self, count: i64) -> Self {
        self.table_count = count;
        self
    }

    fn failing_connect(mut self, message: &str) -> Self {
        self.fail_connect = Some(message.to_owned());
        self
    }

    fn failing_query(mut self, message: &str) -> Self {
        self.fail_query = Some(message.to_owned());
        self
    }

    fn state(&self) -> Arc<ChannelState> {
        self.state.clone()
    }
}

#[async_trait]
impl RpcConnector for MockConnector {
    async fn connect(&self, _address: &str) -> Result<Box<dyn RpcChannel>> {
        self.state.connects.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.fail_connect {
            return Err(BridgeError::Channel(message.clone()));
        }
        Ok(Box::new(MockChannel {
            state: self.state.clone(),
            results: self.results.clone(),
            fail_query: self.fail_query.clone(),
            table_count: self.table_count,
        }))
    }
}

struct MockChannel {
    state: Arc<ChannelState>,
    results: HashMap<String, ResultSet>,
    fail_query: Option<String>,
    table_count: i64,
}

#[async_trait]
impl RpcChannel for MockChannel {
    async fn query(
        &self,
        sql: &str,
        _params: &[serde_json::Value],
    ) -> Result<Box<dyn RowCursor + Send>> {
        if let Some(message) = &self.fail_query {
            return Err(BridgeError::Channel(message.clone()));
        }
        let (cols, rows) = self
            .results
            .get(sql)
            .cloned()
            .ok_or_else(|| BridgeError::Channel(format!("no result set for '{sql}'")))?;
        Ok(Box::new(MockCursor {
            state: self.state.clone(),
            cols,
            rows: rows.into(),
        }))
    }

    async fn query_int(&self, _sql: &str) -> Result<i64> {
        self.state.probes.fetch_add(1, Ordering::SeqCst);
        Ok(self.table_count)
    }

    fn disconnect(&mut self) {
        self.state.disconnects.fetch_add(1, Ordering::SeqCst);
    }
}

struct MockCursor {
    state: Arc<ChannelState>,
    cols: Vec<Col>,
    rows: VecDeque<Vec<Cell>>,
}

impl RowCursor for MockCursor {
    fn columns(&self) -> Result<Vec<Col>> {
        Ok(self.cols.clone())
    }

    fn fetch(&mut self) -> Result<Option<Vec<Cell>>> {
        Ok(self.rows.pop_front())
    }
}

impl Drop for MockCursor {
    fn drop(&mut self) {
        self.state.cursors_dropped.fetch_add(1, Ordering::SeqCst);
    }
}

fn rpc_settings() -> DatasourceSettings {
    DatasourceSettings {
        address: "127.0.0.1:5655".to_owned(),
    }
}

fn query_payload(sql: &str) -> String {
    json!({"queryText": sql, "params": []}).to_string()
}

#[tokio::test]
async fn cursor_rows_become_a_typed_frame() {
    let t0 = DateTime::from_timestamp(1_700_000_000, 0).expect("valid instant");
    let t1 = DateTime::from_timestamp(1_700_000_060, 0).expect("valid instant");
    let connector = MockConnector::default().with_result(
        "select time, value from example",
        vec![Col::new("time", "datetime"), Col::new("value", "double")],
        vec![
            vec![Cell::DateTime(t0), Cell::Float64(0.5)],
            vec![Cell::DateTime(t1), Cell::Float64(1.5)],
        ],
    );
    let state = connector.state();

    let ds = DatasourceInstance::from_settings(rpc_settings(), &connector).await;
    assert!(ds.has_client());

    let response = ds
        .query_data(QueryDataRequest {
            queries: vec![DataQuery::new(
                "A",
                query_payload("select time, value from example"),
            )],
        })
        .await;

    let frame = response.responses["A"].as_ref().expect("must yield a frame");
    assert_eq!(frame.fields.len(), 2);
    assert_eq!(frame.fields[0].name, "time");
    assert_eq!(
        frame.fields[0].values,
        SeriesValues::DateTime(vec![Some(t0), Some(t1)])
    );
    assert_eq!(
        frame.fields[1].values,
        SeriesValues::Float64(vec![Some(0.5), Some(1.5)])
    );

    // The cursor was released before the result came back.
    assert_eq!(state.cursors_dropped.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unknown_column_type_fails_only_its_own_query() {
    let connector = MockConnector::default()
        .with_result(
            "select bad from example",
            vec![Col::new("bad", "unsupported_type")],
            vec![vec![Cell::Int64(1)]],
        )
        .with_result(
            "select good from example",
            vec![Col::new("good", "int64")],
            vec![vec![Cell::Int64(1)]],
        );
    let state = connector.state();

    let ds = DatasourceInstance::from_settings(rpc_settings(), &connector).await;
    let response = ds
        .query_data(QueryDataRequest {
            queries: vec![
                DataQuery::new("A", query_payload("select bad from example")),
                DataQuery::new("B", query_payload("select good from example")),
            ],
        })
        .await;

    let err = response.responses["A"].as_ref().expect_err("must fail");
    assert_eq!(err.status, ErrorStatus::Internal);
    assert!(err.message.contains("unsupported_type"));

    let frame = response.responses["B"].as_ref().expect("must yield a frame");
    assert_eq!(frame.fields[0].values, SeriesValues::Int64(vec![Some(1)]));

    // Both cursors were released, the failing one included.
    assert_eq!(state.cursors_dropped.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn query_submission_failure_is_bad_request() {
    let connector = MockConnector::default().failing_query("table does not exist");

    let ds = DatasourceInstance::from_settings(rpc_settings(), &connector).await;
    let response = ds
        .query_data(QueryDataRequest {
            queries: vec![DataQuery::new("A", query_payload("select * from missing"))],
        })
        .await;

    let err = response.responses["A"].as_ref().expect_err("must fail");
    assert_eq!(err.status, ErrorStatus::BadRequest);
    assert!(err.message.contains("table does not exist"));
}

#[tokio::test]
async fn health_check_embeds_name_and_table_count() {
    let connector = MockConnector::default().with_table_count(42);
    let state = connector.state();

    let ds = DatasourceInstance::from_settings(rpc_settings(), &connector).await;
    let health = ds.check_health("neo-prod").await;

    assert_eq!(health.status, HealthStatus::Ok);
    assert!(health.message.contains("neo-prod"));
    assert!(health.message.contains("42 tables"));
    assert_eq!(state.probes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn empty_address_yields_unknown_health_without_probing() {
    let connector = MockConnector::default();
    let state = connector.state();

    let ds = DatasourceInstance::from_settings(DatasourceSettings::default(), &connector).await;
    assert!(!ds.has_client());
    assert!(ds.client_error().is_none());

    let health = ds.check_health("neo-unconfigured").await;
    assert_eq!(health.status, HealthStatus::Unknown);
    assert_eq!(health.message, "no connection");

    assert_eq!(state.connects.load(Ordering::SeqCst), 0);
    assert_eq!(state.probes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn connect_failure_records_error_and_degrades() {
    let connector = MockConnector::default().failing_connect("connection refused");

    let ds = DatasourceInstance::from_settings(rpc_settings(), &connector).await;
    assert!(!ds.has_client());
    assert_eq!(
        ds.client_error(),
        Some("channel error: connection refused")
    );

    let health = ds.check_health("neo-down").await;
    assert_eq!(health.status, HealthStatus::Error);
    assert!(health.message.contains("connection refused"));
}

#[tokio::test]
async fn dispose_releases_the_connection_once() {
    let connector = MockConnector::default();
    let state = connector.state();

    let mut ds = DatasourceInstance::from_settings(rpc_settings(), &connector).await;
    assert!(ds.has_client());
    assert_eq!(ds.settings().address, "127.0.0.1:5655");

    ds.dispose();
    ds.dispose();

    assert_eq!(state.disconnects.load(Ordering::SeqCst), 1);
    assert!(!ds.has_client());
}
