/// Risk-model partition and export tests
///
/// Covers the date-partitioned result layout, the auto-binding constructor
/// and the best-effort CSV export.
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use qes_client::{ClientError, Connection, RiskModelBuilder, Transport};

#[derive(Default)]
struct MockTransport {
    gets: Mutex<HashMap<String, String>>,
}

impl MockTransport {
    fn stub_get(&self, path: &str, body: impl Into<String>) {
        self.gets.lock().insert(path.to_string(), body.into());
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn post_json(&self, path: &str, _body: &Value) -> Result<String, ClientError> {
        Err(ClientError::Transport(format!("no POST stub for {}", path)))
    }

    async fn get_text(&self, path: &str) -> Result<String, ClientError> {
        self.gets
            .lock()
            .get(path)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(path.to_string()))
    }
}

fn connection() -> (Arc<MockTransport>, Connection) {
    let transport = Arc::new(MockTransport::default());
    let conn = Connection::with_transport(transport.clone());
    (transport, conn)
}

fn stub_partitioned_job(transport: &MockTransport, uuid: &str) {
    transport.stub_get(
        &format!("risk-model/{}/", uuid),
        json!({ "dates": ["2023-01-31", "2023-02-28"] }).to_string(),
    );
    for date in ["2023-01-31", "2023-02-28"] {
        transport.stub_get(
            &format!("risk-model/{}/{}", uuid, date),
            json!({ "files": ["cov.csv", "exposures.csv"] }).to_string(),
        );
        transport.stub_get(
            &format!("risk-model/{}/{}/cov.csv", uuid, date),
            "\"factor\",\"variance\"\nMOM,0.04",
        );
        transport.stub_get(
            &format!("risk-model/{}/{}/exposures.csv", uuid, date),
            "\"asset\",\"MOM\"\nAAPL,1.2",
        );
    }
}

#[tokio::test]
async fn test_connect_auto_binds_latest_successful_job() {
    let (transport, conn) = connection();
    transport.stub_get(
        "job",
        json!([
            { "UUID": "rm-old", "TYPEID": 1, "STATUS": "SUCCESS", "STARTTIME": 1_000, "ENDTIME": 2_000 },
            { "UUID": "rm-new", "TYPEID": 1, "STATUS": "SUCCESS", "STARTTIME": 5_000, "ENDTIME": 6_000 },
            { "UUID": "opt-newer", "TYPEID": 2, "STATUS": "SUCCESS", "STARTTIME": 9_000, "ENDTIME": 9_500 },
        ])
        .to_string(),
    );

    let builder = RiskModelBuilder::connect(conn).await.unwrap();
    assert_eq!(builder.uuid(), Some("rm-new"));
}

#[tokio::test]
async fn test_connect_stays_unbound_without_successful_jobs() {
    let (transport, conn) = connection();
    transport.stub_get(
        "job",
        json!([
            { "UUID": "rm-run", "TYPEID": 1, "STATUS": "STARTED", "STARTTIME": 1_000, "ENDTIME": 0 },
        ])
        .to_string(),
    );

    let builder = RiskModelBuilder::connect(conn).await.unwrap();
    assert!(!builder.is_bound());
    assert!(matches!(
        builder.dates().await,
        Err(ClientError::Unbound("risk-model"))
    ));
}

#[tokio::test]
async fn test_dates_lists_partitions() {
    let (transport, conn) = connection();
    stub_partitioned_job(&transport, "rm-1");

    let mut builder = RiskModelBuilder::new(conn);
    builder.bind("rm-1");

    let dates = builder.dates().await.unwrap();
    assert_eq!(dates, ["2023-01-31", "2023-02-28"]);
}

#[tokio::test]
async fn test_data_for_date_keys_by_date_and_base_name() {
    let (transport, conn) = connection();
    stub_partitioned_job(&transport, "rm-1");

    let mut builder = RiskModelBuilder::new(conn);
    builder.bind("rm-1");

    let tables = builder.data_for_date("2023-01-31").await.unwrap();
    let mut keys: Vec<&str> = tables.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, ["2023-01-31/cov", "2023-01-31/exposures"]);

    let cov = &tables["2023-01-31/cov"];
    assert_eq!(cov.columns(), ["factor", "variance"]);
    assert_eq!(cov.get(0, "variance"), Some("0.04"));
}

#[tokio::test]
async fn test_download_all_writes_csv_per_date() {
    let (transport, conn) = connection();
    stub_partitioned_job(&transport, "rm-1");

    let mut builder = RiskModelBuilder::new(conn);
    builder.bind("rm-1");

    let out_dir = tempfile::tempdir().unwrap();
    builder.download_all(out_dir.path()).await.unwrap();

    for date in ["2023-01-31", "2023-02-28"] {
        for name in ["cov", "exposures"] {
            let path = out_dir.path().join(date).join(format!("{}.csv", name));
            assert!(path.exists(), "missing export {}", path.display());
        }
    }

    let cov = std::fs::read_to_string(out_dir.path().join("2023-01-31/cov.csv")).unwrap();
    assert_eq!(cov, "factor,variance\nMOM,0.04\n");
}

#[tokio::test]
async fn test_download_all_continues_past_failed_dates() {
    let (transport, conn) = connection();
    transport.stub_get(
        "risk-model/rm-1/",
        json!({ "dates": ["2023-01-31", "2023-02-28"] }).to_string(),
    );
    // Only the first partition is served; the second date fails on listing.
    transport.stub_get(
        "risk-model/rm-1/2023-01-31",
        json!({ "files": ["cov.csv"] }).to_string(),
    );
    transport.stub_get(
        "risk-model/rm-1/2023-01-31/cov.csv",
        "\"factor\",\"variance\"\nMOM,0.04",
    );

    let mut builder = RiskModelBuilder::new(conn);
    builder.bind("rm-1");

    let out_dir = tempfile::tempdir().unwrap();
    let result = builder.download_all(out_dir.path()).await;

    match result {
        Err(ClientError::PartialExport(failed)) => {
            assert_eq!(failed, ["2023-02-28"]);
        }
        other => panic!("expected PartialExport, got {:?}", other),
    }

    // The healthy date was still exported.
    assert!(out_dir.path().join("2023-01-31/cov.csv").exists());
}
