use std::sync::Mutex;

use dimsync_core::PublishedSheet;
use dimsync_engine::{
    CatalogSource, FailureKind, FetchError, Pipeline, PipelineConfig, PipelineError,
    ProductSource, Resource, Sink, SnapshotStore,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tempfile::TempDir;

fn init_logging() {
    dimsync_logging::initialize_for_tests();
}

struct StaticSource {
    records: Result<Vec<Value>, FetchError>,
}

#[async_trait::async_trait]
impl CatalogSource for StaticSource {
    async fn fetch_all(
        &self,
        _resource: Resource,
        _page_size: u32,
    ) -> Result<Vec<Value>, FetchError> {
        self.records.clone()
    }
}

#[derive(Default)]
struct RecordingSink {
    saved: Mutex<Vec<PublishedSheet>>,
}

#[async_trait::async_trait]
impl Sink for RecordingSink {
    async fn save(&self, sheet: &PublishedSheet) -> bool {
        self.saved.lock().unwrap().push(sheet.clone());
        true
    }
}

fn product(id: i64, stock: &str, category: &str, description: &str) -> Value {
    json!({
        "product_id": id,
        "code": format!("590{id}"),
        "stock": {"stock": stock, "active": 1},
        "translations": {"pl_PL": {"name": format!("Produkt {id}"), "description": description}},
        "attributes": {"550": {"1370": category}}
    })
}

fn catalog() -> Vec<Value> {
    vec![
        product(1, "5", "Etui na telefon", "<p>Wymiary: 16x8x1 cm</p>"),
        product(2, "0", "Etui na telefon", ""),
        product(3, "4", "Słuchawki", ""),
        product(4, "2", "Szkło hartowane", "Długość: 14 cm Szerokość: 7 cm"),
    ]
}

fn config() -> PipelineConfig {
    PipelineConfig {
        site_url: "https://shop.example.com".to_string(),
        ..PipelineConfig::default()
    }
}

#[tokio::test]
async fn export_from_network_refreshes_snapshot_and_publishes() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let store = SnapshotStore::new(temp.path());
    let pipeline = Pipeline::new(StaticSource { records: Ok(catalog()) }, store, config());
    let sink = RecordingSink::default();

    let summary = pipeline.export(ProductSource::Network, &sink).await.unwrap();

    assert_eq!(summary.fetched, 4);
    assert_eq!(summary.published, 2);
    assert!(summary.saved);
    assert!(pipeline.store().path_for(Resource::Products).is_file());

    let saved = sink.saved.lock().unwrap();
    let sheet = &saved[0];
    let ids: Vec<_> = sheet.rows.iter().map(|row| row[2].clone()).collect();
    assert_eq!(ids, vec!["1", "4"]);
    assert_eq!(sheet.rows[0][6], "16 x 8 x 1");
    assert_eq!(sheet.rows[1][6], "14 x 7");
    assert_eq!(
        sheet.rows[1][3],
        "https://shop.example.com/admin/products/edit/id/4"
    );
}

#[tokio::test]
async fn export_from_snapshot_runs_offline() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let store = SnapshotStore::new(temp.path());
    store.write(Resource::Products, &catalog()).unwrap();

    let offline_error = FetchError {
        resource: "products".to_string(),
        kind: FailureKind::Network,
        message: "offline".to_string(),
    };
    let pipeline = Pipeline::new(
        StaticSource {
            records: Err(offline_error),
        },
        store,
        config(),
    );
    let sink = RecordingSink::default();

    let summary = pipeline.export(ProductSource::Snapshot, &sink).await.unwrap();
    assert_eq!(summary.published, 2);
}

#[tokio::test]
async fn failed_fetch_writes_no_snapshot() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let store = SnapshotStore::new(temp.path());
    let failure = FetchError {
        resource: "products".to_string(),
        kind: FailureKind::HttpStatus(500),
        message: String::new(),
    };
    let pipeline = Pipeline::new(StaticSource { records: Err(failure) }, store, config());
    let sink = RecordingSink::default();

    let err = pipeline
        .export(ProductSource::Network, &sink)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Fetch(ref e) if e.kind == FailureKind::HttpStatus(500)));
    assert!(!pipeline.store().path_for(Resource::Products).exists());
    assert!(sink.saved.lock().unwrap().is_empty());
}

#[tokio::test]
async fn fetch_resource_snapshots_any_resource() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let groups = vec![json!({"attribute_group_id": "552", "name": "Wymiary"})];
    let pipeline = Pipeline::new(
        StaticSource {
            records: Ok(groups.clone()),
        },
        SnapshotStore::new(temp.path()),
        config(),
    );

    let fetched = pipeline.fetch_resource(Resource::AttributeGroups).await.unwrap();
    assert_eq!(fetched, groups);
    assert_eq!(
        pipeline.store().read(Resource::AttributeGroups).unwrap(),
        groups
    );
}
