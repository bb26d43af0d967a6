use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use dimsync_core::{PublishedRow, PublishedSheet};
use dimsync_engine::{
    CsvSheetWriter, GoogleSheetsWriter, RetrySettings, RetryingSink, SheetWriter, Sink, SinkError,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn init_logging() {
    dimsync_logging::initialize_for_tests();
}

fn quick_retry(max_attempts: u32) -> RetrySettings {
    RetrySettings {
        max_attempts,
        delay: Duration::ZERO,
    }
}

fn sheet() -> PublishedSheet {
    PublishedSheet::from_rows(&[PublishedRow {
        ean: "590".to_string(),
        name: "Etui".to_string(),
        product_id: 1,
        edit_link: "https://shop/admin/products/edit/id/1".to_string(),
        category_type: "Etui na telefon".to_string(),
        dimensions_attribute: "10 x 5".to_string(),
        dimensions_description: String::new(),
        description: "Etui".to_string(),
    }])
}

/// Fails the first `failures` updates with the given error, then succeeds.
struct FlakyWriter {
    failures: u32,
    error: SinkError,
    clears: AtomicU32,
    updates: AtomicU32,
    written: Mutex<Vec<Vec<String>>>,
}

impl FlakyWriter {
    fn new(failures: u32, error: SinkError) -> Self {
        Self {
            failures,
            error,
            clears: AtomicU32::new(0),
            updates: AtomicU32::new(0),
            written: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl SheetWriter for FlakyWriter {
    async fn clear(&self) -> Result<(), SinkError> {
        self.clears.fetch_add(1, Ordering::SeqCst);
        self.written.lock().unwrap().clear();
        Ok(())
    }

    async fn update(&self, values: &[Vec<String>]) -> Result<(), SinkError> {
        let call = self.updates.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(self.error.clone());
        }
        *self.written.lock().unwrap() = values.to_vec();
        Ok(())
    }
}

#[tokio::test]
async fn transient_failures_are_retried_until_success() {
    init_logging();
    let sink = RetryingSink::new(
        FlakyWriter::new(2, SinkError::transient("quota")),
        quick_retry(3),
    );

    assert!(sink.save(&sheet()).await);
    assert_eq!(sink.writer().updates.load(Ordering::SeqCst), 3);
    assert_eq!(sink.writer().clears.load(Ordering::SeqCst), 3);
    assert_eq!(*sink.writer().written.lock().unwrap(), sheet().to_values());
}

#[tokio::test]
async fn exhausted_retries_report_false() {
    init_logging();
    let sink = RetryingSink::new(
        FlakyWriter::new(10, SinkError::transient("quota")),
        quick_retry(3),
    );

    assert!(!sink.save(&sheet()).await);
    assert_eq!(sink.writer().updates.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn fatal_failure_is_not_retried() {
    init_logging();
    let sink = RetryingSink::new(
        FlakyWriter::new(1, SinkError::fatal("forbidden")),
        quick_retry(3),
    );

    assert!(!sink.save(&sheet()).await);
    assert_eq!(sink.writer().updates.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn google_writer_clears_then_puts_rows() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v4/spreadsheets/sheet-1/values/Wymiary:clear"))
        .and(header("Authorization", "Bearer g-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v4/spreadsheets/sheet-1/values/Wymiary!A1"))
        .and(query_param("valueInputOption", "RAW"))
        .and(body_partial_json(json!({"values": sheet().to_values()})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"updatedRows": 2})))
        .expect(1)
        .mount(&server)
        .await;

    let writer = GoogleSheetsWriter::new("sheet-1", "Wymiary", "g-token")
        .with_api_base(format!("{}/v4/spreadsheets", server.uri()));
    let sink = RetryingSink::new(writer, quick_retry(3));

    assert!(sink.save(&sheet()).await);
}

#[tokio::test]
async fn google_writer_retries_server_errors() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let writer = GoogleSheetsWriter::new("s", "Arkusz1", "t")
        .with_api_base(format!("{}/v4/spreadsheets", server.uri()));
    let sink = RetryingSink::new(writer, quick_retry(3));

    assert!(sink.save(&sheet()).await);
}

#[tokio::test]
async fn google_writer_client_error_fails_once() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_string("PERMISSION_DENIED"))
        .expect(1)
        .mount(&server)
        .await;

    let writer = GoogleSheetsWriter::new("s", "Arkusz1", "t")
        .with_api_base(format!("{}/v4/spreadsheets", server.uri()));
    let sink = RetryingSink::new(writer, quick_retry(3));

    assert!(!sink.save(&sheet()).await);
}

#[tokio::test]
async fn csv_writer_replaces_file_content() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("out").join("published.csv");
    let sink = RetryingSink::new(CsvSheetWriter::new(&path), quick_retry(1));

    assert!(sink.save(&sheet()).await);
    assert!(sink.save(&PublishedSheet::from_rows(&[])).await);

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().count(), 1);
    assert!(content.starts_with("EAN,Nazwa,ID produktu"));
}
