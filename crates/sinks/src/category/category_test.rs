use std::fs;

use acomms_protocol::{CategoryId, DecodedRecord, FieldValue};
use tempfile::TempDir;

use super::*;

// =============================================================================
// Test Helpers
// =============================================================================

fn names() -> Vec<String> {
    vec!["sentry_status".into(), "sentry_science".into(), "experimental".into()]
}

fn writer(dir: &Path) -> CategoryWriter {
    CategoryWriter::new(CategoryWriterConfig::new(dir).with_prefix("sentry"), names())
}

fn record(category: u16, timestamp: &str, values: &[f64]) -> DecodedRecord {
    DecodedRecord::new(
        CategoryId::new(category),
        timestamp,
        values.iter().copied().map(FieldValue::Float).collect(),
    )
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

// =============================================================================
// Paths
// =============================================================================

#[test]
fn test_stream_path_with_prefix() {
    let path = stream_path(Path::new("/out"), "sentry", "sentry_science");
    assert_eq!(path, PathBuf::from("/out/sentry_sentry_science.txt"));
}

#[test]
fn test_stream_path_without_prefix() {
    let path = stream_path(Path::new("/out"), "", "usbl_ship");
    assert_eq!(path, PathBuf::from("/out/usbl_ship.txt"));
}

#[test]
fn test_config_builders() {
    let config = CategoryWriterConfig::new("/out")
        .with_prefix("sentry")
        .with_durable(true);
    assert_eq!(config.output_dir, PathBuf::from("/out"));
    assert_eq!(config.prefix, "sentry");
    assert!(config.durable);
}

// =============================================================================
// Routing
// =============================================================================

#[tokio::test]
async fn test_route_creates_directory_and_file() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("nested/output");
    let mut writer = writer(&out);

    let delivery = writer
        .route(&record(1, "12:00:00", &[20.1, 3.4]))
        .await
        .unwrap();

    assert_eq!(delivery, Delivery::Written(18));
    let path = writer.path(CategoryId::new(1)).unwrap();
    assert_eq!(path, out.join("sentry_sentry_science.txt"));
    assert_eq!(read(path), "12:00:00,20.1,3.4\n");
}

#[tokio::test]
async fn test_streams_opened_lazily() {
    let dir = TempDir::new().unwrap();
    let mut writer = writer(dir.path());

    writer.route(&record(0, "t", &[1.0])).await.unwrap();

    assert!(dir.path().join("sentry_sentry_status.txt").exists());
    assert!(!dir.path().join("sentry_sentry_science.txt").exists());
    assert!(!dir.path().join("sentry_experimental.txt").exists());
    assert_eq!(writer.metrics().snapshot().streams_opened, 1);
}

#[tokio::test]
async fn test_categories_are_isolated_and_ordered() {
    let dir = TempDir::new().unwrap();
    let mut writer = writer(dir.path());

    writer.route(&record(1, "t1", &[1.0])).await.unwrap();
    writer.route(&record(0, "t2", &[2.0])).await.unwrap();
    writer.route(&record(1, "t3", &[3.0])).await.unwrap();
    writer.route(&record(1, "t4", &[4.5])).await.unwrap();

    let science = read(writer.path(CategoryId::new(1)).unwrap());
    let status = read(writer.path(CategoryId::new(0)).unwrap());
    assert_eq!(science, "t1,1\nt3,3\nt4,4.5\n");
    assert_eq!(status, "t2,2\n");

    let snapshot = writer.metrics().snapshot();
    assert_eq!(snapshot.records_written, 4);
    assert_eq!(snapshot.bytes_written, (science.len() + status.len()) as u64);
}

#[tokio::test]
async fn test_existing_output_is_appended() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sentry_experimental.txt");
    fs::write(&path, "earlier,1\n").unwrap();

    let mut writer = writer(dir.path());
    writer.route(&record(2, "later", &[2.0])).await.unwrap();

    assert_eq!(read(&path), "earlier,1\nlater,2\n");
}

#[tokio::test]
async fn test_mixed_field_kinds() {
    let dir = TempDir::new().unwrap();
    let mut writer = writer(dir.path());

    let record = DecodedRecord::new(
        CategoryId::new(2),
        "2022-08-01 12:00:00",
        vec![
            FieldValue::Timestamp("2022-08-01T11:59:58".into()),
            FieldValue::Integer(42),
            FieldValue::Token("OK".into()),
            FieldValue::Float(-0.25),
        ],
    );
    writer.route(&record).await.unwrap();

    assert_eq!(
        read(writer.path(CategoryId::new(2)).unwrap()),
        "2022-08-01 12:00:00,2022-08-01T11:59:58,42,OK,-0.25\n"
    );
}

#[tokio::test]
async fn test_durable_writes() {
    let dir = TempDir::new().unwrap();
    let config = CategoryWriterConfig::new(dir.path()).with_durable(true);
    let mut writer = CategoryWriter::new(config, names());

    writer.route(&record(0, "t", &[1.0])).await.unwrap();
    assert_eq!(read(&dir.path().join("sentry_status.txt")), "t,1\n");
}

#[tokio::test]
async fn test_unknown_category() {
    let dir = TempDir::new().unwrap();
    let mut writer = writer(dir.path());

    let err = writer.route(&record(9, "t", &[1.0])).await.unwrap_err();
    assert!(matches!(err, SinkError::UnknownCategory { category } if category.as_u16() == 9));
}

// =============================================================================
// Failure policy
// =============================================================================

#[tokio::test]
async fn test_failing_category_is_disabled() {
    let dir = TempDir::new().unwrap();
    // A directory where the file should be makes every open fail
    fs::create_dir(dir.path().join("sentry_sentry_status.txt")).unwrap();
    let mut writer = writer(dir.path());

    let delivery = writer.route(&record(0, "t1", &[1.0])).await.unwrap();
    assert_eq!(delivery, Delivery::Dropped);
    assert!(writer.is_disabled(CategoryId::new(0)));

    // Later records for it are dropped without another attempt
    let delivery = writer.route(&record(0, "t2", &[2.0])).await.unwrap();
    assert_eq!(delivery, Delivery::Dropped);

    // Other categories keep working
    writer.route(&record(1, "t3", &[3.0])).await.unwrap();
    assert_eq!(read(writer.path(CategoryId::new(1)).unwrap()), "t3,3\n");

    let snapshot = writer.metrics().snapshot();
    assert_eq!(snapshot.write_errors, 2);
    assert_eq!(snapshot.categories_disabled, 1);
    assert_eq!(snapshot.records_dropped, 2);
    assert_eq!(snapshot.records_written, 1);
}

#[tokio::test]
async fn test_second_failing_category_is_systemic() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("sentry_sentry_status.txt")).unwrap();
    fs::create_dir(dir.path().join("sentry_experimental.txt")).unwrap();
    let mut writer = writer(dir.path());

    writer.route(&record(0, "t1", &[1.0])).await.unwrap();
    let err = writer.route(&record(2, "t2", &[2.0])).await.unwrap_err();

    assert!(err.is_systemic());
    match err {
        SinkError::Systemic { first, second, .. } => {
            assert_eq!(first, "sentry_status");
            assert_eq!(second, "experimental");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_retry_trims_partial_record() {
    let dir = TempDir::new().unwrap();
    let mut writer = writer(dir.path());
    let status = CategoryId::new(0);

    writer.route(&record(0, "t1", &[1.0])).await.unwrap();
    let path = writer.path(status).unwrap().to_path_buf();

    // Leftover of a write that failed half way through the line
    let mut torn = fs::OpenOptions::new().append(true).open(&path).unwrap();
    std::io::Write::write_all(&mut torn, b"t2,1.2,3").unwrap();

    // A read-only handle makes the next append fail and go through the retry
    writer.slots[0] = Slot::Open(File::open(&path).await.unwrap());

    let delivery = writer.route(&record(0, "t2", &[1.2, 3.4])).await.unwrap();
    assert_eq!(delivery, Delivery::Written(11));
    assert_eq!(read(&path), "t1,1\nt2,1.2,3.4\n");

    let snapshot = writer.metrics().snapshot();
    assert_eq!(snapshot.write_errors, 1);
    assert_eq!(snapshot.partials_trimmed, 1);
    assert_eq!(snapshot.records_written, 2);
    assert!(!writer.is_disabled(status));

    // The tracked end follows later appends
    writer.route(&record(0, "t3", &[5.0])).await.unwrap();
    assert_eq!(read(&path), "t1,1\nt2,1.2,3.4\nt3,5\n");
}

#[tokio::test]
async fn test_flush_all() {
    let dir = TempDir::new().unwrap();
    let mut writer = writer(dir.path());

    writer.flush_all().await.unwrap();

    writer.route(&record(0, "t", &[1.0])).await.unwrap();
    writer.route(&record(1, "t", &[2.0])).await.unwrap();
    writer.flush_all().await.unwrap();

    assert_eq!(read(writer.path(CategoryId::new(0)).unwrap()), "t,1\n");
}

#[test]
fn test_names() {
    let writer = CategoryWriter::new(CategoryWriterConfig::new("/out"), names());
    assert_eq!(writer.name(CategoryId::new(2)), Some("experimental"));
    assert_eq!(writer.name(CategoryId::new(3)), None);
    assert!(!writer.is_disabled(CategoryId::new(0)));
}
