//! Tests for the tailing reader

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use tempfile::TempDir;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use crate::{StartAt, TailConfig, TailError, TailReader};

// =============================================================================
// Test Helpers
// =============================================================================

fn fast_config() -> TailConfig {
    TailConfig {
        poll_interval: Duration::from_millis(10),
        ..Default::default()
    }
}

fn append(path: &Path, bytes: &[u8]) {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
}

async fn next_text(reader: &mut TailReader, cancel: &CancellationToken) -> String {
    timeout(Duration::from_secs(5), reader.next_line(cancel))
        .await
        .expect("line within timeout")
        .unwrap()
        .unwrap()
        .text()
        .to_string()
}

/// True if the reader is still waiting after `ms`
async fn still_waiting(reader: &mut TailReader, cancel: &CancellationToken, ms: u64) -> bool {
    timeout(Duration::from_millis(ms), reader.next_line(cancel))
        .await
        .is_err()
}

// =============================================================================
// Line framing
// =============================================================================

#[tokio::test]
async fn test_yields_lines_with_spans() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("raw.txt");
    append(&path, b"a\nbb\r\n");

    let cancel = CancellationToken::new();
    let mut reader = TailReader::new(&path, fast_config());

    let first = reader.next_line(&cancel).await.unwrap().unwrap();
    assert_eq!(first.text(), "a");
    assert_eq!((first.start(), first.end(), first.seq()), (0, 2, 1));

    let second = reader.next_line(&cancel).await.unwrap().unwrap();
    assert_eq!(second.text(), "bb");
    assert_eq!((second.start(), second.end(), second.seq()), (2, 6, 2));

    assert_eq!(reader.offset(), 6);
    assert_eq!(reader.lines_read(), 2);
}

#[tokio::test]
async fn test_blank_lines_are_yielded() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("raw.txt");
    append(&path, b"\nx\n");

    let cancel = CancellationToken::new();
    let mut reader = TailReader::new(&path, fast_config());

    let blank = reader.next_line(&cancel).await.unwrap().unwrap();
    assert!(blank.is_blank());
    assert_eq!(blank.end(), 1);
    assert_eq!(next_text(&mut reader, &cancel).await, "x");
}

#[tokio::test]
async fn test_partial_line_waits_for_terminator() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("raw.txt");
    append(&path, b"Q1,12:00:00,20");

    let cancel = CancellationToken::new();
    let mut reader = TailReader::new(&path, fast_config());

    assert!(still_waiting(&mut reader, &cancel, 80).await);
    assert_eq!(reader.offset(), 0);
    assert_eq!(reader.buffered(), 14);

    append(&path, b".1,3.4\n");
    let line = reader.next_line(&cancel).await.unwrap().unwrap();
    assert_eq!(line.text(), "Q1,12:00:00,20.1,3.4");
    assert_eq!((line.start(), line.end()), (0, 21));
    assert_eq!(reader.buffered(), 0);
}

#[tokio::test]
async fn test_picks_up_appends_while_polling() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("raw.txt");
    append(&path, b"");

    let writer_path = path.clone();
    let writer = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        append(&writer_path, b"late\n");
    });

    let cancel = CancellationToken::new();
    let mut reader = TailReader::new(&path, fast_config());
    assert_eq!(next_text(&mut reader, &cancel).await, "late");
    writer.await.unwrap();
}

#[tokio::test]
async fn test_invalid_utf8_is_replaced() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("raw.txt");
    append(&path, b"ok\xff\xfe\n");

    let cancel = CancellationToken::new();
    let mut reader = TailReader::new(&path, fast_config());

    let text = next_text(&mut reader, &cancel).await;
    assert!(text.starts_with("ok"));
    assert!(text.contains('\u{FFFD}'));
}

#[tokio::test]
async fn test_small_read_chunks_preserve_lines() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("raw.txt");
    append(&path, b"first line\nsecond line\n");

    let cancel = CancellationToken::new();
    let config = TailConfig {
        read_chunk: 3,
        ..fast_config()
    };
    let mut reader = TailReader::new(&path, config);

    assert_eq!(next_text(&mut reader, &cancel).await, "first line");
    assert_eq!(next_text(&mut reader, &cancel).await, "second line");
    assert_eq!(reader.offset(), 23);
}

// =============================================================================
// Start positions
// =============================================================================

#[tokio::test]
async fn test_resume_at_offset() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("raw.txt");
    append(&path, b"one\ntwo\nthree\n");

    let cancel = CancellationToken::new();
    let mut reader = TailReader::resume(&path, 4, fast_config());

    let line = reader.next_line(&cancel).await.unwrap().unwrap();
    assert_eq!(line.text(), "two");
    assert_eq!(line.start(), 4);
    assert_eq!(line.seq(), 1);
}

#[tokio::test]
async fn test_start_at_end_skips_complete_lines_only() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("raw.txt");
    append(&path, b"old1\nold2\npart");

    let cancel = CancellationToken::new();
    let config = TailConfig {
        start_at: StartAt::End,
        ..fast_config()
    };
    let mut reader = TailReader::new(&path, config);

    assert!(still_waiting(&mut reader, &cancel, 50).await);
    assert_eq!(reader.offset(), 10);

    append(&path, b"ial\nnew\n");
    assert_eq!(next_text(&mut reader, &cancel).await, "partial");
    assert_eq!(next_text(&mut reader, &cancel).await, "new");
}

#[tokio::test]
async fn test_start_at_end_without_newline() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("raw.txt");
    append(&path, b"no newline yet");

    let cancel = CancellationToken::new();
    let config = TailConfig {
        start_at: StartAt::End,
        ..fast_config()
    };
    let mut reader = TailReader::new(&path, config);
    assert!(still_waiting(&mut reader, &cancel, 50).await);
    assert_eq!(reader.offset(), 0);

    append(&path, b"\n");
    assert_eq!(next_text(&mut reader, &cancel).await, "no newline yet");
}

// =============================================================================
// Source conditions
// =============================================================================

#[tokio::test]
async fn test_missing_file_then_created() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("raw.txt");

    let cancel = CancellationToken::new();
    let mut reader = TailReader::new(&path, fast_config());

    let err = reader.next_line(&cancel).await.unwrap_err();
    assert!(err.is_missing());
    assert!(matches!(err, TailError::Missing { .. }));

    append(&path, b"hello\n");
    assert_eq!(next_text(&mut reader, &cancel).await, "hello");
}

#[tokio::test]
async fn test_truncation_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("raw.txt");
    append(&path, b"line one\nline two\n");

    let cancel = CancellationToken::new();
    let mut reader = TailReader::new(&path, fast_config());
    next_text(&mut reader, &cancel).await;
    next_text(&mut reader, &cancel).await;

    std::fs::write(&path, b"new\n").unwrap();

    match reader.next_line(&cancel).await.unwrap_err() {
        TailError::Truncated { position, size } => {
            assert_eq!(position, 18);
            assert_eq!(size, 4);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_resume_beyond_end_is_truncation() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("raw.txt");
    append(&path, b"short\n");

    let cancel = CancellationToken::new();
    let mut reader = TailReader::resume(&path, 100, fast_config());

    assert!(matches!(
        reader.next_line(&cancel).await,
        Err(TailError::Truncated { position: 100, size: 6 })
    ));
}

#[tokio::test]
async fn test_rewind_after_truncation() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("raw.txt");
    append(&path, b"line one\nline two\n");

    let cancel = CancellationToken::new();
    let mut reader = TailReader::new(&path, fast_config());
    next_text(&mut reader, &cancel).await;
    next_text(&mut reader, &cancel).await;

    std::fs::write(&path, b"fresh\n").unwrap();
    assert!(reader.next_line(&cancel).await.is_err());

    reader.rewind();
    assert_eq!(reader.offset(), 0);
    let line = reader.next_line(&cancel).await.unwrap().unwrap();
    assert_eq!(line.text(), "fresh");
    assert_eq!(line.start(), 0);
}

#[tokio::test]
async fn test_removed_and_recreated_is_replacement() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("raw.txt");
    append(&path, b"old line one\n");

    let cancel = CancellationToken::new();
    let mut reader = TailReader::new(&path, fast_config());
    assert_eq!(next_text(&mut reader, &cancel).await, "old line one");

    std::fs::remove_file(&path).unwrap();
    assert!(reader.next_line(&cancel).await.unwrap_err().is_missing());

    append(&path, b"SDQ 34:fresh first line\nsecond\n");
    let err = reader.next_line(&cancel).await.unwrap_err();
    assert!(matches!(err, TailError::Replaced { position: 13 }), "{err}");

    // Stays reported until the caller rewinds
    assert!(matches!(
        reader.next_line(&cancel).await,
        Err(TailError::Replaced { .. })
    ));

    reader.rewind();
    let line = reader.next_line(&cancel).await.unwrap().unwrap();
    assert_eq!(line.text(), "SDQ 34:fresh first line");
    assert_eq!(line.start(), 0);
    assert_eq!(next_text(&mut reader, &cancel).await, "second");
}

#[cfg(unix)]
#[tokio::test]
async fn test_replaced_between_polls_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("raw.txt");
    append(&path, b"a\n");

    let cancel = CancellationToken::new();
    let mut reader = TailReader::new(&path, fast_config());
    assert_eq!(next_text(&mut reader, &cancel).await, "a");

    // Removed and recreated without a poll in between; the old handle is
    // still open, so the new file gets a different inode
    std::fs::remove_file(&path).unwrap();
    std::fs::write(&path, b"new first\nnew second\n").unwrap();

    let result = timeout(Duration::from_secs(5), reader.next_line(&cancel))
        .await
        .expect("replacement must be reported, not waited on");
    assert!(matches!(result, Err(TailError::Replaced { position: 2 })));

    reader.rewind();
    assert_eq!(next_text(&mut reader, &cancel).await, "new first");
    assert_eq!(next_text(&mut reader, &cancel).await, "new second");
}

#[tokio::test]
async fn test_truncation_in_place_is_not_replacement() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("raw.txt");
    append(&path, b"line one\n");

    let cancel = CancellationToken::new();
    let mut reader = TailReader::new(&path, fast_config());
    next_text(&mut reader, &cancel).await;

    std::fs::write(&path, b"x\n").unwrap();
    assert!(matches!(
        reader.next_line(&cancel).await,
        Err(TailError::Truncated { position: 9, size: 2 })
    ));
}

// =============================================================================
// Cancellation
// =============================================================================

#[tokio::test]
async fn test_cancel_while_waiting() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("raw.txt");
    append(&path, b"partial");

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        trigger.cancel();
    });

    let config = TailConfig {
        poll_interval: Duration::from_secs(60),
        ..Default::default()
    };
    let mut reader = TailReader::new(&path, config);

    let result = timeout(Duration::from_secs(5), reader.next_line(&cancel))
        .await
        .expect("cancellation must interrupt the poll sleep");
    assert!(result.unwrap().is_none());
}

#[tokio::test]
async fn test_cancelled_reader_yields_nothing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("raw.txt");
    append(&path, b"a\nb\n");

    let cancel = CancellationToken::new();
    cancel.cancel();
    let mut reader = TailReader::new(&path, fast_config());

    assert!(reader.next_line(&cancel).await.unwrap().is_none());
    assert_eq!(reader.offset(), 0);
}
