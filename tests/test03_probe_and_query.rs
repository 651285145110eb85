mod common;

use common::{Event, RecordingDriver, test_credentials, vocab_rows};
use sql_access::prelude::*;
use sql_access::probe_statement;

const VOCAB: &str = "SELECT id, word FROM vocabulary;";

fn access(driver: &RecordingDriver) -> SqlQuery {
    SqlQuery::with_credentials(driver.clone(), test_credentials())
}

/// Script `sql` and its probe with the same columns; the probe returns no rows.
fn script_query(driver: &RecordingDriver, sql: &str, columns: &[&str], rows: Vec<Vec<RowValues>>) {
    driver.script_rows(&probe_statement(sql), columns, Vec::new());
    driver.script_rows(sql, columns, rows);
}

#[test]
fn query_all_probes_then_reads() -> Result<(), SqlAccessError> {
    let driver = RecordingDriver::new();
    script_query(&driver, VOCAB, &["id", "word"], vocab_rows());

    let (rows, schema) = access(&driver).query_all(VOCAB, &[], ProbeMode::Refresh)?;

    assert_eq!(
        driver.executed(),
        vec!["SELECT id, word FROM vocabulary LIMIT 0;".to_string(), VOCAB.to_string()]
    );
    assert_eq!(schema.position("id"), Some(0));
    assert_eq!(schema.position("word"), Some(1));
    assert_eq!(schema.len(), 2);

    assert_eq!(rows.len(), 3);
    assert_eq!(
        rows[0].get(&schema, "word").and_then(RowValues::as_text),
        Some("你好")
    );
    // Two sessions (probe + read), both released.
    assert_eq!(driver.count(&Event::Connect), 2);
    assert_eq!(driver.open_connections(), 0);
    assert_eq!(driver.count(&Event::Begin), 0);
    assert_eq!(driver.count(&Event::Commit), 0);
    Ok(())
}

#[test]
fn query_all_matches_draining_the_stream() -> Result<(), SqlAccessError> {
    let driver = RecordingDriver::new();
    script_query(&driver, VOCAB, &["id", "word"], vocab_rows());
    let access = access(&driver);

    let (rows, _) = access.query_all(VOCAB, &[], ProbeMode::Skip)?;
    let streamed = access
        .query(VOCAB, &[], ProbeMode::Skip)?
        .collect::<Result<Vec<_>, _>>()?;

    assert_eq!(rows, streamed);
    Ok(())
}

#[test]
fn skip_mode_leaves_cache_alone() -> Result<(), SqlAccessError> {
    let driver = RecordingDriver::new();
    script_query(&driver, VOCAB, &["id", "word"], vocab_rows());

    let (rows, schema) = access(&driver).query_all(VOCAB, &[], ProbeMode::Skip)?;

    assert_eq!(driver.executed(), vec![VOCAB.to_string()]);
    assert_eq!(rows.len(), 3);
    assert!(schema.is_empty());
    Ok(())
}

#[test]
fn drained_stream_releases_its_session() -> Result<(), SqlAccessError> {
    let driver = RecordingDriver::new();
    script_query(&driver, VOCAB, &["id", "word"], vocab_rows());

    let mut stream = access(&driver).stream_query(VOCAB, &[])?;
    assert!(stream.is_open());
    assert_eq!(stream.columns(), Some(vec!["id".to_string(), "word".to_string()]));
    assert_eq!(driver.open_connections(), 1);

    let mut count = 0;
    for row in stream.by_ref() {
        row?;
        count += 1;
    }
    assert_eq!(count, 3);
    assert!(!stream.is_open());
    assert_eq!(driver.open_connections(), 0);
    assert!(stream.next().is_none());
    Ok(())
}

#[test]
fn stream_pulls_one_row_per_next() -> Result<(), SqlAccessError> {
    let driver = RecordingDriver::new();
    script_query(&driver, VOCAB, &["id", "word"], vocab_rows());

    let mut stream = access(&driver).stream_query(VOCAB, &[])?;
    assert_eq!(driver.fetches(), 0);

    assert!(stream.next().transpose()?.is_some());
    assert_eq!(driver.fetches(), 1);
    assert!(stream.next().transpose()?.is_some());
    assert_eq!(driver.fetches(), 2);

    drop(stream);
    assert_eq!(driver.fetches(), 2);
    assert_eq!(driver.open_connections(), 0);
    Ok(())
}

#[test]
fn abandoned_stream_releases_on_drop() -> Result<(), SqlAccessError> {
    let driver = RecordingDriver::new();
    script_query(&driver, VOCAB, &["id", "word"], vocab_rows());

    {
        let mut stream = access(&driver).stream_query(VOCAB, &[])?;
        let first = stream.next().transpose()?;
        assert!(first.is_some());
        assert_eq!(driver.open_connections(), 1);
    }

    assert_eq!(driver.open_connections(), 0);
    let events = driver.events();
    assert_eq!(&events[events.len() - 2..], &[Event::CloseCursor, Event::CloseConnection]);
    Ok(())
}

#[test]
fn explicit_close_releases_early() -> Result<(), SqlAccessError> {
    let driver = RecordingDriver::new();
    script_query(&driver, VOCAB, &["id", "word"], vocab_rows());

    let stream = access(&driver).stream_query(VOCAB, &[])?;
    stream.close()?;
    assert_eq!(driver.open_connections(), 0);
    assert_eq!(driver.count(&Event::CloseConnection), 1);
    Ok(())
}

#[test]
fn failed_probe_keeps_previous_schema() -> Result<(), SqlAccessError> {
    let driver = RecordingDriver::new();
    script_query(&driver, VOCAB, &["id", "word"], vocab_rows());
    let broken = "SELECT id FROM vocabulary LIMIT 5";
    driver.script_execute_failure(&probe_statement(broken), "syntax error at or near \"LIMIT\"");
    let access = access(&driver);

    access.probe_schema(VOCAB, &[])?;
    let err = access.probe_schema(broken, &[]).unwrap_err();

    assert!(err.is_probe_error());
    assert_eq!(access.schema().columns(), ["id", "word"]);
    assert_eq!(driver.open_connections(), 0);
    Ok(())
}

#[test]
fn probe_of_a_columnless_statement_fails() {
    let driver = RecordingDriver::new();
    let err = access(&driver)
        .probe_schema("DELETE FROM vocabulary", &[])
        .unwrap_err();
    assert!(err.is_probe_error());
    assert!(access(&driver).schema().is_empty());
}

#[test]
fn probe_failure_aborts_the_read() {
    let driver = RecordingDriver::new();
    driver.script_execute_failure(&probe_statement(VOCAB), "relation \"vocabulary\" does not exist");

    let err = access(&driver)
        .query(VOCAB, &[], ProbeMode::Refresh)
        .err()
        .unwrap();

    assert!(err.is_probe_error());
    assert_eq!(driver.executed().len(), 1);
    assert_eq!(driver.open_connections(), 0);
}

#[test]
fn differently_shaped_probe_replaces_schema() -> Result<(), SqlAccessError> {
    let driver = RecordingDriver::new();
    let posts = "SELECT id, title, quality FROM post";
    script_query(&driver, VOCAB, &["id", "word"], vocab_rows());
    script_query(&driver, posts, &["id", "title", "quality"], Vec::new());
    let access = access(&driver);

    access.probe_schema(VOCAB, &[])?;
    let returned = access.probe_schema(posts, &[])?;

    assert_eq!(access.schema(), returned);
    assert!(!returned.contains("word"));
    assert_eq!(returned.position("quality"), Some(2));
    Ok(())
}

#[test]
fn fetch_error_is_yielded_once_and_releases() -> Result<(), SqlAccessError> {
    let driver = RecordingDriver::new();
    driver.script_fetch_failure(VOCAB, "canceling statement due to statement timeout");

    let mut stream = access(&driver).stream_query(VOCAB, &[])?;
    let err = stream.next().and_then(Result::err);
    assert!(err.is_some_and(|err| err.is_execution_error()));
    assert!(stream.next().is_none());
    assert_eq!(driver.open_connections(), 0);
    Ok(())
}

#[test]
fn failed_execute_releases_before_returning() {
    let driver = RecordingDriver::new();
    driver.script_execute_failure(VOCAB, "permission denied for table vocabulary");

    let err = access(&driver).stream_query(VOCAB, &[]).err().unwrap();

    assert!(err.is_execution_error());
    assert_eq!(driver.count(&Event::CloseCursor), 1);
    assert_eq!(driver.open_connections(), 0);
}
