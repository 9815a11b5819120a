use anyhow::Result;
use log::info;
use mongodb::bson::{doc, Bson, Document};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use mind_core::db::db::{DocumentStore, WriteAck};
use mind_core::db::memory::MemoryStore;
use mind_core::db::readiness::{wait_for_data, ReadinessError};
use mind_core::schema::{BEHAVIORS_SCHEMA, NEWS_SCHEMA};
use mind_core::tool::setup_log;
use mind_core::tsv_reader::TsvRecordReader;

#[test]
fn test_tsv_reader_behaviors() -> Result<()> {
    setup_log();

    let reader = TsvRecordReader::new(Path::new("resources/behaviors.tsv"), BEHAVIORS_SCHEMA)?;
    let docs = reader.collect::<Result<Vec<Document>>>()?;

    assert_eq!(docs.len(), 3);

    assert_eq!(docs[0].get_i64("impression_id")?, 1);
    assert_eq!(docs[0].get_str("user_id")?, "U13740");
    assert_eq!(docs[0].get_str("impressions")?, "N55689-1 N35729-0");

    // Empty history.
    assert_eq!(docs[1].get("history"), Some(&Bson::Null));

    // Quotes are literal.
    assert_eq!(docs[2].get_str("history")?, "N10732 \"N25792");
    assert!(docs[2].get_str("impressions")?.ends_with("N23814-1"));

    Ok(())
}

#[test]
fn test_tsv_reader_news() -> Result<()> {
    setup_log();

    let reader = TsvRecordReader::new(Path::new("resources/news.tsv"), NEWS_SCHEMA)?;
    let docs = reader.collect::<Result<Vec<Document>>>()?;

    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0].get_str("news_id")?, "N55528");
    assert_eq!(docs[1].get_str("title")?, "\"50 Worst Habits For Belly Fat");
    assert_eq!(docs[1].get_str("text_entities")?, "[]");

    Ok(())
}

#[test]
fn test_tsv_reader_missing_file() {
    setup_log();

    let reader = TsvRecordReader::new(Path::new("resources/not_exists.tsv"), NEWS_SCHEMA);
    assert!(reader.is_err());
}

#[tokio::test]
async fn test_wait_for_data_found() -> Result<()> {
    setup_log();

    let store = MemoryStore::new();
    store
        .insert_many("a", vec![doc! { "impression_id": 1 }], WriteAck::Default)
        .await?;
    store
        .insert_many("b", vec![doc! { "impression_id": 2 }], WriteAck::Default)
        .await?;

    let ok = wait_for_data(
        &store,
        &["a".to_string(), "b".to_string()],
        "impression_id",
        Duration::from_secs(5),
        Duration::from_millis(10),
    )
    .await?;

    assert!(ok);

    Ok(())
}

#[tokio::test]
async fn test_wait_for_data_zero_timeout() -> Result<()> {
    setup_log();

    let store = MemoryStore::new();

    let res = wait_for_data(
        &store,
        &["behaviors_train".to_string()],
        "impression_id",
        Duration::ZERO,
        Duration::from_millis(10),
    )
    .await;

    let err = res.expect_err("empty collection must time out");
    info!("error: {}", err);

    match err.downcast_ref::<ReadinessError>() {
        Some(ReadinessError::Timeout { collection, timeout }) => {
            assert_eq!(collection, "behaviors_train");
            assert_eq!(*timeout, Duration::ZERO);
        }
        None => panic!("unexpected error: {}", err),
    }

    assert!(err.to_string().contains("'behaviors_train'"));

    Ok(())
}

#[tokio::test]
async fn test_wait_for_data_stops_at_first_timeout() -> Result<()> {
    setup_log();

    let store = MemoryStore::new();
    store
        .insert_many("c", vec![doc! { "impression_id": 1 }], WriteAck::Default)
        .await?;

    // `b` has documents but not the check field.
    store
        .insert_many("b", vec![doc! { "other": 1 }], WriteAck::Default)
        .await?;

    let res = wait_for_data(
        &store,
        &["b".to_string(), "missing".to_string(), "c".to_string()],
        "impression_id",
        Duration::from_millis(30),
        Duration::from_millis(10),
    )
    .await;

    let err = res.expect_err("collection b must time out");
    match err.downcast_ref::<ReadinessError>() {
        Some(ReadinessError::Timeout { collection, .. }) => assert_eq!(collection, "b"),
        None => panic!("unexpected error: {}", err),
    }

    Ok(())
}

#[tokio::test]
async fn test_wait_for_data_seeded_later() -> Result<()> {
    setup_log();

    let store = Arc::new(MemoryStore::new());

    let writer = store.clone();
    let handle = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        writer
            .insert_many(
                "behaviors_valid",
                vec![doc! { "impression_id": 1 }],
                WriteAck::Default,
            )
            .await
    });

    let ok = wait_for_data(
        store.as_ref(),
        &["behaviors_valid".to_string()],
        "impression_id",
        Duration::from_secs(10),
        Duration::from_millis(10),
    )
    .await?;

    assert!(ok);
    assert_eq!(handle.await??, 1);

    Ok(())
}
