use anyhow::Result;
use log::info;
use mongodb::bson::Document;
use std::path::{Path, PathBuf};

use mind_core::config::{LoadThreshold, MindConfig, MindSize};
use mind_core::db::db::{DocumentStore, WriteAck};
use mind_core::schema::{
    RecordSchema, Split, BEHAVIORS_FILENAME, BEHAVIORS_SCHEMA, NEWS_FILENAME, NEWS_SCHEMA,
};
use mind_core::tsv_reader::TsvRecordReader;

use crate::download::{download_mind, unzip_file};

/// Load a TSV file into `collection_name` unless the collection already has data.
///
/// The whole file is parsed before anything is written. The collection is cleared
/// right before the bulk insert. An empty file writes nothing.
pub async fn load_tsv_to_store<S: DocumentStore + ?Sized>(
    store: &S,
    collection_name: &str,
    tsv_file: &Path,
    schema: RecordSchema,
) -> Result<usize> {
    if store.estimated_count(collection_name).await? > 0 {
        info!(
            "Collection '{}' already contains data. Skipping load.",
            collection_name
        );
        return Ok(0);
    }

    info!(
        "Reading {} for collection {}...",
        tsv_file.display(),
        collection_name
    );

    let records = TsvRecordReader::new(tsv_file, schema)?.collect::<Result<Vec<Document>>>()?;

    if records.is_empty() {
        info!(
            "No records found in {} for {}.",
            tsv_file.display(),
            collection_name
        );
        return Ok(0);
    }

    store.clear(collection_name).await?;
    let inserted = store
        .insert_many(collection_name, records, WriteAck::Default)
        .await?;

    info!(
        "Inserted {} records into '{}' collection.",
        inserted, collection_name
    );

    Ok(inserted)
}

/// Whether both raw collections of `split` are above their thresholds.
pub async fn is_split_loaded<S: DocumentStore + ?Sized>(
    store: &S,
    split: Split,
    threshold: &LoadThreshold,
) -> Result<bool> {
    let behaviors = store.estimated_count(split.behaviors_collection()).await?;
    let news = store.estimated_count(split.news_collection()).await?;

    Ok(behaviors > threshold.behaviors && news > threshold.news)
}

/// Marker file of an extracted split.
#[inline]
pub fn split_marker(data_path: &Path, split: Split) -> PathBuf {
    data_path.join(split.dir_name()).join(BEHAVIORS_FILENAME)
}

/// Make sure the raw collections of `split` contain data.
pub async fn ensure_split<S: DocumentStore + ?Sized>(
    store: &S,
    data_path: &Path,
    size: MindSize,
    split: Split,
    threshold: &LoadThreshold,
) -> Result<()> {
    if is_split_loaded(store, split, threshold).await? {
        info!(
            "{} data already exists in MongoDB. Skipping download and loading for {} data.",
            split, split
        );
        return Ok(());
    }

    let split_dir = data_path.join(split.dir_name());

    if split_marker(data_path, split).exists() {
        info!(
            "{} data already downloaded and extracted. Loading into MongoDB...",
            split
        );
    } else {
        info!("Downloading and extracting MIND {} dataset...", split);

        let zip_path = download_mind(size, split, data_path).await?;

        let (zip_clone, dir_clone) = (zip_path.clone(), split_dir.clone());
        tokio::task::spawn_blocking(move || unzip_file(&zip_clone, &dir_clone)).await??;
    }

    load_tsv_to_store(
        store,
        split.behaviors_collection(),
        &split_dir.join(BEHAVIORS_FILENAME),
        BEHAVIORS_SCHEMA,
    )
    .await?;

    load_tsv_to_store(
        store,
        split.news_collection(),
        &split_dir.join(NEWS_FILENAME),
        NEWS_SCHEMA,
    )
    .await?;

    Ok(())
}

/// Populate the raw collections of both splits.
pub async fn fetch_mind<S: DocumentStore + ?Sized>(
    store: &S,
    config: &MindConfig,
    data_path: &Path,
) -> Result<()> {
    let size = config.dataset.size;

    info!(
        "fetching MIND {} dataset, data path: {}",
        size,
        data_path.display()
    );

    ensure_split(store, data_path, size, Split::Train, &config.thresholds.train).await?;
    ensure_split(store, data_path, size, Split::Valid, &config.thresholds.valid).await?;

    Ok(())
}
