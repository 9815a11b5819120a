use anyhow::{anyhow, Result};
use datafusion::arrow::array::{Array, Int32Array};
use datafusion::arrow::record_batch::RecordBatch;
use datafusion::prelude::DataFrame;
use futures::StreamExt;
use log::info;
use mongodb::bson::{self, Document};
use serde::{Deserialize, Serialize};

use mind_core::db::db::{DocumentStore, WriteAck};
use mind_core::error_bail;

/// One (user, candidate news) interaction.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize,
)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    pub user_id: i32,
    pub news_id: i32,
    pub clicked: i32,
}

impl Sample {
    pub fn to_document(&self) -> Result<Document> {
        bson::to_document(self).map_err(|e| e.into())
    }
}

fn int32_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Int32Array> {
    batch
        .column_by_name(name)
        .ok_or_else(|| anyhow!("missing column: {}", name))?
        .as_any()
        .downcast_ref::<Int32Array>()
        .ok_or_else(|| anyhow!("column {} is not Int32", name))
}

/// Read the samples of one batch.
///
/// Sample tables carry no nulls, a null in any column is an error.
pub fn samples_from_batch(batch: &RecordBatch) -> Result<Vec<Sample>> {
    let columns = [
        ("userId", int32_column(batch, "userId")?),
        ("newsId", int32_column(batch, "newsId")?),
        ("clicked", int32_column(batch, "clicked")?),
    ];

    for (name, column) in &columns {
        if column.null_count() > 0 {
            error_bail!(
                "column {} has {} null values in a sample batch",
                name,
                column.null_count()
            );
        }
    }

    let [(_, user_ids), (_, news_ids), (_, clicked)] = columns;

    Ok((0..batch.num_rows())
        .map(|i| Sample {
            user_id: user_ids.value(i),
            news_id: news_ids.value(i),
            clicked: clicked.value(i),
        })
        .collect())
}

/// Materialize a sample table.
pub async fn collect_samples(df: DataFrame) -> Result<Vec<Sample>> {
    let mut samples = Vec::new();

    for batch in df.collect().await? {
        samples.extend(samples_from_batch(&batch)?);
    }

    Ok(samples)
}

/// Append a sample table to `collection_name`.
///
/// Documents are inserted in chunks of `batch_size` with majority acknowledgment.
/// Existing documents are never replaced or removed. A failed insert aborts the
/// write, chunks already inserted stay.
pub async fn write_to_store<S: DocumentStore + ?Sized>(
    df: DataFrame,
    store: &S,
    collection_name: &str,
    batch_size: usize,
) -> Result<()> {
    let batch_size = batch_size.max(1);

    let mut stream = df.execute_stream().await?;
    let mut pending: Vec<Document> = Vec::with_capacity(batch_size);
    let mut total = 0;

    while let Some(batch) = stream.next().await {
        for sample in samples_from_batch(&batch?)? {
            pending.push(sample.to_document()?);

            if pending.len() >= batch_size {
                let docs = std::mem::replace(&mut pending, Vec::with_capacity(batch_size));
                total += store
                    .insert_many(collection_name, docs, WriteAck::Majority)
                    .await?;
            }
        }
    }

    if !pending.is_empty() {
        total += store
            .insert_many(collection_name, pending, WriteAck::Majority)
            .await?;
    }

    info!(
        "appended {} documents to collection '{}'",
        total, collection_name
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use datafusion::arrow::array::ArrayRef;
    use datafusion::arrow::datatypes::{DataType, Field, Schema};
    use std::sync::Arc;

    fn sample_batch(user_ids: Vec<Option<i32>>) -> Result<RecordBatch> {
        let schema = Arc::new(Schema::new(vec![
            Field::new("userId", DataType::Int32, true),
            Field::new("newsId", DataType::Int32, true),
            Field::new("clicked", DataType::Int32, true),
        ]));

        let n = user_ids.len() as i32;
        let columns: Vec<ArrayRef> = vec![
            Arc::new(Int32Array::from(user_ids)),
            Arc::new(Int32Array::from((0..n).collect::<Vec<i32>>())),
            Arc::new(Int32Array::from(vec![0; n as usize])),
        ];

        Ok(RecordBatch::try_new(schema, columns)?)
    }

    #[test]
    fn test_samples_from_batch() -> Result<()> {
        let batch = sample_batch(vec![Some(1), Some(2)])?;

        assert_eq!(
            samples_from_batch(&batch)?,
            vec![
                Sample {
                    user_id: 1,
                    news_id: 0,
                    clicked: 0
                },
                Sample {
                    user_id: 2,
                    news_id: 1,
                    clicked: 0
                },
            ]
        );

        Ok(())
    }

    #[test]
    fn test_samples_from_batch_rejects_null() -> Result<()> {
        let batch = sample_batch(vec![Some(1), None])?;

        let err = samples_from_batch(&batch).unwrap_err();
        assert!(err.to_string().contains("userId"));

        Ok(())
    }

    #[test]
    fn test_sample_to_document() -> Result<()> {
        let sample = Sample {
            user_id: 1,
            news_id: 11,
            clicked: 1,
        };

        let doc = sample.to_document()?;

        assert_eq!(doc.get_i32("userId")?, 1);
        assert_eq!(doc.get_i32("newsId")?, 11);
        assert_eq!(doc.get_i32("clicked")?, 1);
        assert_eq!(doc.len(), 3);

        Ok(())
    }
}
