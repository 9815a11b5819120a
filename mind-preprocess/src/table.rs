use anyhow::Result;
use datafusion::arrow::array::{ArrayRef, StringArray};
use datafusion::arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use datafusion::arrow::record_batch::RecordBatch;
use datafusion::datasource::MemTable;
use datafusion::prelude::{DataFrame, SessionContext};
use log::info;
use mongodb::bson::{Bson, Document};
use std::sync::Arc;

use mind_core::db::db::DocumentStore;
use mind_core::schema::RecordSchema;

/// Rows per `RecordBatch` when building a table from documents.
pub const ROWS_PER_BATCH: usize = 8192;

/// Arrow schema with one nullable `Utf8` column per raw column.
///
/// Raw fields are read as text whatever type they were stored with, casts happen
/// in the query.
pub fn raw_arrow_schema(schema: &RecordSchema) -> SchemaRef {
    let fields = schema
        .columns
        .iter()
        .map(|c| Field::new(c.name, DataType::Utf8, true))
        .collect::<Vec<_>>();

    Arc::new(Schema::new(fields))
}

/// Text value of a raw field. `null`, missing and `NaN` fields are `None`.
pub fn bson_to_text(value: Option<&Bson>) -> Option<String> {
    match value? {
        Bson::Null | Bson::Undefined => None,
        Bson::String(s) => Some(s.clone()),
        Bson::Int32(v) => Some(v.to_string()),
        Bson::Int64(v) => Some(v.to_string()),
        Bson::Double(v) if v.is_nan() => None,
        Bson::Double(v) => Some(v.to_string()),
        other => Some(other.to_string()),
    }
}

/// Convert documents to record batches of `schema`, missing fields become null.
pub fn documents_to_batches(
    docs: &[Document],
    schema: &RecordSchema,
) -> Result<Vec<RecordBatch>> {
    let arrow_schema = raw_arrow_schema(schema);

    if docs.is_empty() {
        return Ok(vec![RecordBatch::new_empty(arrow_schema)]);
    }

    docs.chunks(ROWS_PER_BATCH)
        .map(|chunk| {
            let columns = schema
                .columns
                .iter()
                .map(|c| {
                    let values = chunk
                        .iter()
                        .map(|doc| bson_to_text(doc.get(c.name)))
                        .collect::<Vec<Option<String>>>();

                    Arc::new(StringArray::from(values)) as ArrayRef
                })
                .collect::<Vec<_>>();

            RecordBatch::try_new(arrow_schema.clone(), columns).map_err(|e| e.into())
        })
        .collect()
}

/// Read a whole raw collection into a `DataFrame` of `ctx`.
pub async fn fetch_data_from_store<S: DocumentStore + ?Sized>(
    ctx: &SessionContext,
    store: &S,
    collection_name: &str,
    schema: &RecordSchema,
) -> Result<DataFrame> {
    let docs = store.find_all(collection_name).await?;

    info!(
        "fetched {} documents from collection '{}'",
        docs.len(),
        collection_name
    );

    let batches = documents_to_batches(&docs, schema)?;
    let table = MemTable::try_new(raw_arrow_schema(schema), vec![batches])?;

    Ok(ctx.read_table(Arc::new(table))?)
}
