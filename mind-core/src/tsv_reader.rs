use anyhow::Result;
use mongodb::bson::{Bson, Document};
use std::fs::File;
use std::path::Path;

use crate::error_bail;
use crate::schema::{ColumnKind, RecordSchema};

/// Reads a headerless TSV file into documents, one per line.
///
/// Fields are split on tabs only. Quotes are kept as literal characters, the
/// MIND titles and abstracts contain unbalanced ones.
pub struct TsvRecordReader {
    schema: RecordSchema,
    records: csv::StringRecordsIntoIter<File>,
}

impl TsvRecordReader {
    pub fn new(filename: &Path, schema: RecordSchema) -> Result<Self> {
        if !filename.exists() {
            error_bail!("File not found: {}", filename.display());
        }

        let reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .quoting(false)
            .flexible(true)
            .from_path(filename)?;

        Ok(Self {
            schema,
            records: reader.into_records(),
        })
    }
}

impl Iterator for TsvRecordReader {
    type Item = Result<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        self.records
            .next()
            .map(|record| match record {
                Ok(record) => Ok(record_to_document(&self.schema, &record)),
                Err(e) => Err(e.into()),
            })
    }
}

/// Convert one record to a document keyed by the schema's column names.
///
/// Empty and missing fields become `null`. Extra fields are ignored.
pub fn record_to_document(schema: &RecordSchema, record: &csv::StringRecord) -> Document {
    let mut doc = Document::new();

    for (i, column) in schema.columns.iter().enumerate() {
        let value = match record.get(i) {
            None | Some("") => Bson::Null,
            Some(field) => match column.kind {
                ColumnKind::Integer => match field.parse::<i64>() {
                    Ok(v) => Bson::Int64(v),
                    Err(_) => Bson::String(field.to_string()),
                },
                ColumnKind::Text => Bson::String(field.to_string()),
            },
        };

        doc.insert(column.name, value);
    }

    doc
}
