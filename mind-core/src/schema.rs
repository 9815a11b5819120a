//! Raw record layouts of the MIND dataset and the collections they are loaded into.
//!
//! Both `behaviors.tsv` and `news.tsv` come without a header line, so the column
//! names are fixed here.
use strum::{Display, EnumIter, EnumString};

pub const BEHAVIORS_TRAIN_COLLECTION: &str = "behaviors_train";
pub const BEHAVIORS_VALID_COLLECTION: &str = "behaviors_valid";
pub const NEWS_TRAIN_COLLECTION: &str = "news_train";
pub const NEWS_VALID_COLLECTION: &str = "news_valid";

pub const BEHAVIORS_FILENAME: &str = "behaviors.tsv";
pub const NEWS_FILENAME: &str = "news.tsv";

/// Type of a raw column when stored as a document field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    /// Stored as `i64` when the field parses, as a string otherwise.
    Integer,

    Text,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
}

impl Column {
    const fn text(name: &'static str) -> Self {
        Self {
            name,
            kind: ColumnKind::Text,
        }
    }

    const fn integer(name: &'static str) -> Self {
        Self {
            name,
            kind: ColumnKind::Integer,
        }
    }
}

/// Fixed column list of one TSV record type.
#[derive(Clone, Copy, Debug)]
pub struct RecordSchema {
    pub name: &'static str,
    pub columns: &'static [Column],
}

impl RecordSchema {
    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }
}

/// One row per impression event. `impressions` is a space separated list of
/// `newsId-label` tokens.
pub const BEHAVIORS_SCHEMA: RecordSchema = RecordSchema {
    name: "behaviors",
    columns: &[
        Column::integer("impression_id"),
        Column::text("user_id"),
        Column::text("time"),
        Column::text("history"),
        Column::text("impressions"),
    ],
};

/// One row per news article.
pub const NEWS_SCHEMA: RecordSchema = RecordSchema {
    name: "news",
    columns: &[
        Column::text("news_id"),
        Column::text("category"),
        Column::text("subcategory"),
        Column::text("title"),
        Column::text("abstract"),
        Column::text("url"),
        Column::text("title_entities"),
        Column::text("text_entities"),
    ],
};

/// Dataset split.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumString, EnumIter, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Split {
    Train,
    Valid,
}

impl Split {
    /// Local directory the split archive is extracted into.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Valid => "valid",
        }
    }

    pub fn behaviors_collection(&self) -> &'static str {
        match self {
            Split::Train => BEHAVIORS_TRAIN_COLLECTION,
            Split::Valid => BEHAVIORS_VALID_COLLECTION,
        }
    }

    pub fn news_collection(&self) -> &'static str {
        match self {
            Split::Train => NEWS_TRAIN_COLLECTION,
            Split::Valid => NEWS_VALID_COLLECTION,
        }
    }
}
