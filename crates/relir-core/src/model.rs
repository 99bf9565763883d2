//! Core data model shared by the index store and the retrieval layer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Default embedding dimensionality for dense tables.
pub const DEFAULT_EMBEDDING_DIM: usize = 768;

/// Column whose presence marks a table as a sparse (tokenized text) index.
pub const SPARSE_MARKER_COLUMN: &str = "contents";

/// Column whose presence marks a table as a dense (vector) index.
pub const DENSE_MARKER_COLUMN: &str = "embedding";

/// Retrieval kind of a stored table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    /// Tokenized text ranked by BM25.
    Sparse,
    /// Fixed-dimension embeddings ranked by vector similarity.
    Dense,
}

impl IndexKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sparse => "sparse",
            Self::Dense => "dense",
        }
    }

    /// Classify a table from its (lower-cased) column names.
    ///
    /// `contents` means sparse and takes precedence; otherwise `embedding`
    /// means dense. Any other layout has no kind.
    #[must_use]
    pub fn from_columns(columns: &BTreeSet<String>) -> Option<Self> {
        if columns.contains(SPARSE_MARKER_COLUMN) {
            Some(Self::Sparse)
        } else if columns.contains(DENSE_MARKER_COLUMN) {
            Some(Self::Dense)
        } else {
            None
        }
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndexKind {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "sparse" => Ok(Self::Sparse),
            "dense" => Ok(Self::Dense),
            other => Err(format!("unknown index kind '{other}' (expected sparse or dense)")),
        }
    }
}

/// A table name paired with the retrieval kind its schema implies.
///
/// Derived on demand from schema introspection and never cached, so it
/// always reflects the current schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexDescriptor {
    pub table_name: String,
    pub kind: IndexKind,
}

/// One `(id, score)` pair produced by a single-source search.
///
/// Sources return hits in non-increasing score order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedHit {
    pub id: String,
    pub score: f64,
}

/// Stored payload of a document row.
#[derive(Debug, Clone, PartialEq)]
pub enum RowContents {
    Text(String),
    Embedding(Vec<f32>),
}

impl RowContents {
    #[must_use]
    pub const fn kind(&self) -> IndexKind {
        match self {
            Self::Text(_) => IndexKind::Sparse,
            Self::Embedding(_) => IndexKind::Dense,
        }
    }
}

/// A row destined for a sparse or dense table. `id` is unique per table.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRow {
    pub id: String,
    pub contents: RowContents,
}

impl DocumentRow {
    pub fn text(id: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            contents: RowContents::Text(contents.into()),
        }
    }

    pub fn embedding(id: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            contents: RowContents::Embedding(embedding),
        }
    }
}

/// Interchange record as it appears in a JSONL corpus file.
///
/// Text corpora carry `contents`; pre-encoded corpora carry `vector`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contents: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,
}

impl DocumentRecord {
    /// Convert into a row for a table of the given kind.
    ///
    /// Returns `None` when the record lacks the field that kind needs.
    #[must_use]
    pub fn into_row(self, kind: IndexKind) -> Option<DocumentRow> {
        match kind {
            IndexKind::Sparse => self.contents.map(|text| DocumentRow::text(self.id, text)),
            IndexKind::Dense => self
                .vector
                .map(|vector| DocumentRow::embedding(self.id, vector)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_kind_parses_case_insensitively() {
        assert_eq!("Sparse".parse::<IndexKind>(), Ok(IndexKind::Sparse));
        assert_eq!(" dense ".parse::<IndexKind>(), Ok(IndexKind::Dense));
        assert!("hybrid".parse::<IndexKind>().is_err());
    }

    fn column_set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|name| (*name).to_string()).collect()
    }

    #[test]
    fn index_kind_from_marker_columns() {
        assert_eq!(
            IndexKind::from_columns(&column_set(&["id", "contents"])),
            Some(IndexKind::Sparse)
        );
        assert_eq!(
            IndexKind::from_columns(&column_set(&["id", "embedding"])),
            Some(IndexKind::Dense)
        );
        assert_eq!(
            IndexKind::from_columns(&column_set(&["id", "embedding", "contents"])),
            Some(IndexKind::Sparse)
        );
        assert_eq!(IndexKind::from_columns(&column_set(&["id", "body"])), None);
        assert_eq!(IndexKind::from_columns(&BTreeSet::new()), None);
    }

    #[test]
    fn index_kind_display_matches_serde() {
        let json = serde_json::to_string(&IndexKind::Dense).expect("serialize");
        assert_eq!(json, "\"dense\"");
        assert_eq!(IndexKind::Dense.to_string(), "dense");
    }

    #[test]
    fn record_with_contents_becomes_text_row() {
        let record: DocumentRecord =
            serde_json::from_str(r#"{"id": "d1", "contents": "hello world"}"#).expect("parse");
        let row = record.into_row(IndexKind::Sparse).expect("sparse row");
        assert_eq!(row, DocumentRow::text("d1", "hello world"));
        assert_eq!(row.contents.kind(), IndexKind::Sparse);
    }

    #[test]
    fn record_with_vector_becomes_embedding_row() {
        let record: DocumentRecord =
            serde_json::from_str(r#"{"id": "d2", "vector": [0.5, -0.25]}"#).expect("parse");
        let row = record.into_row(IndexKind::Dense).expect("dense row");
        assert_eq!(row, DocumentRow::embedding("d2", vec![0.5, -0.25]));
    }

    #[test]
    fn record_missing_field_for_kind_is_rejected() {
        let record = DocumentRecord {
            id: "d3".into(),
            contents: Some("text only".into()),
            vector: None,
        };
        assert!(record.into_row(IndexKind::Dense).is_none());
    }
}
