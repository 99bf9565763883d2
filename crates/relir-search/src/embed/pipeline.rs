use super::EmbeddingProvider;
use crate::resolve::resolve_index_kind;
use anyhow::{Context, Result, bail};
use relir_core::{DocumentRecord, DocumentRow, IndexKind, IndexStore, SqliteStore};
use tracing::info;

/// Records embedded per provider call.
pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Embeds text records and stores the vectors in a dense table.
pub struct EmbeddingPipeline<'a, P: EmbeddingProvider + ?Sized> {
    provider: &'a P,
    batch_size: usize,
}

impl<'a, P: EmbeddingProvider + ?Sized> EmbeddingPipeline<'a, P> {
    pub const fn new(provider: &'a P) -> Self {
        Self {
            provider,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    #[must_use]
    pub const fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = if batch_size == 0 { 1 } else { batch_size };
        self
    }

    /// Embed the `contents` of every record into dense table `table`.
    ///
    /// The table must already exist with the provider's dimensionality.
    /// Each batch is committed on its own, so a failure part-way leaves the
    /// earlier batches stored.
    ///
    /// Returns the number of rows written.
    ///
    /// # Errors
    ///
    /// Returns an error if the table is not a dense table of the right
    /// dimension, a record has no `contents`, or embedding or insertion
    /// fails.
    pub fn embed_into(
        &self,
        store: &mut SqliteStore,
        table: &str,
        records: &[DocumentRecord],
    ) -> Result<usize> {
        let descriptor = resolve_index_kind(store, table)?;
        if descriptor.kind != IndexKind::Dense {
            bail!("table '{table}' is {}, embeddings need a dense table", descriptor.kind);
        }
        let expected = self.provider.dimension();
        if let Some(stored) = store.embedding_dimension(table)?
            && stored != expected
        {
            bail!(
                "table '{table}' stores {stored}-dimensional vectors but the provider produces {expected}"
            );
        }

        let mut written = 0;
        for batch in records.chunks(self.batch_size) {
            let texts = batch
                .iter()
                .map(|record| {
                    record
                        .contents
                        .as_deref()
                        .with_context(|| format!("record '{}' has no contents", record.id))
                })
                .collect::<Result<Vec<&str>>>()?;

            let vectors = self
                .provider
                .embed_batch(&texts)
                .context("batch embedding failed")?;
            if vectors.len() != batch.len() {
                bail!(
                    "embedding batch length mismatch: expected {}, got {}",
                    batch.len(),
                    vectors.len()
                );
            }

            let rows: Vec<DocumentRow> = batch
                .iter()
                .zip(vectors)
                .map(|(record, vector)| DocumentRow::embedding(record.id.clone(), vector))
                .collect();
            written += store
                .insert_rows(table, &rows)
                .with_context(|| format!("failed to store embeddings in '{table}'"))?;
        }

        info!(table, written, "embeddings stored");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relir_core::RetrievalError;
    use rusqlite::Connection;
    use std::cell::Cell;

    /// Embeds text as `[len, vowels]` and counts batch calls.
    struct CountingEmbedder {
        batches: Cell<usize>,
    }

    impl EmbeddingProvider for CountingEmbedder {
        fn dimension(&self) -> usize {
            2
        }

        fn embed(&self, text: &str) -> relir_core::Result<Vec<f32>> {
            let len = f32::from(u16::try_from(text.len()).unwrap_or(u16::MAX));
            let vowels = text.chars().filter(|c| "aeiou".contains(*c)).count();
            Ok(vec![len, f32::from(u16::try_from(vowels).unwrap_or(u16::MAX))])
        }

        fn embed_batch(&self, texts: &[&str]) -> relir_core::Result<Vec<Vec<f32>>> {
            self.batches.set(self.batches.get() + 1);
            texts.iter().map(|text| self.embed(text)).collect()
        }
    }

    fn record(id: &str, contents: Option<&str>) -> DocumentRecord {
        DocumentRecord {
            id: id.to_string(),
            contents: contents.map(str::to_string),
            vector: None,
        }
    }

    fn store_with_dense(dim: usize) -> SqliteStore {
        let store = SqliteStore::new(Connection::open_in_memory().expect("open"), None);
        store
            .create_table("vectors", IndexKind::Dense, dim)
            .expect("create");
        store
    }

    #[test]
    fn embeds_in_batches_and_stores_every_record() {
        let mut store = store_with_dense(2);
        let embedder = CountingEmbedder {
            batches: Cell::new(0),
        };
        let records: Vec<_> = (0..5)
            .map(|i| record(&format!("d{i}"), Some("some text")))
            .collect();

        let written = EmbeddingPipeline::new(&embedder)
            .with_batch_size(2)
            .embed_into(&mut store, "vectors", &records)
            .expect("embed");

        assert_eq!(written, 5);
        assert_eq!(embedder.batches.get(), 3);
        assert_eq!(store.row_count("vectors").expect("count"), 5);
    }

    #[test]
    fn dimension_disagreement_is_rejected_up_front() {
        let mut store = store_with_dense(3);
        let embedder = CountingEmbedder {
            batches: Cell::new(0),
        };
        let err = EmbeddingPipeline::new(&embedder)
            .embed_into(&mut store, "vectors", &[record("d1", Some("x"))])
            .expect_err("dimension mismatch");
        assert!(err.to_string().contains("3-dimensional"));
        assert_eq!(embedder.batches.get(), 0);
    }

    #[test]
    fn sparse_target_is_rejected() {
        let mut store = SqliteStore::new(Connection::open_in_memory().expect("open"), None);
        store
            .create_table("corpus", IndexKind::Sparse, 0)
            .expect("create");
        let embedder = CountingEmbedder {
            batches: Cell::new(0),
        };
        let err = EmbeddingPipeline::new(&embedder)
            .embed_into(&mut store, "corpus", &[record("d1", Some("x"))])
            .expect_err("sparse target");
        assert!(err.to_string().contains("dense"));
    }

    #[test]
    fn missing_contents_is_reported() {
        let mut store = store_with_dense(2);
        let embedder = CountingEmbedder {
            batches: Cell::new(0),
        };
        let err = EmbeddingPipeline::new(&embedder)
            .embed_into(&mut store, "vectors", &[record("empty", None)])
            .expect_err("no contents");
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn unknown_table_surfaces_retrieval_error() {
        let mut store = store_with_dense(2);
        let embedder = CountingEmbedder {
            batches: Cell::new(0),
        };
        let err = EmbeddingPipeline::new(&embedder)
            .embed_into(&mut store, "ghost", &[])
            .expect_err("unknown");
        assert!(matches!(
            err.downcast_ref::<RetrievalError>(),
            Some(RetrievalError::UnknownIndexType { .. })
        ));
    }
}
