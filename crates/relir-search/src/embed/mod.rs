//! Text embedding for dense retrieval.
//!
//! [`EmbeddingProvider`] is the seam: fusion and ingestion only need text in,
//! fixed-length vectors out. [`OllamaEmbedder`] talks to a local Ollama
//! server; [`EmbeddingPipeline`] batches corpus records into a dense table.

mod ollama;
mod pipeline;

pub use ollama::OllamaEmbedder;
pub use pipeline::{DEFAULT_BATCH_SIZE, EmbeddingPipeline};

use relir_core::Result;

/// Produces fixed-dimension embeddings for text.
pub trait EmbeddingProvider {
    /// Length of every vector this provider returns.
    fn dimension(&self) -> usize;

    /// Embed one text.
    ///
    /// # Errors
    ///
    /// Returns [`relir_core::RetrievalError::Embedding`] when the provider
    /// cannot produce a vector of [`Self::dimension`] floats.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts, preserving order.
    ///
    /// # Errors
    ///
    /// Fails on the first text that cannot be embedded.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|text| self.embed(text)).collect()
    }
}
