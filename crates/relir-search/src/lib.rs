#![forbid(unsafe_code)]
//! relir-search library.
//!
//! Single-source sparse and dense retrieval plus weighted reciprocal rank
//! fusion, all running against an [`relir_core::IndexStore`].
//!
//! # Conventions
//!
//! - **Errors**: retrieval returns [`relir_core::Result`]; the ingestion
//!   pipeline uses `anyhow::Result`.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod dense;
pub mod embed;
pub mod fusion;
pub mod resolve;
pub mod sparse;

pub use dense::{dense_rank, dense_search};
pub use embed::{EmbeddingPipeline, EmbeddingProvider, OllamaEmbedder};
pub use fusion::{FusionParams, FusionResult, RankedId, fuse, fuse_from_ranks, fuse_text};
pub use resolve::{resolve_fusion_tables, resolve_index_kind};
pub use sparse::{normalize_query, sparse_rank, sparse_search};
