#![forbid(unsafe_code)]
//! relir-core library.
//!
//! Shared data model, error kinds, configuration, and the SQLite-backed
//! index store that the retrieval layer in `relir-search` runs against.
//!
//! # Conventions
//!
//! - **Errors**: retrieval paths return [`error::Result`] with a
//!   [`error::RetrievalError`]; configuration and bootstrap code uses
//!   `anyhow::Result`.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod config;
pub mod db;
pub mod error;
pub mod ident;
pub mod model;
pub mod store;

pub use error::{ErrorCode, Result, RetrievalError};
pub use model::{DocumentRecord, DocumentRow, IndexDescriptor, IndexKind, RankedHit, RowContents};
pub use store::{IndexStore, SqliteStore};
