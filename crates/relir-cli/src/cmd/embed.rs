use super::{CmdContext, read_records};
use crate::output::{pretty_kv, render_mode};
use anyhow::Result;
use clap::Args;
use relir_core::IndexKind;
use relir_search::embed::DEFAULT_BATCH_SIZE;
use relir_search::{EmbeddingPipeline, EmbeddingProvider, OllamaEmbedder};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug)]
pub struct EmbedArgs {
    /// Dense table that receives the vectors.
    pub table: String,

    /// JSONL file of `{"id", "contents"}` records; `-` for stdin.
    pub input: PathBuf,

    /// (Re)create the dense table with the model's dimension first.
    #[arg(long)]
    pub create: bool,

    /// Texts sent to the embedding service per request batch.
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,
}

#[derive(Debug, Serialize)]
struct EmbedOutput {
    table: String,
    model: String,
    dim: usize,
    rows: usize,
}

/// Embed a text corpus with the configured provider into a dense table.
pub fn run_embed(args: &EmbedArgs, ctx: &CmdContext) -> Result<()> {
    let provider = OllamaEmbedder::new(&ctx.config.embedding);
    let records = read_records(&args.input)?;
    let mut store = ctx.open_store()?;

    if args.create {
        store.create_table(&args.table, IndexKind::Dense, provider.dimension())?;
    }

    info!(
        table = %args.table,
        model = provider.model(),
        records = records.len(),
        "embedding corpus"
    );
    let written = EmbeddingPipeline::new(&provider)
        .with_batch_size(args.batch_size)
        .embed_into(&mut store, &args.table, &records)?;

    let out = EmbedOutput {
        table: args.table.clone(),
        model: provider.model().to_string(),
        dim: provider.dimension(),
        rows: written,
    };
    render_mode(
        ctx.output,
        &out,
        |o, w| writeln!(w, "{}\t{}\t{}", o.table, o.model, o.rows),
        |o, w| {
            pretty_kv(w, "table", &o.table)?;
            pretty_kv(w, "model", &o.model)?;
            pretty_kv(w, "dim", o.dim.to_string())?;
            pretty_kv(w, "embedded", o.rows.to_string())
        },
    )
}
