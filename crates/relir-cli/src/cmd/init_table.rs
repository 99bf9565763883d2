use super::CmdContext;
use crate::output::{pretty_kv, render_mode};
use anyhow::Result;
use clap::Args;
use relir_core::IndexKind;
use serde::Serialize;
use std::io::Write;

#[derive(Args, Debug)]
pub struct InitTableArgs {
    /// Table to (re)create. Any existing table of that name is dropped.
    pub table: String,

    /// `sparse` for BM25 text tables, `dense` for embedding tables.
    #[arg(long)]
    pub kind: IndexKind,

    /// Embedding dimension for dense tables. Defaults to `embedding.dim`.
    #[arg(long)]
    pub dim: Option<usize>,
}

#[derive(Debug, Serialize)]
struct InitTableOutput {
    table: String,
    kind: IndexKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    dim: Option<usize>,
}

pub fn run_init_table(args: &InitTableArgs, ctx: &CmdContext) -> Result<()> {
    let dim = match args.kind {
        IndexKind::Sparse => None,
        IndexKind::Dense => Some(args.dim.unwrap_or(ctx.config.embedding.dim)),
    };

    let store = ctx.open_store()?;
    store.create_table(&args.table, args.kind, dim.unwrap_or(0))?;

    let out = InitTableOutput {
        table: args.table.clone(),
        kind: args.kind,
        dim,
    };
    render_mode(
        ctx.output,
        &out,
        |o, w| {
            write!(w, "{}\t{}", o.table, o.kind)?;
            if let Some(dim) = o.dim {
                write!(w, "\t{dim}")?;
            }
            writeln!(w)
        },
        |o, w| {
            pretty_kv(w, "created", &o.table)?;
            pretty_kv(w, "kind", o.kind.as_str())?;
            if let Some(dim) = o.dim {
                pretty_kv(w, "dim", dim.to_string())?;
            }
            Ok(())
        },
    )
}
