use super::CmdContext;
use crate::output::{pretty_kv, render_mode};
use anyhow::Result;
use clap::Args;
use relir_core::{IndexKind, IndexStore};
use relir_search::resolve_index_kind;
use serde::Serialize;
use std::io::Write;

#[derive(Args, Debug)]
pub struct KindArgs {
    /// Table to inspect.
    pub table: String,
}

#[derive(Debug, Serialize)]
struct KindOutput {
    table: String,
    kind: IndexKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    dim: Option<usize>,
    rows: u64,
}

/// Report whether a table is a sparse or dense index, from its schema.
pub fn run_kind(args: &KindArgs, ctx: &CmdContext) -> Result<()> {
    let store = ctx.open_store()?;
    let descriptor = resolve_index_kind(&store, &args.table)?;
    let dim = match descriptor.kind {
        IndexKind::Sparse => None,
        IndexKind::Dense => store.embedding_dimension(&args.table)?,
    };

    let out = KindOutput {
        rows: store.row_count(&descriptor.table_name)?,
        table: descriptor.table_name,
        kind: descriptor.kind,
        dim,
    };
    render_mode(
        ctx.output,
        &out,
        |o, w| writeln!(w, "{}", o.kind),
        |o, w| {
            pretty_kv(w, "table", &o.table)?;
            pretty_kv(w, "kind", o.kind.as_str())?;
            if let Some(dim) = o.dim {
                pretty_kv(w, "dim", dim.to_string())?;
            }
            pretty_kv(w, "rows", o.rows.to_string())
        },
    )
}
