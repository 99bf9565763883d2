pub mod completions;
pub mod count;
pub mod embed;
pub mod index;
pub mod init_table;
pub mod kind;
pub mod load;
pub mod search;

use crate::output::OutputMode;
use anyhow::{Context, Result};
use relir_core::config::RelirConfig;
use relir_core::{DocumentRecord, SqliteStore};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Resolved configuration and output mode handed to every command.
#[derive(Debug)]
pub struct CmdContext {
    pub config: RelirConfig,
    pub output: OutputMode,
}

impl CmdContext {
    /// Open the configured index store.
    pub fn open_store(&self) -> Result<SqliteStore> {
        SqliteStore::open(&self.config.store).with_context(|| {
            format!(
                "Failed to open index store {}",
                self.config.store.path.display()
            )
        })
    }
}

/// Read a JSONL corpus file; `-` reads stdin. Blank lines are skipped.
pub fn read_records(path: &Path) -> Result<Vec<DocumentRecord>> {
    if path.as_os_str() == "-" {
        return parse_records(io::stdin().lock(), "<stdin>");
    }
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    parse_records(BufReader::new(file), &path.display().to_string())
}

fn parse_records(reader: impl BufRead, source: &str) -> Result<Vec<DocumentRecord>> {
    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read {source}"))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let record = serde_json::from_str::<DocumentRecord>(trimmed)
            .with_context(|| format!("{source}:{}: invalid record", idx + 1))?;
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_text_and_vector_records() {
        let input = "{\"id\":\"d1\",\"contents\":\"hello\"}\n\n{\"id\":\"d2\",\"vector\":[0.5,1.0]}\n";
        let records = parse_records(input.as_bytes(), "test").expect("parse");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].contents.as_deref(), Some("hello"));
        assert_eq!(records[1].vector.as_deref(), Some(&[0.5, 1.0][..]));
    }

    #[test]
    fn reports_line_number_of_bad_record() {
        let input = "{\"id\":\"d1\",\"contents\":\"ok\"}\nnot json\n";
        let err = parse_records(input.as_bytes(), "corpus.jsonl").expect_err("bad line");
        assert!(err.to_string().contains("corpus.jsonl:2"));
    }

    #[test]
    fn missing_file_names_path() {
        let err = read_records(Path::new("/definitely/not/here.jsonl")).expect_err("missing");
        assert!(format!("{err:#}").contains("here.jsonl"));
    }
}
