//! Output formatting for CLI commands.
//!
//! Commands that report structured results can emit either human-readable
//! text or JSON.

use anyhow::Result;
use lode_core::Hash;
use serde::Serialize;
use std::io::{self, Write};

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Writer for command output with format abstraction.
pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    /// Create a new OutputWriter.
    pub fn new(json: bool) -> Self {
        Self {
            format: if json {
                OutputFormat::Json
            } else {
                OutputFormat::Text
            },
        }
    }

    /// Write output using the configured format.
    ///
    /// The `text_fn` closure is called only in text mode to produce the
    /// human-readable rendering of `data`.
    pub fn write<T: Serialize>(&self, data: &T, text_fn: impl FnOnce() -> String) -> Result<()> {
        let mut stdout = io::stdout();
        match self.format {
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(data)?;
                writeln!(stdout, "{}", json)?;
            }
            OutputFormat::Text => {
                let text = text_fn();
                if !text.is_empty() {
                    write!(stdout, "{}", text)?;
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// Data Transfer Objects (DTOs) for JSON output
// ============================================================================

/// One discovered dataset for the `datasets` command.
#[derive(Debug, Serialize)]
pub struct DatasetInfo {
    pub path: String,
    pub root: Hash,
}

/// Output for the `datasets` command.
#[derive(Debug, Serialize)]
pub struct DatasetsOutput {
    pub success: bool,
    pub snapshot: Hash,
    pub datasets: Vec<DatasetInfo>,
}

/// Tree entry information for the `ls` command.
#[derive(Debug, Serialize)]
pub struct TreeEntryInfo {
    pub name: String,
    pub entry_type: String,
    pub mode: String,
    pub hash: Hash,
}

/// Output for `ls` of a tree.
#[derive(Debug, Serialize)]
pub struct LsOutput {
    pub success: bool,
    pub hash: Hash,
    pub entries: Vec<TreeEntryInfo>,
}

/// Reference information for `refs list`.
#[derive(Debug, Serialize)]
pub struct RefInfo {
    pub name: String,
    pub hash: Hash,
}

/// Output for the `refs list` command.
#[derive(Debug, Serialize)]
pub struct RefsListOutput {
    pub success: bool,
    pub refs: Vec<RefInfo>,
}
