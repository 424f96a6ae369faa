//! Building editor snapshots for terminal use, where the "editor" is a file or stdin.

use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::domain::model::EditorSnapshot;
use crate::infra::fs::FileSystem;

/// Inclusive, 1-based line range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

impl LineRange {
    /// Order the bounds and clamp both to at least line 1.
    pub fn new(a: usize, b: usize) -> Self {
        Self {
            start: a.min(b).max(1),
            end: a.max(b).max(1),
        }
    }
}

impl FromStr for LineRange {
    type Err = LineRangeParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        let (start, end) = value
            .split_once(':')
            .or_else(|| value.split_once('-'))
            .unwrap_or((value, value));
        let parse = |raw: &str| {
            raw.trim()
                .parse::<usize>()
                .map_err(|_| LineRangeParseError::Invalid(value.to_string()))
        };
        Ok(Self::new(parse(start)?, parse(end)?))
    }
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum LineRangeParseError {
    #[error("invalid line range '{0}', expected START:END")]
    Invalid(String),
}

impl EditorSnapshot {
    /// Snapshot of an unnamed document with no selection.
    pub fn from_text(text: impl Into<String>, file_name: Option<String>) -> Self {
        Self::new(text, None, file_name)
    }

    /// Snapshot of `path` opened in an editor, optionally with `lines` selected.
    pub fn from_file(fs: &dyn FileSystem, path: &Path, lines: Option<LineRange>) -> Result<Self> {
        let document = fs
            .read_text(path)
            .with_context(|| format!("failed to read editor document {}", path.display()))?;
        let selection = lines.map(|range| select_lines(&document, range));
        Ok(Self::new(document, selection, Some(fs.simple_name(path))))
    }
}

fn select_lines(document: &str, range: LineRange) -> String {
    let total = document.lines().count();
    if total == 0 {
        return String::new();
    }
    let start = range.start.min(total);
    let end = range.end.min(total);
    document
        .lines()
        .skip(start - 1)
        .take(end + 1 - start)
        .collect::<Vec<_>>()
        .join("\n")
}
