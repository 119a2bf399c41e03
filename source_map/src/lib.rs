//! Source mapping utilities for resolution units
//!
//! Tracks the source text behind each compilation unit so byte offsets carried
//! by AST spans can be turned into 1-based line/column positions for
//! diagnostics and editor-facing output.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Represents a position in source code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SourcePosition {
    pub line: usize,
    pub column: usize,
    pub byte_offset: usize,
}

impl SourcePosition {
    pub fn new(line: usize, column: usize, byte_offset: usize) -> Self {
        Self { line, column, byte_offset }
    }

    /// Position used when no source text is available; only the offset is known
    pub fn offset_only(byte_offset: usize) -> Self {
        Self { line: 0, column: 0, byte_offset }
    }

    pub fn is_mapped(&self) -> bool {
        self.line > 0
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_mapped() {
            write!(f, "{}:{}", self.line, self.column)
        } else {
            write!(f, "@{}", self.byte_offset)
        }
    }
}

/// Represents a span of source code
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SourceSpan {
    pub start: SourcePosition,
    pub end: SourcePosition,
    pub file_id: FileId,
}

impl SourceSpan {
    pub fn new(start: SourcePosition, end: SourcePosition, file_id: FileId) -> Self {
        Self { start, end, file_id }
    }

    /// Span for a unit whose text was never registered
    pub fn from_offsets(file_id: FileId, start: usize, end: usize) -> Self {
        Self {
            start: SourcePosition::offset_only(start),
            end: SourcePosition::offset_only(end),
            file_id,
        }
    }

    pub fn contains_offset(&self, offset: usize) -> bool {
        self.start.byte_offset <= offset && offset < self.end.byte_offset
    }

    /// Merge two spans (must be from the same file)
    pub fn merge(self, other: SourceSpan) -> SourceSpan {
        assert_eq!(self.file_id, other.file_id, "Cannot merge spans from different files");
        let start = self.start.min(other.start);
        let end = self.end.max(other.end);
        SourceSpan::new(start, end, self.file_id)
    }
}

/// Unique identifier for a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct FileId(usize);

impl FileId {
    pub fn new(id: usize) -> Self {
        Self(id)
    }

    pub fn as_usize(self) -> usize {
        self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileId({})", self.0)
    }
}

/// Information about a source file
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub content: String,
    pub line_starts: Vec<usize>,
}

impl SourceFile {
    /// Create a new source file with precomputed line starts
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        let line_starts = compute_line_starts(&content);
        Self {
            name: name.into(),
            content,
            line_starts,
        }
    }

    /// Get a specific line from the source file (1-based line numbers)
    pub fn get_line(&self, line_number: usize) -> Option<&str> {
        if line_number == 0 || line_number > self.line_starts.len() {
            return None;
        }

        let start = self.line_starts[line_number - 1];
        let end = self
            .line_starts
            .get(line_number)
            .copied()
            .unwrap_or(self.content.len());

        Some(self.content[start..end].trim_end_matches(['\n', '\r']))
    }

    /// Number of lines, counting a trailing partial line
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Convert a byte offset to line and column (1-based)
    pub fn offset_to_line_col(&self, offset: usize) -> (usize, usize) {
        let line_index = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };

        let line_start = self.line_starts.get(line_index).copied().unwrap_or(0);
        (line_index + 1, offset.saturating_sub(line_start) + 1)
    }

    /// Convert a 1-based line/column pair back to a byte offset
    pub fn line_col_to_offset(&self, line: usize, column: usize) -> Option<usize> {
        let line_start = *self.line_starts.get(line.checked_sub(1)?)?;
        let offset = line_start + column.checked_sub(1)?;
        (offset <= self.content.len()).then_some(offset)
    }

    /// Create a SourcePosition from a byte offset
    pub fn offset_to_position(&self, offset: usize) -> SourcePosition {
        let (line, column) = self.offset_to_line_col(offset);
        SourcePosition::new(line, column, offset)
    }

    /// Text covered by a byte range, if the range is in bounds
    pub fn slice(&self, start: usize, end: usize) -> Option<&str> {
        self.content.get(start..end)
    }
}

/// Manages source files for a set of resolution units
#[derive(Debug, Clone, Default)]
pub struct SourceMap {
    files: HashMap<FileId, SourceFile>,
    next_id: usize,
}

impl SourceMap {
    /// Create a new empty source map
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a source file and return its FileId
    pub fn add_file(&mut self, name: impl Into<String>, content: impl Into<String>) -> FileId {
        let file_id = FileId(self.next_id);
        self.next_id += 1;
        self.files.insert(file_id, SourceFile::new(name, content));
        file_id
    }

    /// Get a source file by its FileId
    pub fn get_file(&self, file_id: FileId) -> Option<&SourceFile> {
        self.files.get(&file_id)
    }

    /// Get a specific line from a file (1-based line numbers)
    pub fn get_line(&self, file_id: FileId, line_number: usize) -> Option<&str> {
        self.get_file(file_id)?.get_line(line_number)
    }

    /// Convert a byte offset to line and column for a specific file
    pub fn offset_to_line_col(&self, file_id: FileId, offset: usize) -> Option<(usize, usize)> {
        self.get_file(file_id).map(|file| file.offset_to_line_col(offset))
    }

    /// Create a SourceSpan from file, start offset, and end offset
    pub fn span_from_offsets(&self, file_id: FileId, start: usize, end: usize) -> Option<SourceSpan> {
        let file = self.get_file(file_id)?;
        Some(SourceSpan::new(
            file.offset_to_position(start),
            file.offset_to_position(end),
            file_id,
        ))
    }

    /// Like `span_from_offsets`, falling back to offset-only positions
    pub fn span_or_offsets(&self, file_id: FileId, start: usize, end: usize) -> SourceSpan {
        self.span_from_offsets(file_id, start, end)
            .unwrap_or_else(|| SourceSpan::from_offsets(file_id, start, end))
    }

    /// Get all file IDs in the source map
    pub fn file_ids(&self) -> impl Iterator<Item = FileId> + '_ {
        self.files.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Compute line start offsets for a source text
fn compute_line_starts(source: &str) -> Vec<usize> {
    let mut line_starts = vec![0];
    line_starts.extend(
        source
            .char_indices()
            .filter(|&(_, ch)| ch == '\n')
            .map(|(i, _)| i + 1),
    );
    line_starts
}
