//! Line-based offset translation.
//!
//! The parser reports flat character offsets. Consumers want stable
//! `line:column` positions, so a table of line-start offsets is built once
//! per file and every query is a binary search over it.

use crate::ast::FileLocation;
use crate::error::{Result, XrefError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// A position in a source file.
///
/// Ordered by line, then column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TextPointer {
    /// Line number (1-based).
    pub line: usize,

    /// Column number (0-based, in characters).
    pub column: usize,
}

impl TextPointer {
    /// Create a pointer at `line` (1-based) and `column` (0-based).
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for TextPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A half-open span between two pointers.
///
/// Ordered by start, then end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TextRange {
    /// First position covered by the range.
    pub start: TextPointer,

    /// First position after the range.
    pub end: TextPointer,
}

impl TextRange {
    /// Create a range. `start` must not be after `end`.
    pub fn new(start: TextPointer, end: TextPointer) -> Self {
        debug_assert!(start <= end, "range start {} after end {}", start, end);
        Self { start, end }
    }

    /// Shorthand for a range given as four numbers.
    pub fn from_coords(start_line: usize, start_col: usize, end_line: usize, end_col: usize) -> Self {
        Self::new(
            TextPointer::new(start_line, start_col),
            TextPointer::new(end_line, end_col),
        )
    }
}

impl fmt::Display for TextRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Translates character offsets of one file into [`TextPointer`]s.
///
/// Owns the decoded source text for its lifetime.
#[derive(Debug, Clone)]
pub struct OffsetTranslator {
    text: String,
    /// Character offset of the first character of every line.
    line_starts: Vec<usize>,
    /// Length of the text in characters.
    len: usize,
}

impl OffsetTranslator {
    /// Build the line-start table for `text`.
    ///
    /// `\n`, `\r\n` and a lone `\r` each end one line. A terminator at the
    /// very end of the text does not open an extra empty line.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let mut line_starts = vec![0];
        let mut offset = 0;

        let mut chars = text.chars().peekable();
        while let Some(ch) = chars.next() {
            offset += 1;
            match ch {
                '\n' => line_starts.push(offset),
                '\r' => {
                    if chars.peek() == Some(&'\n') {
                        chars.next();
                        offset += 1;
                    }
                    line_starts.push(offset);
                }
                _ => {}
            }
        }

        if line_starts.len() > 1 && line_starts.last() == Some(&offset) {
            line_starts.pop();
        }

        Self {
            text,
            line_starts,
            len: offset,
        }
    }

    /// Decode `bytes` as UTF-8 and build the translator.
    ///
    /// A decode failure is fatal for the file: no partial index is built.
    pub fn from_utf8(path: &Path, bytes: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bytes).map_err(|source| XrefError::Encoding {
            file: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(text))
    }

    /// The source text this translator was built from.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length of the source text in characters.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the source text is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of lines in the file.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Character offset where `line` (1-based) starts.
    pub fn line_start(&self, line: usize) -> Option<usize> {
        line.checked_sub(1)
            .and_then(|idx| self.line_starts.get(idx))
            .copied()
    }

    /// Translate a character offset.
    ///
    /// Offsets past the end of the file clamp to the end-of-file position,
    /// since recovered nodes may claim a length running past it.
    pub fn pointer(&self, offset: usize) -> TextPointer {
        let offset = offset.min(self.len);
        // line_starts[0] == 0, so at least one start is <= offset
        let idx = self.line_starts.partition_point(|&start| start <= offset) - 1;
        TextPointer {
            line: idx + 1,
            column: offset - self.line_starts[idx],
        }
    }

    /// Translate a file location into a range.
    pub fn range(&self, location: FileLocation) -> TextRange {
        let start = self.pointer(location.offset);
        let end = self.pointer(location.offset.saturating_add(location.length));
        TextRange { start, end }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIXED: &str = "int a;\r\nint b;\rint c;\n\nint d;";

    #[test]
    fn test_single_line() {
        let index = OffsetTranslator::new("int x;");
        assert_eq!(index.line_count(), 1);
        assert_eq!(index.pointer(0), TextPointer::new(1, 0));
        assert_eq!(index.pointer(4), TextPointer::new(1, 4));
    }

    #[test]
    fn test_mixed_terminators() {
        let index = OffsetTranslator::new(MIXED);
        assert_eq!(index.line_count(), 5);
        // "int b;" begins after "int a;\r\n"
        assert_eq!(index.pointer(8), TextPointer::new(2, 0));
        // "int c;" begins after the lone '\r'
        assert_eq!(index.pointer(15), TextPointer::new(3, 0));
        // empty fourth line
        assert_eq!(index.pointer(22), TextPointer::new(4, 0));
        assert_eq!(index.pointer(23), TextPointer::new(5, 0));
    }

    #[test]
    fn test_crlf_is_one_terminator() {
        let index = OffsetTranslator::new("a\r\nb");
        assert_eq!(index.line_count(), 2);
        assert_eq!(index.line_start(2), Some(3));
        // the '\n' of the pair still belongs to line 1
        assert_eq!(index.pointer(2), TextPointer::new(1, 2));
    }

    #[test]
    fn test_trailing_terminator_adds_no_line() {
        assert_eq!(OffsetTranslator::new("int x;\n").line_count(), 1);
        assert_eq!(OffsetTranslator::new("int x;\r\n").line_count(), 1);
        assert_eq!(OffsetTranslator::new("int x;\n\n").line_count(), 2);
        assert_eq!(OffsetTranslator::new("").line_count(), 1);
    }

    #[test]
    fn test_offset_past_end_clamps() {
        let index = OffsetTranslator::new("ab\ncd");
        assert_eq!(index.pointer(5), TextPointer::new(2, 2));
        assert_eq!(index.pointer(500), TextPointer::new(2, 2));
    }

    #[test]
    fn test_columns_count_characters() {
        let index = OffsetTranslator::new("// é\nint ü;");
        assert_eq!(index.len(), 11);
        assert_eq!(index.pointer(9), TextPointer::new(2, 4));
    }

    #[test]
    fn test_round_trip_offsets() {
        let index = OffsetTranslator::new(MIXED);
        for offset in 0..index.len() {
            let pointer = index.pointer(offset);
            let start = index.line_start(pointer.line).unwrap();
            assert_eq!(start + pointer.column, offset, "offset {}", offset);
        }
    }

    #[test]
    fn test_pointers_are_monotonic() {
        let index = OffsetTranslator::new(MIXED);
        for offset in 1..=index.len() + 2 {
            assert!(index.pointer(offset - 1) <= index.pointer(offset));
        }
    }

    #[test]
    fn test_range_from_location() {
        let index = OffsetTranslator::new("int x;\nx = 5;");
        let range = index.range(FileLocation::new(7, 1));
        assert_eq!(range, TextRange::from_coords(2, 0, 2, 1));
        assert_eq!(range.to_string(), "2:0-2:1");
    }

    #[test]
    fn test_invalid_utf8_is_fatal() {
        let err = OffsetTranslator::from_utf8(Path::new("bad.cpp"), &[0x69, 0xff, 0x0a]).unwrap_err();
        assert_eq!(err.kind(), "Encoding");
    }
}
