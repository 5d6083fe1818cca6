/// A 1-based line/column pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineCol {
    pub line: usize,
    pub col: usize,
}

/// Holds the text of a single file together with the path it was read from.
///
/// Line starts are computed once so offset lookups are a binary search.
#[derive(Debug, Clone)]
pub struct Source {
    path: String,
    code: String,
    line_starts: Vec<usize>,
}

impl Source {
    pub fn new(path: impl Into<String>, code: impl Into<String>) -> Self {
        let code = code.into();
        let mut line_starts = vec![0];
        for (i, b) in code.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }

        Self {
            path: path.into(),
            code,
            line_starts,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// Resolves a byte offset to a line and column, both starting at 1.
    ///
    /// Columns count characters, not bytes. Offsets past the end of the text are
    /// clamped to the end, and offsets inside a multibyte character resolve to
    /// that character.
    pub fn offset_to_line_col(&self, offset: usize) -> LineCol {
        let offset = offset.min(self.code.len());
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        let line_start = self.line_starts[line_idx];

        let col = self.code[line_start..]
            .char_indices()
            .take_while(|(i, _)| line_start + i < offset)
            .count();

        LineCol {
            line: line_idx + 1,
            col: col + 1,
        }
    }
}
