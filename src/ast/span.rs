/// A region of ADL source text.
///
/// Offsets count characters, not bytes. Lines are 1-based and columns are
/// 0-based, matching the way diagnostics quote the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

impl Span {
    /// Smallest span enclosing both `self` and `other`.
    pub fn to(self, other: Span) -> Span {
        let (first, last) = (
            if other.start < self.start { other } else { self },
            if other.end > self.end { other } else { self },
        );
        Span {
            start: first.start,
            end: last.end,
            line: first.line,
            column: first.column,
            end_line: last.end_line,
            end_column: last.end_column,
        }
    }

    pub fn is_multiline(&self) -> bool {
        self.line != self.end_line
    }

    pub fn encloses(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// Offsets at which each line of the source begins.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        for (offset, ch) in text.chars().enumerate() {
            if ch == '\n' {
                line_starts.push(offset + 1);
            }
        }
        LineIndex { line_starts }
    }

    /// Record that a new line begins at `offset`.
    pub(crate) fn start_line(&mut self, offset: usize) {
        if self.line_starts.last().is_none_or(|last| *last < offset) {
            self.line_starts.push(offset);
        }
    }

    /// Translate a character offset into `(line, column)`.
    pub fn locate(&self, offset: usize) -> (usize, usize) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(insert) => insert - 1,
        };
        (line + 1, offset - self.line_starts[line])
    }

    pub fn span(&self, start: usize, end: usize) -> Span {
        let (line, column) = self.locate(start);
        let (end_line, end_column) = self.locate(end);
        Span {
            start,
            end,
            line,
            column,
            end_line,
            end_column,
        }
    }
}

#[test]
fn test_locate_lines() {
    let index = LineIndex::new("ab\ncd\n\nef");
    assert_eq!(index.locate(0), (1, 0));
    assert_eq!(index.locate(1), (1, 1));
    assert_eq!(index.locate(3), (2, 0));
    assert_eq!(index.locate(6), (3, 0));
    assert_eq!(index.locate(8), (4, 1));
}

#[test]
fn test_merge_encloses_both() {
    let index = LineIndex::new("x := a +\n  b");
    let left = index.span(5, 6);
    let right = index.span(11, 12);
    let merged = left.to(right);
    assert!(merged.encloses(&left));
    assert!(merged.encloses(&right));
    assert!(merged.is_multiline());
    assert_eq!((merged.line, merged.column), (1, 5));
    assert_eq!((merged.end_line, merged.end_column), (2, 3));
}
