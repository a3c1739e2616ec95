use nom_locate::LocatedSpan;

pub type Span<'a> = LocatedSpan<&'a str>;

#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Clone, Copy, Hash)]
pub struct Position {
    pub line: u32,
    pub column: usize,
}

impl Default for Position {
    fn default() -> Self {
        Position { line: 1, column: 1 }
    }
}

impl Position {
    pub fn new(line: u32, column: usize) -> Self {
        Position { line, column }
    }
}

#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Clone, Copy, Default, Hash)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    /// Smallest range covering both `self` and `other`.
    pub fn merge(&self, other: &Range) -> Range {
        Range {
            start: std::cmp::min(self.start, other.start),
            end: std::cmp::max(self.end, other.end),
        }
    }
}

/// Resolves byte offsets into 1-based character columns.
///
/// Offsets looked up in ascending order only scan the text between them, so
/// resolving every token of a long line stays linear in its length.
pub(crate) struct Columns<'a> {
    input: &'a str,
    offset: usize,
    column: usize,
}

impl<'a> Columns<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        Self {
            input,
            offset: 0,
            column: 1,
        }
    }

    pub(crate) fn column(&mut self, offset: usize) -> usize {
        if offset < self.offset {
            self.offset = self.input.get(..offset).and_then(|s| s.rfind('\n')).map_or(0, |i| i + 1);
            self.column = 1;
        }

        for c in self.input.get(self.offset..offset).unwrap_or_default().chars() {
            self.column = if c == '\n' { 1 } else { self.column + 1 };
        }
        self.offset = offset;
        self.column
    }
}

impl<'a> From<Span<'a>> for Position {
    fn from(span: Span<'a>) -> Self {
        Position {
            line: span.location_line(),
            column: span.get_utf8_column(),
        }
    }
}
