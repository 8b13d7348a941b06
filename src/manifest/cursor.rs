/// A trimmed, non-blank, non-comment line and its 1-based line number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicalLine<'a> {
    pub number: usize,
    pub text: &'a str,
}

impl LogicalLine<'_> {
    pub fn is_section_header(&self) -> bool {
        self.text.starts_with('[')
    }
}

/// What a section body sees when it asks for its next line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionLine<'a> {
    Entry(LogicalLine<'a>),
    /// A `[...]` header was reached. It has been pushed back for the top level.
    SectionBoundary,
    EndOfInput,
}

/// Pull-based reader over a manifest document with one line of lookahead.
#[derive(Debug)]
pub struct LineCursor<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
    pending: Option<LogicalLine<'a>>,
}

impl<'a> LineCursor<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().enumerate(),
            pending: None,
        }
    }

    /// Next meaningful line, skipping blanks and `#` comments.
    pub fn next_logical_line(&mut self) -> Option<LogicalLine<'a>> {
        if let Some(line) = self.pending.take() {
            return Some(line);
        }
        for (index, raw) in self.lines.by_ref() {
            let text = raw.trim();
            if text.is_empty() || text.starts_with('#') {
                continue;
            }
            return Some(LogicalLine {
                number: index + 1,
                text,
            });
        }
        None
    }

    /// Return a line so the next call to `next_logical_line` yields it again.
    pub fn push_back(&mut self, line: LogicalLine<'a>) {
        debug_assert!(self.pending.is_none(), "only one line of lookahead");
        self.pending = Some(line);
    }

    /// Next line inside a section body. Section headers end the body.
    pub fn next_entry(&mut self) -> SectionLine<'a> {
        match self.next_logical_line() {
            None => SectionLine::EndOfInput,
            Some(line) if line.is_section_header() => {
                self.push_back(line);
                SectionLine::SectionBoundary
            }
            Some(line) => SectionLine::Entry(line),
        }
    }
}
