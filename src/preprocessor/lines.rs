//! Joins backslash-continued physical lines into logical lines

/// One logical line assembled from a run of continued physical lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalLine {
    /// 1-based number of the first physical line in the run
    pub line: usize,
    /// Trimmed text of each physical line, continuation markers removed
    fragments: Vec<String>,
}

impl LogicalLine {
    /// Build a logical line from already-trimmed fragments
    pub fn new(line: usize, fragments: Vec<String>) -> Self {
        Self { line, fragments }
    }

    /// Concatenated text of every fragment
    ///
    /// Fragments are joined with no separator, so `#define X \` followed by
    /// `5` reads back as `#define X5`. Use [`head`](Self::head) and
    /// [`continuation`](Self::continuation) to keep the line boundary.
    pub fn text(&self) -> String {
        self.fragments.concat()
    }

    /// Fragment contributed by the first physical line
    pub fn head(&self) -> &str {
        self.fragments.first().map(String::as_str).unwrap_or("")
    }

    /// Fragments contributed by the continuation lines, in order
    pub fn continuation(&self) -> &[String] {
        self.fragments.get(1..).unwrap_or(&[])
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }
}

/// Iterator adapter turning physical lines into logical lines
///
/// A physical line whose content ends in one or more `\` (after trailing
/// whitespace is removed) continues onto the next one. A continuation still
/// open when the input runs out closes the logical line.
pub struct LineJoiner<I> {
    lines: I,
    line_number: usize,
}

impl<I> LineJoiner<I> {
    pub fn new<T>(lines: T) -> Self
    where
        T: IntoIterator<IntoIter = I>,
    {
        Self {
            lines: lines.into_iter(),
            line_number: 0,
        }
    }
}

impl<I, S> Iterator for LineJoiner<I>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    type Item = LogicalLine;

    fn next(&mut self) -> Option<LogicalLine> {
        let mut current: Option<LogicalLine> = None;

        for physical in self.lines.by_ref() {
            self.line_number += 1;
            let first_line = self.line_number;
            let (content, continued) = split_continuation(physical.as_ref());

            current
                .get_or_insert_with(|| LogicalLine::new(first_line, Vec::new()))
                .fragments
                .push(content.trim().to_string());

            if !continued {
                return current;
            }
        }

        current
    }
}

/// Split a physical line into its content and whether it continues
fn split_continuation(line: &str) -> (&str, bool) {
    let trimmed = line.trim_end();
    let content = trimmed.trim_end_matches('\\');
    (content, content.len() != trimmed.len())
}
