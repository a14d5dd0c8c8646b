//! Source provenance tags.
//!
//! Every line that leaves the preprocessor, and every instruction or data
//! declaration the assembler builds from it, carries a [`SourceTag`] naming the
//! file and line it came from. Diagnostics and breakpoints are keyed on tags,
//! never on linked positions or addresses.

use std::fmt;
use std::sync::Arc;

/// Origin of an assembled unit: display name of the source file and 1-based line.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceTag {
    /// File name relative to the root source's directory, with `/` separators.
    pub file: Arc<str>,
    /// 1-based line number within `file`.
    pub line: usize,
}

impl SourceTag {
    /// Creates a tag for `line` of `file`.
    pub fn new(file: impl Into<Arc<str>>, line: usize) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }

    /// Renders `text` in the linked intermediate form: `text  "file" line`.
    pub fn suffix(&self, text: &str) -> String {
        format!("{text}  {self}")
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" {}", self.file, self.line)
    }
}

/// Splits a rendered tagged line back into its text and tag.
///
/// Returns `None` for blank lines and for lines without a provenance suffix.
pub fn parse_tagged_line(line: &str) -> Option<(&str, SourceTag)> {
    let (head, number) = line.trim_end().rsplit_once(' ')?;
    let line_no = number.parse::<usize>().ok()?;
    let head = head.strip_suffix('"')?;
    let open = head.rfind('"')?;
    let file = &head[open + 1..];
    let text = head[..open].strip_suffix("  ")?;
    Some((text, SourceTag::new(file, line_no)))
}
