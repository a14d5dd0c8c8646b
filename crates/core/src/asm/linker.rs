//! Linker.
//!
//! Concatenates the preprocessed files in includer order (every included file
//! before the file that includes it), dropping the `.include` lines themselves.
//! Tags travel with their lines unchanged, so the linked stream can be rendered
//! with provenance for diagnostics or without it for display.

use std::path::Path;

use crate::asm::preprocess::{Preprocessed, TaggedLine, render};

/// The linked line stream of a program.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LinkedSource {
    lines: Vec<TaggedLine>,
}

impl LinkedSource {
    /// Links the files of `pre`.
    pub fn link(pre: &Preprocessed) -> Self {
        let lines = pre
            .files
            .iter()
            .flat_map(|f| f.lines.iter())
            .filter(|l| !l.is_include())
            .cloned()
            .collect();
        Self { lines }
    }

    /// Wraps lines that are already in link order.
    pub const fn from_lines(lines: Vec<TaggedLine>) -> Self {
        Self { lines }
    }

    /// Linked lines, blank lines included.
    pub fn lines(&self) -> &[TaggedLine] {
        &self.lines
    }

    /// Linked text with a provenance suffix on every non-blank line.
    pub fn tagged_text(&self) -> String {
        render(&self.lines)
    }

    /// Linked text without provenance suffixes.
    pub fn untagged_text(&self) -> String {
        self.lines.iter().fold(String::new(), |mut out, line| {
            out.push_str(&line.text);
            out.push('\n');
            out
        })
    }

    /// Writes the tagged text to `path`.
    pub fn write_tagged(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, self.tagged_text())
    }
}
