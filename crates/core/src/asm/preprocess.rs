//! Include and macro preprocessor.
//!
//! This module turns a root source file into tagged lines. It performs the following:
//! 1. **Include Walk:** Depth-first traversal of `.include "file"` directives, resolved
//!    relative to the including file. Revisiting a file on the current include path is a
//!    cycle; reaching it again through another branch includes it only once.
//! 2. **Macro Collection:** A single `.eqv` table pooled across every file, applied in
//!    definition order with word-boundary matching.
//! 3. **Line Tagging:** Each line keeps its display name and 1-based line number. Comments
//!    are stripped, macros substituted and trailing whitespace trimmed, except on
//!    `.ascii`/`.asciiz` lines, which pass through untouched.
//! 4. **Path Normalization:** A map between canonical paths and display names (relative to
//!    the root file's directory, `/`-separated) used by diagnostics and breakpoints.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::asm::directive::DIRECTIVES;
use crate::asm::lexer::{is_identifier, strip_comment, strip_label};
use crate::asm::pseudo::is_mnemonic;
use crate::common::error::{PreprocessError, Reserved};
use crate::common::tag::SourceTag;
use crate::config::Config;
use crate::isa::abi::is_register_token;

/// One source line after preprocessing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaggedLine {
    /// Processed text; empty for blank and comment-only lines.
    pub text: String,
    /// Where the line came from.
    pub tag: SourceTag,
}

impl TaggedLine {
    /// Renders the line in the linked intermediate form; blank lines stay blank.
    pub fn render(&self) -> String {
        if self.text.is_empty() {
            String::new()
        } else {
            self.tag.suffix(&self.text)
        }
    }

    /// True for `.include` lines, which the linker drops.
    pub fn is_include(&self) -> bool {
        matches!(directive_of(&self.text), Some((".include", _)))
    }
}

/// Renders lines in the tagged form, one per line, each ending in `\n`.
pub fn render(lines: &[TaggedLine]) -> String {
    lines.iter().fold(String::new(), |mut out, line| {
        out.push_str(&line.render());
        out.push('\n');
        out
    })
}

/// The pooled `.eqv` table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EqvTable {
    entries: Vec<(String, String)>,
}

impl EqvTable {
    /// Defines or redefines `name`. A redefinition keeps the original position.
    ///
    /// # Returns
    ///
    /// The previous replacement, if `name` was already defined.
    pub fn define(&mut self, name: &str, value: &str) -> Option<String> {
        if let Some(entry) = self.entries.iter_mut().find(|(n, _)| n == name) {
            return Some(std::mem::replace(&mut entry.1, value.to_string()));
        }
        self.entries.push((name.to_string(), value.to_string()));
        None
    }

    /// Replacement text of `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// `(pattern, replacement)` pairs in definition order; patterns read `\bNAME\b`.
    pub fn patterns(&self) -> impl Iterator<Item = (String, &str)> + '_ {
        self.entries
            .iter()
            .map(|(n, v)| (format!(r"\b{n}\b"), v.as_str()))
    }

    /// Number of macros.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no macro is defined.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Substitutes every macro into `line`, in definition order.
    pub fn apply(&self, line: &str) -> String {
        self.entries
            .iter()
            .fold(line.to_string(), |text, (name, value)| replace_word(&text, name, value))
    }
}

const fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Replaces whole-word occurrences of `name`.
fn replace_word(text: &str, name: &str, value: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for (start, _) in text.match_indices(name) {
        let end = start + name.len();
        let before_ok = start == 0 || !is_word_byte(bytes[start - 1]);
        let after_ok = end == bytes.len() || !is_word_byte(bytes[end]);
        if before_ok && after_ok && start >= last {
            out.push_str(&text[last..start]);
            out.push_str(value);
            last = end;
        }
    }
    out.push_str(&text[last..]);
    out
}

/// Splits a line into its directive head and operand text, skipping labels and comments.
fn directive_of(line: &str) -> Option<(&str, &str)> {
    let mut rest = strip_comment(line).trim();
    while let Some((_, after)) = strip_label(rest) {
        rest = after.trim_start();
    }
    if !rest.starts_with('.') {
        return None;
    }
    let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
    Some((&rest[..end], rest[end..].trim()))
}

/// True for lines whose string literal must not be touched.
fn is_string_line(line: &str) -> bool {
    let mut rest = line.trim_start();
    while let Some((_, after)) = strip_label(rest) {
        rest = after.trim_start();
    }
    rest.starts_with(".ascii")
}

fn reserved(name: &str) -> Option<Reserved> {
    if is_register_token(name) {
        Some(Reserved::Register)
    } else if DIRECTIVES.contains(&name) {
        Some(Reserved::Directive)
    } else if is_mnemonic(name) {
        Some(Reserved::Mnemonic)
    } else {
        None
    }
}

/// Canonical path to display name, relative to the root file's directory.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PathMap {
    root_dir: PathBuf,
    names: BTreeMap<PathBuf, Arc<str>>,
}

impl PathMap {
    /// Creates an empty map rooted at `root_dir`.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            names: BTreeMap::new(),
        }
    }

    fn insert(&mut self, path: &Path) -> Arc<str> {
        if let Some(name) = self.names.get(path) {
            return Arc::clone(name);
        }
        let shown = path.strip_prefix(&self.root_dir).unwrap_or(path);
        let name: Arc<str> = slash_join(shown).into();
        let _ = self.names.insert(path.to_path_buf(), Arc::clone(&name));
        name
    }

    /// Display name of a known canonical path.
    pub fn display_name(&self, path: &Path) -> Option<Arc<str>> {
        self.names.get(path).cloned()
    }

    /// Every known display name.
    pub fn names(&self) -> impl Iterator<Item = &Arc<str>> {
        self.names.values()
    }

    /// Directory of the root file.
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Normalizes a user-supplied file reference to a display name.
    ///
    /// Quotes are stripped, `\` becomes `/` and a leading `./` is dropped. A reference
    /// matching a known display name, or the base name of exactly one known file, or a
    /// path that resolves to a known file, maps to that file's display name. Anything
    /// else is returned cleaned but unresolved.
    pub fn normalize(&self, file: &str) -> Arc<str> {
        let cleaned = file.trim().trim_matches(|c| c == '"' || c == '\'').replace('\\', "/");
        let cleaned = cleaned.strip_prefix("./").unwrap_or(&cleaned);
        if let Some(name) = self.names.values().find(|n| &***n == cleaned) {
            return Arc::clone(name);
        }
        let mut by_base = self
            .names
            .values()
            .filter(|n| n.rsplit('/').next() == Some(cleaned));
        if let (Some(name), None) = (by_base.next(), by_base.next()) {
            return Arc::clone(name);
        }
        let candidate = self.root_dir.join(cleaned);
        if let Some(name) = fs::canonicalize(&candidate)
            .ok()
            .and_then(|p| self.names.get(&p))
        {
            return Arc::clone(name);
        }
        cleaned.into()
    }
}

fn slash_join(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// One preprocessed file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceFile {
    /// Canonical path.
    pub path: PathBuf,
    /// Display name.
    pub name: Arc<str>,
    /// Preprocessed lines, one per source line.
    pub lines: Vec<TaggedLine>,
}

impl SourceFile {
    /// The file in the tagged intermediate form.
    pub fn tagged_text(&self) -> String {
        render(&self.lines)
    }
}

/// Output of the preprocessor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Preprocessed {
    /// Files with included files before their includers.
    pub files: Vec<SourceFile>,
    /// The pooled macro table.
    pub eqv: EqvTable,
    /// Path normalization map.
    pub paths: PathMap,
}

/// Runs the include walk and per-file preprocessing.
#[derive(Debug)]
pub struct Preprocessor<'a> {
    config: &'a Config,
}

struct Walk<'a> {
    config: &'a Config,
    stack: Vec<(PathBuf, Arc<str>)>,
    visited: HashSet<PathBuf>,
    files: Vec<(PathBuf, Arc<str>, String)>,
    eqv: EqvTable,
    paths: PathMap,
}

impl<'a> Preprocessor<'a> {
    /// Creates a preprocessor reading settings from `config`.
    pub const fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Preprocesses the file at `root` and everything it includes.
    ///
    /// # Returns
    ///
    /// The files in includer order with the macro table and path map, or the first
    /// [`PreprocessError`] encountered.
    pub fn run(&self, root: &Path) -> Result<Preprocessed, PreprocessError> {
        let canonical = fs::canonicalize(root).map_err(|source| PreprocessError::MissingFile {
            path: root.to_path_buf(),
            source,
        })?;
        let contents =
            fs::read_to_string(&canonical).map_err(|source| PreprocessError::MissingFile {
                path: root.to_path_buf(),
                source,
            })?;
        self.run_with(canonical, contents)
    }

    /// Preprocesses in-memory source named `name`, as if it were a file in `dir`.
    ///
    /// Includes are resolved relative to `dir`.
    pub fn run_source(
        &self,
        name: &str,
        contents: &str,
        dir: &Path,
    ) -> Result<Preprocessed, PreprocessError> {
        let dir = fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());
        self.run_with(dir.join(name), contents.to_string())
    }

    fn run_with(&self, root: PathBuf, contents: String) -> Result<Preprocessed, PreprocessError> {
        let root_dir = root.parent().map(Path::to_path_buf).unwrap_or_default();
        let mut walk = Walk {
            config: self.config,
            stack: Vec::new(),
            visited: HashSet::new(),
            files: Vec::new(),
            eqv: EqvTable::default(),
            paths: PathMap::new(root_dir),
        };
        walk.visit(root, contents)?;
        debug!(files = walk.files.len(), macros = walk.eqv.len(), "include walk finished");

        let files = walk
            .files
            .into_iter()
            .map(|(path, name, contents)| SourceFile {
                lines: preprocess(&contents, &name, &walk.eqv),
                path,
                name,
            })
            .collect();
        Ok(Preprocessed {
            files,
            eqv: walk.eqv,
            paths: walk.paths,
        })
    }
}

impl Walk<'_> {
    fn visit(&mut self, path: PathBuf, contents: String) -> Result<(), PreprocessError> {
        let name = self.paths.insert(&path);
        let _ = self.visited.insert(path.clone());
        self.stack.push((path.clone(), Arc::clone(&name)));

        for (idx, raw) in contents.lines().enumerate() {
            if is_string_line(raw) {
                continue;
            }
            let tag = SourceTag::new(Arc::clone(&name), idx + 1);
            match directive_of(raw) {
                Some((".include", operand)) => self.include(&path, operand, tag)?,
                Some((".eqv", operand)) => self.define(operand, tag)?,
                _ => {}
            }
        }

        let _ = self.stack.pop();
        self.files.push((path, name, contents));
        Ok(())
    }

    fn include(&mut self, from: &Path, operand: &str, tag: SourceTag) -> Result<(), PreprocessError> {
        let target = operand
            .strip_prefix('"')
            .and_then(|t| t.strip_suffix('"'))
            .filter(|t| !t.is_empty())
            .ok_or(PreprocessError::MalformedDirective {
                directive: ".include",
                tag,
            })?;
        let candidate = from.parent().unwrap_or_else(|| Path::new(".")).join(target);
        let canonical =
            fs::canonicalize(&candidate).map_err(|source| PreprocessError::MissingFile {
                path: candidate.clone(),
                source,
            })?;

        if self.stack.iter().any(|(p, _)| *p == canonical) {
            let mut chain: Vec<String> = self.stack.iter().map(|(_, n)| n.to_string()).collect();
            chain.push(self.paths.insert(&canonical).to_string());
            return Err(PreprocessError::CyclicInclude {
                path: canonical,
                chain,
            });
        }
        if self.visited.contains(&canonical) {
            debug!(file = %canonical.display(), "already included, skipping");
            return Ok(());
        }

        let contents =
            fs::read_to_string(&canonical).map_err(|source| PreprocessError::MissingFile {
                path: candidate,
                source,
            })?;
        debug!(file = %canonical.display(), "including");
        self.visit(canonical, contents)
    }

    fn define(&mut self, operand: &str, tag: SourceTag) -> Result<(), PreprocessError> {
        let malformed = |tag| PreprocessError::MalformedDirective {
            directive: ".eqv",
            tag,
        };
        let (name, value) = operand
            .split_once(char::is_whitespace)
            .map(|(n, v)| (n, v.trim()))
            .filter(|(_, v)| !v.is_empty())
            .ok_or_else(|| malformed(tag.clone()))?;
        if let Some(reserved) = reserved(name) {
            return Err(PreprocessError::RestrictedMacro {
                name: name.to_string(),
                reserved,
                tag,
            });
        }
        if !is_identifier(name) {
            return Err(malformed(tag));
        }
        if let Some(previous) = self.eqv.define(name, value)
            && self.config.warnings
        {
            warn!(%tag, name, %previous, value, "eqv redefined");
        }
        Ok(())
    }
}

/// Preprocesses the lines of one file against the pooled macro table.
///
/// # Arguments
///
/// * `contents` - Raw file text.
/// * `name` - Display name used in the tags.
/// * `eqv` - Macro table.
///
/// # Returns
///
/// One [`TaggedLine`] per source line.
pub fn preprocess(contents: &str, name: &Arc<str>, eqv: &EqvTable) -> Vec<TaggedLine> {
    contents
        .lines()
        .enumerate()
        .map(|(idx, raw)| {
            let text = if is_string_line(raw) {
                raw.trim_end().to_string()
            } else {
                let code = strip_comment(raw).trim_end();
                if matches!(directive_of(code), Some((".include", _))) {
                    code.to_string()
                } else {
                    eqv.apply(code)
                }
            };
            TaggedLine {
                text,
                tag: SourceTag::new(Arc::clone(name), idx + 1),
            }
        })
        .collect()
}
