//! Best-effort syntax check run before the heuristics.
//!
//! The analyzer only needs to know whether the text parses and, if not, what
//! the parser had to say. The check sits behind [`SyntaxCheck`] so tests can
//! inject a fake, and so builds without the `ast` feature still work.

use regex::Regex;

/// A parser failure surfaced as a single finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxDiagnostic {
    pub message: String,
    /// 1-based line, when the parser reported one.
    pub line: Option<usize>,
}

impl SyntaxDiagnostic {
    /// Diagnostic with only message text; the line is recovered from the
    /// message when it contains one.
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let line = extract_line(&message);
        Self { message, line }
    }
}

/// Parses source text without executing it.
pub trait SyntaxCheck: Send + Sync {
    fn check(&self, source: &str) -> Result<(), SyntaxDiagnostic>;
}

/// Accepts every input.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSyntaxCheck;

impl SyntaxCheck for NoSyntaxCheck {
    fn check(&self, _source: &str) -> Result<(), SyntaxDiagnostic> {
        Ok(())
    }
}

/// The checker used when nothing else is injected: tree-sitter when built
/// with `ast`, otherwise [`NoSyntaxCheck`].
pub fn default_checker() -> Box<dyn SyntaxCheck> {
    #[cfg(feature = "ast")]
    {
        Box::new(TreeSitterCheck)
    }
    #[cfg(not(feature = "ast"))]
    {
        Box::new(NoSyntaxCheck)
    }
}

/// Pull a line number out of free-form diagnostic text.
///
/// Understands `line 12`, `(12:4)` and `:12:4` shapes. Returns `None` rather
/// than guessing when nothing matches.
pub fn extract_line(message: &str) -> Option<usize> {
    let patterns = [r"(?i)\bline\s+(\d+)", r"\(?(\d+):\d+\)?"];
    patterns.iter().find_map(|p| {
        Regex::new(p)
            .ok()?
            .captures(message)?
            .get(1)?
            .as_str()
            .parse()
            .ok()
            .filter(|&n: &usize| n > 0)
    })
}

/// JavaScript parse check backed by tree-sitter.
#[cfg(feature = "ast")]
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeSitterCheck;

#[cfg(feature = "ast")]
impl SyntaxCheck for TreeSitterCheck {
    fn check(&self, source: &str) -> Result<(), SyntaxDiagnostic> {
        let mut parser = tree_sitter::Parser::new();
        let lang: tree_sitter::Language = tree_sitter_javascript::LANGUAGE.into();
        if parser.set_language(&lang).is_err() {
            tracing::warn!("tree-sitter javascript grammar failed to load; skipping syntax check");
            return Ok(());
        }
        let Some(tree) = parser.parse(source, None) else {
            return Ok(());
        };

        let root = tree.root_node();
        if !root.has_error() {
            return Ok(());
        }

        let node = first_error(root).unwrap_or(root);
        let line = node.start_position().row + 1;
        let message = if node.is_missing() {
            format!("SyntaxError: missing '{}' (line {})", node.kind(), line)
        } else {
            let snippet: String = source
                .get(node.start_byte()..node.end_byte())
                .unwrap_or("")
                .chars()
                .take(20)
                .collect();
            if snippet.trim().is_empty() {
                format!("SyntaxError: unexpected end of input (line {})", line)
            } else {
                format!("SyntaxError: unexpected token '{}' (line {})", snippet.trim(), line)
            }
        };

        Err(SyntaxDiagnostic {
            message,
            line: Some(line),
        })
    }
}

/// Depth-first search for the first `ERROR` or `MISSING` node.
#[cfg(feature = "ast")]
fn first_error(node: tree_sitter::Node) -> Option<tree_sitter::Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            if child.has_error() || child.is_missing() {
                if let Some(found) = first_error(child) {
                    return Some(found);
                }
            }
        }
    }
    None
}
