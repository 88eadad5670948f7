pub mod balance;
pub mod completeness;
pub mod control_flow;
pub mod immutability;
pub mod registry;
pub mod spelling;
pub mod termination;
pub mod undefined;

use crate::config::Severity;
use crate::symbols::KnownSymbols;
use crate::text;
use regex::{Captures, Regex};
use std::cell::{OnceCell, RefCell};
use std::collections::HashMap;
use std::ops::Range;
use std::panic::{self, AssertUnwindSafe};

/// Secondary check run on every pattern match; returning `false` drops the match.
pub type ConfirmFn = for<'a> fn(&MatchContext<'a>) -> bool;

/// Rewrite for a matched span, given the matched text and its capture groups
/// (index 0 is the whole match). `None` leaves the span untouched.
pub type FixFn = fn(&str, &[Option<String>]) -> Option<String>;

/// A heuristic: a pattern plus optional confirmation and fix behavior.
///
/// Rules carry no per-scan state, so one instance can be searched over any
/// number of texts, from any number of threads.
#[derive(Debug, Clone)]
pub struct Rule {
    id: &'static str,
    pattern: Regex,
    message: &'static str,
    severity: Severity,
    confirm: Option<ConfirmFn>,
    fix: Option<FixFn>,
}

/// Everything a confirmation predicate may look at for one match.
pub struct MatchContext<'a> {
    pub matched: &'a str,
    pub start: usize,
    pub end: usize,
    /// The complete text being scanned.
    pub full: &'a str,
    pub symbols: &'a dyn KnownSymbols,
    captures: &'a Captures<'a>,
    facts: &'a TextFacts,
}

/// Facts about the searched text, shared by every match of one search and
/// computed on first use.
#[derive(Default)]
struct TextFacts {
    code: OnceCell<text::CodeMap>,
    memo: RefCell<HashMap<String, bool>>,
}

impl<'a> MatchContext<'a> {
    /// Capture group `i` of the match, if it participated.
    pub fn group(&self, i: usize) -> Option<&'a str> {
        self.captures.get(i).map(|m| m.as_str())
    }

    /// Comment/literal layout of the full text.
    pub fn code(&self) -> &'a text::CodeMap {
        self.facts.code.get_or_init(|| text::CodeMap::new(self.full))
    }

    /// Cache a per-text answer under `key` for the rest of this search.
    pub fn remember(&self, key: &str, compute: impl FnOnce() -> bool) -> bool {
        if let Some(&known) = self.facts.memo.borrow().get(key) {
            return known;
        }
        let value = compute();
        self.facts.memo.borrow_mut().insert(key.to_string(), value);
        value
    }
}

/// Machine-actionable fix data for a finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fix {
    pub old: String,
    pub new: String,
}

/// A single issue reported by the analyzer.
#[derive(Debug, Clone)]
pub struct Finding {
    pub rule_id: String,
    pub severity: Severity,
    pub message: String,
    pub line: Option<usize>,
    pub column: Option<usize>,
    /// Byte offset of the match in the scanned text.
    pub offset: usize,
    /// Byte length of the match.
    pub len: usize,
    pub matched: String,
    pub groups: Vec<Option<String>>,
    pub fix: Option<FixFn>,
}

impl Finding {
    pub fn span(&self) -> Range<usize> {
        self.offset..self.offset + self.len
    }

    pub fn is_fixable(&self) -> bool {
        self.fix.is_some()
    }

    /// Run the fix function for this finding.
    ///
    /// Returns `None` when the rule has no fix, declines to rewrite, or panics.
    pub fn replacement(&self) -> Option<String> {
        let fix = self.fix?;
        match panic::catch_unwind(AssertUnwindSafe(|| fix(&self.matched, &self.groups))) {
            Ok(replacement) => replacement,
            Err(_) => {
                tracing::warn!(rule = %self.rule_id, offset = self.offset, "fix function panicked");
                None
            }
        }
    }

    /// The edit this finding would make, if it makes one.
    pub fn suggested_fix(&self) -> Option<Fix> {
        self.replacement()
            .filter(|new| *new != self.matched)
            .map(|new| Fix {
                old: self.matched.clone(),
                new,
            })
    }
}

impl Rule {
    pub fn new(
        id: &'static str,
        pattern: &str,
        message: &'static str,
        severity: Severity,
    ) -> Result<Self, RuleBuildError> {
        let pattern =
            Regex::new(pattern).map_err(|e| RuleBuildError::InvalidRegex(id.to_string(), e))?;
        Ok(Self {
            id,
            pattern,
            message,
            severity,
            confirm: None,
            fix: None,
        })
    }

    pub fn with_confirm(mut self, confirm: ConfirmFn) -> Self {
        self.confirm = Some(confirm);
        self
    }

    pub fn with_fix(mut self, fix: FixFn) -> Self {
        self.fix = Some(fix);
        self
    }

    pub fn id(&self) -> &'static str {
        self.id
    }

    pub fn message(&self) -> &'static str {
        self.message
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn is_fixable(&self) -> bool {
        self.fix.is_some()
    }

    /// Search the whole of `content` and return every confirmed match,
    /// left to right.
    pub fn find_all(&self, content: &str, symbols: &dyn KnownSymbols) -> Vec<Finding> {
        let mut findings = Vec::new();
        let facts = TextFacts::default();

        for caps in self.pattern.captures_iter(content) {
            let Some(m) = caps.get(0) else { continue };

            if let Some(confirm) = self.confirm {
                let ctx = MatchContext {
                    matched: m.as_str(),
                    start: m.start(),
                    end: m.end(),
                    full: content,
                    symbols,
                    captures: &caps,
                    facts: &facts,
                };
                if !confirm(&ctx) {
                    continue;
                }
            }

            findings.push(Finding {
                rule_id: self.id.to_string(),
                severity: self.severity,
                message: self.message.to_string(),
                line: Some(text::line_number(content, m.start())),
                column: Some(text::column_number(content, m.start())),
                offset: m.start(),
                len: m.len(),
                matched: m.as_str().to_string(),
                groups: caps
                    .iter()
                    .map(|g| g.map(|g| g.as_str().to_string()))
                    .collect(),
                fix: self.fix,
            });
        }

        findings
    }
}

/// Errors that can occur when constructing a rule.
#[derive(Debug)]
pub enum RuleBuildError {
    InvalidRegex(String, regex::Error),
}

impl std::fmt::Display for RuleBuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleBuildError::InvalidRegex(id, err) => {
                write!(f, "rule '{}': invalid regex: {}", id, err)
            }
        }
    }
}

impl std::error::Error for RuleBuildError {}

/// Append a `;` to a statement unless it already ends a statement or block.
pub(crate) fn terminated(stmt: &str) -> String {
    let stmt = stmt.trim_end();
    if stmt.ends_with(';') || stmt.ends_with('}') {
        stmt.to_string()
    } else {
        format!("{};", stmt)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::symbols::AmbientGlobals;

    /// Run a single rule over `content` with the built-in globals.
    pub fn run(rule: &Rule, content: &str) -> Vec<Finding> {
        rule.find_all(content, &AmbientGlobals::builtin())
    }

    /// Apply a finding's fix to its own span within `content`.
    pub fn fixed(content: &str, finding: &Finding) -> String {
        let mut out = content.to_string();
        let new = finding.replacement().expect("finding should be fixable");
        out.replace_range(finding.span(), &new);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::AmbientGlobals;

    fn never(_: &MatchContext<'_>) -> bool {
        false
    }

    fn only_second_word(ctx: &MatchContext<'_>) -> bool {
        ctx.start > 0
    }

    fn upper(m: &str, _: &[Option<String>]) -> Option<String> {
        Some(m.to_uppercase())
    }

    #[test]
    fn find_all_reports_every_match_in_order() {
        let rule = Rule::new("words", r"\b(\w+)\b", "word", Severity::Warning).unwrap();
        let findings = rule.find_all("one two\nthree", &AmbientGlobals::builtin());
        let matched: Vec<_> = findings.iter().map(|f| f.matched.as_str()).collect();
        assert_eq!(matched, ["one", "two", "three"]);
        assert_eq!(findings[2].line, Some(2));
        assert_eq!(findings[2].column, Some(1));
        assert_eq!(findings[1].offset, 4);
        assert_eq!(findings[1].len, 3);
        assert_eq!(findings[1].groups[1].as_deref(), Some("two"));
    }

    #[test]
    fn repeated_searches_are_independent() {
        let rule = Rule::new("words", r"\w+", "word", Severity::Warning).unwrap();
        let symbols = AmbientGlobals::builtin();
        let first = rule.find_all("a b c", &symbols);
        let second = rule.find_all("a b c", &symbols);
        assert_eq!(first.len(), 3);
        assert_eq!(second.len(), 3);
    }

    #[test]
    fn confirm_filters_matches() {
        let symbols = AmbientGlobals::builtin();
        let rule = Rule::new("w", r"\w+", "w", Severity::Warning)
            .unwrap()
            .with_confirm(never);
        assert!(rule.find_all("a b", &symbols).is_empty());

        let rule = Rule::new("w", r"\w+", "w", Severity::Warning)
            .unwrap()
            .with_confirm(only_second_word);
        let findings = rule.find_all("a b", &symbols);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].matched, "b");
    }

    #[test]
    fn finding_carries_rule_fix() {
        let rule = Rule::new("w", r"\w+", "w", Severity::Error)
            .unwrap()
            .with_fix(upper);
        let findings = rule.find_all("abc", &AmbientGlobals::builtin());
        assert!(findings[0].is_fixable());
        assert_eq!(
            findings[0].suggested_fix(),
            Some(Fix {
                old: "abc".into(),
                new: "ABC".into()
            })
        );
    }

    #[test]
    fn unfixable_finding_has_no_replacement() {
        let rule = Rule::new("w", r"\w+", "w", Severity::Error).unwrap();
        let findings = rule.find_all("abc", &AmbientGlobals::builtin());
        assert!(!findings[0].is_fixable());
        assert_eq!(findings[0].replacement(), None);
        assert_eq!(findings[0].suggested_fix(), None);
    }

    #[test]
    fn panicking_fix_yields_no_replacement() {
        fn bad_index(_: &str, groups: &[Option<String>]) -> Option<String> {
            groups[7].clone()
        }
        let rule = Rule::new("w", r"\w+", "w", Severity::Error)
            .unwrap()
            .with_fix(bad_index);
        let findings = rule.find_all("abc", &AmbientGlobals::builtin());
        assert_eq!(findings[0].replacement(), None);
    }

    #[test]
    fn context_memo_and_code_map_are_shared_across_matches() {
        fn first_call_only(ctx: &MatchContext<'_>) -> bool {
            // only the first match computes; later matches see the cached value
            ctx.remember("seen", || ctx.start == 0) && ctx.code().in_code(ctx.start)
        }
        let rule = Rule::new("w", r"\w+", "w", Severity::Warning)
            .unwrap()
            .with_confirm(first_call_only);
        let findings = rule.find_all("a b // c", &AmbientGlobals::builtin());
        let matched: Vec<_> = findings.iter().map(|f| f.matched.as_str()).collect();
        assert_eq!(matched, ["a", "b"]);
    }

    #[test]
    fn invalid_regex_error() {
        let err = Rule::new("broken", r"(unclosed", "x", Severity::Error).unwrap_err();
        assert!(matches!(err, RuleBuildError::InvalidRegex(ref id, _) if id == "broken"));
        assert!(err.to_string().contains("rule 'broken'"));
    }

    #[test]
    fn terminated_appends_semicolon_once() {
        assert_eq!(terminated("x = 1"), "x = 1;");
        assert_eq!(terminated("x = 1;  "), "x = 1;");
        assert_eq!(terminated("f(() => {})"), "f(() => {});");
        assert_eq!(terminated("{ a(); }"), "{ a(); }");
    }
}
