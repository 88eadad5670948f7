use crate::config::Severity;
use crate::fixer::{self, FixReport};
use crate::rules::registry::RuleRegistry;
use crate::rules::{Finding, RuleBuildError};
use crate::symbols::{AmbientGlobals, KnownSymbols};
use crate::syntax::{self, SyntaxCheck, SyntaxDiagnostic};
use std::panic::{self, AssertUnwindSafe};

/// Rule id used for the single finding produced by a failed syntax check.
pub const SYNTAX_ERROR_ID: &str = "syntax-error";

/// Runs the syntax check and every registered rule over a text.
///
/// An `Analyzer` holds no per-scan state; share one across threads to scan
/// many files at once.
pub struct Analyzer {
    registry: RuleRegistry,
    syntax: Box<dyn SyntaxCheck>,
    symbols: Box<dyn KnownSymbols>,
}

impl Analyzer {
    pub fn new(registry: RuleRegistry) -> Self {
        Self {
            registry,
            syntax: syntax::default_checker(),
            symbols: Box::new(AmbientGlobals::builtin()),
        }
    }

    /// All built-in rules with the default syntax check and globals.
    pub fn builtin() -> Result<Self, RuleBuildError> {
        Ok(Self::new(RuleRegistry::builtin()?))
    }

    pub fn with_syntax_check(mut self, check: impl SyntaxCheck + 'static) -> Self {
        self.syntax = Box::new(check);
        self
    }

    pub fn with_symbols(mut self, symbols: impl KnownSymbols + 'static) -> Self {
        self.symbols = Box::new(symbols);
        self
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Findings for `text`: the syntax finding (if any) first, then each
    /// rule's matches in registration order, left to right within a rule.
    pub fn analyze(&self, text: &str) -> Vec<Finding> {
        let mut findings = Vec::new();

        if let Some(finding) = self.syntax_finding(text) {
            findings.push(finding);
        }

        for rule in &self.registry {
            let symbols = self.symbols.as_ref();
            match panic::catch_unwind(AssertUnwindSafe(|| rule.find_all(text, symbols))) {
                Ok(found) => {
                    if !found.is_empty() {
                        tracing::debug!(rule = rule.id(), count = found.len(), "rule matched");
                    }
                    findings.extend(found);
                }
                Err(_) => {
                    tracing::warn!(rule = rule.id(), "rule panicked; skipping its findings");
                }
            }
        }

        tracing::debug!(findings = findings.len(), bytes = text.len(), "analyzed text");
        findings
    }

    /// Analyze `text` and apply every fix that can be applied.
    pub fn fix(&self, text: &str) -> (FixReport, Vec<Finding>) {
        let findings = self.analyze(text);
        let report = fixer::fix_with_report(text, &findings);
        (report, findings)
    }

    fn syntax_finding(&self, text: &str) -> Option<Finding> {
        let diag = match panic::catch_unwind(AssertUnwindSafe(|| self.syntax.check(text))) {
            Ok(Ok(())) => return None,
            Ok(Err(diag)) => diag,
            Err(_) => {
                tracing::warn!("syntax check panicked; continuing without it");
                return None;
            }
        };

        let SyntaxDiagnostic { message, line } = diag;
        let line = line.or_else(|| syntax::extract_line(&message));
        Some(Finding {
            rule_id: SYNTAX_ERROR_ID.to_string(),
            severity: Severity::Error,
            message,
            line,
            column: None,
            offset: 0,
            len: 0,
            matched: String::new(),
            groups: Vec::new(),
            fix: None,
        })
    }
}
