use crate::config::Severity;
use crate::rules::registry::RuleRegistry;
use crate::rules::Finding;
use crate::scan::{FileFindings, FixSummary, ScanResult};
use serde_json::json;
use std::io::Write;

/// Print findings grouped by file with ANSI colors.
pub fn print_pretty(result: &ScanResult) {
    let mut out = std::io::stdout();
    write_pretty(result, &mut out);
}

fn write_pretty(result: &ScanResult, out: &mut dyn Write) {
    if result.findings().next().is_none() {
        let _ = writeln!(
            out,
            "\x1b[32m✓\x1b[0m No issues found ({} files scanned, {} rules loaded)",
            result.files_scanned, result.rules_loaded
        );
        return;
    }

    for file in result.files.iter().filter(|f| !f.findings.is_empty()) {
        let _ = writeln!(out, "\n\x1b[4m{}\x1b[0m", file.path.display());
        for f in &file.findings {
            let severity_str = match f.severity {
                Severity::Error => "\x1b[31merror\x1b[0m",
                Severity::Warning => "\x1b[33mwarn \x1b[0m",
            };
            let fixable = if f.is_fixable() {
                " \x1b[36m(fixable)\x1b[0m"
            } else {
                ""
            };

            let _ = writeln!(
                out,
                "  \x1b[90m{:<8}\x1b[0m {} \x1b[90m{:<25}\x1b[0m {}{}",
                location(f),
                severity_str,
                f.rule_id,
                f.message,
                fixable
            );

            if let Some(source) = source_line(file, f) {
                let _ = writeln!(out, "           \x1b[90m│\x1b[0m {}", source.trim());
            }

            if let Some(fix) = f.suggested_fix() {
                let _ = writeln!(
                    out,
                    "           \x1b[90m└─\x1b[0m \x1b[36m{:?} → {:?}\x1b[0m",
                    fix.old.trim_end(),
                    fix.new.trim_end()
                );
            }
        }
    }

    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);

    let _ = writeln!(out);
    let _ = write!(out, "\x1b[1m");
    if errors > 0 {
        let _ = write!(out, "\x1b[31m{} error{}\x1b[0m\x1b[1m", errors, plural(errors));
    }
    if errors > 0 && warnings > 0 {
        let _ = write!(out, ", ");
    }
    if warnings > 0 {
        let _ = write!(out, "\x1b[33m{} warning{}\x1b[0m\x1b[1m", warnings, plural(warnings));
    }
    let _ = writeln!(
        out,
        " ({} files scanned, {} rules loaded)\x1b[0m",
        result.files_scanned, result.rules_loaded
    );
}

/// Print findings as structured JSON.
pub fn print_json(result: &ScanResult) {
    let mut out = std::io::stdout();
    write_json(result, &mut out);
}

fn write_json(result: &ScanResult, out: &mut dyn Write) {
    let files: Vec<_> = result
        .files
        .iter()
        .map(|file| {
            json!({
                "file": file.path.display().to_string(),
                "findings": findings_json(&file.findings),
            })
        })
        .collect();

    let output = json!({
        "files": files,
        "summary": {
            "total": result.findings().count(),
            "errors": result.count(Severity::Error),
            "warnings": result.count(Severity::Warning),
            "fixable": result.findings().filter(|f| f.is_fixable()).count(),
            "files_scanned": result.files_scanned,
            "rules_loaded": result.rules_loaded,
        },
    });

    let _ = writeln!(out, "{:#}", output);
}

/// JSON form of one finding, shared with the tool server.
pub fn finding_json(f: &Finding) -> serde_json::Value {
    json!({
        "rule_id": f.rule_id,
        "severity": f.severity.as_str(),
        "line": f.line,
        "column": f.column,
        "offset": f.offset,
        "length": f.len,
        "matched": f.matched,
        "message": f.message,
        "fixable": f.is_fixable(),
        "fix": f.suggested_fix().map(|fix| json!({
            "old": fix.old,
            "new": fix.new,
        })),
    })
}

pub fn findings_json(findings: &[Finding]) -> Vec<serde_json::Value> {
    findings.iter().map(finding_json).collect()
}

/// Print findings in compact one-line-per-finding format.
/// Findings go to stdout; summary goes to stderr.
pub fn print_compact(result: &ScanResult) {
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    write_compact(result, &mut stdout, &mut stderr);
}

fn write_compact(result: &ScanResult, out: &mut dyn Write, err: &mut dyn Write) {
    for file in &result.files {
        for f in &file.findings {
            let _ = writeln!(
                out,
                "{}:{}:{}: {}[{}] {}",
                file.path.display(),
                f.line.unwrap_or(1),
                f.column.unwrap_or(1),
                f.severity.as_str(),
                f.rule_id,
                f.message
            );
        }
    }

    write_summary_stderr(result, err);
}

/// Print findings as GitHub Actions workflow commands.
/// Findings go to stdout; summary goes to stderr.
pub fn print_github(result: &ScanResult) {
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    write_github(result, &mut stdout, &mut stderr);
}

fn write_github(result: &ScanResult, out: &mut dyn Write, err: &mut dyn Write) {
    for file in &result.files {
        for f in &file.findings {
            let mut props = format!("file={}", file.path.display());
            if let Some(line) = f.line {
                props.push_str(&format!(",line={}", line));
            }
            if let Some(col) = f.column {
                props.push_str(&format!(",col={}", col));
            }
            props.push_str(&format!(",title={}", f.rule_id));

            let _ = writeln!(out, "::{} {}::{}", f.severity.as_str(), props, f.message);
        }
    }

    write_summary_stderr(result, err);
}

fn write_summary_stderr(result: &ScanResult, err: &mut dyn Write) {
    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);

    if errors > 0 || warnings > 0 {
        let mut parts = Vec::new();
        if errors > 0 {
            parts.push(format!("{} error{}", errors, plural(errors)));
        }
        if warnings > 0 {
            parts.push(format!("{} warning{}", warnings, plural(warnings)));
        }
        let _ = writeln!(
            err,
            "{} ({} files scanned, {} rules loaded)",
            parts.join(", "),
            result.files_scanned,
            result.rules_loaded
        );
    } else {
        let _ = writeln!(
            err,
            "No issues found ({} files scanned, {} rules loaded)",
            result.files_scanned, result.rules_loaded
        );
    }
}

/// Print the rule catalogue as a table.
pub fn print_rules(registry: &RuleRegistry) {
    let mut out = std::io::stdout();
    write_rules(registry, &mut out);
}

fn write_rules(registry: &RuleRegistry, out: &mut dyn Write) {
    for rule in registry {
        let _ = writeln!(
            out,
            "{:<26} {:<8} {:<8} {}",
            rule.id(),
            rule.severity().as_str(),
            if rule.is_fixable() { "fixable" } else { "-" },
            rule.message()
        );
    }
}

/// Report what a fix run did. Goes to stderr so stdout stays free for
/// fixed stdin text.
pub fn print_fix_summary(summary: &FixSummary) {
    let mut err = std::io::stderr();
    write_fix_summary(summary, &mut err);
}

fn write_fix_summary(summary: &FixSummary, err: &mut dyn Write) {
    let verb = if summary.dry_run { "would apply" } else { "applied" };
    for file in summary.files.iter().filter(|f| f.changed()) {
        let _ = writeln!(
            err,
            "  {} {} fix{} in {}",
            verb,
            file.report.applied,
            if file.report.applied == 1 { "" } else { "es" },
            file.path.display()
        );
    }

    let applied = summary.applied();
    let remaining = summary.remaining();
    let mark = if remaining == 0 {
        "\x1b[32m✓\x1b[0m"
    } else {
        "\x1b[33m!\x1b[0m"
    };
    let _ = writeln!(
        err,
        "{} {} {} fix{} across {} file{}; {} issue{} remaining",
        mark,
        if summary.dry_run { "Would apply" } else { "Applied" },
        applied,
        if applied == 1 { "" } else { "es" },
        summary.files_changed(),
        plural(summary.files_changed()),
        remaining,
        plural(remaining)
    );
}

fn location(f: &Finding) -> String {
    match (f.line, f.column) {
        (Some(l), Some(c)) => format!("{}:{}", l, c),
        (Some(l), None) => format!("{}:1", l),
        _ => "-".to_string(),
    }
}

fn source_line<'a>(file: &'a FileFindings, f: &Finding) -> Option<&'a str> {
    // syntax findings have a line but no column; their line may be a guess
    f.column?;
    file.source.lines().nth(f.line?.checked_sub(1)?)
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}
