use crate::config::Severity;
use crate::rules::{MatchContext, Rule, RuleBuildError};
use crate::text::{self, Region};
use regex::Regex;
use std::sync::LazyLock;

/// Statement shapes that must end in `;`: assignments (with or without a
/// declaration keyword), updates, `return` with an argument and call statements.
static STATEMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^(?:(?:(?:const|let|var)\s+)?[A-Za-z_$][\w$]*(?:\.[A-Za-z_$][\w$]*|\[[^\]]*\])*\s*(?:[-+*/%&|^]|\*\*|<<|>>>?|\?\?|&&|\|\|)?=[^=>]|[A-Za-z_$][\w$.]*(?:\+\+|--)$|(?:\+\+|--)[A-Za-z_$]|return\s+\S|(?:await\s+)?[A-Za-z_$][\w$]*(?:\.[A-Za-z_$][\w$]*)*\()"#,
    )
    .unwrap()
});

const CONTROL_KEYWORDS: &[&str] = &[
    "if", "for", "while", "switch", "catch", "function", "return", "typeof", "do", "else", "with",
];

/// Characters after which a line is incomplete or already terminated.
const NO_TERMINATOR_AFTER: &[u8] = b";{}([,:=+-*/%&|<>!?.\\";

/// Leading tokens that continue the previous line's expression.
const CONTINUATIONS: &[&str] = &[".", "?", ":", "+", "-", "*", "/", ",", ")", "]", "&&", "||"];

pub fn rules() -> Result<Vec<Rule>, RuleBuildError> {
    Ok(vec![Rule::new(
        "missing-semicolon",
        r"(?m)[ \t\r]*$",
        "Missing semicolon",
        Severity::Warning,
    )?
    .with_confirm(needs_terminator)
    .with_fix(insert_semicolon)])
}

/// The match is the (possibly empty) trailing whitespace of a line; accept it
/// when the code before it is an unterminated statement.
fn needs_terminator(ctx: &MatchContext<'_>) -> bool {
    let before = &ctx.full[..ctx.start];
    // Empty matches after trailing whitespace would duplicate the real one.
    let Some(last) = before.bytes().last() else {
        return false;
    };
    let update = before.ends_with("++") || before.ends_with("--");
    if matches!(last, b' ' | b'\t' | b'\r' | b'\n')
        || (!update && NO_TERMINATOR_AFTER.contains(&last))
    {
        return false;
    }
    // The line must end in code or right after a closed string, not inside a
    // comment or a multi-line template.
    match ctx.code().region_at(ctx.start - 1) {
        Some((_, Region::Code)) => {}
        Some((range, Region::Literal)) if range.end == ctx.start => {}
        _ => return false,
    }

    let (line_start, _) = text::line_bounds(ctx.full, ctx.start);
    let line = before[line_start..].trim();
    if line.starts_with("//") || line.starts_with("/*") || line.starts_with('*') {
        return false;
    }
    if !is_statement(line) {
        return false;
    }

    match text::next_non_blank_line(ctx.full, ctx.start) {
        Some(next) => !CONTINUATIONS.iter().any(|c| next.starts_with(c)),
        None => true,
    }
}

fn is_statement(line: &str) -> bool {
    if !STATEMENT_RE.is_match(line) {
        return false;
    }
    let head: String = line
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '$')
        .collect();
    // `return x` is a statement; `if (x)` and friends are not.
    head == "return" || !CONTROL_KEYWORDS.contains(&head.as_str())
}

fn insert_semicolon(matched: &str, _: &[Option<String>]) -> Option<String> {
    Some(format!(";{}", matched))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::{fixed, run};

    fn rule() -> Rule {
        rules().unwrap().remove(0)
    }

    fn lines_flagged(content: &str) -> Vec<usize> {
        run(&rule(), content)
            .iter()
            .filter_map(|f| f.line)
            .collect()
    }

    #[test]
    fn flags_assignment_without_semicolon() {
        let findings = run(&rule(), "let total = 5\n");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, Some(1));
        assert_eq!(findings[0].matched, "");
        assert_eq!(fixed("let total = 5\n", &findings[0]), "let total = 5;\n");
    }

    #[test]
    fn keeps_trailing_whitespace_after_inserted_semicolon() {
        let content = "x = 10  \r\ny = 2;";
        let findings = run(&rule(), content);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].matched, "  \r");
        assert_eq!(fixed(content, &findings[0]), "x = 10;  \r\ny = 2;");
    }

    #[test]
    fn flags_call_statements_and_updates() {
        let content = "doThing(a, b)\ncounter++\nobj.method()\nreturn value\n";
        assert_eq!(lines_flagged(content), [1, 2, 3, 4]);
    }

    #[test]
    fn flags_unclosed_call_statement() {
        assert_eq!(lines_flagged("  console.log(\"Hello world\"\n"), [1]);
    }

    #[test]
    fn flags_compound_and_member_assignment() {
        let content = "total += step\nel.style.color = 'red'\nitems[0] = first\n";
        assert_eq!(lines_flagged(content), [1, 2, 3]);
    }

    #[test]
    fn ignores_terminated_and_open_lines() {
        let content = "const a = 1;\nconst f = () => {\nlet s = 'a' +\n  'b';\nfoo(a,\n  b);\n}\n";
        assert!(lines_flagged(content).is_empty());
    }

    #[test]
    fn ignores_control_flow_and_comparisons() {
        let content = "if (a == b) run()\nwhile (x) step()\nfunction go()\nx == 1\na <= b\n";
        assert!(lines_flagged(content).is_empty());
    }

    #[test]
    fn ignores_comments_and_blank_lines() {
        let content = "// x = 1\n\n   \n/* y = 2 */\n * z = 3\n";
        assert!(lines_flagged(content).is_empty());
    }

    #[test]
    fn ignores_line_continued_by_next_line() {
        let content = "const result = fetchAll()\n  .then(parse)\n  .catch(fail);\n";
        assert!(lines_flagged(content).is_empty());
    }

    #[test]
    fn flags_last_line_without_newline() {
        let content = "a = 1;\nb = 2";
        let findings = run(&rule(), content);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, Some(2));
        assert_eq!(fixed(content, &findings[0]), "a = 1;\nb = 2;");
    }

    #[test]
    fn ignores_line_ending_inside_template_literal() {
        let content = "const s = `line one\nline two`;\n";
        assert!(lines_flagged(content).is_empty());
    }
}
