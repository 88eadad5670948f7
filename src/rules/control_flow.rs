use crate::config::Severity;
use crate::rules::{terminated, MatchContext, Rule, RuleBuildError};
use crate::text;

pub fn rules() -> Result<Vec<Rule>, RuleBuildError> {
    Ok(vec![
        Rule::new(
            "if-without-block",
            r"(?m)\bif[ \t]*\(((?:[^()\n]|\([^()\n]*\))*)\)[ \t]*([^\s{;/][^\n]*?)([ \t\r]*)$",
            "If statement body should be wrapped in braces",
            Severity::Warning,
        )?
        .with_confirm(single_statement_if)
        .with_fix(wrap_if),
        Rule::new(
            "else-without-block",
            r"(?m)\belse[ \t]+([^\s{;][^\n]*?)([ \t\r]*)$",
            "Else body should be wrapped in braces",
            Severity::Warning,
        )?
        .with_confirm(single_statement_else)
        .with_fix(wrap_else),
    ])
}

fn single_statement_if(ctx: &MatchContext<'_>) -> bool {
    ctx.code().in_code(ctx.start) && ctx.group(2).is_some_and(is_wrappable)
}

fn single_statement_else(ctx: &MatchContext<'_>) -> bool {
    let Some(body) = ctx.group(1) else {
        return false;
    };
    let chained_if = body.starts_with("if") && !body[2..].starts_with(|c: char| {
        c.is_ascii_alphanumeric() || c == '_' || c == '$'
    });
    !chained_if && ctx.code().in_code(ctx.start) && is_wrappable(body)
}

/// A body can be braced in place when it is one self-contained statement on
/// the same line: no `else`, no block, no comment, no open bracket or string.
fn is_wrappable(body: &str) -> bool {
    !text::contains_word(body, "else")
        && !body.contains(['{', '}'])
        && !body.contains("//")
        && !body.contains("/*")
        && text::balance(body) == text::Balance::default()
}

fn wrap_if(_: &str, groups: &[Option<String>]) -> Option<String> {
    let cond = groups.get(1)?.as_deref()?;
    let body = groups.get(2)?.as_deref()?;
    let trailing = groups.get(3).and_then(|g| g.as_deref()).unwrap_or("");
    Some(format!("if ({}) {{ {} }}{}", cond, terminated(body), trailing))
}

fn wrap_else(_: &str, groups: &[Option<String>]) -> Option<String> {
    let body = groups.get(1)?.as_deref()?;
    let trailing = groups.get(2).and_then(|g| g.as_deref()).unwrap_or("");
    Some(format!("else {{ {} }}{}", terminated(body), trailing))
}
