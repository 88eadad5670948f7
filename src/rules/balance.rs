//! Unbalanced delimiters. Only the console-call case has a safe fix; a missing
//! brace or quote could belong anywhere, so those are reported only.

use crate::config::Severity;
use crate::rules::{MatchContext, Rule, RuleBuildError};
use crate::text;

pub fn rules() -> Result<Vec<Rule>, RuleBuildError> {
    Ok(vec![
        Rule::new(
            "unclosed-console-call",
            r"(?m)\bconsole\.(?:log|info|warn|error|debug|trace|table)[ \t]*\([^\n]*$",
            "Missing closing parenthesis in console call",
            Severity::Error,
        )?
        .with_confirm(console_call_left_open)
        .with_fix(close_console_call),
        Rule::new(
            "unclosed-brace",
            r"\{",
            "Unclosed curly brace",
            Severity::Error,
        )?
        .with_confirm(|ctx| ctx.code().balance().unclosed_brace == Some(ctx.start)),
        Rule::new(
            "unclosed-paren",
            r"\(",
            "Unclosed parenthesis",
            Severity::Error,
        )?
        .with_confirm(|ctx| ctx.code().balance().unclosed_paren == Some(ctx.start)),
        Rule::new(
            "unclosed-string",
            r#"["'`]"#,
            "Unclosed string literal",
            Severity::Error,
        )?
        .with_confirm(|ctx| ctx.code().balance().unclosed_string == Some(ctx.start)),
    ])
}

/// The call's opening parenthesis is never closed anywhere in the text, and
/// the rest of the line holds no unterminated string (appending `)` would land
/// inside it).
fn console_call_left_open(ctx: &MatchContext<'_>) -> bool {
    let Some(paren) = ctx.matched.find('(') else {
        return false;
    };
    let open = ctx.start + paren;
    ctx.code().in_code(ctx.start)
        && ctx.code().matching_close(open).is_none()
        && text::balance(ctx.matched).unclosed_string.is_none()
}

/// Closers go after the last code on the line, ahead of any trailing comment.
fn close_console_call(matched: &str, _: &[Option<String>]) -> Option<String> {
    let mut split = 0;
    text::regions(matched, |range, region| {
        let piece = matched[range.clone()].trim_end();
        if region != text::Region::Comment && !piece.is_empty() {
            split = range.start + piece.len();
        }
    });
    let (code, trailing) = matched.split_at(split);
    let open = count_unclosed_parens(code);
    if open == 0 {
        return None;
    }
    let closers = ")".repeat(open);
    Some(match code.strip_suffix(';') {
        Some(head) => format!("{}{};{}", head.trim_end(), closers, trailing),
        None => format!("{}{}{}", code, closers, trailing),
    })
}

fn count_unclosed_parens(code: &str) -> usize {
    let mut depth = 0usize;
    text::walk_code(code, |_, b| match b {
        b'(' => depth += 1,
        b')' => depth = depth.saturating_sub(1),
        _ => {}
    });
    depth
}
