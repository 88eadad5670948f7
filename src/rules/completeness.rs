use crate::config::Severity;
use crate::rules::{MatchContext, Rule, RuleBuildError};
use crate::text;

pub fn rules() -> Result<Vec<Rule>, RuleBuildError> {
    Ok(vec![Rule::new(
        "function-without-return",
        r"\bfunction\b[ \t]*\*?[ \t]*([A-Za-z_$][\w$]*)?[ \t]*\([^()]*\)[ \t]*\{",
        "Function has no return statement",
        Severity::Warning,
    )?
    .with_confirm(body_lacks_return)])
}

/// Look at the body up to its closing brace (or end of text when the brace is
/// never closed) for a `return`. Capitalized names are taken as constructors,
/// which legitimately return nothing.
fn body_lacks_return(ctx: &MatchContext<'_>) -> bool {
    if ctx.group(1).is_some_and(|name| name.starts_with(|c: char| c.is_ascii_uppercase())) {
        return false;
    }
    if !ctx.code().in_code(ctx.start) {
        return false;
    }
    let open = ctx.end - 1;
    let close = ctx.code().matching_close(open).unwrap_or(ctx.full.len());

    let mut code = String::with_capacity(close - open);
    for (range, region) in ctx.code().regions_within(open + 1..close) {
        if region == text::Region::Code {
            code.push_str(&ctx.full[range]);
        }
        code.push(' ');
    }
    !text::contains_word(&code, "return")
}
