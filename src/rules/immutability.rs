use crate::config::Severity;
use crate::rules::{MatchContext, Rule, RuleBuildError};
use crate::text;
use regex::Regex;

pub fn rules() -> Result<Vec<Rule>, RuleBuildError> {
    Ok(vec![Rule::new(
        "const-reassignment",
        r"\bconst[ \t]+([A-Za-z_$][\w$]*)[ \t]*=",
        "Cannot reassign constant variable",
        Severity::Error,
    )?
    .with_confirm(is_reassigned_later)
    .with_fix(relax_to_let)])
}

/// Accept a `const NAME =` declaration when `NAME` is assigned or updated
/// anywhere after it.
fn is_reassigned_later(ctx: &MatchContext<'_>) -> bool {
    let Some(name) = ctx.group(1) else {
        return false;
    };
    if !ctx.code().in_code(ctx.start) {
        return false;
    }

    let name = regex::escape(name);
    let pattern = format!(
        r"(?:^|[^\w$.])((?:\+\+|--)[ \t]*{name}\b|{name}(?:[ \t]*(?:\+\+|--)|[ \t]*(?:[-+*/%&|^]|\*\*|<<|>>>?|\?\?|&&|\|\|)?=(?:[^=>]|$)))",
    );
    let Ok(assignment) = Regex::new(&pattern) else {
        return false;
    };

    let rest = &ctx.full[ctx.end..];
    let found = assignment.captures_iter(rest).any(|caps| {
        let Some(target) = caps.get(1) else {
            return false;
        };
        let at = ctx.end + target.start();
        // `let x = ...` in another scope is a new binding, not a reassignment.
        let prefix = ctx.full[..at].trim_end();
        let redeclared = ["let", "var", "const"].iter().any(|kw| {
            prefix.ends_with(kw)
                && !prefix[..prefix.len() - kw.len()]
                    .bytes()
                    .last()
                    .is_some_and(text::is_ident_byte)
        });
        !redeclared && ctx.code().in_code(ctx.end + target.end() - 1)
    });
    found
}

fn relax_to_let(matched: &str, _: &[Option<String>]) -> Option<String> {
    matched.strip_prefix("const").map(|rest| format!("let{}", rest))
}
