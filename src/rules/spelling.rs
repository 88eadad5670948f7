use crate::config::Severity;
use crate::rules::{MatchContext, Rule, RuleBuildError};

pub fn rules() -> Result<Vec<Rule>, RuleBuildError> {
    Ok(vec![
        Rule::new(
            "function-keyword-typo",
            r"\b(?:fucntion|funtion|functoin)\b",
            "Misspelled keyword 'function'",
            Severity::Error,
        )?
        .with_confirm(in_code)
        .with_fix(|_, _| Some("function".to_string())),
        Rule::new(
            "document-typo",
            r"\b(?:docuemnt|documnet)\b",
            "Misspelled global 'document'",
            Severity::Error,
        )?
        .with_confirm(in_code)
        .with_fix(|_, _| Some("document".to_string())),
        Rule::new(
            "get-element-by-id-case",
            r"\bgetElementByID\b",
            "Incorrect case in 'getElementById'",
            Severity::Error,
        )?
        .with_confirm(in_code)
        .with_fix(|_, _| Some("getElementById".to_string())),
    ])
}

fn in_code(ctx: &MatchContext<'_>) -> bool {
    ctx.code().in_code(ctx.start)
}
