use crate::config::Severity;
use crate::rules::{MatchContext, Rule, RuleBuildError};
use crate::text;
use regex::Regex;

/// Words followed by `(` that are syntax, not calls.
const KEYWORDS: &[&str] = &[
    "if", "for", "while", "switch", "catch", "function", "return", "typeof", "instanceof",
    "await", "async", "super", "import", "do", "else", "yield", "delete", "void", "in", "of",
    "with", "new", "throw", "case",
];

pub fn rules() -> Result<Vec<Rule>, RuleBuildError> {
    Ok(vec![Rule::new(
        "undefined-function",
        r"\b([A-Za-z_$][\w$]*)\(",
        "Function not defined",
        Severity::Error,
    )?
    .with_confirm(is_undefined_call)])
}

fn is_undefined_call(ctx: &MatchContext<'_>) -> bool {
    let Some(name) = ctx.group(1) else {
        return false;
    };
    if KEYWORDS.contains(&name) {
        return false;
    }
    // member calls (`a.b(`, `a?.b(`) resolve against the object, not the scope
    let prev = ctx.full[..ctx.start].bytes().last();
    if prev.is_some_and(|b| b == b'.' || text::is_ident_byte(b)) {
        return false;
    }
    if !ctx.code().in_code(ctx.start) || ctx.symbols.is_known(name) {
        return false;
    }
    !ctx.remember(name, || is_declared(ctx.full, name))
        && !is_definition_site(ctx, ctx.end - 1)
}

/// Whether `name` is bound somewhere in `full` by one of the usual
/// declaration styles.
fn is_declared(full: &str, name: &str) -> bool {
    let name = regex::escape(name);
    let declarations = [
        format!(r"\bfunction\s*\*?\s*{name}\s*\("),
        format!(
            r"\b(?:const|let|var)\s+{name}\s*=\s*(?:async\s+)?(?:function\b|\(|[A-Za-z_$][\w$]*\s*=>)"
        ),
        format!(r"(?:^|[^\w$.]){name}\s*=\s*(?:async\s+)?(?:function\b|\([^()]*\)\s*=>)"),
        format!(r"\bclass\s+{name}\b"),
        format!(r"\bimport\b[^;\n]*[^\w$]{name}\b[^;\n]*\bfrom\b"),
        format!(r"\b(?:const|let|var)\s*\{{[^}}]*\b{name}\b[^}}]*\}}\s*="),
        format!(r"(?:^|[^\w$.]){name}\s*=>"),
    ];
    let declared = declarations
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .any(|re| re.is_match(full));

    declared || is_parameter(full, &name)
}

/// `name` appears in the parameter list of a function or arrow function.
fn is_parameter(full: &str, escaped_name: &str) -> bool {
    let Ok(params) = Regex::new(r"\(([^()]*)\)\s*(?:=>|\{)") else {
        return false;
    };
    let Ok(name) = Regex::new(&format!(r"^(?:\.\.\.)?{escaped_name}$")) else {
        return false;
    };
    let found = params.captures_iter(full).any(|caps| {
        caps.get(1).is_some_and(|list| {
            list.as_str()
                .split(',')
                .map(|p| p.split('=').next().unwrap_or("").trim())
                .any(|p| name.is_match(p))
        })
    });
    found
}

/// `name(...) {` is a shorthand method definition, not a call.
fn is_definition_site(ctx: &MatchContext<'_>, open: usize) -> bool {
    ctx.code()
        .matching_close(open)
        .is_some_and(|close| ctx.full[close + 1..].trim_start().starts_with('{'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::run;
    use crate::symbols::AmbientGlobals;

    fn rule() -> Rule {
        rules().unwrap().remove(0)
    }

    fn flagged(content: &str) -> Vec<String> {
        run(&rule(), content)
            .into_iter()
            .map(|f| f.matched)
            .collect()
    }

    #[test]
    fn flags_call_to_unknown_function() {
        let findings = run(&rule(), "greet('x');");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].matched, "greet(");
        assert!(!findings[0].is_fixable());
    }

    #[test]
    fn declared_functions_are_known() {
        assert!(flagged("function greet() {}\ngreet();").is_empty());
        assert!(flagged("const run = () => 1;\nrun();").is_empty());
        assert!(flagged("let go = function () {};\ngo();").is_empty());
        assert!(flagged("var fly = async () => {};\nfly();").is_empty());
        assert!(flagged("const sq = x => x * x;\nsq(2);").is_empty());
        assert!(flagged("class Point {}\nnew Point(1, 2);").is_empty());
    }

    #[test]
    fn imports_and_destructured_bindings_are_known() {
        assert!(flagged("import { helper } from './h';\nhelper();").is_empty());
        assert!(flagged("import build from './b';\nbuild();").is_empty());
        assert!(flagged("const { join } = require('path');\njoin('a');").is_empty());
    }

    #[test]
    fn ambient_globals_and_member_calls_are_known() {
        assert!(flagged("parseInt('1');\nsetTimeout(tick, 10);").is_empty());
        assert!(flagged("obj.method();\nitems?.map(fn);").is_empty());
    }

    #[test]
    fn keywords_are_not_calls() {
        assert!(flagged("if(a) {}\nwhile(b) {}\nswitch(c) {}\nreturn(d);").is_empty());
    }

    #[test]
    fn strings_and_comments_are_ignored() {
        assert!(flagged("// missing()\nconst s = 'nope()';").is_empty());
    }

    #[test]
    fn method_shorthand_is_a_definition() {
        let content = "const o = {\n  save() {\n    return 1;\n  }\n};";
        assert!(flagged(content).is_empty());
    }

    #[test]
    fn parameters_are_known() {
        assert!(flagged("function each(items, cb) { cb(items); }").is_empty());
        assert!(flagged("const apply = (fn, ...rest) => fn(rest);").is_empty());
        assert!(flagged("function go(done = noop) { done(); }").is_empty());
    }

    #[test]
    fn resolver_is_injected() {
        let custom = AmbientGlobals::default().with_names(["track"]);
        let findings = rule().find_all("track();\nparseInt('1');", &custom);
        let names: Vec<_> = findings.iter().map(|f| f.matched.as_str()).collect();
        assert_eq!(names, ["parseInt("]);
    }

    #[test]
    fn reports_each_unknown_call() {
        assert_eq!(flagged("a();\nb();\na();"), ["a(", "b(", "a("]);
    }
}
