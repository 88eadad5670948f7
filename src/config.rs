/// Severity level for a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

/// Resolved settings from `jscheck.toml` (or defaults when no file exists).
#[derive(Debug, Clone)]
pub struct Settings {
    /// Globs a walked file must match to be scanned.
    pub include: Vec<String>,
    /// Globs for files to skip while walking directories.
    pub exclude: Vec<String>,
    /// Rule ids to leave out of the registry.
    pub disable: Vec<String>,
    /// Extra names treated as defined by the undefined-function rule.
    pub globals: Vec<String>,
    /// Run the syntax check before the rules.
    pub syntax_check: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            include: default_include(),
            exclude: default_exclude(),
            disable: Vec::new(),
            globals: Vec::new(),
            syntax_check: true,
        }
    }
}

pub fn default_include() -> Vec<String> {
    ["**/*.js", "**/*.mjs", "**/*.cjs", "**/*.jsx"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

pub fn default_exclude() -> Vec<String> {
    ["node_modules/**", "dist/**", "build/**", "**/*.min.js"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
