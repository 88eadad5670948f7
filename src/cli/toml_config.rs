use crate::config::{default_exclude, default_include, Settings};
use serde::Deserialize;

/// Top-level `jscheck.toml` structure.
#[derive(Debug, Default, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub jscheck: CheckSection,
}

/// The `[jscheck]` section. Every key is optional.
#[derive(Debug, Deserialize)]
pub struct CheckSection {
    #[serde(default = "default_include")]
    pub include: Vec<String>,
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub disable: Vec<String>,
    #[serde(default)]
    pub globals: Vec<String>,
    #[serde(default = "default_true")]
    pub syntax_check: bool,
}

fn default_true() -> bool {
    true
}

impl Default for CheckSection {
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

impl TomlConfig {
    /// Convert to the core `Settings` type.
    pub fn to_settings(&self) -> Settings {
        let section = &self.jscheck;
        Settings {
            include: section.include.clone(),
            exclude: section.exclude.clone(),
            disable: section.disable.clone(),
            globals: section.globals.clone(),
            syntax_check: section.syntax_check,
        }
    }
}

/// Contents written by `jscheck init`.
pub fn starter_config() -> String {
    r#"# jscheck configuration

[jscheck]
# Files scanned when a directory is given on the command line.
include = ["**/*.js", "**/*.mjs", "**/*.cjs", "**/*.jsx"]
exclude = ["node_modules/**", "dist/**", "build/**", "**/*.min.js"]

# Rule ids to turn off (see `jscheck rules`).
disable = []

# Names defined outside your code, e.g. globals from a script tag.
globals = []

# Parse each file before running the rules (needs the `ast` build feature).
syntax_check = true
"#
    .to_string()
}
