use crate::analyzer::Analyzer;
use crate::cli::toml_config::TomlConfig;
use crate::config::{Settings, Severity};
use crate::fixer::FixReport;
use crate::rules::registry::{RegistryError, RuleRegistry};
use crate::rules::{Finding, RuleBuildError};
use crate::symbols::AmbientGlobals;
use crate::syntax::NoSyntaxCheck;
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use rayon::prelude::*;
use std::fmt;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG: &str = "jscheck.toml";

/// Target argument that means "read the source from stdin".
pub const STDIN_ARG: &str = "-";

/// Display name used for source read from stdin.
pub const STDIN_NAME: &str = "<stdin>";

#[derive(Debug)]
pub enum ScanError {
    ConfigRead(PathBuf, io::Error),
    ConfigParse(PathBuf, toml::de::Error),
    GlobParse(globset::Error),
    RuleBuild(RuleBuildError),
    Registry(RegistryError),
    PathNotFound(PathBuf),
    Stdin(io::Error),
    Write(PathBuf, io::Error),
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::ConfigRead(p, e) => {
                write!(f, "failed to read config '{}': {}", p.display(), e)
            }
            ScanError::ConfigParse(p, e) => {
                write!(f, "failed to parse config '{}': {}", p.display(), e)
            }
            ScanError::GlobParse(e) => write!(f, "invalid glob pattern: {}", e),
            ScanError::RuleBuild(e) => write!(f, "failed to build rule: {}", e),
            ScanError::Registry(e) => write!(f, "{}", e),
            ScanError::PathNotFound(p) => write!(f, "no such file or directory: '{}'", p.display()),
            ScanError::Stdin(e) => write!(f, "failed to read stdin: {}", e),
            ScanError::Write(p, e) => write!(f, "failed to write '{}': {}", p.display(), e),
        }
    }
}

impl std::error::Error for ScanError {}

impl From<RuleBuildError> for ScanError {
    fn from(e: RuleBuildError) -> Self {
        ScanError::RuleBuild(e)
    }
}

impl From<RegistryError> for ScanError {
    fn from(e: RegistryError) -> Self {
        ScanError::Registry(e)
    }
}

/// One scanned source and what the analyzer found in it.
#[derive(Debug)]
pub struct FileFindings {
    pub path: PathBuf,
    pub source: String,
    pub findings: Vec<Finding>,
}

pub struct ScanResult {
    pub files: Vec<FileFindings>,
    pub files_scanned: usize,
    pub rules_loaded: usize,
}

impl ScanResult {
    pub fn findings(&self) -> impl Iterator<Item = &Finding> {
        self.files.iter().flat_map(|f| f.findings.iter())
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.findings().filter(|f| f.severity == severity).count()
    }

    pub fn has_errors(&self) -> bool {
        self.count(Severity::Error) > 0
    }
}

/// Outcome of fixing one source.
#[derive(Debug)]
pub struct FixedFile {
    pub path: PathBuf,
    pub from_stdin: bool,
    pub report: FixReport,
    /// Findings still present in the fixed text.
    pub remaining: Vec<Finding>,
}

impl FixedFile {
    pub fn changed(&self) -> bool {
        self.report.applied > 0
    }
}

pub struct FixSummary {
    pub files: Vec<FixedFile>,
    pub dry_run: bool,
}

impl FixSummary {
    pub fn applied(&self) -> usize {
        self.files.iter().map(|f| f.report.applied).sum()
    }

    pub fn files_changed(&self) -> usize {
        self.files.iter().filter(|f| f.changed()).count()
    }

    pub fn remaining(&self) -> usize {
        self.files.iter().map(|f| f.remaining.len()).sum()
    }
}

struct Source {
    path: PathBuf,
    text: String,
    from_stdin: bool,
}

/// Resolve settings: an explicit config must exist; otherwise `jscheck.toml`
/// in the working directory is used when present, else the defaults.
pub fn load_settings(config_path: Option<&Path>) -> Result<Settings, ScanError> {
    let path = match config_path {
        Some(p) => p.to_path_buf(),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG);
            if !default.is_file() {
                tracing::debug!("no {} found; using default settings", DEFAULT_CONFIG);
                return Ok(Settings::default());
            }
            default
        }
    };

    let text = fs::read_to_string(&path).map_err(|e| ScanError::ConfigRead(path.clone(), e))?;
    let config: TomlConfig =
        toml::from_str(&text).map_err(|e| ScanError::ConfigParse(path.clone(), e))?;
    tracing::debug!(config = %path.display(), "loaded config");
    Ok(config.to_settings())
}

/// Build the analyzer the settings describe.
pub fn build_analyzer(settings: &Settings) -> Result<Analyzer, ScanError> {
    let registry = RuleRegistry::builtin()?.without(&settings.disable)?;
    let symbols = AmbientGlobals::builtin().with_names(settings.globals.iter().cloned());
    let analyzer = Analyzer::new(registry).with_symbols(symbols);
    Ok(if settings.syntax_check {
        analyzer
    } else {
        analyzer.with_syntax_check(NoSyntaxCheck)
    })
}

/// Analyze every target. Files are analyzed in parallel; results keep a
/// stable order (stdin first, then paths sorted).
pub fn run_scan(
    analyzer: &Analyzer,
    settings: &Settings,
    targets: &[PathBuf],
) -> Result<ScanResult, ScanError> {
    let sources = gather_sources(settings, targets)?;

    let files: Vec<FileFindings> = sources
        .into_par_iter()
        .map(|source| {
            let findings = analyzer.analyze(&source.text);
            FileFindings {
                path: source.path,
                source: source.text,
                findings,
            }
        })
        .collect();

    tracing::debug!(files = files.len(), "scan finished");
    Ok(ScanResult {
        files_scanned: files.len(),
        rules_loaded: analyzer.registry().len(),
        files,
    })
}

/// Fix every target. Files are rewritten in place unless `dry_run`; stdin is
/// never written back (the caller prints the fixed text).
pub fn run_fix(
    analyzer: &Analyzer,
    settings: &Settings,
    targets: &[PathBuf],
    dry_run: bool,
) -> Result<FixSummary, ScanError> {
    let sources = gather_sources(settings, targets)?;

    let files: Vec<FixedFile> = sources
        .into_par_iter()
        .map(|source| {
            let (report, _) = analyzer.fix(&source.text);
            let remaining = analyzer.analyze(&report.text);
            FixedFile {
                path: source.path,
                from_stdin: source.from_stdin,
                report,
                remaining,
            }
        })
        .collect();

    if !dry_run {
        for file in files.iter().filter(|f| f.changed() && !f.from_stdin) {
            fs::write(&file.path, &file.report.text)
                .map_err(|e| ScanError::Write(file.path.clone(), e))?;
            tracing::debug!(
                file = %file.path.display(),
                applied = file.report.applied,
                "wrote fixes"
            );
        }
    }

    Ok(FixSummary { files, dry_run })
}

fn gather_sources(settings: &Settings, targets: &[PathBuf]) -> Result<Vec<Source>, ScanError> {
    let include = build_glob_set(&settings.include)?;
    let exclude = build_glob_set(&settings.exclude)?;

    let mut sources = Vec::new();
    let mut paths = Vec::new();
    for target in targets {
        if target.as_os_str() == STDIN_ARG {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .map_err(ScanError::Stdin)?;
            sources.push(Source {
                path: PathBuf::from(STDIN_NAME),
                text,
                from_stdin: true,
            });
        } else {
            paths.extend(collect_files(target, &include, &exclude)?);
        }
    }
    paths.sort();
    paths.dedup();

    let read: Vec<Source> = paths
        .into_par_iter()
        .filter_map(|path| match fs::read_to_string(&path) {
            Ok(text) => Some(Source {
                path,
                text,
                from_stdin: false,
            }),
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "skipping unreadable file");
                None
            }
        })
        .collect();
    sources.extend(read);
    Ok(sources)
}

/// Files under `target`. An explicitly named file is always taken; files
/// found by walking a directory must match `include` and not `exclude`,
/// both matched against the path relative to `target`.
fn collect_files(
    target: &Path,
    include: &GlobSet,
    exclude: &GlobSet,
) -> Result<Vec<PathBuf>, ScanError> {
    if target.is_file() {
        return Ok(vec![target.to_path_buf()]);
    }
    if !target.is_dir() {
        return Err(ScanError::PathNotFound(target.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in WalkBuilder::new(target).build() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(error = %e, "skipping directory entry");
                continue;
            }
        };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let path = entry.into_path();
        let rel = path.strip_prefix(target).unwrap_or(&path);
        if exclude.is_match(rel) || !include.is_match(rel) {
            continue;
        }
        files.push(path);
    }
    Ok(files)
}

fn build_glob_set(patterns: &[String]) -> Result<GlobSet, ScanError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).map_err(ScanError::GlobParse)?);
    }
    builder.build().map_err(ScanError::GlobParse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn settings() -> Settings {
        Settings {
            syntax_check: false,
            ..Settings::default()
        }
    }

    fn write(dir: &Path, rel: &str, content: &str) -> PathBuf {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    fn scanned_names(result: &ScanResult, root: &Path) -> Vec<String> {
        result
            .files
            .iter()
            .map(|f| {
                f.path
                    .strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn walks_directories_with_include_and_exclude() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "app.js", "let a = 1\n");
        write(dir.path(), "lib/util.mjs", "export const b = 2;\n");
        write(dir.path(), "node_modules/dep/index.js", "let c = 3\n");
        write(dir.path(), "vendor.min.js", "let d = 4\n");
        write(dir.path(), "notes.txt", "let e = 5\n");

        let settings = settings();
        let analyzer = build_analyzer(&settings).unwrap();
        let result = run_scan(&analyzer, &settings, &[dir.path().to_path_buf()]).unwrap();

        assert_eq!(scanned_names(&result, dir.path()), ["app.js", "lib/util.mjs"]);
        assert_eq!(result.files_scanned, 2);
        assert_eq!(result.rules_loaded, 13);
        assert_eq!(result.count(Severity::Warning), 1);
        assert!(!result.has_errors());
    }

    #[test]
    fn explicit_file_is_scanned_regardless_of_include() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "script.txt", "missing();\n");

        let settings = settings();
        let analyzer = build_analyzer(&settings).unwrap();
        let result = run_scan(&analyzer, &settings, &[path]).unwrap();

        assert_eq!(result.files_scanned, 1);
        assert!(result.has_errors());
        assert_eq!(result.files[0].findings[0].rule_id, "undefined-function");
    }

    #[test]
    fn missing_target_is_an_error() {
        let dir = TempDir::new().unwrap();
        let settings = settings();
        let analyzer = build_analyzer(&settings).unwrap();
        let err = run_scan(&analyzer, &settings, &[dir.path().join("nope")]).err().unwrap();
        assert!(matches!(err, ScanError::PathNotFound(_)));
    }

    #[test]
    fn disabled_rules_and_extra_globals_apply() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "a.js", "track('x');\nlet a = 1\n");

        let settings = Settings {
            disable: vec!["missing-semicolon".into()],
            globals: vec!["track".into()],
            ..settings()
        };
        let analyzer = build_analyzer(&settings).unwrap();
        let result = run_scan(&analyzer, &settings, &[path]).unwrap();

        assert_eq!(result.rules_loaded, 12);
        assert_eq!(result.findings().count(), 0);
    }

    #[test]
    fn unknown_disabled_rule_is_rejected() {
        let settings = Settings {
            disable: vec!["no-such-rule".into()],
            ..settings()
        };
        let err = build_analyzer(&settings).err().unwrap();
        assert!(matches!(err, ScanError::Registry(RegistryError::UnknownRule { .. })));
    }

    #[test]
    fn invalid_glob_is_reported() {
        let dir = TempDir::new().unwrap();
        let settings = Settings {
            include: vec!["[".into()],
            ..settings()
        };
        let analyzer = build_analyzer(&settings).unwrap();
        let err = run_scan(&analyzer, &settings, &[dir.path().to_path_buf()]).err().unwrap();
        assert!(matches!(err, ScanError::GlobParse(_)));
    }

    #[test]
    fn load_settings_reads_explicit_file() {
        let dir = TempDir::new().unwrap();
        let path = write(
            dir.path(),
            "jscheck.toml",
            "[jscheck]\ndisable = [\"function-without-return\"]\nsyntax_check = false\n",
        );
        let settings = load_settings(Some(&path)).unwrap();
        assert_eq!(settings.disable, ["function-without-return"]);
        assert!(!settings.syntax_check);
    }

    #[test]
    fn load_settings_reports_missing_and_malformed_files() {
        let dir = TempDir::new().unwrap();
        let err = load_settings(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(
            err,
            ScanError::ConfigRead(_, ref e) if e.kind() == io::ErrorKind::NotFound
        ));

        let path = write(dir.path(), "bad.toml", "[jscheck\n");
        let err = load_settings(Some(&path)).unwrap_err();
        assert!(matches!(err, ScanError::ConfigParse(..)));
    }

    #[test]
    fn fix_rewrites_files_in_place() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "a.js", "const x = 5\nx = 10\n");

        let settings = settings();
        let analyzer = build_analyzer(&settings).unwrap();
        let summary = run_fix(&analyzer, &settings, &[path.clone()], false).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "let x = 5;\nx = 10;\n");
        assert_eq!(summary.applied(), 3);
        assert_eq!(summary.files_changed(), 1);
        assert_eq!(summary.remaining(), 0);
    }

    #[test]
    fn dry_run_leaves_files_untouched() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "a.js", "let a = 1\n");

        let settings = settings();
        let analyzer = build_analyzer(&settings).unwrap();
        let summary = run_fix(&analyzer, &settings, &[path.clone()], true).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "let a = 1\n");
        assert_eq!(summary.files[0].report.text, "let a = 1;\n");
        assert!(summary.dry_run);
    }
}
