use clap::Parser;
use jscheck::cli::format;
use jscheck::cli::toml_config::starter_config;
use jscheck::cli::{Cli, Commands, OutputFormat};
use jscheck::mcp;
use jscheck::scan::{self, ScanError};
use jscheck::Analyzer;
use jscheck::RuleRegistry;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Check {
            paths,
            config,
            format: output_format,
        } => {
            let (settings, analyzer) = setup(config.as_deref());
            let result = scan::run_scan(&analyzer, &settings, &paths).unwrap_or_else(|e| fail(e));

            match output_format {
                OutputFormat::Pretty => format::print_pretty(&result),
                OutputFormat::Json => format::print_json(&result),
                OutputFormat::Compact => format::print_compact(&result),
                OutputFormat::Github => format::print_github(&result),
            }

            process::exit(if result.has_errors() { 1 } else { 0 });
        }

        Commands::Fix {
            paths,
            config,
            dry_run,
        } => {
            let (settings, analyzer) = setup(config.as_deref());
            let summary =
                scan::run_fix(&analyzer, &settings, &paths, dry_run).unwrap_or_else(|e| fail(e));

            let mut stdout = std::io::stdout();
            for file in summary.files.iter().filter(|f| f.from_stdin) {
                let _ = stdout.write_all(file.report.text.as_bytes());
            }
            let _ = stdout.flush();

            format::print_fix_summary(&summary);
        }

        Commands::Rules => {
            let registry = RuleRegistry::builtin().unwrap_or_else(|e| fail(e));
            format::print_rules(&registry);
        }

        Commands::Init { output, force } => init(&output, force),

        Commands::Mcp { config } => {
            let (_, analyzer) = setup(config.as_deref());
            mcp::run_mcp_server(&analyzer);
        }
    }
}

/// `RUST_LOG` wins; otherwise warnings only, or debug with `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose { "jscheck=debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn setup(config: Option<&Path>) -> (jscheck::config::Settings, Analyzer) {
    let settings = match scan::load_settings(config) {
        Ok(s) => s,
        Err(ScanError::ConfigRead(ref path, ref e)) if e.kind() == std::io::ErrorKind::NotFound => {
            eprintln!(
                "\x1b[31merror\x1b[0m: config file '{}' not found",
                path.display()
            );
            eprintln!(
                "\x1b[90mhint\x1b[0m: run \x1b[1mjscheck init\x1b[0m to generate a starter config"
            );
            process::exit(2);
        }
        Err(e) => fail(e),
    };
    let analyzer = scan::build_analyzer(&settings).unwrap_or_else(|e| fail(e));
    (settings, analyzer)
}

fn init(output: &Path, force: bool) {
    if output.exists() && !force {
        eprintln!(
            "\x1b[31merror\x1b[0m: '{}' already exists (use --force to overwrite)",
            output.display()
        );
        process::exit(2);
    }

    if let Err(e) = fs::write(output, starter_config()) {
        eprintln!("\x1b[31merror\x1b[0m: failed to write config: {}", e);
        process::exit(2);
    }

    eprintln!("\x1b[32m✓\x1b[0m Created {}", output.display());
    eprintln!("\x1b[90mhint\x1b[0m: run \x1b[1mjscheck check .\x1b[0m to find issues");
}

fn fail(e: impl std::fmt::Display) -> ! {
    eprintln!("\x1b[31merror\x1b[0m: {}", e);
    process::exit(2);
}
