use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use sift_core::{Dialect, ParseError, Severity};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Sift filter expression toolchain.
#[derive(Parser)]
#[command(name = "sift", version, about = "Sift filter expression analyzer")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate filter files against a dialect
    Check {
        /// Filter files to validate
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Path to the dialect JSON site configuration
        #[arg(long)]
        dialect: Option<PathBuf>,

        /// Treat advisory findings as failures
        #[arg(long)]
        strict: bool,

        /// Maximum nesting depth accepted before aborting
        #[arg(long)]
        max_depth: Option<usize>,
    },

    /// Dump the token stream of a filter file
    Tokens {
        /// Filter file to tokenize
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check {
            files,
            dialect,
            strict,
            max_depth,
        } => {
            cmd_check(
                &files,
                dialect.as_deref(),
                strict,
                max_depth,
                cli.output,
                cli.quiet,
            );
        }
        Commands::Tokens { file } => {
            cmd_tokens(&file, cli.output, cli.quiet);
        }
    }
}

fn load_dialect(path: Option<&Path>, output: OutputFormat, quiet: bool) -> Dialect {
    let Some(path) = path else {
        return Dialect::default();
    };
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            let msg = format!("error reading dialect '{}': {}", path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };
    match Dialect::from_json_str(&text) {
        Ok(dialect) => dialect,
        Err(e) => {
            let msg = format!("error parsing dialect JSON in '{}': {}", path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    }
}

fn check_filter(
    source: &str,
    dialect: &Dialect,
    max_depth: Option<usize>,
) -> Result<(), ParseError> {
    let tokens = sift_core::tokenize(source)?;
    let mut parser = sift_core::Parser::new(dialect);
    if let Some(limit) = max_depth {
        parser = parser.with_max_depth(limit);
    }
    parser.parse(&tokens)
}

fn severity_label(error: &ParseError) -> &'static str {
    match error.severity {
        Some(Severity::Warning) => "warning",
        _ => "error",
    }
}

fn cmd_check(
    files: &[PathBuf],
    dialect_path: Option<&Path>,
    strict: bool,
    max_depth: Option<usize>,
    output: OutputFormat,
    quiet: bool,
) {
    let dialect = load_dialect(dialect_path, output, quiet);

    let mut failed = 0usize;
    let mut reports = Vec::new();
    for file in files {
        let source = match std::fs::read_to_string(file) {
            Ok(source) => source,
            Err(e) => {
                let msg = format!("error reading '{}': {}", file.display(), e);
                report_error(&msg, output, quiet);
                process::exit(1);
            }
        };

        let result = check_filter(&source, &dialect, max_depth);
        // Advisory-only findings still pass unless --strict is given; this
        // mirrors how live filters with deprecation notices keep running.
        let pass = match &result {
            Ok(()) => true,
            Err(error) => !strict && error.is_advisory(),
        };
        if !pass {
            failed += 1;
        }

        match output {
            OutputFormat::Json => {
                reports.push(serde_json::json!({
                    "file": file.display().to_string(),
                    "ok": pass,
                    "error": result.as_ref().err().map(ParseError::to_json_value),
                }));
            }
            OutputFormat::Text => {
                if quiet {
                    continue;
                }
                match &result {
                    Ok(()) => println!("{}: ok", file.display()),
                    Err(error) => {
                        eprintln!(
                            "{}:{}: {}: {}",
                            file.display(),
                            error.from,
                            severity_label(error),
                            error.message
                        );
                        for warning in &error.warnings {
                            eprintln!(
                                "{}:{}: {}: {}",
                                file.display(),
                                warning.from,
                                severity_label(warning),
                                warning.message
                            );
                        }
                    }
                }
            }
        }
    }

    if output == OutputFormat::Json {
        let report = serde_json::json!({
            "checked": files.len(),
            "failed": failed,
            "filters": reports,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&report).unwrap_or_default()
        );
    } else if !quiet && failed > 0 {
        eprintln!("{} of {} filter(s) failed", failed, files.len());
    }

    if failed > 0 {
        process::exit(1);
    }
}

fn cmd_tokens(file: &Path, output: OutputFormat, quiet: bool) {
    let source = match std::fs::read_to_string(file) {
        Ok(source) => source,
        Err(e) => {
            let msg = format!("error reading '{}': {}", file.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };

    match sift_core::tokenize(&source) {
        Ok(tokens) => {
            if quiet {
                return;
            }
            match output {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&tokens).unwrap_or_default()
                    );
                }
                OutputFormat::Text => {
                    for token in &tokens {
                        println!(
                            "{:>5}..{:<5} {:?} {}",
                            token.start, token.end, token.kind, token.text
                        );
                    }
                }
            }
        }
        Err(error) => {
            match output {
                OutputFormat::Json => {
                    eprintln!(
                        "{}",
                        serde_json::to_string_pretty(&error.to_json_value()).unwrap_or_default()
                    );
                }
                OutputFormat::Text => {
                    if !quiet {
                        eprintln!("{}:{}: {}", file.display(), error.from, error.message);
                    }
                }
            }
            process::exit(1);
        }
    }
}

fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{{\"error\": \"{}\"}}", msg.replace('"', "\\\""));
        }
    }
}
