//! expc CLI Entry Point
//!
//! Command-line interface for experiment compilation.
//!
//! # Usage
//!
//! ```bash
//! # Validate an experiment bundle
//! expc validate experiment.yaml
//!
//! # Compile an experiment into an artifact
//! expc generate experiment.yaml
//!
//! # Choose the artifact output path
//! expc generate experiment.yaml --output plan.json
//! ```

use std::env;
use std::process::ExitCode;

use log::{error, info};

use expc::error::ValidationReport;
use expc::{APP_NAME, VERSION};

/// Default artifact output path.
const DEFAULT_OUTPUT: &str = "artifact.json";

/// The command to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Validate,
    Generate,
}

/// Command-line configuration parsed from arguments.
#[derive(Debug)]
struct Config {
    command: Command,
    bundle_path: String,
    output_path: String,
    verbose: bool,
}

/// Configures the logging system with appropriate formatting.
fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| {
            use std::io::Write;

            match record.level() {
                log::Level::Warn | log::Level::Error => {
                    writeln!(buf, "[{}] {}", record.level(), record.args())
                }
                _ => writeln!(buf, "{}", record.args()),
            }
        })
        .init();
}

/// Prints the application banner with version information.
fn print_banner() {
    println!();
    println!("{} v{}", APP_NAME, VERSION);
    println!("Experiment Workflow Compiler");
    println!();
}

/// Prints usage information.
fn print_usage() {
    println!("Usage: expc <COMMAND> <BUNDLE_FILE> [OPTIONS]");
    println!();
    println!("Commands:");
    println!("  validate            Check the experiment and report diagnostics");
    println!("  generate            Validate, then compile the execution artifact");
    println!();
    println!("Arguments:");
    println!("  <BUNDLE_FILE>       Path to the experiment bundle YAML file");
    println!();
    println!("Options:");
    println!("  --output PATH       Artifact output path (default: {})", DEFAULT_OUTPUT);
    println!("  --verbose           Enable debug logging");
    println!("  --help              Show this help message");
    println!("  --version           Show version information");
    println!();
    println!("Examples:");
    println!("  expc validate experiment.yaml");
    println!("  expc generate experiment.yaml --output plan.json");
}

/// Parses command-line arguments into a Config struct.
fn parse_arguments(args: &[String]) -> Result<Config, String> {
    let mut command = None;
    let mut bundle_path = None;
    let mut output_path = DEFAULT_OUTPUT.to_string();
    let mut verbose = false;
    let mut i = 1; // Skip program name

    while i < args.len() {
        let arg = &args[i];

        match arg.as_str() {
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("{} {}", APP_NAME, VERSION);
                std::process::exit(0);
            }
            "--verbose" | "-v" => {
                verbose = true;
            }
            "--output" => {
                i += 1;
                if i >= args.len() {
                    return Err("--output requires a path argument".to_string());
                }
                output_path = args[i].clone();
            }
            "validate" if command.is_none() => {
                command = Some(Command::Validate);
            }
            "generate" if command.is_none() => {
                command = Some(Command::Generate);
            }
            arg if arg.starts_with('-') => {
                return Err(format!("Unknown option: {}", arg));
            }
            _ => {
                if bundle_path.is_some() {
                    return Err(format!("Unexpected argument: {}", arg));
                }
                bundle_path = Some(arg.clone());
            }
        }
        i += 1;
    }

    let command = command.ok_or("Missing command: expected 'validate' or 'generate'")?;
    let bundle_path = bundle_path.ok_or("Missing experiment bundle file argument")?;

    Ok(Config {
        command,
        bundle_path,
        output_path,
        verbose,
    })
}

/// Prints a validation report as diagnostic lists and returns whether it
/// is free of errors.
fn print_report(report: &ValidationReport) -> bool {
    for message in report.error_messages() {
        println!("error: {}", message);
    }
    for message in report.warning_messages() {
        println!("warning: {}", message);
    }

    println!();
    println!(
        "{} error(s), {} warning(s)",
        report.errors.len(),
        report.warnings.len()
    );

    report.is_ok()
}

/// Main application entry point.
fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    // Parse arguments
    let config = parse_arguments(&args).map_err(|e| {
        eprintln!("Error: {}", e);
        eprintln!();
        print_usage();
        e
    })?;

    // Setup logging
    setup_logging(config.verbose);

    // Print banner
    print_banner();

    match config.command {
        Command::Validate => {
            info!("Validating: {}", config.bundle_path);
            let report = expc::validate(&config.bundle_path)?;

            if !print_report(&report) {
                return Err("validation failed".into());
            }
        }
        Command::Generate => {
            info!("Compiling: {}", config.bundle_path);
            let outcome = expc::generate(&config.bundle_path)?;

            let ok = print_report(&outcome.validation);
            match outcome.artifact {
                Some(artifact) => {
                    artifact.save(&config.output_path)?;
                    println!("Artifact written to {}", config.output_path);
                }
                None => {
                    error!("No artifact generated");
                    if !ok {
                        return Err("validation failed".into());
                    }
                    return Err("generation failed".into());
                }
            }
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!();
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("expc")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_parse_validate_command() {
        let config = parse_arguments(&args(&["validate", "experiment.yaml"])).unwrap();
        assert_eq!(config.command, Command::Validate);
        assert_eq!(config.bundle_path, "experiment.yaml");
        assert!(!config.verbose);
    }

    #[test]
    fn test_parse_generate_with_output() {
        let config = parse_arguments(&args(&[
            "generate",
            "experiment.yaml",
            "--output",
            "plan.json",
            "--verbose",
        ]))
        .unwrap();

        assert_eq!(config.command, Command::Generate);
        assert_eq!(config.output_path, "plan.json");
        assert!(config.verbose);
    }

    #[test]
    fn test_parse_missing_command() {
        assert!(parse_arguments(&args(&["experiment.yaml"])).is_err());
    }

    #[test]
    fn test_parse_missing_bundle() {
        assert!(parse_arguments(&args(&["validate"])).is_err());
    }

    #[test]
    fn test_parse_unknown_option() {
        assert!(parse_arguments(&args(&["validate", "e.yaml", "--fast"])).is_err());
    }

    #[test]
    fn test_parse_output_requires_value() {
        assert!(parse_arguments(&args(&["generate", "e.yaml", "--output"])).is_err());
    }
}
