use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use privscan_analysis::{AnalysisConfig, PrivateRecognitionPass};
use privscan_core::PassManager;
use privscan_emit::{DumpConfig, Emitter, FunctionReport, TraitDumper};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "privscan")]
#[command(about = "privscan - privatization and dependence classification for loops")]
#[command(version = "0.1.0")]
#[command(author = "Gianluca Brigandi <gbrigand@gmail.com>")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify the loops of every function in a facts file.
    Analyze {
        input: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long, value_enum, default_value = "text")]
        format: Format,

        #[arg(long)]
        stats: bool,

        #[arg(long)]
        no_color: bool,

        #[arg(long)]
        no_unknowns: bool,

        /// Keep dependences reported as loop-independent at the loop's own depth.
        #[arg(long)]
        keep_loop_independent: bool,

        #[arg(short, long)]
        verbose: bool,
    },

    /// Validate a facts file, or every facts file under a directory.
    Check {
        input: PathBuf,

        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

impl From<Format> for privscan_emit::OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Text => privscan_emit::OutputFormat::Text,
            Format::Json => privscan_emit::OutputFormat::Json,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            input,
            output,
            format,
            stats,
            no_color,
            no_unknowns,
            keep_loop_independent,
            verbose,
        } => {
            init_logging(verbose);
            let mut config = DumpConfig {
                include_statistics: stats,
                include_unknowns: !no_unknowns,
                format: format.into(),
                ..DumpConfig::default()
            };
            if no_color || output.is_some() {
                colored::control::set_override(false);
                config.use_colors = false;
            }
            let analysis = if keep_loop_independent {
                AnalysisConfig::new().keep_loop_independent()
            } else {
                AnalysisConfig::new()
            };
            cmd_analyze(input, output, config, analysis, verbose)
        }
        Commands::Check { input, verbose } => {
            init_logging(verbose);
            cmd_check(input, verbose)
        }
    }
}

/// `RUST_LOG` wins; `--verbose` alone turns on debug output of the engine.
fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "debug" } else { "warn" })
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .try_init();
}

fn cmd_analyze(
    input: PathBuf,
    output: Option<PathBuf>,
    config: DumpConfig,
    analysis: AnalysisConfig,
    verbose: bool,
) -> Result<()> {
    use colored::*;
    use std::fs;
    use std::time::Instant;

    let start = Instant::now();
    tracing::info!(input = %input.display(), "loading facts");
    let functions = privscan_parser::parse_file(&input)
        .with_context(|| format!("Failed to load {}", input.display()))?;

    if functions.is_empty() {
        eprintln!("{}", "  No functions found in input".yellow());
        return Ok(());
    }

    let mut manager = PassManager::new();
    if verbose {
        manager.enable_statistics();
    }
    let mut pass = PrivateRecognitionPass::with_config(analysis);
    let mut rendered = String::new();
    let mut reports = Vec::new();

    for function in &functions {
        let info = manager
            .run(&mut pass, function)
            .with_context(|| format!("Failed to classify {}", function.name))?;
        let dumper = TraitDumper::with_config(function, config.clone());
        if config.format == privscan_emit::OutputFormat::Json {
            reports.push(dumper.report(info));
        } else {
            if !rendered.is_empty() {
                rendered.push('\n');
            }
            rendered.push_str(&dumper.emit_to_string(info)?);
        }
    }

    if config.format == privscan_emit::OutputFormat::Json {
        rendered = json(&reports)?;
    }

    if verbose {
        for stat in manager.statistics() {
            eprintln!(
                " {} {}: {:.3}ms",
                stat.name.bright_blue(),
                stat.function,
                stat.duration.as_secs_f64() * 1000.0
            );
        }
    }

    if let Some(output_path) = output {
        fs::write(&output_path, &rendered)
            .with_context(|| format!("Failed to write {}", output_path.display()))?;
        if verbose {
            eprintln!(
                "\n {} Classified {} function(s) in {:.3}s",
                "SUCCESS:".bright_green().bold(),
                functions.len(),
                start.elapsed().as_secs_f64()
            );
            eprintln!("   Output: {}", output_path.display());
        }
    } else {
        print!("{}", rendered);
    }

    Ok(())
}

/// One function is written as an object, several as an array.
fn json(reports: &[FunctionReport]) -> Result<String> {
    let text = match reports {
        [report] => serde_json::to_string_pretty(report)?,
        reports => serde_json::to_string_pretty(reports)?,
    };
    Ok(text + "\n")
}

fn cmd_check(input: PathBuf, verbose: bool) -> Result<()> {
    use colored::*;

    if verbose {
        eprintln!("{}", " Checking facts".bright_cyan().bold());
        eprintln!("{}", "=".repeat(50).bright_cyan());
        eprintln!(" Input: {}", input.display());
        eprintln!();
    }

    match privscan_parser::parse_dir(&input) {
        Ok(files) if files.is_empty() => {
            println!("{}", " No facts files found".yellow());
            Ok(())
        }
        Ok(files) => {
            println!("{}", " VALID".bright_green().bold());
            if verbose {
                for (path, functions) in &files {
                    let loops: usize = functions.iter().map(|f| f.regions.len()).sum();
                    println!(
                        "   {}: {} function(s), {} loop(s)",
                        path.display(),
                        functions.len(),
                        loops
                    );
                }
            }
            Ok(())
        }
        Err(e) => {
            println!("{}", " INVALID".bright_red().bold());
            println!("\n{}", "Parse Error:".bright_red());
            println!("{}", e);
            Err(anyhow::anyhow!("Validation failed"))
        }
    }
}
