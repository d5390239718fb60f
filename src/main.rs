//! # juliet-build CLI Entry Point
//!
//! Resolves the command line (and optional `juliet-build.toml`) into a
//! validated [`BuildConfig`], then runs discovery and the build and reports
//! timings.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use colored::*;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use juliet_build::build::{Builder, ProcessInvoker};
use juliet_build::config::{
    BuildConfig, CaseSelection, InvocationStyle, Language, Settings, load_settings,
    parse_cwe_list,
};
use juliet_build::discovery::discover;
use juliet_build::layout::SuiteLayout;
use juliet_build::logging;
use juliet_build::report::{RunReport, Timings};
use juliet_build::toolchain;
use juliet_build::ui::{self, plural};

#[derive(Parser)]
#[command(name = "juliet-build")]
#[command(about = "Builds the SAMATE Juliet test suite", version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
struct Cli {
    /// Which language to build ("cpp" or "java")
    #[arg(long, value_name = "LANG")]
    language: Language,
    /// Location of the unzipped SAMATE suite
    #[arg(long, value_name = "DIR")]
    samate: PathBuf,
    /// Location for the output directory
    #[arg(long, value_name = "DIR")]
    output: PathBuf,
    /// CWEs to build, separated by ',' (default: all CWEs)
    #[arg(long, value_name = "NUM")]
    cwes: Option<String>,
    /// CWEs to exclude, separated by ','
    #[arg(long, value_name = "NUM")]
    exclude: Option<String>,
    /// Which test cases to build ("good", "bad" or "both") [default: both]
    #[arg(long, value_name = "WHICH")]
    cases: Option<CaseSelection>,
    /// Number of threads, use 1 for better determinism and cleaner output [default: CPUs + 1]
    #[arg(long, value_name = "NUM")]
    threads: Option<usize>,
    /// Path to gcc
    #[arg(long, value_name = "PATH")]
    gcc: Option<String>,
    /// Path to cl (builds with cl instead of gcc)
    #[arg(long, value_name = "PATH")]
    cl: Option<String>,
    /// Path to ant (Java only)
    #[arg(long, value_name = "PATH")]
    ant: Option<String>,
    /// Never pass `-pipe` to gcc
    #[arg(long)]
    no_pipe: bool,
    /// Don't draw a progress bar
    #[arg(long)]
    no_progress: bool,
    /// Settings file [default: ./juliet-build.toml if present]
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Write a JSON run report
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,
    /// Show debug output (patterns, every compiler command)
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn settings(&self) -> Result<Settings> {
        let cwes = self
            .cwes
            .as_deref()
            .map(parse_cwe_list)
            .transpose()?
            .map(|s| s.into_iter().collect());
        let exclude = self
            .exclude
            .as_deref()
            .map(parse_cwe_list)
            .transpose()?
            .map(|s| s.into_iter().collect());

        Ok(Settings {
            gcc: self.gcc.clone(),
            cl: self.cl.clone(),
            ant: self.ant.clone(),
            threads: self.threads,
            cases: self.cases,
            cwes,
            exclude,
            pipe: self.no_pipe.then_some(false),
            progress: self.no_progress.then_some(false),
        })
    }
}

fn main() {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose);

    if let Err(e) = run(&cli) {
        print_failure(&e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let time_start = Instant::now();
    println!("{}", "--- juliet-build ---".bold());
    println!();

    let settings = cli.settings()?.or(load_settings(cli.config.as_deref())?);

    // Absolute paths: every compiler runs inside the object directory.
    let samate = std::path::absolute(&cli.samate).context("Invalid --samate path")?;
    let output = std::path::absolute(&cli.output).context("Invalid --output path")?;
    let layout = SuiteLayout::locate(&samate, cli.language)?;

    let object_dir = output.join("object");
    let _ = fs::remove_dir_all(&object_dir);
    fs::create_dir_all(&object_dir)
        .with_context(|| format!("Failed to create {}", object_dir.display()))?;

    let (compiler, style) = resolve_compiler(cli.language, &settings)?;
    let config = BuildConfig {
        language: cli.language,
        test_cases_dir: layout.test_cases_dir,
        support_dir: layout.support_dir,
        object_dir: object_dir.clone(),
        include: settings.cwes.unwrap_or_default().into_iter().collect(),
        exclude: settings.exclude.unwrap_or_default().into_iter().collect(),
        cases: settings.cases.unwrap_or_default(),
        threads: settings.threads.unwrap_or_else(toolchain::default_threads),
        compiler,
        style,
        fast_io: settings.pipe.unwrap_or(true),
        progress: settings.progress.unwrap_or(true) && console::Term::stdout().is_term(),
    };
    config.validate()?;
    log::debug!("configuration: {:?}", config);

    // Find test cases. Strictly these are test case *sources*: some test
    // cases are split across several files.
    let find_start = Instant::now();
    println!("{} Scanning SAMATE test cases...", "🔍".cyan());
    let discovery = discover(&config)?;
    let units = &discovery.units;
    println!("  found {} test sources total", units.len());
    if let (Some(first), Some(last)) = (units.first(), units.last()) {
        println!("    from {}", first.display());
        println!("    to {}", last.display());
    }
    println!();
    let finding = find_start.elapsed();

    let build_start = Instant::now();
    let invoker = Arc::new(ProcessInvoker::new(&object_dir));
    let mut builder = Builder::new(config.clone(), invoker);
    let outcome = builder.build(units);
    let building = build_start.elapsed();

    let timings = Timings {
        total: time_start.elapsed(),
        finding,
        building,
    };

    if let Some(path) = &cli.report {
        let report = RunReport {
            config: &config,
            sources: units.len(),
            excluded: discovery.excluded.len(),
            batches: outcome.as_ref().map_or(0, |s| s.batches),
            timings: timings.clone(),
            failures: match &outcome {
                Ok(_) => Vec::new(),
                Err(e) => failure_lines(e),
            },
        };
        report.write(path)?;
    }

    let summary = outcome?;
    println!(
        "{} All test cases built ({} source{} in {} batch{}).",
        "✓".green(),
        summary.sources,
        plural(summary.sources),
        summary.batches,
        if summary.batches == 1 { "" } else { "es" }
    );
    println!();

    print_timings(&timings);
    println!("{}", "--- juliet-build: success! ---".green().bold());
    Ok(())
}

fn resolve_compiler(language: Language, settings: &Settings) -> Result<(PathBuf, InvocationStyle)> {
    let locate = |name: &str, what: &str| {
        toolchain::find_executable(name).ok_or_else(|| anyhow!("Could not locate {} ('{}')", what, name))
    };

    match language {
        Language::Java => {
            let ant = settings.ant.as_deref().unwrap_or(toolchain::default_ant());
            Ok((locate(ant, "ant")?, InvocationStyle::Gcc))
        }
        Language::Cpp => match &settings.cl {
            Some(cl) => Ok((locate(cl, "cl")?, InvocationStyle::Cl)),
            None => {
                let gcc = settings.gcc.as_deref().unwrap_or(toolchain::default_gcc());
                Ok((locate(gcc, "gcc")?, InvocationStyle::Gcc))
            }
        },
    }
}

fn print_timings(timings: &Timings) {
    let mut table = ui::Table::new(&["Phase", "Time"]);
    table.add_row(vec!["total".to_string(), ui::seconds(timings.total)]);
    table.add_row(vec![
        "finding testcases".dimmed().to_string(),
        ui::seconds(timings.finding),
    ]);
    table.add_row(vec![
        "building sources".dimmed().to_string(),
        ui::seconds(timings.building),
    ]);
    table.add_row(vec![
        "unaccounted for".dimmed().to_string(),
        ui::seconds(timings.unaccounted()),
    ]);
    table.print();
    println!();
}

fn failure_lines(error: &juliet_build::Error) -> Vec<String> {
    match error {
        juliet_build::Error::Pool { errors } => errors.iter().map(|e| e.to_string()).collect(),
        other => vec![other.to_string()],
    }
}

fn print_failure(error: &anyhow::Error) {
    if let Some(build_error) = error.downcast_ref::<juliet_build::Error>() {
        let count = build_error.failure_count();
        if matches!(
            build_error,
            juliet_build::Error::Pool { .. } | juliet_build::Error::Failed { .. }
        ) {
            println!(
                "{} build failed in {} job{}:",
                "***".red().bold(),
                count,
                plural(count)
            );
            for line in failure_lines(build_error) {
                println!("  {} {}", "x".red(), line);
            }
            println!();
        }
    }
    eprintln!("{} {:#}", "Error:".red().bold(), error);
}
