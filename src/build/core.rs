use super::batch::{batch_size, plan_batches};
use super::command::CompilerCommand;
use super::invoke::Invoker;
use super::pool::JobPool;
use crate::config::{BuildConfig, InvocationStyle, Language};
use crate::error::{Error, Result};
use crate::ui::plural;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, warn};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// What the main build handed to the compiler.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BuildSummary {
    pub batches: usize,
    pub sources: usize,
}

/// State shared by every job: configuration, the process runner, and the
/// lock that keeps failure diagnostics from different workers apart.
pub struct BuildContext {
    config: BuildConfig,
    invoker: Arc<dyn Invoker>,
    output: Mutex<()>,
    progress: ProgressBar,
}

impl BuildContext {
    /// Compile one batch. A failure is re-run verbosely before it is returned.
    pub fn compile(&self, sources: &[PathBuf], fast_io: bool) -> Result<()> {
        let command = CompilerCommand::for_batch(&self.config, sources, fast_io)?;
        debug!("exec: {}", command);

        let code = self.run(&command, true)?;
        if code == 0 {
            return Ok(());
        }

        let verbose_code = self.report_failure(&command, code);
        Err(Error::Failed {
            sources: sources.to_vec(),
            code,
            verbose_code,
        })
    }

    fn run(&self, command: &CompilerCommand, quiet: bool) -> Result<i32> {
        self.invoker
            .invoke(command, quiet)
            .map_err(|source| Error::Spawn {
                program: command.program.display().to_string(),
                source,
            })
    }

    fn report_failure(&self, command: &CompilerCommand, code: i32) -> i32 {
        let _guard = self.output.lock().unwrap_or_else(|e| e.into_inner());
        let verbose = command.verbose();

        self.progress.suspend(|| {
            println!("{} FAILED BUILD:", "***".red().bold());
            println!("exec: \"{}\"", verbose);
            println!();
            let _ = io::stdout().flush();

            let verbose_code = match self.run(&verbose, false) {
                Ok(c) => c,
                Err(e) => {
                    println!("{} {}", "x".red(), e);
                    -1
                }
            };

            println!("exit code: {} / {}", code, verbose_code);
            println!("{}", "***".red().bold());
            println!();
            let _ = io::stdout().flush();
            verbose_code
        })
    }
}

pub struct Builder {
    ctx: Arc<BuildContext>,
    fast_io: bool,
}

impl Builder {
    pub fn new(config: BuildConfig, invoker: Arc<dyn Invoker>) -> Self {
        let progress = if config.progress {
            let style = ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-");
            let pb = ProgressBar::new(0);
            pb.set_style(style);
            pb
        } else {
            ProgressBar::hidden()
        };

        Self {
            fast_io: config.uses_fast_io(),
            ctx: Arc::new(BuildContext {
                config,
                invoker,
                output: Mutex::new(()),
                progress,
            }),
        }
    }

    /// Whether `-pipe` is (still) in use.
    pub fn fast_io(&self) -> bool {
        self.fast_io
    }

    /// Support files, then every unit.
    pub fn build(&mut self, units: &[PathBuf]) -> Result<BuildSummary> {
        self.build_support()?;
        self.build_units(units)
    }

    /// Build the support sources every test case links against. A failure
    /// with `-pipe` is retried once without it; anything else is fatal.
    pub fn build_support(&mut self) -> Result<()> {
        let files = support_files(&self.ctx.config);
        if files.is_empty() {
            return Ok(());
        }

        println!("{} Building support files...", "🔧".cyan());
        match self.ctx.compile(&files, self.fast_io) {
            Ok(()) => Ok(()),
            Err(e) if self.fast_io => {
                debug!("support build failed with -pipe: {}", e);
                println!("   {} Trying without `-pipe`...", "↻".yellow());
                self.fast_io = false;
                self.ctx.compile(&files, false)
            }
            Err(e) => Err(e),
        }
    }

    /// Build all units in batches, serially for one thread, otherwise through
    /// a [`JobPool`]. Submission stops at the first recorded failure; running
    /// batches are still waited for.
    pub fn build_units(&self, units: &[PathBuf]) -> Result<BuildSummary> {
        let config = &self.ctx.config;
        let threads = config.threads;
        let cpus = std::thread::available_parallelism().map_or(1, |n| n.get());
        println!(
            "{} Building test cases ({} thread{} / {} CPU{})...",
            "🚀".cyan(),
            threads,
            plural(threads),
            cpus,
            plural(cpus)
        );

        let size = batch_size(config.language, units.len(), threads);
        debug!("{} units in batches of {}", units.len(), size);
        self.ctx.progress.set_length(units.len() as u64);

        let result = if threads <= 1 {
            self.build_serial(units, size)
        } else {
            self.build_parallel(units, size)
        };
        self.ctx.progress.finish_and_clear();
        result
    }

    fn build_serial(&self, units: &[PathBuf], size: usize) -> Result<BuildSummary> {
        let mut summary = BuildSummary::default();
        for batch in plan_batches(units, size) {
            summary.batches += 1;
            summary.sources += batch.len();
            self.ctx.compile(&batch, self.fast_io)?;
            self.ctx.progress.inc(batch.len() as u64);
        }
        Ok(summary)
    }

    fn build_parallel(&self, units: &[PathBuf], size: usize) -> Result<BuildSummary> {
        let pool = JobPool::new(self.ctx.config.threads)?;
        debug!("job pool with {} slots", pool.capacity());
        let mut summary = BuildSummary::default();

        for batch in plan_batches(units, size) {
            if pool.has_errors() {
                warn!("a build failed, not starting further batches");
                break;
            }
            summary.batches += 1;
            summary.sources += batch.len();

            let ctx = Arc::clone(&self.ctx);
            let fast_io = self.fast_io;
            pool.submit(move || {
                ctx.compile(&batch, fast_io)?;
                ctx.progress.inc(batch.len() as u64);
                Ok(())
            });
        }

        pool.join_all()?;
        Ok(summary)
    }
}

/// Support sources built before any test case. Java has none; `std_thread.c`
/// uses `__try` and only builds with cl.
pub fn support_files(config: &BuildConfig) -> Vec<PathBuf> {
    match config.language {
        Language::Java => Vec::new(),
        Language::Cpp => {
            let mut files = vec![config.support_dir.join("io.c")];
            if config.style == InvocationStyle::Cl {
                files.push(config.support_dir.join("std_thread.c"));
            }
            files
        }
    }
}
