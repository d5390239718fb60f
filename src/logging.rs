//! Debug tracing: `log` records rendered by `env_logger` on stderr.

use colored::Colorize;
use env_logger::Builder;
use log::{Level, LevelFilter};
use std::io::Write;

/// Route `log` records to stderr. Our crate logs at `Info` (or `Debug` when
/// verbose), dependencies only at `Warn`. `RUST_LOG` still overrides both.
pub fn setup_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let _ = Builder::new()
        .filter_level(LevelFilter::Warn)
        .filter_module("juliet_build", level)
        .parse_default_env()
        .format(|buf, record| {
            let tag = match record.level() {
                Level::Error => "ERROR".red(),
                Level::Warn => "WARN".yellow(),
                Level::Info => "INFO".green(),
                Level::Debug | Level::Trace => "DEBUG".dimmed(),
            };
            writeln!(buf, "[{} {}] {}", "juliet-build".cyan(), tag, record.args())
        })
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_logging_twice() {
        setup_logging(true);
        setup_logging(false);
        // The second call finds a logger already installed and is a no-op.
        log::debug!("logger installed");
        let metadata = log::Metadata::builder()
            .level(Level::Error)
            .target("juliet_build")
            .build();
        assert!(log::logger().enabled(&metadata));
    }
}
