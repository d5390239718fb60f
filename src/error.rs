//! Error taxonomy shared by discovery, the job pool and the orchestrator.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while discovering or building test cases
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to scan {}: {source}", path.display())]
    Discovery {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Build '{}' failed (exit code {code} / {verbose_code})", last_source(sources))]
    Failed {
        sources: Vec<PathBuf>,
        code: i32,
        verbose_code: i32,
    },

    #[error("Could not launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Can't build more than one file at a time with 'ant' (got {0})")]
    BatchTooLarge(usize),

    #[error("Build job panicked: {0}")]
    Panicked(String),

    #[error("Exceptions occurred in {} job{}", errors.len(), if errors.len() == 1 { "" } else { "s" })]
    Pool { errors: Vec<Error> },

    #[error("Failed to start worker threads: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl Error {
    /// Number of failed jobs this error stands for.
    pub fn failure_count(&self) -> usize {
        match self {
            Error::Pool { errors } => errors.len(),
            _ => 1,
        }
    }
}

fn last_source(sources: &[PathBuf]) -> String {
    sources
        .last()
        .map(|p| p.display().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_names_last_source() {
        let err = Error::Failed {
            sources: vec![PathBuf::from("a.c"), PathBuf::from("b.c")],
            code: 1,
            verbose_code: 1,
        };
        let msg = err.to_string();
        assert!(msg.contains("'b.c'"));
        assert!(msg.contains("exit code 1 / 1"));
    }

    #[test]
    fn test_pool_failure_count() {
        let err = Error::Pool {
            errors: vec![Error::Panicked("boom".into())],
        };
        assert_eq!(err.failure_count(), 1);
        assert_eq!(err.to_string(), "Exceptions occurred in 1 job");
        assert_eq!(Error::Config("x".into()).failure_count(), 1);
    }
}
