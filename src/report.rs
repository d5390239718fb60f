//! Machine readable run report (`--report`).

use crate::config::BuildConfig;
use anyhow::{Context, Result};
use serde_json::{Value, json};
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Default, Clone)]
pub struct Timings {
    pub total: Duration,
    pub finding: Duration,
    pub building: Duration,
}

impl Timings {
    pub fn unaccounted(&self) -> Duration {
        self.total.saturating_sub(self.finding + self.building)
    }
}

pub struct RunReport<'a> {
    pub config: &'a BuildConfig,
    pub sources: usize,
    pub excluded: usize,
    pub batches: usize,
    pub timings: Timings,
    pub failures: Vec<String>,
}

impl RunReport<'_> {
    pub fn to_json(&self) -> Value {
        json!({
            "language": self.config.language.as_str(),
            "threads": self.config.threads,
            "cwes": self.config.include,
            "exclude": self.config.exclude,
            "sources": self.sources,
            "excluded": self.excluded,
            "batches": self.batches,
            "timings": {
                "total": self.timings.total.as_secs_f64(),
                "finding": self.timings.finding.as_secs_f64(),
                "building": self.timings.building.as_secs_f64(),
                "unaccounted": self.timings.unaccounted().as_secs_f64(),
            },
            "success": self.failures.is_empty(),
            "failures": self.failures,
        })
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(&self.to_json())?;
        fs::write(path, text).with_context(|| format!("Failed to write report {}", path.display()))
    }
}
