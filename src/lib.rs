//! # juliet-build - SAMATE Juliet test suite builder
//!
//! Compiles the thousands of individually buildable test case sources of the
//! NIST SAMATE Juliet suite (C/C++ or Java) as quickly as the machine allows,
//! while keeping failures easy to reproduce.
//!
//! ## Pipeline
//!
//! 1. [`layout`] finds `testcases/` and `testcasesupport/` inside the suite
//! 2. [`discovery`] walks the CWE tree and selects the units to build
//! 3. [`build`] compiles the support files, then the units in batches on a
//!    bounded pool of workers, re-running any failure verbosely
//!
//! ## Quick Start
//!
//! ```bash
//! juliet-build --language cpp --samate ~/juliet --output /tmp/out --cwes 120,190
//! ```
//!
//! Nothing is linked: the goal is to check that every selected test case
//! compiles, and to leave the object files behind.

/// Batching, the job pool, and the build orchestrator.
pub mod build;

/// Build configuration and the optional settings file.
pub mod config;

/// Filtered discovery of test case units.
pub mod discovery;

/// Error taxonomy.
pub mod error;

/// Suite directory layout (Juliet 1.2 and 1.3).
pub mod layout;

/// `log` backend setup for the binary.
pub mod logging;

/// JSON run report.
pub mod report;

/// Executable lookup and platform defaults.
pub mod toolchain;

/// Terminal output helpers.
pub mod ui;

pub use error::{Error, Result};
