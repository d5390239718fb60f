//! Locating the test case and support directories inside an unzipped suite.
//!
//! Juliet 1.3 nests each language under its own directory (`C/`, `Java/src/`),
//! 1.2 did not. Both layouts are accepted.

use crate::config::Language;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteLayout {
    pub language_root: PathBuf,
    pub test_cases_dir: PathBuf,
    pub support_dir: PathBuf,
}

impl SuiteLayout {
    pub fn locate(samate_dir: &Path, language: Language) -> Result<Self> {
        if !samate_dir.is_dir() {
            return Err(Error::Config(format!(
                "Specified SAMATE path {} is not a directory",
                samate_dir.display()
            )));
        }

        let nested = match language {
            Language::Cpp => samate_dir.join("C"),
            Language::Java => samate_dir.join("Java").join("src"),
        };
        let language_root = if nested.is_dir() {
            nested
        } else {
            samate_dir.to_path_buf()
        };

        let test_cases_dir = language_root.join("testcases");
        let support_dir = language_root.join("testcasesupport");
        if !test_cases_dir.is_dir() {
            return Err(Error::Config(format!(
                "Cannot locate SAMATE test cases directory under {}",
                language_root.display()
            )));
        }
        if !support_dir.is_dir() {
            return Err(Error::Config(format!(
                "Cannot locate SAMATE test cases support directory under {}",
                language_root.display()
            )));
        }

        Ok(Self {
            language_root,
            test_cases_dir,
            support_dir,
        })
    }
}
