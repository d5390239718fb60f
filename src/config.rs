use crate::error::{Error, Result};
use anyhow::Context;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default settings file picked up from the current directory.
pub const SETTINGS_FILE: &str = "juliet-build.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Cpp,
    Java,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Cpp => "cpp",
            Language::Java => "java",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "cpp" | "c" | "c++" => Ok(Language::Cpp),
            "java" => Ok(Language::Java),
            other => Err(Error::Config(format!("Unknown language '{}'", other))),
        }
    }
}

/// Which half of each test case gets compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseSelection {
    Good,
    Bad,
    #[default]
    Both,
}

impl CaseSelection {
    /// Preprocessor macro that omits the unwanted half, if any.
    pub fn omit_macro(&self) -> Option<&'static str> {
        match self {
            CaseSelection::Good => Some("OMITBAD"),
            CaseSelection::Bad => Some("OMITGOOD"),
            CaseSelection::Both => None,
        }
    }
}

impl FromStr for CaseSelection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "good" => Ok(CaseSelection::Good),
            "bad" => Ok(CaseSelection::Bad),
            "both" => Ok(CaseSelection::Both),
            other => Err(Error::Config(format!("Unknown cases '{}'", other))),
        }
    }
}

/// Command-line convention used to drive the C/C++ compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationStyle {
    /// gcc / MinGW style flags (`-I`, `-D`, `-c`)
    Gcc,
    /// MSVC `cl` style flags (`/I`, `/D`, `/c`)
    Cl,
}

/// Validated configuration consumed by discovery and the build.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub language: Language,
    /// Root of the labeled test case tree (`testcases/`).
    pub test_cases_dir: PathBuf,
    /// Support sources and headers (`testcasesupport/`).
    pub support_dir: PathBuf,
    /// Working directory of every compiler invocation; object files land here.
    pub object_dir: PathBuf,
    /// CWEs to build. Empty means all of them.
    pub include: BTreeSet<u32>,
    pub exclude: BTreeSet<u32>,
    pub cases: CaseSelection,
    pub threads: usize,
    /// gcc, cl or ant, depending on language and style.
    pub compiler: PathBuf,
    pub style: InvocationStyle,
    /// Try `-pipe` first (gcc only).
    pub fast_io: bool,
    pub progress: bool,
}

impl BuildConfig {
    /// Minimal configuration rooted at `test_cases_dir`, building everything
    /// single-threaded with gcc conventions.
    pub fn new(language: Language, test_cases_dir: impl Into<PathBuf>) -> Self {
        let test_cases_dir = test_cases_dir.into();
        Self {
            language,
            support_dir: test_cases_dir.clone(),
            object_dir: test_cases_dir.clone(),
            test_cases_dir,
            include: BTreeSet::new(),
            exclude: BTreeSet::new(),
            cases: CaseSelection::Both,
            threads: 1,
            compiler: PathBuf::from("gcc"),
            style: InvocationStyle::Gcc,
            fast_io: true,
            progress: false,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.threads == 0 {
            return Err(Error::Config("'threads' argument is non-positive".into()));
        }
        if !self.test_cases_dir.is_dir() {
            return Err(Error::Config(format!(
                "Test case directory {} does not exist",
                self.test_cases_dir.display()
            )));
        }
        if self.language == Language::Cpp && !self.support_dir.is_dir() {
            return Err(Error::Config(format!(
                "Support directory {} does not exist",
                self.support_dir.display()
            )));
        }
        if self.language == Language::Java && self.style == InvocationStyle::Cl {
            return Err(Error::Config("'cl' cannot build Java test cases".into()));
        }
        Ok(())
    }

    /// Whether `-pipe` should be attempted at all.
    pub fn uses_fast_io(&self) -> bool {
        self.fast_io && self.language == Language::Cpp && self.style == InvocationStyle::Gcc
    }
}

/// Parse a comma separated CWE list such as `"120,190"`.
pub fn parse_cwe_list(list: &str) -> Result<BTreeSet<u32>> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.trim_start_matches("CWE")
                .parse::<u32>()
                .map_err(|_| Error::Config(format!("'{}' is not a CWE number", s)))
        })
        .collect()
}

/// Optional `[build]` defaults read from a TOML settings file.
#[derive(Deserialize, Debug, Default)]
pub struct SettingsFile {
    #[serde(default)]
    pub build: Settings,
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct Settings {
    pub gcc: Option<String>,
    pub cl: Option<String>,
    pub ant: Option<String>,
    pub threads: Option<usize>,
    pub cases: Option<CaseSelection>,
    pub cwes: Option<Vec<u32>>,
    pub exclude: Option<Vec<u32>>,
    pub pipe: Option<bool>,
    pub progress: Option<bool>,
}

impl Settings {
    /// Fill every unset field of `self` from `fallback`.
    pub fn or(self, fallback: Settings) -> Settings {
        Settings {
            gcc: self.gcc.or(fallback.gcc),
            cl: self.cl.or(fallback.cl),
            ant: self.ant.or(fallback.ant),
            threads: self.threads.or(fallback.threads),
            cases: self.cases.or(fallback.cases),
            cwes: self.cwes.or(fallback.cwes),
            exclude: self.exclude.or(fallback.exclude),
            pipe: self.pipe.or(fallback.pipe),
            progress: self.progress.or(fallback.progress),
        }
    }
}

/// Load settings from `path`. When `path` is `None` the default file is used
/// if it exists, otherwise empty settings are returned.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let default = PathBuf::from(SETTINGS_FILE);
            if !default.exists() {
                return Ok(Settings::default());
            }
            default
        }
    };

    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read settings file {}", path.display()))?;
    let file: SettingsFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse settings file {}", path.display()))?;
    Ok(file.build)
}
