//! Test case discovery.
//!
//! Walks the `testcases/` tree and collects every source unit that belongs to
//! a selected CWE. Only two directory shapes are ever entered:
//!
//! - `CWE<id>_<description>` - a category, filtered by the include/exclude sets
//! - `s<nn>` - a subdivision of an oversized category, always entered
//!
//! Anything else (e.g. the `antbuild` directories of the Java suite) is pruned
//! without being read.

use crate::config::{BuildConfig, InvocationStyle, Language};
use crate::error::{Error, Result};
use colored::*;
use log::debug;
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use walkdir::{DirEntry, WalkDir};

pub const DIR_PATTERN: &str = r"^(?:CWE([0-9]+)_.*|s[0-9]+)$";
pub const CPP_FILE_PATTERN: &str = r"^CWE[0-9]+_.*\.(c|cpp)$";
pub const JAVA_FILE_PATTERN: &str = r"^build\.xml$";

/// Windows specific according to its own comments; does not build with gcc.
pub const GCC_EXCLUDED_SOURCE: &str = "CWE397_Throw_Generic_Exception__declare_dotdotdot_w32_01.cpp";

static DIR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DIR_PATTERN).expect("directory pattern is valid"));
static CPP_FILE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(CPP_FILE_PATTERN).expect("source pattern is valid"));
static JAVA_FILE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(JAVA_FILE_PATTERN).expect("build file pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirKind {
    Category(u32),
    Subdivision,
}

/// Classify a directory name, `None` if it must not be entered.
pub fn classify_dir(name: &str) -> Option<DirKind> {
    let caps = DIR_RE.captures(name)?;
    match caps.get(1) {
        Some(id) => id.as_str().parse().ok().map(DirKind::Category),
        None => Some(DirKind::Subdivision),
    }
}

/// Include/exclude decision for a category. Exclude always wins.
pub fn category_selected(id: u32, include: &BTreeSet<u32>, exclude: &BTreeSet<u32>) -> bool {
    (include.is_empty() || include.contains(&id)) && !exclude.contains(&id)
}

pub fn file_pattern(language: Language) -> &'static Regex {
    match language {
        Language::Cpp => &CPP_FILE_RE,
        Language::Java => &JAVA_FILE_RE,
    }
}

/// Per-category line of the progress report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySummary {
    pub id: u32,
    pub sources: usize,
}

impl fmt::Display for CategorySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "found CWE {} with {} test sources", self.id, self.sources)
    }
}

#[derive(Debug, Default)]
pub struct Discovery {
    /// Units in traversal order.
    pub units: Vec<PathBuf>,
    /// One entry per category entered, in the order each one finished.
    pub categories: Vec<CategorySummary>,
    /// Matching files skipped because they cannot build under this convention.
    pub excluded: Vec<PathBuf>,
}

struct OpenCategory {
    id: u32,
    depth: usize,
    first_unit: usize,
}

/// Find all test case units below `config.test_cases_dir`.
pub fn discover(config: &BuildConfig) -> Result<Discovery> {
    let files_re = file_pattern(config.language);
    println!("  dirs_exp = {}", DIR_PATTERN);
    println!("  files_exp = {}", files_re.as_str());
    println!("  include = {:?}", config.include);
    println!("  exclude = {:?}", config.exclude);

    let mut discovery = Discovery::default();
    let mut open: Vec<OpenCategory> = Vec::new();

    let walker = WalkDir::new(&config.test_cases_dir)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| should_enter(entry, config));

    for entry in walker {
        let entry = entry.map_err(|source| Error::Discovery {
            path: source
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| config.test_cases_dir.clone()),
            source,
        })?;

        close_categories(&mut open, entry.depth(), &mut discovery);

        let name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type().is_dir() {
            if let Some(DirKind::Category(id)) = classify_dir(&name) {
                open.push(OpenCategory {
                    id,
                    depth: entry.depth(),
                    first_unit: discovery.units.len(),
                });
            }
            continue;
        }

        if !entry.path().is_file() || !files_re.is_match(&name) {
            continue;
        }

        if config.style == InvocationStyle::Gcc && name == GCC_EXCLUDED_SOURCE {
            println!(
                "  {} excluding '{}' because that test case explicitly does not work in gcc.",
                "!".yellow(),
                name
            );
            discovery.excluded.push(entry.into_path());
        } else {
            discovery.units.push(entry.into_path());
        }
    }
    close_categories(&mut open, 0, &mut discovery);

    Ok(discovery)
}

fn should_enter(entry: &DirEntry, config: &BuildConfig) -> bool {
    if !entry.file_type().is_dir() {
        return true;
    }
    match classify_dir(&entry.file_name().to_string_lossy()) {
        Some(DirKind::Category(id)) => category_selected(id, &config.include, &config.exclude),
        Some(DirKind::Subdivision) => true,
        None => {
            debug!("skipping {}", entry.path().display());
            false
        }
    }
}

// Categories close once the walk returns to their depth or above.
fn close_categories(open: &mut Vec<OpenCategory>, depth: usize, discovery: &mut Discovery) {
    while open.last().is_some_and(|top| top.depth >= depth) {
        let Some(category) = open.pop() else { break };
        let summary = CategorySummary {
            id: category.id,
            sources: discovery.units.len() - category.first_unit,
        };
        println!("    {}", summary);
        discovery.categories.push(summary);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "int x;\n").unwrap();
    }

    fn names(units: &[PathBuf]) -> Vec<String> {
        units
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_classify_dir() {
        assert_eq!(
            classify_dir("CWE120_Buffer_Overflow"),
            Some(DirKind::Category(120))
        );
        assert_eq!(classify_dir("s01"), Some(DirKind::Subdivision));
        assert_eq!(classify_dir("s"), None);
        assert_eq!(classify_dir("s01x"), None);
        assert_eq!(classify_dir("CACHE_temp"), None);
        assert_eq!(classify_dir("antbuild"), None);
        assert_eq!(classify_dir("CWE_missing_id"), None);
    }

    #[test]
    fn test_category_selected_truth_table() {
        let none = BTreeSet::new();
        let only_120: BTreeSet<u32> = [120].into();
        let only_190: BTreeSet<u32> = [190].into();

        assert!(category_selected(120, &none, &none));
        assert!(category_selected(120, &only_120, &none));
        assert!(!category_selected(190, &only_120, &none));
        assert!(!category_selected(120, &none, &only_120));
        // exclude dominates include
        assert!(!category_selected(120, &only_120, &only_120));
        assert!(category_selected(120, &only_120, &only_190));
    }

    #[test]
    fn test_file_patterns() {
        let cpp = file_pattern(Language::Cpp);
        assert!(cpp.is_match("CWE120_bad.cpp"));
        assert!(cpp.is_match("CWE190_x.c"));
        assert!(!cpp.is_match("CWE190_x.h"));
        assert!(!cpp.is_match("io.c"));
        assert!(!cpp.is_match("main_CWE1_x.c"));

        let java = file_pattern(Language::Java);
        assert!(java.is_match("build.xml"));
        assert!(!java.is_match("mybuild.xml"));
        assert!(!java.is_match("CWE15_x.java"));
    }

    #[test]
    fn test_include_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "CWE120_Buffer_Overflow/s01/CWE120_bad.cpp");
        touch(root, "CWE120_Buffer_Overflow/s02/CWE120_good.cpp");
        touch(root, "CWE190_Integer_Overflow/CWE190_x.cpp");

        let mut config = BuildConfig::new(Language::Cpp, root);
        config.include = [120].into();

        let found = discover(&config).unwrap();
        assert_eq!(names(&found.units), vec!["CWE120_bad.cpp", "CWE120_good.cpp"]);
        assert_eq!(
            found.categories,
            vec![CategorySummary { id: 120, sources: 2 }]
        );
        assert_eq!(
            found.categories[0].to_string(),
            "found CWE 120 with 2 test sources"
        );
    }

    #[test]
    fn test_summary_wording_is_fixed() {
        let one = CategorySummary { id: 190, sources: 1 };
        assert_eq!(one.to_string(), "found CWE 190 with 1 test sources");
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_directories_are_followed() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("testcases");
        touch(dir.path(), "elsewhere/CWE78_Command/CWE78_a.c");
        touch(dir.path(), "elsewhere/s02/CWE121_b.c");
        touch(&root, "CWE121_Stack/s01/CWE121_a.c");
        std::os::unix::fs::symlink(
            dir.path().join("elsewhere/CWE78_Command"),
            root.join("CWE78_Command"),
        )
        .unwrap();
        std::os::unix::fs::symlink(
            dir.path().join("elsewhere/s02"),
            root.join("CWE121_Stack/s02"),
        )
        .unwrap();

        let config = BuildConfig::new(Language::Cpp, &root);
        let found = discover(&config).unwrap();
        assert_eq!(
            names(&found.units),
            vec!["CWE121_a.c", "CWE121_b.c", "CWE78_a.c"]
        );
        assert_eq!(
            found.categories,
            vec![
                CategorySummary { id: 121, sources: 2 },
                CategorySummary { id: 78, sources: 1 },
            ]
        );
    }

    #[test]
    fn test_decoy_directories_are_pruned() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "CACHE_temp/CWE121_hidden.c");
        touch(root, "CWE121_Stack/antbuild/CWE121_copy.c");
        touch(root, "CWE121_Stack/CWE121_real.c");
        touch(root, "CWE121_Stack/readme.txt");

        let config = BuildConfig::new(Language::Cpp, root);
        let found = discover(&config).unwrap();
        assert_eq!(names(&found.units), vec!["CWE121_real.c"]);
    }

    #[test]
    fn test_exclude_wins_over_include() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "CWE120_A/CWE120_a.c");
        touch(root, "CWE190_B/CWE190_b.c");

        let mut config = BuildConfig::new(Language::Cpp, root);
        config.include = [120, 190].into();
        config.exclude = [120].into();

        let found = discover(&config).unwrap();
        assert_eq!(names(&found.units), vec!["CWE190_b.c"]);
        assert_eq!(found.categories.len(), 1);
        assert_eq!(found.categories[0].id, 190);
    }

    #[test]
    fn test_nested_categories_report_after_children() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "CWE1_Outer/CWE1_top.c");
        touch(root, "CWE1_Outer/CWE2_Inner/CWE2_a.c");
        touch(root, "CWE3_Next/CWE3_b.c");

        let config = BuildConfig::new(Language::Cpp, root);
        let found = discover(&config).unwrap();
        assert_eq!(
            found.categories,
            vec![
                CategorySummary { id: 2, sources: 1 },
                CategorySummary { id: 1, sources: 2 },
                CategorySummary { id: 3, sources: 1 },
            ]
        );
    }

    #[test]
    fn test_gcc_only_exclusion() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, &format!("CWE397_Throw/{}", GCC_EXCLUDED_SOURCE));
        touch(root, "CWE397_Throw/CWE397_other_01.cpp");

        let mut config = BuildConfig::new(Language::Cpp, root);
        let found = discover(&config).unwrap();
        assert_eq!(names(&found.units), vec!["CWE397_other_01.cpp"]);
        assert_eq!(names(&found.excluded), vec![GCC_EXCLUDED_SOURCE]);

        config.style = InvocationStyle::Cl;
        let found = discover(&config).unwrap();
        assert_eq!(found.units.len(), 2);
        assert!(found.excluded.is_empty());
    }

    #[test]
    fn test_java_finds_build_descriptors() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "CWE15_External/s01/build.xml");
        touch(root, "CWE15_External/s01/CWE15_x.java");
        touch(root, "CWE15_External/antbuild/build.xml");

        let config = BuildConfig::new(Language::Java, root);
        let found = discover(&config).unwrap();
        assert_eq!(found.units, vec![root.join("CWE15_External/s01/build.xml")]);
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = BuildConfig::new(Language::Cpp, dir.path().join("gone"));
        assert!(matches!(discover(&config), Err(Error::Discovery { .. })));
    }
}
