//! Locating compiler and build tool executables.

use std::env;
use std::path::{Path, PathBuf};

/// Default gcc: native on Windows, the MinGW cross compiler elsewhere (it
/// ships `windows.h`, which many test cases include).
pub fn default_gcc() -> &'static str {
    if cfg!(windows) {
        "gcc"
    } else {
        "/usr/bin/i686-w64-mingw32-gcc"
    }
}

pub fn default_ant() -> &'static str {
    "ant"
}

/// Worker count used when none is configured: one per CPU plus one ready.
pub fn default_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get() + 1)
        .unwrap_or(9)
}

/// Resolve `name` the way `which` does. Names containing a path separator are
/// checked directly, bare names are searched for on `PATH`.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    let candidate = Path::new(name);
    if candidate.components().count() > 1 || candidate.is_absolute() {
        return executable_file(candidate);
    }

    let path_var = env::var_os("PATH")?;
    env::split_paths(&path_var).find_map(|dir| executable_file(&dir.join(name)))
}

fn executable_file(path: &Path) -> Option<PathBuf> {
    if is_executable(path) {
        return Some(path.to_path_buf());
    }
    if cfg!(windows) && path.extension().is_none() {
        let exe = path.with_extension("exe");
        if is_executable(&exe) {
            return Some(exe);
        }
    }
    None
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
