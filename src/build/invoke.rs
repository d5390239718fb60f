use super::command::CompilerCommand;
use std::io;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Runs a compiler command to completion and reports its raw exit code.
///
/// Interpreting the code (zero = success) and any retry policy belong to the
/// caller.
pub trait Invoker: Send + Sync {
    fn invoke(&self, command: &CompilerCommand, quiet: bool) -> io::Result<i32>;
}

/// Spawns real processes inside a fixed working directory.
#[derive(Debug, Clone)]
pub struct ProcessInvoker {
    working_dir: PathBuf,
}

impl ProcessInvoker {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
        }
    }
}

impl Invoker for ProcessInvoker {
    fn invoke(&self, command: &CompilerCommand, quiet: bool) -> io::Result<i32> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args).current_dir(&self.working_dir);
        if quiet {
            cmd.stdout(Stdio::null()).stderr(Stdio::null());
        } else {
            cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        }
        let status = cmd.status()?;
        // Killed by a signal: no code to report.
        Ok(status.code().unwrap_or(-1))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> CompilerCommand {
        CompilerCommand {
            program: PathBuf::from("/bin/sh"),
            args: vec!["-c".into(), script.into()],
            verbose_args: Vec::new(),
            sources: Vec::new(),
        }
    }

    #[test]
    fn test_exit_code_is_passed_through() {
        let invoker = ProcessInvoker::new(std::env::temp_dir());
        assert_eq!(invoker.invoke(&sh("exit 0"), true).unwrap(), 0);
        assert_eq!(invoker.invoke(&sh("echo noise; exit 3"), true).unwrap(), 3);
    }

    #[test]
    fn test_runs_in_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        let invoker = ProcessInvoker::new(dir.path());
        assert_eq!(invoker.invoke(&sh("touch marker.o"), true).unwrap(), 0);
        assert!(dir.path().join("marker.o").exists());
    }

    #[test]
    fn test_missing_program_is_an_error() {
        let invoker = ProcessInvoker::new(std::env::temp_dir());
        let cmd = CompilerCommand {
            program: PathBuf::from("/no/such/compiler"),
            args: Vec::new(),
            verbose_args: Vec::new(),
            sources: Vec::new(),
        };
        assert!(invoker.invoke(&cmd, true).is_err());
    }
}
