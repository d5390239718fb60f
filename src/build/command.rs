use crate::config::{BuildConfig, InvocationStyle, Language};
use crate::error::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};

// Same switches as the .bat files shipped with the suite.
const CL_FLAGS: &[&str] = &["/W3", "/MT", "/GS", "/RTC1", "/bigobj", "/EHsc", "/nologo"];

// Found missing in some MinGW header versions.
const GCC_DEFINES: &[&str] = &[
    "-DCALG_RC5=(ALG_CLASS_DATA_ENCRYPT|ALG_TYPE_BLOCK|ALG_SID_RC5)",
    "-DNO_ERROR=0L",
    "-D__STDC_FORMAT_MACROS",
];

/// One external compiler (or ant) invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Appended for the diagnostic re-run of a failed build.
    pub verbose_args: Vec<String>,
    pub sources: Vec<PathBuf>,
}

impl CompilerCommand {
    pub fn for_batch(config: &BuildConfig, sources: &[PathBuf], fast_io: bool) -> Result<Self> {
        match config.language {
            Language::Java => ant_command(config, sources),
            Language::Cpp => Ok(match config.style {
                InvocationStyle::Gcc => gcc_command(config, sources, fast_io),
                InvocationStyle::Cl => cl_command(config, sources),
            }),
        }
    }

    /// The same command with the verbose flags appended, for the diagnostic
    /// re-run of a failed build.
    pub fn verbose(&self) -> CompilerCommand {
        let mut args = self.args.clone();
        args.extend(self.verbose_args.iter().cloned());
        CompilerCommand {
            program: self.program.clone(),
            args,
            verbose_args: Vec::new(),
            sources: self.sources.clone(),
        }
    }
}

impl fmt::Display for CompilerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = vec![quote(&self.program.to_string_lossy())];
        parts.extend(self.args.iter().map(|a| quote(a)));
        f.write_str(&parts.join(" "))
    }
}

fn quote(arg: &str) -> String {
    if arg.is_empty() || arg.contains([' ', '|', '(', ')', '"']) {
        format!("\"{}\"", arg.replace('"', "\\\""))
    } else {
        arg.to_string()
    }
}

fn path_arg(p: &Path) -> String {
    p.to_string_lossy().to_string()
}

fn gcc_command(config: &BuildConfig, sources: &[PathBuf], fast_io: bool) -> CompilerCommand {
    let mut args = vec!["-I".to_string(), path_arg(&config.support_dir)];
    if let Some(omit) = config.cases.omit_macro() {
        args.push(format!("-D{}", omit));
    }
    args.extend(GCC_DEFINES.iter().map(|d| d.to_string()));
    args.push("-c".into());
    // Subcommands do nothing; we only want the front end to accept the code.
    args.extend(["-wrapper".to_string(), "true".to_string()]);
    if fast_io {
        args.push("-pipe".into());
    }
    args.extend(sources.iter().map(|s| path_arg(s)));

    CompilerCommand {
        program: config.compiler.clone(),
        args,
        verbose_args: vec!["-v".into(), "-pass-exit-codes".into()],
        sources: sources.to_vec(),
    }
}

fn cl_command(config: &BuildConfig, sources: &[PathBuf]) -> CompilerCommand {
    let mut args = vec![format!("/I{}", path_arg(&config.support_dir))];
    if let Some(omit) = config.cases.omit_macro() {
        args.push(format!("/D{}", omit));
    }
    args.extend(CL_FLAGS.iter().map(|f| f.to_string()));
    args.push("/c".into());
    args.extend(sources.iter().map(|s| path_arg(s)));

    CompilerCommand {
        program: config.compiler.clone(),
        args,
        verbose_args: Vec::new(),
        sources: sources.to_vec(),
    }
}

fn ant_command(config: &BuildConfig, sources: &[PathBuf]) -> Result<CompilerCommand> {
    if sources.len() > 1 {
        return Err(Error::BatchTooLarge(sources.len()));
    }
    let mut args = Vec::new();
    for source in sources {
        args.extend(["-buildfile".to_string(), path_arg(source)]);
    }
    Ok(CompilerCommand {
        program: config.compiler.clone(),
        args,
        verbose_args: vec!["-v".into()],
        sources: sources.to_vec(),
    })
}
