use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::debug;

use crate::error::LayerFontError;

/// Runs an external program to completion. A spawn failure or a non-zero exit
/// status is an error carrying the program's stderr.
pub(crate) fn run_tool<I, S>(program: &str, args: I) -> Result<(), LayerFontError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = Command::new(program);
    cmd.args(args);
    debug!("running {:?}", cmd);
    let output = cmd.output().map_err(|err| LayerFontError::Tool {
        program: program.to_string(),
        message: err.to_string(),
    })?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(LayerFontError::Tool {
            program: program.to_string(),
            message: format!("{}: {}", output.status, stderr.trim()),
        });
    }
    Ok(())
}

/// Compiles a TTX table description into a binary font.
pub trait TableCompiler {
    fn compile_tables(&mut self, ttx: &Path, output: &Path) -> Result<(), LayerFontError>;
}

/// fontTools' `ttx` command.
#[derive(Debug, Clone)]
pub struct TtxCompiler {
    program: String,
}

impl TtxCompiler {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl TableCompiler for TtxCompiler {
    fn compile_tables(&mut self, ttx: &Path, output: &Path) -> Result<(), LayerFontError> {
        let args: [PathBuf; 4] = [
            "--recalc-timestamp".into(),
            "-o".into(),
            output.to_path_buf(),
            ttx.to_path_buf(),
        ];
        run_tool(&self.program, &args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_programs_are_tool_errors() {
        let err = run_tool("layerfont-no-such-program", ["--version"]).unwrap_err();
        match err {
            LayerFontError::Tool { program, .. } => {
                assert_eq!(program, "layerfont-no-such-program")
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_an_error() {
        assert!(run_tool("sh", ["-c", "exit 0"]).is_ok());
        let err = run_tool("sh", ["-c", "echo broken >&2; exit 3"]).unwrap_err();
        assert!(err.to_string().contains("broken"), "{err}");
    }
}
