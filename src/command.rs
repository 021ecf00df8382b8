use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::CommandError;
use crate::output;

/// Runs version-control commands inside one working directory
pub struct Runner {
    program: String,
    dir: PathBuf,
}

impl Runner {
    pub fn git(dir: impl AsRef<Path>) -> Self {
        Self {
            program: "git".to_owned(),
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Execute the command and return its stdout
    pub fn try_run(&self, args: &[&str]) -> Result<String, CommandError> {
        let command = format!("{} {}", self.program, args.join(" "));
        let output = Command::new(&self.program)
            .args(args)
            .current_dir(&self.dir)
            .output()
            .map_err(|source| CommandError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(CommandError::Failed {
                command,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Execute the command, logging any failure and returning an empty string in its place.
    ///
    /// An empty result may mean the command failed, not that there was nothing to report.
    pub fn run(&self, args: &[&str]) -> String {
        self.try_run(args).unwrap_or_else(|err| {
            output::error(&err.to_string());
            String::new()
        })
    }
}
