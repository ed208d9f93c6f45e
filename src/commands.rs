//! Post-generation command execution.
//!
//! Commands declared in the manifest run sequentially inside the freshly
//! generated project. A failing command never aborts the run; it is
//! reported as a warning and the remaining commands still execute.

use log::{info, warn};
use std::path::Path;
use std::process::Command;

use crate::error::{Result, Warning};

/// Runs each command line through the platform shell, in order, with the
/// generated project as working directory. Returns one warning per command
/// that could not be spawned or exited non-zero.
pub fn run_post_generate(commands: &[String], project_dir: &Path) -> Result<Vec<Warning>> {
    let mut warnings = Vec::new();
    for command in commands {
        info!("Running post-generation command: {command}");
        match shell_command(command).current_dir(project_dir).status() {
            Ok(status) if status.success() => {}
            Ok(status) => {
                warn!("Command '{command}' exited with {status}");
                warnings.push(Warning::command_failed(command, status));
            }
            Err(e) => {
                warn!("Command '{command}' could not be started: {e}");
                warnings.push(Warning::CommandFailed {
                    command: command.clone(),
                    detail: e.to_string(),
                });
            }
        }
    }
    Ok(warnings)
}

#[cfg(windows)]
fn shell_command(line: &str) -> Command {
    let mut command = Command::new("cmd");
    command.args(["/C", line]);
    command
}

#[cfg(not(windows))]
fn shell_command(line: &str) -> Command {
    let mut command = Command::new("sh");
    command.args(["-c", line]);
    command
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn successful_commands_produce_no_warnings() {
        let dir = TempDir::new().unwrap();
        let warnings = run_post_generate(&["true".into()], dir.path()).unwrap();
        assert!(warnings.is_empty());
    }

    #[test]
    fn a_failing_command_warns_but_later_commands_still_run() {
        let dir = TempDir::new().unwrap();
        let commands = vec!["false".into(), "touch after.txt".into()];

        let warnings = run_post_generate(&commands, dir.path()).unwrap();

        assert_eq!(warnings.len(), 1);
        assert!(matches!(warnings[0], Warning::CommandFailed { .. }));
        assert!(dir.path().join("after.txt").exists());
    }

    #[test]
    fn commands_run_in_the_project_directory() {
        let dir = TempDir::new().unwrap();
        run_post_generate(&["touch here.txt".into()], dir.path()).unwrap();
        assert!(dir.path().join("here.txt").exists());
    }
}
