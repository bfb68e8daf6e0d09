//! Version-control probing
//!
//! A small seam over the `git` CLI so enumeration can ask about file
//! tracking without knowing how the answer is produced. Tests substitute a
//! fake probe instead of spawning git.

use crate::error::{LongshoreError, LongshoreResult};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Tracking state of one file, as the VCS reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VcsStatus {
    /// Known to the VCS.
    Tracked,
    /// Not known to the VCS (and not covered by ignore rules).
    Unmatched,
}

/// Asks the VCS about files. The probe itself failing is a distinct error
/// from a file merely being unmatched.
pub trait VcsProbe {
    /// Tracking state of `path`, relative to the probe's working directory.
    fn status(&self, path: &Path) -> LongshoreResult<VcsStatus>;
}

/// Probe backed by the `git` command line.
pub struct GitProbe {
    workdir: PathBuf,
}

impl GitProbe {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }
}

impl VcsProbe for GitProbe {
    fn status(&self, path: &Path) -> LongshoreResult<VcsStatus> {
        let output = Command::new("git")
            .args(["ls-files", "--error-unmatch", "--exclude-standard"])
            .arg(path)
            .current_dir(&self.workdir)
            .output()
            .map_err(|e| LongshoreError::VcsCheckFailed {
                path: path.to_path_buf(),
                message: format!("failed to run git: {e}"),
            })?;
        status_from_exit(path, output.status.code(), &output.stderr)
    }
}

/// Exit-status contract of `git ls-files --error-unmatch`: 0 means tracked,
/// 1 means unmatched, anything else means the check itself failed.
fn status_from_exit(path: &Path, code: Option<i32>, stderr: &[u8]) -> LongshoreResult<VcsStatus> {
    match code {
        Some(0) => Ok(VcsStatus::Tracked),
        Some(1) => Ok(VcsStatus::Unmatched),
        Some(code) => {
            let detail = String::from_utf8_lossy(stderr);
            let detail = detail.trim();
            let message = if detail.is_empty() {
                format!("git exited with status {code}")
            } else {
                format!("git exited with status {code}: {detail}")
            };
            Err(LongshoreError::VcsCheckFailed {
                path: path.to_path_buf(),
                message,
            })
        }
        None => Err(LongshoreError::VcsCheckFailed {
            path: path.to_path_buf(),
            message: "git terminated by signal".to_string(),
        }),
    }
}

/// Current branch name, used to pick a default environment.
pub fn current_branch(workdir: &Path) -> LongshoreResult<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--abbrev-ref", "HEAD"])
        .current_dir(workdir)
        .output()
        .map_err(|e| LongshoreError::VcsCheckFailed {
            path: workdir.to_path_buf(),
            message: format!("failed to run git: {e}"),
        })?;
    if !output.status.success() {
        return Err(LongshoreError::VcsCheckFailed {
            path: workdir.to_path_buf(),
            message: "could not determine the current branch".to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
