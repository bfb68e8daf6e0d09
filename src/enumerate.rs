//! Local file enumeration
//!
//! Walks a source tree into deploy candidates. Two policies share one walk:
//! branch syncs require files to be VCS-tracked and report strays, versioned
//! builds take every file. VCS internal storage is never a candidate under
//! either policy.

use crate::error::{LongshoreError, LongshoreResult};
use crate::models::LocalCandidate;
use crate::vcs::{VcsProbe, VcsStatus};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::fs;
use std::path::{Path, PathBuf};

/// Which files count as deploy candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumerationPolicy {
    /// Only VCS-tracked files. Strays (neither tracked nor ignored) are
    /// excluded and reported so the caller can warn about them.
    RequireTracked,
    /// Every file. For generated build output that is never tracked.
    AllFiles,
}

/// Result of a walk: candidates plus the strays excluded under
/// [`EnumerationPolicy::RequireTracked`].
#[derive(Debug, Default)]
pub struct Enumeration {
    pub candidates: Vec<LocalCandidate>,
    /// Relative paths of files skipped because the VCS does not know them.
    pub excluded: Vec<PathBuf>,
}

/// Enumerate deployable files under `root`.
///
/// The walk is recursive and the result is sorted by relative path for
/// deterministic output. A probe error (as opposed to "file unmatched")
/// aborts the walk.
pub fn enumerate_files(
    root: &Path,
    policy: EnumerationPolicy,
    vcs: &dyn VcsProbe,
) -> LongshoreResult<Enumeration> {
    if !root.is_dir() {
        return Err(LongshoreError::SourceNotFound {
            path: root.to_path_buf(),
        });
    }

    let ignored = match policy {
        EnumerationPolicy::RequireTracked => Some(ignore_matcher(root)),
        EnumerationPolicy::AllFiles => None,
    };

    let mut enumeration = Enumeration::default();
    enumerate_recursive(root, root, policy, vcs, ignored.as_ref(), &mut enumeration)?;
    enumeration
        .candidates
        .sort_by(|a, b| a.relative.cmp(&b.relative));
    enumeration.excluded.sort();
    Ok(enumeration)
}

/// Matcher over the project's own `.gitignore`, used to separate expected
/// build junk from strays worth warning about.
fn ignore_matcher(root: &Path) -> Gitignore {
    let mut builder = GitignoreBuilder::new(root);
    let _ = builder.add(root.join(".gitignore"));
    builder.build().unwrap_or_else(|_| Gitignore::empty())
}

fn enumerate_recursive(
    root: &Path,
    current: &Path,
    policy: EnumerationPolicy,
    vcs: &dyn VcsProbe,
    ignored: Option<&Gitignore>,
    out: &mut Enumeration,
) -> LongshoreResult<()> {
    for entry in fs::read_dir(current)? {
        let entry = entry?;
        let path = entry.path();

        if path.file_name() == Some(std::ffi::OsStr::new(".git")) {
            continue;
        }

        if path.is_dir() {
            enumerate_recursive(root, &path, policy, vcs, ignored, out)?;
            continue;
        }

        let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
        match policy {
            EnumerationPolicy::AllFiles => out.candidates.push(LocalCandidate {
                relative,
                absolute: path,
            }),
            EnumerationPolicy::RequireTracked => match vcs.status(&relative)? {
                VcsStatus::Tracked => out.candidates.push(LocalCandidate {
                    relative,
                    absolute: path,
                }),
                VcsStatus::Unmatched => {
                    // Ignored strays are expected build junk; only
                    // unignored ones are worth reporting.
                    let is_ignored = ignored
                        .map(|m| m.matched_path_or_any_parents(&relative, false).is_ignore())
                        .unwrap_or(false);
                    if !is_ignored {
                        out.excluded.push(relative);
                    }
                }
            },
        }
    }
    Ok(())
}
