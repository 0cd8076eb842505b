//! Shared command context

use crate::config::AppConfig;
use crate::engine::ContainerEngine;
use crate::error::{Result, WorkbenchError};
use crate::logging::Logger;
use crate::prompt::{PickItem, Prompter};
use crate::runner::CommandRunner;
use crate::state::StateStore;
use regex::Regex;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use walkdir::{DirEntry, WalkDir};

const SKIPPED_DIRS: &[&str] = &["node_modules", "target", "bin", "obj"];
const MAX_DEPTH: usize = 6;

/// Everything a command handler needs: settings, the workspace root and the
/// external collaborators
pub struct Workbench {
    pub config: AppConfig,
    pub workspace: PathBuf,
    pub runner: Arc<dyn CommandRunner>,
    pub engine: Arc<dyn ContainerEngine>,
    pub prompter: Arc<dyn Prompter>,
    pub state: StateStore,
    pub logger: Logger,
}

impl Workbench {
    /// Commands that execute workspace content refuse to run in an untrusted workspace
    pub fn ensure_trusted(&self) -> Result<()> {
        if self.config.trusted {
            Ok(())
        } else {
            Err(WorkbenchError::Cancelled(Some("enforceTrust".to_string())))
        }
    }

    /// Resolve `path` against the workspace
    pub fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace.join(path)
        }
    }

    /// Workspace-relative path with forward slashes; paths outside the workspace stay absolute
    pub fn relative(&self, path: &Path) -> String {
        let absolute = self.absolute(path);
        let relative = absolute.strip_prefix(&self.workspace).unwrap_or(&absolute);
        to_slash(relative)
    }

    /// Files under the workspace whose name matches `pattern`, sorted
    pub fn find_files(&self, pattern: &Regex) -> Result<Vec<PathBuf>> {
        let mut found = Vec::new();
        let walker = WalkDir::new(&self.workspace)
            .max_depth(MAX_DEPTH + 1)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| !is_skipped(e));
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable workspace entry");
                    continue;
                }
            };
            if entry.file_type().is_file()
                && pattern.is_match(&entry.file_name().to_string_lossy())
            {
                found.push(entry.into_path());
            }
        }
        found.sort();
        Ok(found)
    }

    /// Let the user choose among `files`; none yields `None`, one is taken directly
    pub async fn pick_file(&self, files: &[PathBuf], message: &str) -> Result<Option<PathBuf>> {
        match files {
            [] => Ok(None),
            [only] => Ok(Some(only.clone())),
            _ => {
                let items: Vec<PickItem> = files
                    .iter()
                    .map(|f| PickItem::new(self.relative(f)))
                    .collect();
                let index = self.prompter.pick_one(message, &items).await?;
                Ok(files.get(index).cloned())
            }
        }
    }
}

fn is_skipped(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || SKIPPED_DIRS.contains(&&*name)
}

/// Render a path with `/` separators; rooted paths are shown as they are
pub fn to_slash(path: &Path) -> String {
    if path.has_root() {
        return path.display().to_string();
    }
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
