use std::path::{Path, PathBuf};

/// Filesystem locations of one working tree: the live files and the backup slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceLayout {
    root: PathBuf,
    backup_dir: PathBuf,
}

impl WorkspaceLayout {
    pub fn new(root: impl Into<PathBuf>, backup_dir: impl AsRef<Path>) -> Self {
        let root = root.into();
        let backup_dir = root.join(backup_dir);
        Self { root, backup_dir }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// The single backup slot for `file_name`.
    pub fn backup_path(&self, file_name: &str) -> PathBuf {
        self.backup_dir.join(format!("{file_name}.bc"))
    }

    pub fn live_path(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }
}
