use anyhow::{anyhow, Context, Result};
use confpull_security::same_content;
use std::fs;
use std::io;
use std::path::Path;

use crate::fs_utils::{part_path, remove_file_if_exists, set_mode};
use crate::install::install_file;
use crate::WorkspaceLayout;

pub const BACKUP_FILE_MODE: u32 = 0o755;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupOutcome {
    Created,
    /// The slot already holds the live file's content.
    Skipped,
    Failed(String),
}

impl BackupOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Skipped => "skipped",
            Self::Failed(_) => "failed",
        }
    }
}

/// Creates the backup directory if needed. True when it exists afterwards.
pub fn ensure_backup_dir(layout: &WorkspaceLayout) -> bool {
    let dir = layout.backup_dir();
    match fs::create_dir_all(dir) {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(dir = %dir.display(), error = %err, "failed to create backup directory");
            dir.is_dir()
        }
    }
}

pub fn backup_exists(layout: &WorkspaceLayout, file_name: &str) -> bool {
    layout.backup_dir().is_dir() && layout.backup_path(file_name).is_file()
}

/// True when a backup exists and its digest equals the live content's digest.
pub fn backup_is_current(live: &[u8], backup: Option<&[u8]>) -> bool {
    backup.is_some_and(|backup| same_content(live, backup))
}

pub fn needs_backup(layout: &WorkspaceLayout, live_path: &Path, file_name: &str) -> Result<bool> {
    let live = fs::read(live_path)
        .with_context(|| format!("failed to read live file: {}", live_path.display()))?;

    let slot = layout.backup_path(file_name);
    let backup = match fs::read(&slot) {
        Ok(bytes) => Some(bytes),
        Err(err) if err.kind() == io::ErrorKind::NotFound => None,
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read backup slot: {}", slot.display()));
        }
    };

    Ok(!backup_is_current(&live, backup.as_deref()))
}

/// Copies the live file into the backup slot for `file_name` unless the slot is
/// already up to date. Never returns an error; failures come back as `Failed`.
pub fn backup_file(layout: &WorkspaceLayout, live_path: &Path, file_name: &str) -> BackupOutcome {
    if !live_path.is_file() {
        return BackupOutcome::Failed(format!("source missing: {}", live_path.display()));
    }

    match needs_backup(layout, live_path, file_name) {
        Ok(false) => {
            tracing::debug!(file = file_name, "backup already up to date");
            return BackupOutcome::Skipped;
        }
        Ok(true) => {}
        Err(err) => return BackupOutcome::Failed(format!("{err:#}")),
    }

    if !ensure_backup_dir(layout) {
        return BackupOutcome::Failed(format!(
            "backup directory unavailable: {}",
            layout.backup_dir().display()
        ));
    }

    match write_backup(layout, live_path, file_name) {
        Ok(()) => {
            tracing::info!(file = file_name, "backup created");
            BackupOutcome::Created
        }
        Err(err) => BackupOutcome::Failed(format!("{err:#}")),
    }
}

fn write_backup(layout: &WorkspaceLayout, live_path: &Path, file_name: &str) -> Result<()> {
    let slot = layout.backup_path(file_name);
    let part = part_path(&slot);

    let result = fs::copy(live_path, &part)
        .with_context(|| {
            format!(
                "failed to copy {} into backup {}",
                live_path.display(),
                part.display()
            )
        })
        .and_then(|_| {
            fs::rename(&part, &slot)
                .with_context(|| format!("failed to move backup into place: {}", slot.display()))
        });
    if result.is_err() {
        let _ = remove_file_if_exists(&part);
    }
    result?;

    set_mode(&slot, BACKUP_FILE_MODE)
        .with_context(|| format!("failed to set permissions on backup: {}", slot.display()))
}

/// Copies the backup slot for `file_name` over `destination`.
pub fn restore_backup(layout: &WorkspaceLayout, file_name: &str, destination: &Path) -> Result<()> {
    let slot = layout.backup_path(file_name);
    let bytes = match fs::read(&slot) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(anyhow!("no backup slot for {file_name}: {}", slot.display()));
        }
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read backup slot: {}", slot.display()));
        }
    };

    install_file(destination, &bytes)?;
    tracing::info!(file = file_name, path = %destination.display(), "restored from backup");
    Ok(())
}
