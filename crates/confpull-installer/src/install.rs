use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::fs_utils::{part_path, remove_file_if_exists};

/// Writes `content` to `path` through a sibling `.part` file and a rename, so a
/// failed write never leaves a truncated live file behind.
///
/// Parent directories are created. An existing file keeps its permissions. When
/// `path` is a symlink the content goes to the file it points at and the link
/// itself stays in place.
pub fn install_file(path: &Path, content: &[u8]) -> Result<()> {
    let target = resolve_install_target(path)?;
    if let Some(parent) = target.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let part = part_path(&target);
    fs::write(&part, content)
        .with_context(|| format!("failed to write staged file: {}", part.display()))?;

    let result = carry_permissions(&target, &part).and_then(|()| {
        fs::rename(&part, &target).with_context(|| {
            format!(
                "failed to move staged file into place: {}",
                target.display()
            )
        })
    });
    if result.is_err() {
        let _ = remove_file_if_exists(&part);
    }
    result?;

    tracing::debug!(path = %path.display(), target = %target.display(), bytes = content.len(), "installed file");
    Ok(())
}

/// The path to write for `path`: itself unless it is a symlink, otherwise the
/// link's final target. Dangling links resolve one level, relative to the link.
fn resolve_install_target(path: &Path) -> Result<PathBuf> {
    let is_symlink = fs::symlink_metadata(path)
        .map(|metadata| metadata.file_type().is_symlink())
        .unwrap_or(false);
    if !is_symlink {
        return Ok(path.to_path_buf());
    }

    if let Ok(target) = fs::canonicalize(path) {
        return Ok(target);
    }
    let link = fs::read_link(path)
        .with_context(|| format!("failed to read symlink: {}", path.display()))?;
    Ok(match path.parent() {
        Some(parent) if link.is_relative() => parent.join(link),
        _ => link,
    })
}

fn carry_permissions(existing: &Path, staged: &Path) -> Result<()> {
    let Ok(metadata) = fs::metadata(existing) else {
        return Ok(());
    };
    fs::set_permissions(staged, metadata.permissions()).with_context(|| {
        format!(
            "failed to copy permissions of {} onto {}",
            existing.display(),
            staged.display()
        )
    })
}
