use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub(crate) fn remove_file_if_exists(path: &Path) -> io::Result<()> {
    if path.exists() {
        fs::remove_file(path)?;
    }
    Ok(())
}

pub(crate) fn part_path(path: &Path) -> PathBuf {
    path.with_file_name(format!(
        "{}.part",
        path.file_name()
            .and_then(|v| v.to_str())
            .unwrap_or("staged")
    ))
}

#[cfg(unix)]
pub(crate) fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = fs::metadata(path)?.permissions();
    permissions.set_mode(mode);
    fs::set_permissions(path, permissions)
}

#[cfg(not(unix))]
pub(crate) fn set_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}
