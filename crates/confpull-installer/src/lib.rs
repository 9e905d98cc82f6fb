mod backup;
mod fs_utils;
mod install;
mod layout;

pub use backup::{
    backup_exists, backup_file, backup_is_current, ensure_backup_dir, needs_backup,
    restore_backup, BackupOutcome, BACKUP_FILE_MODE,
};
pub use install::install_file;
pub use layout::WorkspaceLayout;
