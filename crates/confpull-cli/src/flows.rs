use std::path::{Path, PathBuf};
use std::time::Duration;

use confpull_core::{
    ConfpullConfig, FailureKind, FetchRequest, FileKind, FileRegistry, FlowError,
};
use confpull_installer::{
    backup_exists, backup_file, ensure_backup_dir, install_file, restore_backup, BackupOutcome,
    WorkspaceLayout,
};
use confpull_security::{check_content, ValidationOptions};

use crate::download::{download_with_progress, HttpOptions};

/// Everything a workflow needs, built once from the loaded configuration.
#[derive(Debug, Clone)]
pub(crate) struct FlowContext {
    pub(crate) registry: FileRegistry,
    pub(crate) layout: WorkspaceLayout,
    pub(crate) validation: ValidationOptions,
    pub(crate) http: HttpOptions,
}

impl FlowContext {
    pub(crate) fn from_config(
        root: &Path,
        config: ConfpullConfig,
        timeout_override: Option<Duration>,
    ) -> Self {
        Self {
            layout: WorkspaceLayout::new(root, &config.backup_dir),
            validation: ValidationOptions {
                key_passphrase: config.key_passphrase,
            },
            http: HttpOptions {
                timeout: timeout_override.or(config.request_timeout),
            },
            registry: config.registry,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum FetchStage {
    Downloaded,
    Validated,
    BackedUp,
    Installed,
}

impl FetchStage {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Downloaded => "downloaded",
            Self::Validated => "validated",
            Self::BackedUp => "backed-up",
            Self::Installed => "installed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FlowEvent {
    Fetching { file_name: String, url: String },
    Progress { downloaded: u64, total: Option<u64> },
    Reached(FetchStage),
    BackingUp { file_name: String },
    Backup { file_name: String, outcome: BackupOutcome },
    Installing { file_name: String, path: PathBuf },
    Reverting { file_name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FetchReport {
    pub(crate) request: FetchRequest,
    pub(crate) kind: FileKind,
    pub(crate) path: PathBuf,
    pub(crate) bytes: usize,
    pub(crate) backup: BackupOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RevertReport {
    pub(crate) file_name: String,
    pub(crate) path: PathBuf,
}

/// Downloads `url`, validates the body against the file's kind, refreshes the
/// backup slot and installs the new content.
///
/// Nothing touches the disk before validation and path resolution succeed. A
/// failed backup is reported through `observer` and in the report but never
/// stops the install.
pub(crate) fn run_fetch(
    ctx: &FlowContext,
    url: &str,
    observer: &mut dyn FnMut(FlowEvent),
) -> Result<FetchReport, FlowError> {
    let request =
        FetchRequest::parse(url).map_err(|err| FlowError::InvalidRequest(format!("{err:#}")))?;
    tracing::info!(
        url = %request.url,
        file = %request.file_name,
        app = %request.app_name,
        "fetching configuration file"
    );

    observer(FlowEvent::Fetching {
        file_name: request.file_name.clone(),
        url: request.url.clone(),
    });
    let content = download_with_progress(&request.url, &ctx.http, |downloaded, total| {
        observer(FlowEvent::Progress { downloaded, total })
    })
    .map_err(|failure| FlowError::Transport {
        url: request.url.clone(),
        code: failure.code,
        message: failure.message,
    })?;
    reach(observer, FetchStage::Downloaded);

    let kind = ctx.registry.kind_for(&request.file_name);
    check_content(&content, kind, &ctx.validation).map_err(|err| FlowError::Validation {
        file_name: request.file_name.clone(),
        kind,
        reason: format!("{err:#}"),
    })?;
    reach(observer, FetchStage::Validated);

    let relative = resolve_live_path(&ctx.registry, &request.file_name, request.app_name())?;
    let path = ctx.layout.live_path(&relative);

    observer(FlowEvent::BackingUp {
        file_name: request.file_name.clone(),
    });
    let backup = if ensure_backup_dir(&ctx.layout) {
        backup_file(&ctx.layout, &path, &request.file_name)
    } else {
        BackupOutcome::Failed(format!(
            "backup directory {} is unavailable",
            ctx.layout.backup_dir().display()
        ))
    };
    if let BackupOutcome::Failed(reason) = &backup {
        tracing::warn!(
            file = %request.file_name,
            failure = FailureKind::BackupFailure.as_str(),
            %reason,
            "continuing without backup"
        );
    }
    observer(FlowEvent::Backup {
        file_name: request.file_name.clone(),
        outcome: backup.clone(),
    });
    reach(observer, FetchStage::BackedUp);

    observer(FlowEvent::Installing {
        file_name: request.file_name.clone(),
        path: path.clone(),
    });
    install_file(&path, &content).map_err(|err| FlowError::Install {
        file_name: request.file_name.clone(),
        path: path.clone(),
        reason: format!("{err:#}"),
    })?;
    reach(observer, FetchStage::Installed);

    Ok(FetchReport {
        kind,
        path,
        bytes: content.len(),
        backup,
        request,
    })
}

/// Copies the backup slot of `file_name` back over its live file.
///
/// The slot is checked before the registry so a missing backup is reported
/// even for names the registry does not know.
pub(crate) fn run_revert(
    ctx: &FlowContext,
    file_name: &str,
    app_name: Option<&str>,
    observer: &mut dyn FnMut(FlowEvent),
) -> Result<RevertReport, FlowError> {
    let file_name = file_name.trim();
    if file_name.is_empty() || file_name.contains(['/', '\\']) || file_name == ".." {
        return Err(FlowError::InvalidRequest(format!(
            "'{file_name}' is not a configuration file name"
        )));
    }
    let app_name = app_name.map(str::trim).filter(|value| !value.is_empty());

    observer(FlowEvent::Reverting {
        file_name: file_name.to_string(),
    });
    if !backup_exists(&ctx.layout, file_name) {
        return Err(FlowError::NoBackup {
            file_name: file_name.to_string(),
        });
    }

    let relative = resolve_live_path(&ctx.registry, file_name, app_name)?;
    let path = ctx.layout.live_path(&relative);
    restore_backup(&ctx.layout, file_name, &path).map_err(|err| FlowError::Revert {
        file_name: file_name.to_string(),
        path: path.clone(),
        reason: format!("{err:#}"),
    })?;
    tracing::info!(file = file_name, path = %path.display(), "reverted from backup");

    Ok(RevertReport {
        file_name: file_name.to_string(),
        path,
    })
}

fn resolve_live_path(
    registry: &FileRegistry,
    file_name: &str,
    app_name: Option<&str>,
) -> Result<PathBuf, FlowError> {
    if !registry.contains(file_name) {
        return Err(FlowError::UnknownFile {
            file_name: file_name.to_string(),
        });
    }
    registry
        .resolve(file_name, app_name)
        .ok_or_else(|| FlowError::MissingAppName {
            file_name: file_name.to_string(),
        })
}

fn reach(observer: &mut dyn FnMut(FlowEvent), stage: FetchStage) {
    tracing::debug!(stage = stage.as_str(), "fetch stage reached");
    observer(FlowEvent::Reached(stage));
}
