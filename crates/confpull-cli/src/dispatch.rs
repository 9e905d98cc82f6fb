use std::io::IsTerminal;
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use confpull_core::{ConfpullConfig, FlowError, DEFAULT_CONFIG_FILE_NAME, KEY_PASSPHRASE_ENV};
use confpull_installer::{backup_exists, BackupOutcome};

use crate::flows::{run_fetch, run_revert, FetchStage, FlowContext, FlowEvent};
use crate::render::{DownloadProgress, TerminalRenderer};
use crate::{Cli, Commands};

pub(crate) fn run_cli(cli: Cli) -> Result<ExitCode> {
    let config = load_config(&cli.root, cli.config.as_deref())?;
    let ctx = FlowContext::from_config(&cli.root, config, cli.timeout.map(Duration::from_secs));
    let renderer = TerminalRenderer::current();

    let outcome = match cli.command {
        Commands::Get { url } => {
            let url = match url {
                Some(url) => url,
                None => prompt_for_url()?,
            };
            run_get_command(&ctx, &url, renderer)
        }
        Commands::Revert {
            file_name,
            app_name,
        } => run_revert_command(&ctx, &file_name, app_name.as_deref(), renderer),
        Commands::Status => {
            renderer.print_section("configuration files");
            renderer.print_lines(&format_status_lines(&ctx));
            Ok(())
        }
    };

    match outcome {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            tracing::debug!(kind = err.kind().as_str(), "command failed");
            renderer.print_error(&err.to_string());
            Ok(ExitCode::from(err.exit_code()))
        }
    }
}

fn load_config(root: &Path, explicit: Option<&Path>) -> Result<ConfpullConfig> {
    let config = match explicit {
        Some(path) => ConfpullConfig::load(path)?,
        None => ConfpullConfig::load_or_default(&root.join(DEFAULT_CONFIG_FILE_NAME))?,
    };
    Ok(config.with_env_passphrase(std::env::var(KEY_PASSPHRASE_ENV).ok()))
}

fn prompt_for_url() -> Result<String> {
    if !std::io::stdin().is_terminal() {
        bail!("no configuration url given and stdin is not a terminal");
    }
    let url = dialoguer::Input::<String>::new()
        .with_prompt("Define configuration server url")
        .interact_text()
        .context("failed to read configuration url")?;
    Ok(url)
}

fn run_get_command(
    ctx: &FlowContext,
    url: &str,
    renderer: TerminalRenderer,
) -> Result<(), FlowError> {
    let mut progress: Option<DownloadProgress> = None;
    let result = run_fetch(ctx, url, &mut |event| {
        if let FlowEvent::Fetching { file_name, .. } = &event {
            progress = Some(renderer.start_download(file_name));
        }
        if let FlowEvent::Progress { downloaded, total } = &event {
            if let Some(progress) = progress.as_mut() {
                progress.set(*downloaded, *total);
            }
            return;
        }
        if event == FlowEvent::Reached(FetchStage::Downloaded) {
            if let Some(mut progress) = progress.take() {
                progress.finish();
            }
        }
        if let Some((status, message)) = event_status_line(&event) {
            renderer.print_status(status, &message);
        }
    });
    drop(progress);

    let report = result?;
    tracing::info!(
        file = %report.request.file_name,
        kind = report.kind.as_str(),
        bytes = report.bytes,
        backup = report.backup.as_str(),
        path = %report.path.display(),
        "configuration installed"
    );
    Ok(())
}

fn run_revert_command(
    ctx: &FlowContext,
    file_name: &str,
    app_name: Option<&str>,
    renderer: TerminalRenderer,
) -> Result<(), FlowError> {
    let report = run_revert(ctx, file_name, app_name, &mut |event| {
        if let Some((status, message)) = event_status_line(&event) {
            renderer.print_status(status, &message);
        }
    })?;
    tracing::debug!(file = %report.file_name, "revert finished");
    renderer.print_status(
        "ok",
        &format!("File reverted successfully! ({})", report.path.display()),
    );
    Ok(())
}

/// Maps a workflow event to the status line shown to the operator, if any.
pub(crate) fn event_status_line(event: &FlowEvent) -> Option<(&'static str, String)> {
    match event {
        FlowEvent::Fetching { file_name, url } => {
            Some(("step", format!("Trying to get {file_name} from: {url}")))
        }
        FlowEvent::Progress { .. } => None,
        FlowEvent::Reached(FetchStage::Validated) => {
            Some(("ok", "Configuration downloaded and validated.".to_string()))
        }
        FlowEvent::Reached(FetchStage::Installed) => {
            Some(("ok", "File update success!".to_string()))
        }
        FlowEvent::Reached(_) => None,
        FlowEvent::BackingUp { .. } => Some(("step", "Creating backup...".to_string())),
        FlowEvent::Backup { file_name, outcome } => Some(match outcome {
            BackupOutcome::Created => ("ok", "Backup created successfully!".to_string()),
            BackupOutcome::Skipped => ("ok", format!("File {file_name} already backed up!")),
            BackupOutcome::Failed(reason) => {
                ("warn", format!("Failed to create backup! ({reason})"))
            }
        }),
        FlowEvent::Installing { file_name, .. } => {
            Some(("step", format!("Updating {file_name} file...")))
        }
        FlowEvent::Reverting { file_name } => Some((
            "step",
            format!("Trying to revert {file_name} file from backup directory..."),
        )),
    }
}

pub(crate) fn format_status_lines(ctx: &FlowContext) -> Vec<String> {
    let mut lines = vec![
        format!("root: {}", ctx.layout.root().display()),
        format!("backup dir: {}", ctx.layout.backup_dir().display()),
    ];
    for entry in ctx.registry.entries() {
        let template = if entry.per_application {
            format!("{}<app>/{}", entry.path, entry.name)
        } else {
            format!("{}{}", entry.path, entry.name)
        };
        let backup = if backup_exists(&ctx.layout, &entry.name) {
            "present"
        } else {
            "none"
        };
        lines.push(format!(
            "{} kind={} path={} backup={}",
            entry.name,
            entry.kind().as_str(),
            template,
            backup
        ));
    }
    lines
}
