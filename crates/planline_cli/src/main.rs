//! Diagnostic CLI over the Planline core.
//!
//! Every subcommand prints JSON on stdout. Repository fallbacks print as
//! normal output; only failed user-initiated writes exit non-zero.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::warn;
use planline_core::model::project::NewProject;
use planline_core::model::reminder::ReminderWindow;
use planline_core::model::settings::{SettingsPatch, Theme};
use planline_core::{init_logging, Backend, BackendConfig, LogTarget};
use serde_json::json;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "planline", about = "Planline backend diagnostics", version)]
struct Cli {
    /// Backend configuration (JSON). Defaults apply when omitted.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// trace|debug|info|warn|error
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Write rolling log files here instead of stderr.
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Probe the backend and print the health state
    Health,
    /// List projects
    Projects,
    /// Create a project
    AddProject {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// List activity logs, newest first
    Logs,
    /// List reminders, optionally limited to a due-date window
    Reminders {
        #[arg(long, value_enum)]
        window: Option<WindowArg>,
    },
    /// Show settings, applying any given changes first
    Settings {
        #[arg(long, value_enum)]
        theme: Option<ThemeArg>,
        #[arg(long)]
        font_scale: Option<u32>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum WindowArg {
    Today,
    Upcoming,
    Overdue,
}

impl From<WindowArg> for ReminderWindow {
    fn from(value: WindowArg) -> Self {
        match value {
            WindowArg::Today => Self::Today,
            WindowArg::Upcoming => Self::Upcoming,
            WindowArg::Overdue => Self::Overdue,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ThemeArg {
    Light,
    Dark,
}

impl From<ThemeArg> for Theme {
    fn from(value: ThemeArg) -> Self {
        match value {
            ThemeArg::Light => Self::Light,
            ThemeArg::Dark => Self::Dark,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let target = match cli.log_dir {
        Some(dir) => LogTarget::Directory(dir),
        None => LogTarget::Stderr,
    };
    init_logging(&cli.log_level, target).context("failed to start logging")?;

    let config = match &cli.config {
        Some(path) => BackendConfig::from_path(path)
            .with_context(|| format!("failed to load config `{}`", path.display()))?,
        None => BackendConfig::default(),
    };
    let backend = Backend::connect(config);
    if let Some(err) = backend.init_error() {
        warn!(
            "event=cli_start module=cli status=degraded mode=offline_preview error={}",
            err
        );
    }

    let output = match cli.cmd {
        Cmd::Health => {
            let reachable = backend.probe().check_health().await;
            json!({
                "reachable": reachable,
                "status": backend.health().status().as_str(),
                "offlinePreview": backend.is_offline_preview(),
            })
        }
        Cmd::Projects => serde_json::to_value(backend.projects().get_projects().await)?,
        Cmd::AddProject { name, description } => {
            let input = NewProject {
                description,
                ..NewProject::named(name)
            };
            match backend.project_service().create_project(input).await {
                Ok(id) => json!({ "id": id }),
                Err(err) => bail!("{}", err.user_message()),
            }
        }
        Cmd::Logs => serde_json::to_value(backend.task_logs().get_logs().await)?,
        Cmd::Reminders { window } => {
            let reminders = match window {
                Some(window) => {
                    let now = chrono::Local::now().fixed_offset();
                    backend
                        .reminder_service()
                        .in_window(window.into(), now)
                        .await
                }
                None => backend.reminders().get_reminders().await,
            };
            serde_json::to_value(reminders)?
        }
        Cmd::Settings { theme, font_scale } => {
            let settings = backend.settings();
            if theme.is_some() || font_scale.is_some() {
                let patch = SettingsPatch {
                    theme: theme.map(Theme::from),
                    font_scale,
                };
                if settings.update_settings(patch).await.is_none() {
                    bail!("settings were not saved");
                }
            }
            serde_json::to_value(settings.get_settings().await)?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
