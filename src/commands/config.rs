use clap::{Args, Subcommand};
use serde::Serialize;

use asset_rename::defaults::{self, Defaults, RenameConfig};

use super::CmdResult;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Display the effective configuration (built-ins merged with the file)
    Show {
        /// Show only built-in defaults (ignore config.json)
        #[arg(long)]
        builtin: bool,
    },
    /// Write the built-in defaults to config.json for editing
    Init {
        /// Overwrite an existing config.json
        #[arg(long)]
        force: bool,
    },
    /// Reset configuration to built-in defaults (deletes config.json)
    Reset,
    /// Show the path to config.json
    Path,
}

#[derive(Debug, Serialize)]
pub struct ConfigOutput {
    command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    defaults: Option<Defaults>,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    exists: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    written: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    deleted: Option<bool>,
}

impl ConfigOutput {
    fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
            defaults: None,
            path: None,
            exists: None,
            written: None,
            deleted: None,
        }
    }
}

pub fn run(args: ConfigArgs, global: &crate::commands::GlobalArgs) -> CmdResult<ConfigOutput> {
    match args.command {
        ConfigCommand::Show { builtin } => show(builtin, global),
        ConfigCommand::Init { force } => init(force, global),
        ConfigCommand::Reset => reset(global),
        ConfigCommand::Path => path(global),
    }
}

fn show(builtin: bool, global: &crate::commands::GlobalArgs) -> CmdResult<ConfigOutput> {
    let defaults = if builtin {
        Defaults::default()
    } else {
        global.defaults()?
    };

    Ok((
        ConfigOutput {
            defaults: Some(defaults),
            ..ConfigOutput::new("config.show")
        },
        0,
    ))
}

fn init(force: bool, global: &crate::commands::GlobalArgs) -> CmdResult<ConfigOutput> {
    let path = config_file(global)?;
    let exists = path.exists();

    let written = force || !exists;
    if written {
        defaults::save_config(&path, &RenameConfig::default())?;
    }

    Ok((
        ConfigOutput {
            path: Some(path.display().to_string()),
            exists: Some(exists),
            written: Some(written),
            ..ConfigOutput::new("config.init")
        },
        0,
    ))
}

fn reset(global: &crate::commands::GlobalArgs) -> CmdResult<ConfigOutput> {
    let path = config_file(global)?;
    let deleted = defaults::reset_config(&path)?;

    Ok((
        ConfigOutput {
            defaults: Some(Defaults::default()),
            path: Some(path.display().to_string()),
            deleted: Some(deleted),
            ..ConfigOutput::new("config.reset")
        },
        0,
    ))
}

fn path(global: &crate::commands::GlobalArgs) -> CmdResult<ConfigOutput> {
    let path = config_file(global)?;

    Ok((
        ConfigOutput {
            exists: Some(path.exists()),
            path: Some(path.display().to_string()),
            ..ConfigOutput::new("config.path")
        },
        0,
    ))
}

/// The `--config` override may name a file that does not exist yet.
fn config_file(global: &crate::commands::GlobalArgs) -> asset_rename::Result<std::path::PathBuf> {
    match &global.config {
        Some(path) => Ok(asset_rename::paths::expand(path)),
        None => asset_rename::paths::config_json(),
    }
}
