use std::path::PathBuf;

use asset_rename::defaults::{self, Defaults};
use asset_rename::paths;

pub type CmdResult<T> = asset_rename::Result<(T, i32)>;

pub(crate) struct GlobalArgs {
    /// Config file given with `--config`, used instead of the global one.
    pub config: Option<String>,
}

impl GlobalArgs {
    pub fn config_file(&self) -> asset_rename::Result<PathBuf> {
        match &self.config {
            Some(path) => paths::existing("config", path),
            None => paths::config_json(),
        }
    }

    pub fn defaults(&self) -> asset_rename::Result<Defaults> {
        defaults::load_defaults_from(&self.config_file()?)
    }
}

pub mod config;
pub mod fix_resolution;
pub mod propagate;
pub mod rename;
pub mod repair_json;

macro_rules! dispatch {
    ($args:expr, $global:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run($args, $global))
    };
}

pub(crate) fn run_json(
    command: crate::Commands,
    global: &GlobalArgs,
) -> (asset_rename::Result<serde_json::Value>, i32) {
    crate::tty::status("asset-rename is working...");

    match command {
        crate::Commands::Rename(args) => dispatch!(args, global, rename),
        crate::Commands::Propagate(args) => dispatch!(args, global, propagate),
        crate::Commands::FixResolution(args) => dispatch!(args, global, fix_resolution),
        crate::Commands::RepairJson(args) => dispatch!(args, global, repair_json),
        crate::Commands::Config(args) => dispatch!(args, global, config),
    }
}
