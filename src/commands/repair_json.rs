use clap::Args;
use serde::Serialize;

use asset_rename::json_patch::{self, RepairReport, RepairStatus};
use asset_rename::paths;

use super::CmdResult;

#[derive(Args)]
pub struct RepairJsonArgs {
    /// JSON file to repair in place
    pub file: String,

    /// Report the outcome without writing
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Serialize)]
#[serde(tag = "command")]
pub enum RepairJsonOutput {
    #[serde(rename = "repair-json")]
    RepairJson {
        dry_run: bool,
        #[serde(flatten)]
        report: RepairReport,
    },
}

pub fn run(args: RepairJsonArgs, global: &crate::commands::GlobalArgs) -> CmdResult<RepairJsonOutput> {
    let defaults = global.defaults()?;
    let path = paths::existing("file", &args.file)?;

    let report = json_patch::repair_file(&path, &defaults.propagation.repair_rules, args.dry_run)?;
    if report.status == RepairStatus::Unrepairable {
        asset_rename::log_status!("json", "{} is still invalid after repair", report.file);
    }

    let exit_code = if report.status == RepairStatus::Unrepairable { 1 } else { 0 };

    Ok((
        RepairJsonOutput::RepairJson {
            dry_run: args.dry_run,
            report,
        },
        exit_code,
    ))
}
