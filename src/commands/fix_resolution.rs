use clap::Args;
use serde::Serialize;

use asset_rename::assets::RelocationReport;
use asset_rename::paths;
use asset_rename::pipeline;

use super::CmdResult;

#[derive(Args)]
pub struct FixResolutionArgs {
    /// Asset catalog to normalize (e.g. Assets.xcassets)
    pub assets_path: String,

    /// Preview every change without touching the filesystem
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Serialize)]
#[serde(tag = "command")]
pub enum FixResolutionOutput {
    #[serde(rename = "fix-resolution")]
    FixResolution {
        dry_run: bool,
        #[serde(flatten)]
        report: RelocationReport,
    },
}

pub fn run(
    args: FixResolutionArgs,
    global: &crate::commands::GlobalArgs,
) -> CmdResult<FixResolutionOutput> {
    let defaults = global.defaults()?;
    let assets = paths::existing("assets_path", &args.assets_path)?;

    let report = pipeline::run_fix_resolution(&assets, &defaults, args.dry_run)?;

    Ok((
        FixResolutionOutput::FixResolution {
            dry_run: args.dry_run,
            report,
        },
        0,
    ))
}
