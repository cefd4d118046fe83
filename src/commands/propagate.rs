use clap::Args;
use serde::Serialize;

use asset_rename::paths;
use asset_rename::pipeline::{self, PropagateOptions, PropagateResult, PropagateTarget, Scope};

use super::CmdResult;

#[derive(Args)]
pub struct PropagateArgs {
    /// Mapping to replay (JSON object or numbered .txt report)
    #[arg(long, value_name = "FILE")]
    pub mapping_file: String,

    /// Project root to rewrite (sources and JSON files)
    #[arg(long, required_unless_present = "json_file", conflicts_with = "json_file")]
    pub project_root: Option<String>,

    /// Rewrite a single JSON file instead of a project tree
    #[arg(long, value_name = "FILE")]
    pub json_file: Option<String>,

    /// Preview every change without writing
    #[arg(long)]
    pub dry_run: bool,

    /// Only rewrite source files
    #[arg(long, conflicts_with_all = ["data_only", "json_file"])]
    pub code_only: bool,

    /// Only rewrite JSON files
    #[arg(long)]
    pub data_only: bool,

    /// Replay the mapping backwards (new → old)
    #[arg(long)]
    pub invert: bool,
}

#[derive(Serialize)]
#[serde(tag = "command")]
pub enum PropagateOutput {
    #[serde(rename = "propagate")]
    Propagate {
        dry_run: bool,
        scope: Scope,
        #[serde(flatten)]
        result: PropagateResult,
    },
}

pub fn run(args: PropagateArgs, global: &crate::commands::GlobalArgs) -> CmdResult<PropagateOutput> {
    let defaults = global.defaults()?;

    let target = match (&args.project_root, &args.json_file) {
        (Some(root), _) => PropagateTarget::Tree(paths::existing("project_root", root)?),
        (None, Some(file)) => PropagateTarget::JsonFile(paths::existing("json_file", file)?),
        (None, None) => {
            return Err(asset_rename::Error::validation_missing_argument(vec![
                "--project-root".to_string(),
                "--json-file".to_string(),
            ]))
        }
    };

    let scope = if args.code_only {
        Scope::Code
    } else if args.data_only {
        Scope::Data
    } else {
        Scope::All
    };

    let options = PropagateOptions {
        mapping_file: paths::expand(&args.mapping_file),
        target,
        scope,
        invert: args.invert,
        dry_run: args.dry_run,
    };

    let result = pipeline::run_propagate(&options, &defaults)?;

    Ok((
        PropagateOutput::Propagate {
            dry_run: args.dry_run,
            scope,
            result,
        },
        0,
    ))
}
