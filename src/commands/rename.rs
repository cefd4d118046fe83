use clap::Args;
use serde::Serialize;

use asset_rename::naming::NamingMode;
use asset_rename::paths;
use asset_rename::pipeline::{self, MappingFiles, RenameOptions, RenameResult};

use super::CmdResult;

#[derive(Args)]
pub struct RenameArgs {
    /// Asset catalog to walk (e.g. Assets.xcassets)
    pub assets_path: String,

    /// Prefix for new names (default from config: "project")
    #[arg(long)]
    pub project_name: Option<String>,

    /// Project root whose sources and JSON files receive the new names
    #[arg(long)]
    pub project_root: Option<String>,

    /// Preview every change without touching the filesystem
    #[arg(long)]
    pub dry_run: bool,

    /// Generate random identifiers instead of prefixed names
    #[arg(long)]
    pub random_names: bool,

    /// Skip the rename and replay the saved mapping against --project-root
    #[arg(long)]
    pub json_only: bool,

    /// Mapping file to write (or read with --json-only)
    #[arg(long, value_name = "FILE")]
    pub mapping_file: Option<String>,

    /// Numbered report file (default: next to the mapping file)
    #[arg(long, value_name = "FILE")]
    pub report_file: Option<String>,

    /// Seed for --random-names, for reproducible runs
    #[arg(long, requires = "random_names")]
    pub seed: Option<u64>,
}

#[derive(Serialize)]
#[serde(tag = "command")]
pub enum RenameOutput {
    #[serde(rename = "rename")]
    Rename {
        dry_run: bool,
        json_only: bool,
        #[serde(flatten)]
        result: RenameResult,
    },
}

pub fn run(args: RenameArgs, global: &crate::commands::GlobalArgs) -> CmdResult<RenameOutput> {
    let defaults = global.defaults()?;

    let assets = if args.json_only {
        paths::expand(&args.assets_path)
    } else {
        paths::existing("assets_path", &args.assets_path)?
    };
    let project_root = args
        .project_root
        .as_deref()
        .map(|root| paths::existing("project_root", root))
        .transpose()?;

    let naming = if args.random_names {
        NamingMode::Random {
            length: defaults.naming.random_name_length,
            max_attempts: defaults.naming.random_max_attempts,
        }
    } else {
        NamingMode::Prefixed {
            prefix: args
                .project_name
                .unwrap_or_else(|| defaults.naming.project_name.clone()),
        }
    };

    let files = MappingFiles::resolve(
        args.mapping_file.as_deref().map(paths::expand),
        args.report_file.as_deref().map(paths::expand),
        &defaults,
    );

    let options = RenameOptions {
        assets,
        project_root,
        naming,
        seed: args.seed,
        files,
        dry_run: args.dry_run,
        json_only: args.json_only,
    };

    let result = pipeline::run_rename(&options, &defaults)?;

    Ok((
        RenameOutput::Rename {
            dry_run: args.dry_run,
            json_only: args.json_only,
            result,
        },
        0,
    ))
}
