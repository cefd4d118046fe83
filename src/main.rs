use clap::{Parser, Subcommand};

use commands::GlobalArgs;

mod commands;
mod output;
mod tty;

use commands::{config, fix_resolution, propagate, rename, repair_json};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "asset-rename")]
#[command(version = VERSION)]
#[command(about = "Rename image asset bundles and propagate the new names across code and JSON")]
struct Cli {
    /// Config file to use instead of ~/.config/asset-rename/config.json
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rename every bundle in an asset catalog and propagate the mapping
    Rename(rename::RenameArgs),
    /// Replay a saved mapping against a project tree or a JSON file
    Propagate(propagate::PropagateArgs),
    /// Normalize @2x/@3x files and manifests without renaming bundles
    FixResolution(fix_resolution::FixResolutionArgs),
    /// Repair a malformed JSON file in place
    RepairJson(repair_json::RepairJsonArgs),
    /// Manage asset-rename configuration
    Config(config::ConfigArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let global = GlobalArgs { config: cli.config };

    let (json_result, exit_code) = commands::run_json(cli.command, &global);
    if output::print_json_result(json_result).is_err() {
        return std::process::ExitCode::from(1);
    }

    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
