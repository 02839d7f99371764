use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

use bumpv::client::{BumpClient, BumpOptions, OutputFormat};
use bumpv::config::{Configuration, DEFAULT_CONFIG_FILE};
use bumpv::error::BumpvError;
use bumpv::logging::{self, Verbosity};
use bumpv::ui;

#[derive(Parser)]
#[command(
    name = "bumpv",
    version,
    about = "Bump a version number across project files, then commit and tag"
)]
struct Args {
    #[arg(
        short,
        long,
        global = true,
        help = "Configuration file path [default: .bumpv.toml]"
    )]
    config_file: Option<PathBuf>,

    #[arg(short, long, global = true, action = ArgAction::Count, help = "Log more (-v info, -vv debug)")]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Bump a version part and rewrite every configured file
    Bump(BumpArgs),

    /// Write a starter configuration file
    Init {
        #[arg(long, default_value = "0.1.0", help = "Version to start from")]
        current_version: String,
    },
}

#[derive(clap::Args)]
struct BumpArgs {
    #[arg(help = "Part of the version to bump (e.g. major, minor, patch)")]
    part: String,

    #[arg(long, help = "Don't abort if the working directory is dirty")]
    allow_dirty: bool,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json, help = "Result format")]
    output: OutputFormat,

    #[arg(short = 'n', long, help = "Preview what would happen without making changes")]
    dry_run: bool,

    #[arg(long, help = "Version to bump from instead of the configured one")]
    current_version: Option<String>,

    #[arg(long, help = "Version to write instead of bumping a part")]
    new_version: Option<String>,

    #[arg(long, conflicts_with = "no_commit", help = "Commit the changes")]
    commit: bool,

    #[arg(long, help = "Don't commit the changes")]
    no_commit: bool,

    #[arg(long, conflicts_with = "no_tag", help = "Tag the new version")]
    tag: bool,

    #[arg(long, help = "Don't tag the new version")]
    no_tag: bool,

    #[arg(long, help = "Tag name template (e.g. v{new_version})")]
    tag_name: Option<String>,

    #[arg(short, long, help = "Commit message template")]
    message: Option<String>,
}

/// Collapses a `--flag` / `--no-flag` pair; `None` defers to the configuration.
fn flag_pair(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

fn main() {
    let args = Args::parse();
    let _guard = logging::init(Verbosity::from_occurrences(args.verbose));

    if let Err(err) = run(args) {
        let code = err
            .downcast_ref::<BumpvError>()
            .map(BumpvError::exit_code)
            .unwrap_or(1);
        ui::display_error(&format!("{:#}", err));
        std::process::exit(code);
    }
}

fn run(args: Args) -> Result<()> {
    let config_path = args
        .config_file
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    match args.command {
        Command::Init { current_version } => {
            Configuration::init(&config_path, &current_version)?;
            ui::display_success(&format!("Created {}", config_path.display()));
        }
        Command::Bump(bump) => {
            let config = Configuration::load(&config_path)?;
            if bump.dry_run {
                ui::display_status("Dry run: files, configuration and VCS stay untouched");
            }
            let options = BumpOptions {
                dry_run: bump.dry_run,
                allow_dirty: bump.allow_dirty,
                commit: flag_pair(bump.commit, bump.no_commit),
                tag: flag_pair(bump.tag, bump.no_tag),
                current_version: bump.current_version,
                new_version: bump.new_version,
                tag_name: bump.tag_name,
                message: bump.message,
            };

            let mut client = BumpClient::new(config, options)?;
            let result = client.bump(&bump.part)?;

            ui::display_version_change(&result.old_version, &result.new_version, bump.dry_run);
            println!("{}", result.render(bump.output)?);
        }
    }

    Ok(())
}
