mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    config::ConfigSubcommand, errands::ErrandsSubcommand, protocols::ProtocolsSubcommand,
    rolodex::RolodexSubcommand,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "layton",
    about = "Personal task assistant: errands, protocols, and rolodex cards backed by bd",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .layton/)
    #[arg(long, global = true, env = "LAYTON_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Log tracker calls and other diagnostics to stderr
    #[arg(long, global = true, short = 'v')]
    verbose: bool,

    /// Omit to print an orientation summary
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Errand templates and the tracker items scheduled from them
    Errands {
        #[command(subcommand)]
        subcommand: Option<ErrandsSubcommand>,
    },

    /// Protocol documents
    Protocols {
        #[command(subcommand)]
        subcommand: Option<ProtocolsSubcommand>,
    },

    /// Rolodex cards
    Rolodex {
        #[command(subcommand)]
        subcommand: Option<RolodexSubcommand>,
    },

    /// Read and write .layton/config.json
    Config {
        #[command(subcommand)]
        subcommand: Option<ConfigSubcommand>,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        None => cmd::orient::run(&root, cli.json),
        Some(Commands::Errands { subcommand }) => {
            cmd::errands::run(&root, subcommand.unwrap_or_default(), cli.json)
        }
        Some(Commands::Protocols { subcommand }) => {
            cmd::protocols::run(&root, subcommand.unwrap_or_default(), cli.json)
        }
        Some(Commands::Rolodex { subcommand }) => {
            cmd::rolodex::run(&root, subcommand.unwrap_or_default(), cli.json)
        }
        Some(Commands::Config { subcommand }) => {
            cmd::config::run(&root, subcommand.unwrap_or_default(), cli.json)
        }
    };

    if let Err(e) = result {
        let status = output::layton_error(&e).map_or(1, |le| le.exit_code());
        if cli.json {
            // stdout is the machine channel; fall back to stderr if it is gone
            if output::print_json(&output::failure_envelope(&e)).is_err() {
                eprintln!("error: {e:#}");
            }
        } else {
            eprintln!("error: {e:#}");
            if let Some(le) = output::layton_error(&e) {
                for step in le.next_steps() {
                    eprintln!("  hint: {step}");
                }
            }
        }
        std::process::exit(status);
    }
}
