mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    config::ConfigSubcommand,
    log::LogSubcommand,
    LogArgs, RoleArgs,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "harden",
    about = "Apply a service hardening baseline to a Windows Server host, and undo it from its audit log",
    version,
    propagate_version = true
)]
struct Cli {
    /// Config file (default: ./harden.yaml, then next to the executable)
    #[arg(long, global = true, env = "HARDEN_CONFIG")]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Log every step, including swallowed stop failures
    #[arg(long, global = true, short = 'v')]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stop and reconfigure every service in the role's policy
    Apply {
        #[command(flatten)]
        roles: RoleArgs,

        #[command(flatten)]
        log: LogArgs,
    },

    /// Restore startup modes recorded in an audit log
    Undo {
        /// Audit log written by a previous run
        #[arg(long, value_name = "PATH")]
        undo_log_file: PathBuf,

        #[command(flatten)]
        log: LogArgs,
    },

    /// Show what `apply` would change, without changing anything
    Plan {
        #[command(flatten)]
        roles: RoleArgs,
    },

    /// List the directives for a role
    Catalog {
        #[command(flatten)]
        roles: RoleArgs,
    },

    /// Inspect audit logs
    Log {
        #[command(subcommand)]
        subcommand: LogSubcommand,
    },

    /// Inspect and validate the config file
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        match &cli.command {
            Commands::Apply { .. } | Commands::Undo { .. } => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = root::resolve_config(cli.config.as_deref());

    let result = match cli.command {
        Commands::Apply { roles, log } => cmd::apply::run(&config_path, &roles, &log, cli.json),
        Commands::Undo { undo_log_file, log } => {
            cmd::undo::run(&config_path, &undo_log_file, &log, cli.json)
        }
        Commands::Plan { roles } => cmd::plan::run(&config_path, &roles, cli.json),
        Commands::Catalog { roles } => cmd::catalog::run(&config_path, &roles, cli.json),
        Commands::Log { subcommand } => cmd::log::run(subcommand, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&config_path, subcommand, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
