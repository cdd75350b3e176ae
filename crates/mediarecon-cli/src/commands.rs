use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "mediarecon")]
#[command(about = "Reconciles completed downloads with Radarr, Sonarr and Lidarr", long_about = None)]
pub struct Cli {
    /// Configuration file to load instead of ./Config.toml
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Log every mutating call instead of executing it
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Poll forever (default)
    Run,
    /// Run a single reconciliation cycle and print a summary
    Once,
    /// Run the stale-entry audit for every enabled category
    Audit,
    /// Show how a release name is normalized and parsed
    Parse {
        /// Release or file name
        release: String,
    },
    /// Print configuration values
    PrintConfig,
}
