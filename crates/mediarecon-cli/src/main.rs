mod commands;
mod logging;

use std::process;

use anyhow::Context;
use clap::Parser;
use colored::*;
use commands::{Cli, Commands};
use dotenv::dotenv;
use mediarecon_core::matching::normalize;
use mediarecon_core::parse::{classify_release, parse_track_number, ReleaseShape};
use mediarecon_core::{AppConfig, AuditReport, CycleReport, PollEngine};
use tracing::{error, info};

fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let args = Cli::parse();
    let _guard = logging::init_logger();

    let mut config = match mediarecon_core::load_configuration(args.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };
    if args.dry_run {
        config.dry_run = true;
    }

    match args.command.unwrap_or(Commands::Run) {
        Commands::Parse { release } => print_parse(&release),
        Commands::PrintConfig => println!("Configuration: {:#?}", config),
        Commands::Run => build_engine(&config)?.run(),
        Commands::Once => {
            let report = build_engine(&config)?.run_cycle();
            print_cycle(&report);
        }
        Commands::Audit => {
            let audits = build_engine(&config)?.audit_all();
            for audit in &audits {
                print_audit(audit);
            }
        }
    }

    Ok(())
}

/// Missing required configuration is fatal before any work starts.
fn build_engine(config: &AppConfig) -> anyhow::Result<PollEngine> {
    if let Err(err) = config.validate() {
        error!("{}", err);
        process::exit(1);
    }
    if config.dry_run {
        info!("{}", "Dry run: mutating calls will be logged and skipped".yellow());
    }
    PollEngine::from_config(config).context("failed to set up the poll engine")
}

fn print_cycle(report: &CycleReport) {
    println!();
    println!(
        "{} releases in history{} ({:.2}s)",
        report.releases.to_string().cyan(),
        if report.history_failed {
            " (history unavailable)".red().to_string()
        } else {
            String::new()
        },
        report.duration.as_secs_f64()
    );
    for category in &report.categories {
        println!(
            "{:>6}: {} releases, {} registered, {} satisfied, {} unmatched, {} unparseable, {} searches, {} cooling down, {} failed",
            category.category.bold(),
            category.releases,
            category.registered.to_string().green(),
            category.satisfied,
            category.unmatched.to_string().yellow(),
            category.unparseable,
            category.searches.to_string().cyan(),
            category.cooling_down,
            category.failed.to_string().red(),
        );
    }
    for (name, err) in &report.failures {
        println!("{:>6}: {}", name.bold(), err.red());
    }
    for audit in &report.audits {
        print_audit(audit);
    }
}

fn print_audit(audit: &AuditReport) {
    if audit.skipped {
        println!("{:>6}: audit skipped, library root missing or empty", audit.category.bold().yellow());
        return;
    }
    println!(
        "{:>6}: audited {} file records, removed {}, deferred {} searches",
        audit.category.bold(),
        audit.checked,
        audit.removed.to_string().red(),
        audit.deferred.to_string().cyan(),
    );
}

fn print_parse(release: &str) {
    let normalized = normalize(release);
    println!("{} {:?}", "words:".bold(), normalized.words);
    println!(
        "{} {}",
        "year:".bold(),
        normalized.year.map_or("-".to_string(), |year| year.to_string())
    );
    match classify_release(release) {
        Some(ReleaseShape::Episode(number)) => println!(
            "{} season {} episodes {:?}",
            "episode:".bold(),
            number.season_or_default(),
            number.episodes
        ),
        Some(ReleaseShape::SeasonPack { season }) => println!("{} season {}", "pack:".bold(), season),
        None => println!("{} {}", "episode:".bold(), "none".dimmed()),
    }
    match parse_track_number(release) {
        Some(track) => println!(
            "{} disc {} track {}",
            "track:".bold(),
            track.disc.map_or("-".to_string(), |disc| disc.to_string()),
            track.track
        ),
        None => println!("{} {}", "track:".bold(), "none".dimmed()),
    }
}
