mod boilerplate;
mod browser;
mod config;
mod error;
mod html;
mod ident;
mod matcher;
mod model;
mod net;
mod platform;
mod runner;
mod targets;
#[cfg(test)]
mod testing;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use boilerplate::Boilerplate;
use browser::{HttpSession, PageSession};
use config::{AdpMode, Settings};
use model::Target;
use net::{Fetch, ReqwestFetch};
use platform::Dispatcher;
use targets::{JsonTargets, TargetSource};

#[derive(Parser)]
#[command(name = "jobscout", about = "Keyword-matched job discovery across career-site platforms")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape every target and write matched job cards as JSON
    Run {
        /// JSON file with [{company_name, careers_url, keywords}]
        #[arg(short, long, default_value = "targets.json")]
        targets: PathBuf,
        /// Write job cards here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// ADP algorithm (overrides JOBSCOUT_ADP_MODE)
        #[arg(long, value_enum)]
        adp_mode: Option<AdpMode>,
        /// JSON boilerplate rules (overrides JOBSCOUT_BOILERPLATE_FILE)
        #[arg(long)]
        boilerplate: Option<PathBuf>,
    },
    /// Load a careers page and report which platform it resolves to
    Detect { url: String },
    /// Print the unique job id derived from a job link
    Id {
        link: String,
        #[arg(short, long)]
        company: String,
    },
    /// Print the keywords that match a piece of text
    Match {
        /// Comma-separated keywords
        #[arg(short, long, value_delimiter = ',')]
        keywords: Vec<String>,
        text: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            targets,
            out,
            adp_mode,
            boilerplate,
        } => {
            let mut settings = Settings::from_env()?;
            if let Some(mode) = adp_mode {
                settings.adp_mode = mode;
            }
            if boilerplate.is_some() {
                settings.boilerplate_file = boilerplate;
            }

            let pending = JsonTargets::new(&targets).pending()?;
            if pending.is_empty() {
                println!("No targets in {}.", targets.display());
                return Ok(());
            }

            let (mut session, dispatcher) = build(&settings)?;
            let pb = ProgressBar::new(pending.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")?
                    .progress_chars("=> "),
            );

            println!("Processing {} targets...", pending.len());
            let (cards, report) =
                runner::run_targets(&mut session, &dispatcher, &pending, &pb).await;
            pb.finish_and_clear();

            let json = serde_json::to_string_pretty(&cards)?;
            match &out {
                Some(path) => {
                    std::fs::write(path, json)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Saved {} job cards to {}", cards.len(), path.display());
                }
                None => println!("{}", json),
            }

            println!("Targets:      {}", report.targets);
            println!("Failed:       {}", report.failed_targets);
            println!("No strategy:  {}", report.unmatched_targets);
            println!("Page loads:   {}", report.page_loads);
            println!("Jobs scanned: {}", report.raw_records);
            println!("Job cards:    {}", report.cards);
            Ok(())
        }
        Commands::Detect { url } => {
            let settings = Settings::from_env()?;
            let (mut session, dispatcher) = build(&settings)?;
            let target = Target {
                company_name: String::new(),
                careers_url: url.clone(),
                keywords: Vec::new(),
            };
            dispatcher.load(&mut session, &target).await?;
            let landed = session.current_url().await?;
            match dispatcher.resolve(&mut session).await? {
                Some(route) => println!(
                    "{} -> {} ({:?} extractor)",
                    landed,
                    route.kind,
                    route.extractor.capability()
                ),
                None => println!("{} -> no matching platform", landed),
            }
            Ok(())
        }
        Commands::Id { link, company } => {
            println!("{}", ident::unique_job_id(&company, &link));
            Ok(())
        }
        Commands::Match { keywords, text } => {
            let matched = matcher::match_keywords(&text, &keywords);
            if matched.is_empty() {
                println!("No match.");
            } else {
                println!("Matched: {}", matched.join(", "));
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn build(settings: &Settings) -> anyhow::Result<(HttpSession, Dispatcher)> {
    let boilerplate = match &settings.boilerplate_file {
        Some(path) => Boilerplate::load(path)?,
        None => Boilerplate::default(),
    };
    let fetch: Arc<dyn Fetch> = Arc::new(ReqwestFetch::new(settings.user_agent.as_deref())?);
    let session = HttpSession::new(Arc::clone(&fetch), settings.navigation_timeout);
    let dispatcher = Dispatcher::standard(settings, fetch, Arc::new(boilerplate));
    Ok((session, dispatcher))
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
