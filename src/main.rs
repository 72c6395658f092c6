//! feedly-intel: fetch Feedly entries, score and rank them into a Markdown
//! reading list, and push hand-picked items back to Read Later.

use anyhow::{bail, Context, Result};
use chrono::{Local, Utc};
use clap::{Parser, Subcommand};
use feedly_intel::config::{expand_path, Config};
use feedly_intel::ingest::feedly::{load_token, write_fetch_output, FeedlyClient, TokenStatus};
use feedly_intel::ingest::{load_articles, read_article_file};
use feedly_intel::pipeline::rank_with_social;
use feedly_intel::report::bookmarks::load_mapping;
use feedly_intel::report::{default_output_path, parse_saved_urls, render_markdown, resolve_entry_ids, write_report};
use feedly_intel::social::default_providers;
use feedly_intel::zipcode::{BatchSummary, ZipCloudClient, ZipcodeRecord, ZipcodeValidator};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "feedly_intel=info,feedly=info,social=info,relevance=info,warn";
/// How many unmapped URLs / ids to echo before summarizing.
const PREVIEW: usize = 5;

#[derive(Parser)]
#[command(name = "feedly-intel")]
#[command(about = "Feedly intelligence report: fetch, score, bookmark")]
struct Cli {
    /// Config file (JSON, or TOML by extension). Falls back to
    /// $FEEDLY_CONFIG_PATH, then ~/.feedly/config.json.
    #[arg(long, global = true)]
    config: Option<String>,

    /// Token file; overrides `token_file` from the config.
    #[arg(long, global = true)]
    token_file: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch global.all and write the categorized article file
    Fetch {
        /// Output path, `-` for stdout
        #[arg(long, default_value = "-")]
        output: String,
        /// Include already-read entries
        #[arg(long)]
        include_read: bool,
    },

    /// Test the API connection
    Test,

    /// Report whether the token is still accepted
    CheckToken,

    /// Mark every entry in a fetched file as read
    MarkRead { file: PathBuf },

    /// Score fetched articles and write the Markdown report
    Score {
        #[arg(long)]
        input: PathBuf,
        /// Defaults to {output_dir}/YYYY-MM/YYYY-MM-DD（曜日）_feeds-report.md
        #[arg(long)]
        output: Option<PathBuf>,
        /// Skip Hatena / Hacker News lookups
        #[arg(long)]
        no_social: bool,
    },

    /// Save entries ticked in a report's save column to Read Later
    Bookmark {
        #[arg(long)]
        report: PathBuf,
        #[arg(long)]
        mapping: PathBuf,
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate postal codes against addresses (JSON array of {name, zipcode, address})
    Zipcode {
        #[arg(long)]
        input: PathBuf,
        /// Write JSON results here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let path = Config::resolve_path(cli.config.as_deref());
    Config::load_from(&path)
}

/// Config for commands that only need the token; a missing file is fine.
fn load_config_or_default(cli: &Cli) -> Config {
    load_config(cli).unwrap_or_else(|e| {
        tracing::debug!(error = ?e, "no usable config, using defaults");
        Config::default()
    })
}

fn client(cli: &Cli, config: &Config) -> Result<FeedlyClient> {
    let path = match &cli.token_file {
        Some(p) => expand_path(p),
        None => config.token_path(),
    };
    Ok(FeedlyClient::new(load_token(&path)?))
}

async fn run(cli: Cli) -> Result<ExitCode> {
    match &cli.command {
        Commands::Test => {
            let config = load_config_or_default(&cli);
            match client(&cli, &config)?.check_token().await? {
                TokenStatus::Valid(p) => {
                    println!("Connected as: {}", p.email.as_deref().unwrap_or("unknown"));
                    Ok(ExitCode::SUCCESS)
                }
                TokenStatus::Expired => {
                    eprintln!("Connection failed: 401 (token expired)");
                    Ok(ExitCode::FAILURE)
                }
                TokenStatus::Rejected { status, body } => {
                    eprintln!("Connection failed: {status} - {body}");
                    Ok(ExitCode::FAILURE)
                }
            }
        }

        Commands::CheckToken => {
            let config = load_config_or_default(&cli);
            match client(&cli, &config)?.check_token().await? {
                TokenStatus::Valid(_) => {
                    println!("valid");
                    Ok(ExitCode::SUCCESS)
                }
                TokenStatus::Expired => {
                    println!("expired");
                    Ok(ExitCode::from(2))
                }
                TokenStatus::Rejected { status, .. } => {
                    println!("error {status}");
                    Ok(ExitCode::FAILURE)
                }
            }
        }

        Commands::Fetch {
            output,
            include_read,
        } => {
            let config = load_config(&cli)?;
            let file = client(&cli, &config)?
                .fetch_global_all(&config, *include_read)
                .await?;
            if output == "-" {
                println!("{}", serde_json::to_string_pretty(&file)?);
            } else {
                let out = expand_path(output);
                let mapping = write_fetch_output(&file, &out)?;
                tracing::info!(output = %out.display(), mapping = %mapping.display(), "fetch output written");
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::MarkRead { file } => {
            let config = load_config(&cli)?;
            let ids = read_article_file(file)?.entry_ids();
            tracing::info!(count = ids.len(), "marking entries as read");
            let report = client(&cli, &config)?.mark_as_read(&ids).await;
            if report.is_success() {
                println!("Marked {} articles as read", report.marked);
                Ok(ExitCode::SUCCESS)
            } else {
                eprintln!(
                    "Error: {}\n  Partially marked: {} articles",
                    report.error.unwrap_or_default(),
                    report.marked
                );
                Ok(ExitCode::FAILURE)
            }
        }

        Commands::Score {
            input,
            output,
            no_social,
        } => {
            let config = load_config(&cli)?;
            let articles = load_articles(input)?;
            if articles.is_empty() {
                bail!("no articles found in {}", input.display());
            }

            let providers = if *no_social {
                Vec::new()
            } else {
                default_providers(Duration::from_secs(config.social.timeout_secs))
            };
            let report = rank_with_social(articles, &config, &providers, Utc::now()).await;

            let generated = Local::now();
            let path = output.clone().unwrap_or_else(|| {
                default_output_path(&expand_path(&config.output_dir), generated.date_naive())
            });
            write_report(&path, &render_markdown(&report, &config, generated))?;
            println!("Report generated: {} ({} articles)", path.display(), report.len());
            Ok(ExitCode::SUCCESS)
        }

        Commands::Bookmark {
            report,
            mapping,
            dry_run,
        } => {
            let mapping = load_mapping(mapping)?;
            let markdown = std::fs::read_to_string(report)
                .with_context(|| format!("report file not found: {}", report.display()))?;
            let links = parse_saved_urls(&markdown);
            if links.is_empty() {
                println!("No articles marked for saving.");
                return Ok(ExitCode::SUCCESS);
            }

            let selection = resolve_entry_ids(&links, &mapping);
            if !selection.unmapped.is_empty() {
                tracing::warn!(count = selection.unmapped.len(), "URLs not found in mapping");
                for url in selection.unmapped.iter().take(PREVIEW) {
                    eprintln!("  - {url}");
                }
            }
            if selection.entry_ids.is_empty() {
                eprintln!("No valid entry IDs found.");
                return Ok(ExitCode::FAILURE);
            }

            if *dry_run {
                println!("[DRY RUN] Would save {} articles to Read Later", selection.entry_ids.len());
                for id in selection.entry_ids.iter().take(PREVIEW) {
                    println!("  - {id}");
                }
                return Ok(ExitCode::SUCCESS);
            }

            let config = load_config_or_default(&cli);
            let feedly = client(&cli, &config)?;
            let profile = feedly.profile().await?;
            let saved = feedly
                .save_to_read_later(&profile.id, &selection.entry_ids)
                .await?;
            println!("Saved {saved} articles to Read Later");
            Ok(ExitCode::SUCCESS)
        }

        Commands::Zipcode { input, output } => {
            let raw = std::fs::read_to_string(input)
                .with_context(|| format!("read {}", input.display()))?;
            let records: Vec<ZipcodeRecord> =
                serde_json::from_str(&raw).context("parse zipcode records")?;

            let mut validator = ZipcodeValidator::new(ZipCloudClient::new());
            let results = validator.validate_batch(records).await;
            let summary = BatchSummary::of(&results);
            tracing::info!(total = summary.total, valid = summary.valid, invalid = summary.invalid, "zipcode validation done");

            let json = serde_json::to_string_pretty(&serde_json::json!({
                "summary": summary,
                "results": results,
            }))?;
            match output {
                Some(p) => std::fs::write(p, json).with_context(|| format!("write {}", p.display()))?,
                None => println!("{json}"),
            }
            Ok(if summary.invalid == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // .env is optional
    let _ = dotenvy::dotenv();
    init_tracing();

    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = ?e, "command failed");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
