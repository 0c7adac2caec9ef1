// src/main.rs
// bugscout - Conversational bug intake and commit-history investigation

use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use bugscout::ai::AiAnalyzer;
use bugscout::config::{ApiKeys, ScoutConfig};
use bugscout::http::create_shared_client;
use bugscout::investigate::{summary_markdown, Investigator};
use bugscout::repo::{ProviderKind, RepositoryConfig};
use bugscout::report::ReportStatus;
use bugscout::session::{SessionManager, SessionReply};
use bugscout::store::{ChannelConfig, Database, UpdateOutcome};
use clap::{Parser, Subcommand};
use tracing::{warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "bugscout")]
#[command(about = "Conversational bug intake and commit-history investigation")]
#[command(version)]
struct Cli {
    /// Database path (default: ~/.bugscout/bugscout.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive bug-report intake session on stdin/stdout
    Intake {
        /// Reporter name recorded on saved reports
        #[arg(short, long, default_value = "cli-user")]
        reporter: String,
        /// Channel whose repository configuration applies to this session
        #[arg(short, long)]
        channel: Option<String>,
    },

    /// Investigate a stored report against a channel's repositories
    Investigate {
        /// Report id, e.g. BUG-2026-001
        report_id: String,
        /// Channel id holding the repository configuration
        #[arg(short, long)]
        channel: String,
    },

    /// Stored bug reports
    Report {
        #[command(subcommand)]
        action: ReportAction,
    },

    /// Per-channel repository configuration
    Channel {
        #[command(subcommand)]
        action: ChannelAction,
    },
}

#[derive(Subcommand)]
enum ReportAction {
    /// List recent reports
    List {
        /// Filter by status (new, in_progress, resolved, closed)
        #[arg(short, long)]
        status: Option<String>,
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
    /// Show one report
    Show { report_id: String },
    /// Substring search over report text
    Search {
        query: String,
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
    /// Aggregate counts by status and priority
    Stats,
    /// Update report fields, e.g. --set status=resolved --set assigned_to=alice
    Update {
        report_id: String,
        /// field=value pairs; unknown fields are ignored
        #[arg(long = "set", value_parser = parse_key_val)]
        sets: Vec<(String, String)>,
    },
}

#[derive(Subcommand)]
enum ChannelAction {
    /// Create or replace a channel's repository configuration
    Set {
        channel_id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        project: String,
        /// Repository as name=url[,branch=..][,provider=..][,site_type=..]
        #[arg(long = "repo", value_parser = parse_repo_arg)]
        repos: Vec<RepositoryConfig>,
    },
    /// List configured channels
    List,
    /// Remove a channel configuration
    Remove { channel_id: String },
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected field=value, got '{s}'"))?;
    Ok((key.trim().to_string(), value.trim().to_string()))
}

/// Parse a `--repo` value: the first segment is name=url, later segments are
/// optional key=value settings.
fn parse_repo_arg(s: &str) -> Result<RepositoryConfig, String> {
    let mut parts = s.split(',');
    let first = parts.next().unwrap_or_default();
    let (name, url) = first
        .split_once('=')
        .ok_or_else(|| format!("expected name=url, got '{first}'"))?;

    let mut repo = RepositoryConfig {
        name: name.trim().to_string(),
        provider: ProviderKind::infer_from_url(url),
        url: url.trim().to_string(),
        branch: "main".to_string(),
        credential_env: None,
        site_type: None,
        tags: Vec::new(),
    };

    for part in parts {
        let (key, value) = part
            .split_once('=')
            .ok_or_else(|| format!("expected key=value, got '{part}'"))?;
        match key.trim() {
            "branch" => repo.branch = value.trim().to_string(),
            "provider" => {
                repo.provider = ProviderKind::parse(value.trim())
                    .ok_or_else(|| format!("unknown provider '{value}'"))?
            }
            "credential_env" => repo.credential_env = Some(value.trim().to_string()),
            "site_type" => repo.site_type = Some(value.trim().to_string()),
            "tags" => repo.tags = value.split('|').map(|t| t.trim().to_string()).collect(),
            other => return Err(format!("unknown repository setting '{other}'")),
        }
    }
    Ok(repo)
}

fn default_db_path() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".bugscout/bugscout.db")
}

fn open_database(cli_path: Option<PathBuf>) -> Result<Arc<Database>> {
    let path = cli_path.unwrap_or_else(default_db_path);
    Ok(Arc::new(Database::open(&path)?))
}

/// Read-prompt-respond loop over stdin. Stands in for a chat transport.
fn run_intake(db: &Database, reporter: &str, channel: Option<&str>) -> Result<()> {
    let sessions = SessionManager::new();
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();

    println!("Describe the bug (type 'cancel' to abort, Ctrl-D to exit).");
    print!("> ");
    stdout.flush()?;

    for line in stdin.lock().lines() {
        let line = line?;
        match sessions.handle_message(reporter, channel, &line) {
            SessionReply::Prompt(prompt) => println!("{prompt}"),
            SessionReply::Completed { draft, channel_id } => {
                match db.save_report(&draft, reporter, channel_id.as_deref()) {
                    Ok(report) => println!("{}", report.format_markdown()),
                    Err(e) => {
                        // Intake must not lose the report text on a store failure
                        warn!(error = %e, "Failed to persist report");
                        println!(
                            "Could not save the report ({e}). Captured details:\n\n\
                             Summary: {}\nPages: {}\nSteps: {}\nComponents: {}",
                            draft.summary.as_deref().unwrap_or("-"),
                            draft.pages.as_deref().unwrap_or("-"),
                            draft.steps.as_deref().unwrap_or("-"),
                            draft.components.as_deref().unwrap_or("-"),
                        );
                    }
                }
                break;
            }
            SessionReply::Cancelled { had_session } => {
                if had_session {
                    println!("Intake cancelled.");
                } else {
                    println!("No intake session in progress.");
                }
                break;
            }
        }
        print!("> ");
        stdout.flush()?;
    }
    Ok(())
}

async fn run_investigate(
    db: &Database,
    keys: &ApiKeys,
    report_id: &str,
    channel: &str,
) -> Result<()> {
    let report = db
        .get_report(report_id)?
        .ok_or_else(|| anyhow::anyhow!("report {report_id} not found"))?;
    let config = db
        .get_channel_config(channel)?
        .ok_or_else(|| anyhow::anyhow!("channel {channel} has no repository configuration"))?;

    let tunables = ScoutConfig::load().investigation;
    let http = create_shared_client();
    let mut investigator = Investigator::new(http.clone(), tunables);
    if let Some(key) = &keys.openai {
        investigator = investigator.with_ai(AiAnalyzer::new(http, key.clone()));
    }

    let result = investigator.investigate(&report, &config.repos).await;
    println!("{}", summary_markdown(&result));
    Ok(())
}

fn run_report(db: &Database, action: ReportAction) -> Result<()> {
    match action {
        ReportAction::List { status, limit } => {
            let status = match status.as_deref() {
                Some(s) => Some(
                    ReportStatus::parse(s)
                        .ok_or_else(|| anyhow::anyhow!("unknown status '{s}'"))?,
                ),
                None => None,
            };
            for report in db.list_reports(status, limit)? {
                println!(
                    "{}  {:<12} {:<8} {}",
                    report.report_id,
                    report.status.as_str(),
                    report.priority.as_str(),
                    report.summary
                );
            }
        }
        ReportAction::Show { report_id } => match db.get_report(&report_id)? {
            Some(report) => println!("{}", report.format_markdown()),
            None => println!("Report {report_id} not found."),
        },
        ReportAction::Search { query, limit } => {
            for report in db.search_reports(&query, limit)? {
                println!("{}  {}", report.report_id, report.summary);
            }
        }
        ReportAction::Stats => {
            let stats = db.report_stats()?;
            println!("Total reports: {}", stats.total);
            println!("Last 7 days:   {}", stats.recent_7_days);
            for (status, count) in &stats.by_status {
                println!("  status {status}: {count}");
            }
            for (priority, count) in &stats.by_priority {
                println!("  priority {priority}: {count}");
            }
        }
        ReportAction::Update { report_id, sets } => {
            let updates: BTreeMap<String, String> = sets.into_iter().collect();
            match db.update_report(&report_id, &updates)? {
                UpdateOutcome::Updated => println!("Updated {report_id}."),
                UpdateOutcome::NothingToUpdate => println!("No updatable fields given."),
                UpdateOutcome::NotFound => println!("Report {report_id} not found."),
            }
        }
    }
    Ok(())
}

fn run_channel(db: &Database, action: ChannelAction) -> Result<()> {
    match action {
        ChannelAction::Set {
            channel_id,
            name,
            project,
            repos,
        } => {
            let config = ChannelConfig {
                channel_id: channel_id.clone(),
                channel_name: name,
                project_name: project,
                repos,
            };
            db.upsert_channel_config(&config)?;
            println!(
                "Channel {channel_id} configured with {} repositories.",
                config.repos.len()
            );
        }
        ChannelAction::List => {
            for config in db.list_channel_configs()? {
                println!(
                    "{}  {} ({} repos)",
                    config.channel_id,
                    config.project_name,
                    config.repos.len()
                );
            }
        }
        ChannelAction::Remove { channel_id } => {
            if db.delete_channel_config(&channel_id)? {
                println!("Removed {channel_id}.");
            } else {
                println!("Channel {channel_id} not found.");
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env files (global first, then project - project overrides)
    if let Some(home) = dirs::home_dir() {
        let _ = dotenvy::from_path(home.join(".bugscout/.env"));
    }
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let log_level = match &cli.command {
        Commands::Intake { .. } => Level::WARN, // quiet for the interactive loop
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let keys = ApiKeys::from_env();
    let db = open_database(cli.db)?;

    match cli.command {
        Commands::Intake { reporter, channel } => {
            run_intake(&db, &reporter, channel.as_deref())?;
        }
        Commands::Investigate { report_id, channel } => {
            run_investigate(&db, &keys, &report_id, &channel).await?;
        }
        Commands::Report { action } => {
            run_report(&db, action)?;
        }
        Commands::Channel { action } => {
            run_channel(&db, action)?;
        }
    }
    Ok(())
}
