use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use civic_core::config::{dedup_policy_from_env_values, severity_table_from_env_value};
use civic_core::validation::validate_analysis;
use civic_core::{
    AnalysisRequest, CoreConfig, DedupPolicy, InMemoryIssueStore, IntakeOutcome, IntakeService,
    IssueStore, Report, RetryPolicy, SeverityAnalyzer, SeverityTable,
};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

#[derive(Parser)]
#[command(name = "civic")]
#[command(about = "Civic issue intake CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PolicyName {
    Scored,
    Simple,
}

#[derive(Subcommand)]
enum Commands {
    /// Assess a single report and print the assessment as JSON
    Analyze {
        /// Report category, e.g. "Roads & Transport"
        #[arg(long)]
        category: String,
        /// Specific issue, e.g. "Pothole" (defaults to the category)
        #[arg(long, default_value = "")]
        issue: String,
        /// Free-text description
        #[arg(long)]
        description: String,
        /// Region or city name
        #[arg(long, default_value = "")]
        region: String,
        /// Image reference (enables the image boost)
        #[arg(long)]
        image: Option<String>,
        /// YAML severity table to use instead of the built-in one
        #[arg(long)]
        table: Option<PathBuf>,
    },
    /// Replay a JSON array of reports through an in-memory intake and print each outcome
    Replay {
        /// JSON file: an array of reports, each optionally carrying an RFC 3339 `at` timestamp
        file: PathBuf,
        /// Duplicate detection policy
        #[arg(long, value_enum, default_value = "scored")]
        policy: PolicyName,
        /// Override the policy radius, in meters
        #[arg(long)]
        radius: Option<f64>,
        /// Override the policy recency window, in hours (0 disables it)
        #[arg(long)]
        window_hours: Option<i64>,
    },
    /// Print the severity decision table as YAML
    Table {
        /// Validate and print this table instead of the built-in one
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

/// One replayed report. `at` drives the intake clock; absent means "now".
#[derive(Debug, Deserialize)]
struct ReplayEntry {
    #[serde(default)]
    at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    report: Report,
}

fn load_table(path: Option<PathBuf>) -> civic_core::IntakeResult<SeverityTable> {
    severity_table_from_env_value(path.map(|p| p.to_string_lossy().into_owned()))
}

fn replay(
    entries: Vec<ReplayEntry>,
    policy: DedupPolicy,
) -> (Arc<InMemoryIssueStore>, Vec<civic_core::IntakeResult<IntakeOutcome>>) {
    let store = Arc::new(InMemoryIssueStore::new());
    let now = Arc::new(Mutex::new(Utc::now()));
    let clock = now.clone();

    let retry = RetryPolicy::immediate(1).unwrap_or_default();
    let cfg = CoreConfig::default().with_dedup(policy).with_retry(retry);
    let intake = IntakeService::new(store.clone(), SeverityAnalyzer::default(), Arc::new(cfg))
        .with_clock(move || match clock.lock() {
            Ok(t) => *t,
            Err(poisoned) => *poisoned.into_inner(),
        });

    let outcomes = entries
        .into_iter()
        .map(|entry| {
            if let Ok(mut t) = now.lock() {
                *t = entry.at.unwrap_or_else(Utc::now);
            }
            intake.submit(entry.report)
        })
        .collect();

    (store, outcomes)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Analyze {
            category,
            issue,
            description,
            region,
            image,
            table,
        }) => {
            let analyzer = SeverityAnalyzer::new(
                Arc::new(load_table(table)?),
                Arc::new(civic_core::severity::NoImageBoost),
            );
            let request = validate_analysis(AnalysisRequest {
                category,
                specific_issue: issue,
                description,
                region,
                image_ref: image,
            })?;
            let assessment = analyzer.analyze(
                request.category.as_str(),
                &request.specific_issue,
                request.description.as_str(),
                &request.region,
                request.image_ref.as_deref(),
            );
            println!("{}", serde_json::to_string_pretty(&assessment)?);
        }
        Some(Commands::Replay {
            file,
            policy,
            radius,
            window_hours,
        }) => {
            let raw = std::fs::read_to_string(&file)?;
            let entries: Vec<ReplayEntry> = serde_json::from_str(&raw)?;
            let name = match policy {
                PolicyName::Scored => "scored",
                PolicyName::Simple => "simple",
            };
            let policy = dedup_policy_from_env_values(
                Some(name.to_string()),
                radius.map(|r| r.to_string()),
                window_hours.map(|h| h.to_string()),
            )?;

            let (store, outcomes) = replay(entries, policy);
            for (i, outcome) in outcomes.iter().enumerate() {
                match outcome {
                    Ok(outcome) => println!(
                        "#{} issue {} score {} -> {}",
                        i + 1,
                        outcome.issue().id,
                        outcome.assessment().score(),
                        outcome.message()
                    ),
                    Err(e) => eprintln!("#{} rejected: {}", i + 1, e),
                }
            }

            let stats = store.dashboard_stats()?;
            println!(
                "{} reports, {} issues ({} rejected reports)",
                outcomes.len(),
                stats.total_issues,
                outcomes.iter().filter(|o| o.is_err()).count()
            );
        }
        Some(Commands::Table { file }) => {
            let table = load_table(file)?;
            print!("{}", table.to_yaml_string()?);
        }
        None => {
            println!("Use 'civic --help' for commands");
        }
    }

    Ok(())
}
