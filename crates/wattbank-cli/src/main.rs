//! Command-line surface for the WattBank prepaid energy tracker.
//!
//! Stands in for the mobile UI: every subcommand goes through the same
//! aggregator the app screens would use.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing_subscriber::EnvFilter;

use wattbank_app::{App, AppConfig, MockEndpoint};
use wattbank_store::Store;
use wattbank_types::{CreditSource, HistoryRange, wh_to_kwh};

#[derive(Parser)]
#[command(name = "wattbank")]
#[command(author, version, about = "Prepaid energy credit tracker", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Database path (overrides config and the platform default)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for listing commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the account snapshot: balance, today's usage, last sync
    Status,

    /// Show the current credit balance
    Balance,

    /// List credit transactions, most recent first
    Transactions {
        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Add credit to the account
    AddCredit {
        /// Amount to add (must be positive)
        amount: f64,

        /// Transaction source
        #[arg(short, long, default_value = "manual")]
        source: String,

        /// Optional note
        #[arg(short, long)]
        note: Option<String>,
    },

    /// Show usage history as kWh buckets
    History {
        /// Window: day (24 hourly buckets), week (7 daily), month (4 weekly)
        #[arg(short, long, default_value = "day")]
        range: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Sync with the remote account service
    Sync,

    /// List alerts, most recent first
    Alerts {
        /// Only show unread alerts
        #[arg(short, long)]
        unread: bool,

        /// Mark this alert id as read
        #[arg(long)]
        read: Option<i64>,

        /// Dismiss (delete) this alert id
        #[arg(long)]
        dismiss: Option<i64>,
    },

    /// Log a sensor pairing record
    Pair {
        /// Advertised device name
        name: String,

        /// Signal strength in dBm
        #[arg(long, default_value = "-60", allow_hyphen_values = true)]
        rssi: i32,

        /// Whether the device advertised as connectable
        #[arg(long, action = clap::ArgAction::Set, default_value_t = true)]
        connectable: bool,
    },

    /// Ingest an energy sample (watt-hours) for testing and backfill
    Ingest {
        /// Energy used during the sample interval, watt-hours
        wh: i64,

        /// Sample time, epoch milliseconds (defaults to now)
        #[arg(long)]
        ts: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let app = open_app(&cli)?;
    run(cli.command, &app).await
}

/// Build the aggregator the same way the mobile shell would: config first,
/// then the store at the resolved path, a mock sync endpoint standing in
/// for the remote service.
fn open_app(cli: &Cli) -> Result<App> {
    let config_path = cli.config.clone().unwrap_or_else(AppConfig::default_path);
    let config = AppConfig::load(&config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    let db_path = cli
        .db
        .clone()
        .or_else(|| config.db_path.clone())
        .unwrap_or_else(wattbank_store::default_db_path);
    let store = Store::open(&db_path)
        .with_context(|| format!("opening database at {}", db_path.display()))?;

    let app = App::new(Box::new(store), Box::new(MockEndpoint::slow()), config)?;
    Ok(app)
}

async fn run(command: Commands, app: &App) -> Result<()> {
    match command {
        Commands::Status => {
            let s = app.snapshot();
            println!("Credit remaining:  ${:.2}", s.credit_remaining);
            println!(
                "Today's usage:     {:.2} kWh (expected {:.2})",
                s.today_kwh, s.expected_today_kwh
            );
            println!("Rate now:          {:.1} c/kWh", s.rate_now);
            println!(
                "Last synced:       {}",
                s.last_synced.map_or_else(|| "never".to_string(), fmt_ts)
            );
            println!(
                "Sensor link:       {}",
                if s.ble_connected { "connected" } else { "disconnected" }
            );
        }

        Commands::Balance => {
            println!("{:.2}", app.snapshot().credit_remaining);
        }

        Commands::Transactions { format } => {
            let transactions = app.transactions().await?;
            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&transactions)?);
                }
                OutputFormat::Text => {
                    for t in &transactions {
                        let note = t.note.as_deref().unwrap_or("-");
                        println!(
                            "{:>6}  {}  {:>+9.2}  {:<7}  {}",
                            t.id,
                            fmt_ts(t.ts),
                            t.delta,
                            t.source,
                            note
                        );
                    }
                    if transactions.is_empty() {
                        println!("No transactions.");
                    }
                }
            }
        }

        Commands::AddCredit { amount, source, note } => {
            // The positivity check belongs to the UI surface; the ledger
            // itself accepts signed deltas.
            anyhow::ensure!(amount > 0.0, "amount must be positive");
            let source: CreditSource = source.parse()?;
            let id = app.add_credit(amount, source, note.as_deref()).await?;
            println!(
                "Added ${:.2} ({}). New balance: ${:.2} [txn {}]",
                amount,
                source,
                app.snapshot().credit_remaining,
                id
            );
        }

        Commands::History { range, format } => {
            let range: HistoryRange = range.parse()?;
            let buckets = app.history_data(range).await?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string(&buckets)?),
                OutputFormat::Text => {
                    for (i, kwh) in buckets.iter().enumerate() {
                        println!("{:>3}  {:.3} kWh", i, kwh);
                    }
                    let total: f64 = buckets.iter().sum();
                    println!("total  {:.3} kWh", total);
                }
            }
        }

        Commands::Sync => {
            println!("Syncing...");
            let ts = app.sync_now().await?;
            println!("Synced at {}", fmt_ts(ts));
        }

        Commands::Alerts { unread, read, dismiss } => {
            if let Some(id) = read {
                app.mark_alert_read(id).await?;
            }
            if let Some(id) = dismiss {
                app.dismiss_alert(id).await?;
            }

            let alerts = app.alerts().await?;
            let mut shown = 0;
            for a in alerts.iter().filter(|a| !unread || !a.read) {
                let marker = if a.read { " " } else { "*" };
                println!(
                    "{}{:>5}  {}  [{}/{}]  {}: {}",
                    marker,
                    a.id,
                    fmt_ts(a.timestamp),
                    a.kind,
                    a.severity,
                    a.title,
                    a.message
                );
                shown += 1;
            }
            if shown == 0 {
                println!("No alerts.");
            }
        }

        Commands::Pair { name, rssi, connectable } => {
            let id = app.record_pairing(&name, rssi, connectable).await?;
            println!("Recorded pairing {} (rssi {} dBm) [{}]", name, rssi, id);
        }

        Commands::Ingest { wh, ts } => {
            let id = app.record_energy(wh, ts).await?;
            app.refresh().await?;
            println!(
                "Recorded {} Wh ({:.3} kWh) [{}]; today now {:.2} kWh",
                wh,
                wh_to_kwh(wh),
                id,
                app.snapshot().today_kwh
            );
        }
    }

    Ok(())
}

/// Epoch milliseconds as RFC 3339, falling back to the raw number for
/// out-of-range values.
fn fmt_ts(ms: i64) -> String {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(ms) * 1_000_000)
        .ok()
        .and_then(|dt| dt.format(&Rfc3339).ok())
        .unwrap_or_else(|| ms.to_string())
}
