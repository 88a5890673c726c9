use std::path::PathBuf;
use std::pin::pin;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use linkwatch::{Dashboard, EntityTelemetry, PollOutcome, Settings};
use linkwatch_types::{Collector, Pair, Registry};

#[derive(Parser, Debug)]
#[command(name = "linkwatch")]
#[command(about = "Watch radio-link telemetry and collector state from a monitoring service")]
struct Args {
    /// Settings file (TOML). `LINKWATCH_*` environment variables also apply.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Monitoring service base URL
    #[arg(short, long)]
    base_url: Option<String>,

    /// Per-request timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Print JSON instead of one line per entity
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch and print the pair registry
    Pairs,

    /// Fetch and print the collector registry
    Collectors {
        /// Poll each collector's status before printing
        #[arg(long)]
        refresh_status: bool,
    },

    /// Fetch and print the latest telemetry for one pair
    Telemetry { pair_id: String },

    /// Poll continuously, printing every update until Ctrl-C
    Watch {
        /// Pair to fetch telemetry for on each tick
        #[arg(short, long)]
        pair: Option<String>,

        /// Tick interval in milliseconds (overrides `poll_interval_ms`)
        #[arg(short, long)]
        interval_ms: Option<u64>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("linkwatch=info,linkwatch_client=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut settings = Settings::load(args.config.as_deref()).context("loading settings")?;
    if let Some(base_url) = args.base_url {
        settings.base_url = base_url;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        settings.timeout_ms = timeout_ms;
    }
    if let Command::Watch {
        interval_ms: Some(interval_ms),
        ..
    } = args.command
    {
        settings.poll_interval_ms = interval_ms;
    }
    settings.validate()?;

    let dashboard = Dashboard::from_settings(&settings).context("building HTTP client")?;
    let json = args.json;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        match args.command {
            Command::Pairs => {
                let pairs = dashboard.pairs().fetch_all().await.context("fetching pairs")?;
                print_pairs(&pairs, json);
            }
            Command::Collectors { refresh_status } => {
                dashboard
                    .collectors()
                    .fetch_all()
                    .await
                    .context("fetching collectors")?;
                if refresh_status {
                    // Failures keep the listed state; report them and print anyway
                    match dashboard.collectors().refresh_status().await {
                        Ok(report) if !report.failed.is_empty() => {
                            warn!(failed = report.failed.len(), "some collector status requests failed");
                        }
                        Ok(_) => {}
                        Err(err) => warn!(error = %err, "collector status refresh failed"),
                    }
                }
                print_collectors(&dashboard.collectors().current(), json);
            }
            Command::Telemetry { pair_id } => {
                let telemetry = dashboard
                    .telemetry()
                    .fetch(&pair_id)
                    .await
                    .with_context(|| format!("fetching telemetry for pair '{pair_id}'"))?;
                print_telemetry(&telemetry, json);
            }
            Command::Watch { pair, .. } => {
                watch(&dashboard, pair, settings.poll_interval(), json).await?;
            }
        }
        Ok::<_, anyhow::Error>(())
    })
}

/// Poll on a fixed tick, printing each store publication, until Ctrl-C.
async fn watch(
    dashboard: &Dashboard,
    pair: Option<String>,
    interval: Duration,
    json: bool,
) -> Result<()> {
    let _subscriptions = [
        dashboard.pairs().subscribe(move |r| print_pairs(r, json)),
        dashboard.collectors().subscribe(move |r| print_collectors(r, json)),
        dashboard.telemetry().subscribe(move |t| print_telemetry(t, json)),
    ];

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut shutdown = pin!(tokio::signal::ctrl_c());

    info!(?interval, ?pair, "watching");
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => {}
        }
        tokio::select! {
            _ = &mut shutdown => break,
            outcome = dashboard.poll(pair.as_deref()) => log_outcome(&outcome),
        }
    }
    info!("stopped");
    Ok(())
}

fn log_outcome(outcome: &PollOutcome) {
    if let Err(err) = &outcome.pairs {
        warn!(error = %err, "pair fetch failed");
    }
    if let Err(err) = &outcome.collectors {
        warn!(error = %err, "collector fetch failed");
    }
    if let Err(err) = &outcome.status {
        warn!(error = %err, "collector status refresh failed");
    }
    if let Some(Err(err)) = &outcome.telemetry {
        warn!(error = %err, "telemetry fetch failed");
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string(value) {
        Ok(line) => println!("{line}"),
        Err(err) => warn!(error = %err, "failed to encode output"),
    }
}

fn print_pairs(pairs: &Registry<Pair>, json: bool) {
    if json {
        return print_json(pairs);
    }
    println!("pairs: {}", pairs.len());
    for pair in pairs {
        println!(
            "  {}\t{}\trx={}\ttx={}",
            pair.pair_id,
            if pair.is_active { "active" } else { "inactive" },
            pair.rx_sub_id.as_deref().unwrap_or("-"),
            pair.tx_sub_id.as_deref().unwrap_or("-"),
        );
    }
}

fn print_collectors(collectors: &Registry<Collector>, json: bool) {
    if json {
        return print_json(collectors);
    }
    println!("collectors: {}", collectors.len());
    for collector in collectors {
        println!(
            "  {}\t{}\t{}\tlast_insert={}",
            collector.collection_name,
            collector.last_state.as_deref().unwrap_or("-"),
            collector.probe_url,
            collector.last_insert.as_deref().unwrap_or("-"),
        );
    }
}

fn print_telemetry(telemetry: &Option<EntityTelemetry>, json: bool) {
    let Some(t) = telemetry else {
        if json {
            println!("null");
        }
        return;
    };
    if json {
        return print_json(t);
    }
    let s = &t.snapshot;
    println!(
        "telemetry {}: tx={} rx={} payload_err={} header_err={} snr={} bps={} updated={}",
        t.key,
        opt(s.tx_frame_count),
        opt(s.rx_frame_count),
        percent(s.payload_error_rate()),
        percent(s.header_error_rate()),
        opt(s.snr_est.map(|v| format!("{v:.1}"))),
        opt(s.current_bps.map(|v| format!("{v:.0}"))),
        s.last_update.as_deref().unwrap_or("-"),
    );
}

fn opt<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn percent(rate: Option<f64>) -> String {
    opt(rate.map(|r| format!("{:.2}%", r * 100.0)))
}
