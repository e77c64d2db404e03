//! # Validator Dashboard
//!
//! Runs aggregation cycles over the configured validators and prints the result,
//! either as JSON or as a coloured summary.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin validator_dashboard -- --json
//! cargo run --bin validator_dashboard -- --watch 300
//! ```
//!
//! With `--watch`, press Ctrl+C to stop.

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use indexmap::IndexMap;
use std::time::Duration;
use tokio::signal;
use tokio::time::interval;

use validator_revenue_sdk::{
    cache::Freshness,
    dashboard::{Dashboard, DashboardView},
    metrics,
    registry::Ecosystem,
    settings::Settings,
    types::network::EnrichedNetwork,
};

#[derive(Parser, Debug)]
#[command(name = "validator_dashboard", version, about = "Validator stake and revenue across networks")]
struct Args {
    /// Configuration file (TOML)
    #[arg(long, default_value = "Config.toml")]
    config: String,

    /// JSON registry file, replacing the built-in network list
    #[arg(long)]
    registry: Option<String>,

    /// Refresh every N seconds until Ctrl+C
    #[arg(long, value_name = "SECS")]
    watch: Option<u64>,

    /// Print the raw aggregation result as JSON
    #[arg(long)]
    json: bool,

    /// Also fetch Chainlink operator balance and payment history
    #[arg(long)]
    chainlink: bool,

    /// Prometheus exporter listen address
    #[cfg(feature = "observability")]
    #[arg(long, default_value = "0.0.0.0:9000")]
    metrics_addr: std::net::SocketAddr,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    let mut settings = Settings::from_file(&args.config)?;
    if let Some(path) = &args.registry {
        settings.registry_path = Some(path.clone());
    }

    #[cfg(feature = "observability")]
    {
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(args.metrics_addr)
            .install()?;
        log::info!("📈 Prometheus exporter listening on {}", args.metrics_addr);
    }
    metrics::describe_metrics();

    let dashboard = Dashboard::from_settings(&settings)?;

    match args.watch {
        None => run_once(&dashboard, &args).await,
        Some(secs) => {
            let mut ticker = interval(Duration::from_secs(secs.max(1)));
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = run_once(&dashboard, &args).await {
                            log::error!("❌ Refresh failed: {}", e);
                        }
                    }
                    _ = signal::ctrl_c() => {
                        println!("\n🛑 Shutdown signal received");
                        break;
                    }
                }
            }
            Ok(())
        }
    }
}

async fn run_once(dashboard: &Dashboard, args: &Args) -> Result<()> {
    let view = if args.watch.is_some() {
        dashboard.refresh().await?
    } else {
        dashboard.current().await?
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print_summary(&view);
    }

    if args.chainlink {
        match dashboard.chainlink_stats().await {
            Ok(stats) if args.json => println!("{}", serde_json::to_string_pretty(&stats)?),
            Ok(stats) => {
                println!("\n{}", "Chainlink operator".bold());
                println!("   balance: {:.2} LINK{}", stats.current_balance, usd_suffix(stats.current_balance_usd));
                if stats.history_available {
                    println!(
                        "   received: {:.2} LINK (7d {:.2}, 30d {:.2}, 90d {:.2}), {} payments",
                        stats.history.total_received,
                        stats.history.last_7_days,
                        stats.history.last_30_days,
                        stats.history.last_90_days,
                        stats.history.payments.len()
                    );
                } else {
                    println!("   {}", "payment history needs ETHERSCAN_API_KEY".yellow());
                }
            }
            Err(e) => println!("{} {}", "Chainlink stats unavailable:".red(), e),
        }
    }
    Ok(())
}

fn usd_suffix(usd: Option<f64>) -> String {
    usd.map(|v| format!(" (${:.0})", v)).unwrap_or_default()
}

fn print_summary(view: &DashboardView) {
    let result = &view.result;
    let freshness = match view.freshness {
        Freshness::Fresh => "fresh".green(),
        Freshness::Stale => "stale".yellow(),
        Freshness::NeverFetched => "never fetched".red(),
    };
    println!(
        "{} {} ({}, cycle {})",
        "Validator dashboard".bold(),
        result.last_updated.format("%Y-%m-%d %H:%M:%S UTC"),
        freshness,
        result.cycle_id
    );

    let mut by_ecosystem: IndexMap<Ecosystem, Vec<&EnrichedNetwork>> = IndexMap::new();
    for network in &result.networks {
        by_ecosystem.entry(network.entry.ecosystem).or_default().push(network);
    }

    for (ecosystem, networks) in &by_ecosystem {
        println!("\n{}", format!("{:?}", ecosystem).cyan().bold());
        for n in networks {
            let stake = match (&n.stake, &n.wallet_balance) {
                (Some(s), _) => format!("{:>18.2} {}{}", s.amount, n.entry.token, usd_suffix(s.usd_value)),
                (None, Some(w)) => format!(
                    "{:>18.2} {}{} {}",
                    w.amount,
                    n.entry.token,
                    usd_suffix(w.usd_value),
                    "(wallet)".dimmed()
                ),
                (None, None) if result.failed(n.id()) => "failed".red().to_string(),
                (None, None) => "-".dimmed().to_string(),
            };
            let rank = match (n.rank, n.total_validators) {
                (Some(r), Some(t)) => format!("#{}/{}", r, t),
                (None, Some(t)) => format!("-/{}", t),
                _ => String::new(),
            };
            let revenue = n
                .estimated_monthly_revenue
                .map(|m| format!("${:.0}/mo", m))
                .unwrap_or_default();
            println!("   {:<14} {} {} {}", n.entry.name, stake, rank, revenue.green());
        }
    }

    let m = &result.metrics;
    println!(
        "\n{} ${:.0} staked, ${:.0}/mo, ${:.0}/yr, {}/{} active networks, avg APR {}",
        "Total:".bold(),
        m.total_stake_usd,
        m.estimated_monthly_revenue,
        m.estimated_yearly_revenue,
        m.active_networks,
        m.total_networks,
        m.avg_apr.map(|a| format!("{:.2}%", a)).unwrap_or_else(|| "n/a".to_string())
    );

    for e in &result.errors {
        println!("   {} {}: {}", "✗".red(), e.network_id, e.message);
    }
    for d in &result.degraded {
        println!("   {} {}: {}", "!".yellow(), d.source, d.reason);
    }
    for n in &view.last_known {
        if let Some(s) = &n.stake {
            println!("   last known {}: {:.2} {}", n.id(), s.amount, n.entry.token);
        }
    }
}
