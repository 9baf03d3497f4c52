use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use aqi_dashboard::{
    DashboardApiClient, HistoricalView, LoadOutcome, Notifier, PredictionSession,
    PredictionView, PresetCatalog, SystemClock, ToastBoard, WarningThresholds,
    config::AppConfig,
    export::export_historical_csv,
    render::{render_historical, render_prediction, render_toasts},
};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(name = "aqi-dashboard")]
#[command(about = "Air quality dashboard - historical and predicted AQI")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show historical AQI and PM2.5 for a date range (default: last 30 days)
    Historical {
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        /// Also write the table to a CSV file in this directory
        #[arg(long)]
        export: Option<Option<PathBuf>>,
    },
    /// Show predicted AQI for a range preset
    Predictions {
        #[arg(long)]
        range: Option<String>,
    },
    /// Keep the prediction view on screen, refreshing periodically
    Watch {
        #[arg(long)]
        range: Option<String>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::builder()
        .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
        .parse_lossy("aqi_dashboard=debug");

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;
    let config = Arc::new(config);

    let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;

    rt.block_on(async move {
        let api = DashboardApiClient::new(&config.api.base_url, &config.network)?;
        tracing::info!("API client initialized for {}", config.api.base_url);

        let clock = Arc::new(SystemClock);
        let toasts = ToastBoard::new(clock.clone(), config.notifications.toast_ttl_secs);
        let notifier = build_notifier(&config, toasts.clone());

        match args.command {
            Command::Historical { start, end, export } => {
                let mut view =
                    HistoricalView::with_default_days(clock.as_ref(), config.history.default_days);
                if start.is_some() || end.is_some() {
                    let range = view.range();
                    view.set_range(start.unwrap_or(range.start), end.unwrap_or(range.end));
                }

                let outcome = view.load(&api, notifier.as_ref()).await;
                print!("{}", render_historical(&view));
                eprint!("{}", render_toasts(&toasts.active()));

                if let (LoadOutcome::Applied, Some(dir)) = (outcome, export) {
                    let dir = dir.unwrap_or_else(|| config.export.output_dir.clone());
                    let path = export_historical_csv(view.rows(), &dir, clock.as_ref()).await?;
                    println!("Exported to {}", path.display());
                }
                Ok(())
            }
            Command::Predictions { range } => {
                let mut view = build_prediction_view(&config)?;
                if let Some(name) = range {
                    view.set_active_preset(&name)?;
                }
                view.load_predictions(&api, notifier.as_ref()).await;
                print!("{}", render_prediction(&view));
                eprint!("{}", render_toasts(&toasts.active()));
                Ok(())
            }
            Command::Watch { range } => {
                let mut view = build_prediction_view(&config)?;
                if let Some(name) = range {
                    view.set_active_preset(&name)?;
                }
                let period = Duration::from_secs(config.refresh.prediction_interval_secs);
                run_watch(view, api, notifier, toasts, period).await
            }
        }
    })
}

fn build_prediction_view(config: &AppConfig) -> Result<PredictionView> {
    let catalog = PresetCatalog::from_config(&config.predictions)
        .context("Invalid prediction preset configuration")?;
    Ok(PredictionView::new(catalog).with_warnings(
        WarningThresholds::from(&config.alerts),
        config.alerts.enabled,
    ))
}

#[cfg(feature = "desktop")]
fn build_notifier(config: &AppConfig, toasts: ToastBoard) -> Arc<dyn Notifier> {
    if config.notifications.desktop {
        Arc::new(aqi_dashboard::CombinedNotifier::new(vec![
            Arc::new(toasts) as Arc<dyn Notifier>,
            Arc::new(aqi_dashboard::DesktopNotifier),
        ]))
    } else {
        Arc::new(toasts)
    }
}

#[cfg(not(feature = "desktop"))]
fn build_notifier(config: &AppConfig, toasts: ToastBoard) -> Arc<dyn Notifier> {
    if config.notifications.desktop {
        tracing::warn!("Desktop notifications requested but the `desktop` feature is not enabled");
    }
    Arc::new(toasts)
}

/// Mount the prediction view and re-render after every completed load
/// until Ctrl-C.
async fn run_watch(
    view: PredictionView,
    api: DashboardApiClient,
    notifier: Arc<dyn Notifier>,
    toasts: ToastBoard,
    period: Duration,
) -> Result<()> {
    let mut session = PredictionSession::mount(view, api, notifier, period).await;
    let mut updates = session.subscribe();

    loop {
        {
            let view = session.view();
            let view = view.lock().await;
            print!("{}", render_prediction(&view));
        }
        eprint!("{}", render_toasts(&toasts.active()));

        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, stopping");
                break;
            }
        }
    }

    session.unmount();
    Ok(())
}
