use std::path::PathBuf;

use anyhow::{Context, Result, ensure};
use config::{Config, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub network: NetworkConfig,
    pub refresh: RefreshConfig,
    pub history: HistoryConfig,
    pub predictions: PredictionsConfig,
    pub notifications: NotificationConfig,
    pub alerts: AlertsConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    /// Base URL of the dashboard backend, without the `/api/...` path.
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NetworkConfig {
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RefreshConfig {
    pub prediction_interval_secs: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            prediction_interval_secs: 300,
        }
    }
}

/// Upper bound for `history.default_days`, one hundred years.
pub const MAX_HISTORY_DAYS: u32 = 36_525;

#[derive(Debug, Deserialize, Clone)]
pub struct HistoryConfig {
    /// Days back from today selected on first display.
    pub default_days: u32,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { default_days: 30 }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PredictionsConfig {
    /// Range presets understood by the backend, e.g. `24h`.
    pub presets: Vec<String>,
    pub default_preset: String,
}

impl Default for PredictionsConfig {
    fn default() -> Self {
        Self {
            presets: vec!["24h".to_string(), "48h".to_string(), "72h".to_string()],
            default_preset: "24h".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotificationConfig {
    /// Seconds before a toast disappears on its own. `0` keeps it until dismissed.
    pub toast_ttl_secs: u64,
    /// Also raise desktop notifications (needs the `desktop` feature).
    pub desktop: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            toast_ttl_secs: 3,
            desktop: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AlertsConfig {
    pub enabled: bool,
    pub blue: f64,
    pub yellow: f64,
    pub orange: f64,
    pub red: f64,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            blue: 101.0,
            yellow: 151.0,
            orange: 201.0,
            red: 301.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExportConfig {
    pub output_dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        // Load .env file (silently ignore if not present)
        let _ = dotenvy::dotenv();

        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("aqi-dashboard");

        let builder = Config::builder()
            // 1. Defaults
            .set_default("api.base_url", "http://127.0.0.1:5000")?
            .set_default("network.request_timeout_secs", 30)?
            .set_default("network.connect_timeout_secs", 10)?
            .set_default("refresh.prediction_interval_secs", 300)?
            .set_default("history.default_days", 30)?
            .set_default("predictions.presets", vec!["24h", "48h", "72h"])?
            .set_default("predictions.default_preset", "24h")?
            .set_default("notifications.toast_ttl_secs", 3)?
            .set_default("notifications.desktop", false)?
            .set_default("alerts.enabled", true)?
            .set_default("alerts.blue", 101.0)?
            .set_default("alerts.yellow", 151.0)?
            .set_default("alerts.orange", 201.0)?
            .set_default("alerts.red", 301.0)?
            .set_default("export.output_dir", ".")?
            // 2. Local config file (optional, lowest priority)
            .add_source(File::from(PathBuf::from("config.toml")).required(false))
            // 3. User config directory (optional, overrides local)
            .add_source(File::from(config_dir.join("config.toml")).required(false))
            // 4. Environment variables (AQI__API__BASE_URL=...)
            .add_source(
                Environment::with_prefix("AQI")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("predictions.presets")
                    .try_parsing(true),
            );

        let s = builder.build().context("Failed to build configuration")?;
        let config: Self = s
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that deserialize fine but cannot be used.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.refresh.prediction_interval_secs > 0,
            "refresh.prediction_interval_secs must be greater than zero"
        );
        ensure!(
            i64::try_from(self.notifications.toast_ttl_secs)
                .ok()
                .and_then(chrono::TimeDelta::try_seconds)
                .is_some(),
            "notifications.toast_ttl_secs is out of range: {}",
            self.notifications.toast_ttl_secs
        );
        ensure!(
            self.history.default_days <= MAX_HISTORY_DAYS,
            "history.default_days must be at most {}, got {}",
            MAX_HISTORY_DAYS,
            self.history.default_days
        );
        ensure!(
            self.predictions
                .presets
                .iter()
                .any(|p| p.trim() == self.predictions.default_preset),
            "predictions.default_preset {:?} is not one of predictions.presets",
            self.predictions.default_preset
        );
        Ok(())
    }
}
