//! Prediction view: actual vs. predicted AQI for a range preset, with
//! confidence bands, summary widgets and forecast warnings.

use thiserror::Error;

use crate::{
    alerts::{WARNING_TITLE, WarningLevel, WarningThresholds, peak_warning, scan_forecast},
    api::{ApiError, DashboardApiClient},
    chart::ChartState,
    config::PredictionsConfig,
    level::{AqiLevel, classify, round_half_up},
    model::{PredictionSeries, RangePreset, Timestamp},
    notify::notify_error,
    sequence::{LoadOutcome, LoadTicket, RequestSequence},
    traits::Notifier,
};

pub const PREDICTION_LOAD_FAILED: &str = "Failed to load data, please try again later";

/// Placeholder shown for unknown values.
pub const PLACEHOLDER: &str = "-";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    #[error("Unknown range preset: {0}")]
    UnknownPreset(String),
    #[error("Preset catalog is empty")]
    NoPresets,
}

// ==================== Presets ====================

/// The range presets offered to the user, one of which is the default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetCatalog {
    presets: Vec<RangePreset>,
    default: RangePreset,
}

impl PresetCatalog {
    /// Fails if `names` is empty or does not contain `default`.
    pub fn new<I, S>(names: I, default: &str) -> Result<Self, ViewError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut presets: Vec<RangePreset> = Vec::new();
        for name in names {
            let preset = RangePreset::new(name.into().trim());
            if !presets.contains(&preset) {
                presets.push(preset);
            }
        }
        if presets.is_empty() {
            return Err(ViewError::NoPresets);
        }
        let default = presets
            .iter()
            .find(|p| p.as_str() == default)
            .cloned()
            .ok_or_else(|| ViewError::UnknownPreset(default.to_string()))?;

        Ok(Self { presets, default })
    }

    pub fn from_config(config: &PredictionsConfig) -> Result<Self, ViewError> {
        Self::new(config.presets.iter().cloned(), &config.default_preset)
    }

    pub fn get(&self, name: &str) -> Result<RangePreset, ViewError> {
        self.presets
            .iter()
            .find(|p| p.as_str() == name)
            .cloned()
            .ok_or_else(|| ViewError::UnknownPreset(name.to_string()))
    }

    pub fn default_preset(&self) -> &RangePreset {
        &self.default
    }

    pub fn presets(&self) -> &[RangePreset] {
        &self.presets
    }
}

impl Default for PresetCatalog {
    fn default() -> Self {
        let presets = ["24h", "48h", "72h"].map(|p| RangePreset::new(p)).to_vec();
        Self {
            default: presets[0].clone(),
            presets,
        }
    }
}

// ==================== View Model ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewState {
    #[default]
    Idle,
    Loading,
    Displaying,
    ErrorShown,
}

/// A big-number AQI widget ("current AQI", "predicted AQI").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AqiDisplay {
    pub value: i64,
    pub level: AqiLevel,
}

impl AqiDisplay {
    fn new(aqi: f64) -> Self {
        Self {
            value: round_half_up(aqi),
            level: classify(aqi),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictedDisplay {
    pub aqi: AqiDisplay,
    /// `"{lower}-{upper}"`.
    pub confidence: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRow {
    pub timestamp: Timestamp,
    pub predicted: f64,
    pub actual: Option<f64>,
    /// Category of the predicted value; colors the predicted and label cells.
    pub level: AqiLevel,
}

impl PredictionRow {
    pub fn time_text(&self) -> &str {
        self.timestamp.raw()
    }

    pub fn predicted_text(&self) -> String {
        round_half_up(self.predicted).to_string()
    }

    pub fn actual_text(&self) -> String {
        self.actual
            .map(|a| round_half_up(a).to_string())
            .unwrap_or_else(|| PLACEHOLDER.to_string())
    }

    pub fn error_text(&self) -> String {
        self.actual
            .map(|a| round_half_up((a - self.predicted).abs()).to_string())
            .unwrap_or_else(|| PLACEHOLDER.to_string())
    }

    pub fn label(&self) -> &'static str {
        self.level.label()
    }

    pub fn color(&self) -> &'static str {
        self.level.color()
    }
}

pub struct PredictionView {
    catalog: PresetCatalog,
    active: RangePreset,
    state: ViewState,
    chart: ChartState,
    rows: Vec<PredictionRow>,
    current: Option<AqiDisplay>,
    predicted: Option<PredictedDisplay>,
    sequence: RequestSequence,
    last_error: Option<ApiError>,
    thresholds: WarningThresholds,
    warnings_enabled: bool,
    last_warned: Option<WarningLevel>,
}

impl PredictionView {
    pub fn new(catalog: PresetCatalog) -> Self {
        Self {
            active: catalog.default_preset().clone(),
            catalog,
            state: ViewState::Idle,
            chart: ChartState::prediction(),
            rows: Vec::new(),
            current: None,
            predicted: None,
            sequence: RequestSequence::default(),
            last_error: None,
            thresholds: WarningThresholds::default(),
            warnings_enabled: true,
            last_warned: None,
        }
    }

    pub fn with_warnings(mut self, thresholds: WarningThresholds, enabled: bool) -> Self {
        self.thresholds = thresholds;
        self.warnings_enabled = enabled;
        self
    }

    pub fn catalog(&self) -> &PresetCatalog {
        &self.catalog
    }

    pub fn active_preset(&self) -> &RangePreset {
        &self.active
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    /// Busy indicator: set while the latest load is in flight.
    pub fn is_loading(&self) -> bool {
        self.sequence.is_pending()
    }

    pub fn chart(&self) -> &ChartState {
        &self.chart
    }

    pub fn rows(&self) -> &[PredictionRow] {
        &self.rows
    }

    pub fn current_aqi(&self) -> Option<&AqiDisplay> {
        self.current.as_ref()
    }

    pub fn predicted_aqi(&self) -> Option<&PredictedDisplay> {
        self.predicted.as_ref()
    }

    pub fn last_error(&self) -> Option<&ApiError> {
        self.last_error.as_ref()
    }

    /// Mark a preset active without loading it.
    pub fn set_active_preset(&mut self, name: &str) -> Result<(), ViewError> {
        let preset = self.catalog.get(name)?;
        tracing::info!("Switching prediction range to {}", preset);
        self.active = preset;
        Ok(())
    }

    /// Mark a preset active and start loading it.
    pub fn select_preset(&mut self, name: &str) -> Result<(LoadTicket, RangePreset), ViewError> {
        self.set_active_preset(name)?;
        Ok(self.begin_load())
    }

    /// Start a load of the active preset. The returned preset is what to fetch.
    pub fn begin_load(&mut self) -> (LoadTicket, RangePreset) {
        self.state = ViewState::Loading;
        (self.sequence.issue(), self.active.clone())
    }

    /// Apply a completed fetch. Only the most recently issued ticket is
    /// applied; it also clears the busy indicator whether it succeeded or not.
    pub fn finish(
        &mut self,
        ticket: LoadTicket,
        result: Result<PredictionSeries, ApiError>,
        notifier: &dyn Notifier,
    ) -> LoadOutcome {
        if !self.sequence.settle(ticket) {
            tracing::debug!(
                "Dropping stale prediction response #{} (latest #{})",
                ticket.sequence(),
                self.sequence.latest()
            );
            return LoadOutcome::Stale;
        }

        match result {
            Ok(series) => {
                tracing::info!(
                    "Loaded {} prediction points for {}",
                    series.len(),
                    self.active
                );
                self.check_warnings(&series, notifier);
                self.show(series);
                self.last_error = None;
                self.state = ViewState::Displaying;
                LoadOutcome::Applied
            }
            Err(e) => {
                tracing::error!("Failed to load predictions: {}", e);
                notify_error(notifier, PREDICTION_LOAD_FAILED);
                self.last_error = Some(e);
                self.state = ViewState::ErrorShown;
                LoadOutcome::Failed
            }
        }
    }

    fn show(&mut self, series: PredictionSeries) {
        self.chart.show_prediction(&series);

        if let Some(actual) = series.latest_actual() {
            self.current = Some(AqiDisplay::new(actual));
        }
        if let Some(first) = series.first() {
            self.predicted = Some(PredictedDisplay {
                aqi: AqiDisplay::new(first.predicted),
                confidence: first.confidence.display_text(),
            });
        }

        self.rows = series
            .points
            .into_iter()
            .map(|p| PredictionRow {
                level: classify(p.predicted),
                timestamp: p.timestamp,
                predicted: p.predicted,
                actual: p.actual,
            })
            .collect();
    }

    /// Notify once per escalation: only when the forecast's peak level is
    /// above the last level already reported. A forecast without warnings
    /// resets the reported level.
    fn check_warnings(&mut self, series: &PredictionSeries, notifier: &dyn Notifier) {
        if !self.warnings_enabled {
            return;
        }
        let warnings = scan_forecast(series, &self.thresholds);
        let Some(peak) = peak_warning(&warnings) else {
            self.last_warned = None;
            return;
        };

        if self.last_warned.is_some_and(|last| peak.level <= last) {
            return;
        }
        let body = format!(
            "{} warning: AQI {} forecast at {}",
            peak.level,
            round_half_up(peak.aqi),
            peak.timestamp.raw()
        );
        if let Err(e) = notifier.notify(WARNING_TITLE, &body) {
            tracing::warn!("Failed to deliver forecast warning: {}", e);
        }
        self.last_warned = Some(peak.level);
    }

    /// Load the active preset.
    pub async fn load_predictions(
        &mut self,
        api: &DashboardApiClient,
        notifier: &dyn Notifier,
    ) -> LoadOutcome {
        let (ticket, preset) = self.begin_load();
        let result = api.fetch_predictions(&preset).await;
        self.finish(ticket, result, notifier)
    }
}
