//! AQI Dashboard Library
//!
//! This module exposes the core components of the AQI dashboard client
//! for testing and potential reuse.

pub mod alerts;
pub mod api;
pub mod chart;
pub mod config;
pub mod export;
pub mod historical;
pub mod level;
pub mod model;
pub mod notify;
pub mod prediction;
pub mod refresh;
pub mod render;
pub mod sequence;
pub mod traits;

// Re-export commonly used types
pub use alerts::{ForecastWarning, WarningLevel, WarningThresholds, scan_forecast};
pub use api::{ApiError, DashboardApiClient};
pub use chart::ChartState;
pub use config::AppConfig;
pub use historical::{DateRange, HistoricalRow, HistoricalSummary, HistoricalView};
pub use level::{AqiLevel, Classification, classify, classify_full, round_half_up};
pub use model::{
    AqiReading, ConfidenceInterval, HistoricalSeries, HistoricalStats, PredictionPoint,
    PredictionSeries, RangePreset, Timestamp,
};
pub use notify::{Toast, ToastBoard, notify_error};
pub use prediction::{PredictionRow, PredictionView, PresetCatalog, ViewError, ViewState};
pub use refresh::{PeriodicRefresh, PredictionSession, RefreshHandle};
pub use sequence::{LoadOutcome, LoadTicket};
#[cfg(feature = "desktop")]
pub use traits::DesktopNotifier;
pub use traits::{Clock, CombinedNotifier, MockClock, MockNotifier, Notifier, SystemClock};
