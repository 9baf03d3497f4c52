//! Forecast warnings raised when predicted AQI crosses configured thresholds.

use std::fmt;

use crate::{
    config::AlertsConfig,
    model::{PredictionSeries, Timestamp},
};

pub const WARNING_TITLE: &str = "Air quality warning";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WarningLevel {
    Blue,
    Yellow,
    Orange,
    Red,
}

impl WarningLevel {
    pub fn name(&self) -> &'static str {
        match self {
            WarningLevel::Blue => "Blue",
            WarningLevel::Yellow => "Yellow",
            WarningLevel::Orange => "Orange",
            WarningLevel::Red => "Red",
        }
    }
}

impl fmt::Display for WarningLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Inclusive lower AQI bound of each warning level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WarningThresholds {
    pub blue: f64,
    pub yellow: f64,
    pub orange: f64,
    pub red: f64,
}

impl Default for WarningThresholds {
    fn default() -> Self {
        Self::from(&AlertsConfig::default())
    }
}

impl From<&AlertsConfig> for WarningThresholds {
    fn from(config: &AlertsConfig) -> Self {
        Self {
            blue: config.blue,
            yellow: config.yellow,
            orange: config.orange,
            red: config.red,
        }
    }
}

impl WarningThresholds {
    pub fn level_for(&self, aqi: f64) -> Option<WarningLevel> {
        if aqi >= self.red {
            Some(WarningLevel::Red)
        } else if aqi >= self.orange {
            Some(WarningLevel::Orange)
        } else if aqi >= self.yellow {
            Some(WarningLevel::Yellow)
        } else if aqi >= self.blue {
            Some(WarningLevel::Blue)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastWarning {
    pub timestamp: Timestamp,
    pub aqi: f64,
    pub level: WarningLevel,
}

/// Every predicted point that reaches a warning level, in series order.
pub fn scan_forecast(
    series: &PredictionSeries,
    thresholds: &WarningThresholds,
) -> Vec<ForecastWarning> {
    series
        .points
        .iter()
        .filter_map(|p| {
            thresholds.level_for(p.predicted).map(|level| ForecastWarning {
                timestamp: p.timestamp.clone(),
                aqi: p.predicted,
                level,
            })
        })
        .collect()
}

/// The most severe warning; ties go to the earliest point.
pub fn peak_warning(warnings: &[ForecastWarning]) -> Option<&ForecastWarning> {
    warnings
        .iter()
        .fold(None, |best: Option<&ForecastWarning>, w| match best {
            Some(b) if b.level >= w.level => Some(b),
            _ => Some(w),
        })
}
