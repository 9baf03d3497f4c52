//! Data received from the dashboard backend.
//!
//! Every series is replaced wholesale on the next successful fetch; nothing
//! here is mutated after decoding.

use std::fmt;

use chrono::{DateTime, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::level::round_half_up;

/// Naive formats accepted for backend timestamps, tried in order after
/// RFC 3339 and RFC 2822.
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// A backend timestamp: the original string plus its local wall-clock time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timestamp {
    raw: String,
    local: NaiveDateTime,
}

impl Timestamp {
    /// Parse a timestamp string. Offsets are converted to local time; naive
    /// values are taken as already local.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let local = DateTime::parse_from_rfc3339(trimmed)
            .or_else(|_| DateTime::parse_from_rfc2822(trimmed))
            .map(|dt| dt.with_timezone(&Local).naive_local())
            .ok()
            .or_else(|| {
                NAIVE_FORMATS
                    .iter()
                    .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
            })?;

        Some(Self {
            raw: raw.to_string(),
            local,
        })
    }

    /// The string exactly as the backend sent it.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn local(&self) -> NaiveDateTime {
        self.local
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.local.format("%Y-%m-%d %H:%M:%S"))
    }
}

/// One historical sample.
#[derive(Debug, Clone, PartialEq)]
pub struct AqiReading {
    pub timestamp: Timestamp,
    pub aqi: f64,
    pub pm25: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct MetricStats {
    pub mean: f64,
    pub max: f64,
    pub min: f64,
}

/// Aggregates computed by the backend; displayed as-is.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct HistoricalStats {
    pub aqi: MetricStats,
    pub pm25: MetricStats,
    pub total_points: u64,
    pub missing_ratio: f64,
    pub outlier_ratio: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalSeries {
    pub stats: HistoricalStats,
    pub readings: Vec<AqiReading>,
}

/// `[lower, upper]` bound pair around a predicted value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceInterval {
    /// `"{lower}-{upper}"` with both bounds rounded to integers.
    pub fn display_text(&self) -> String {
        format!("{}-{}", round_half_up(self.lower), round_half_up(self.upper))
    }
}

impl From<[f64; 2]> for ConfidenceInterval {
    fn from([lower, upper]: [f64; 2]) -> Self {
        Self { lower, upper }
    }
}

/// One index-aligned entry of a prediction response.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionPoint {
    pub timestamp: Timestamp,
    /// Absent for timestamps that have not happened yet.
    pub actual: Option<f64>,
    pub predicted: f64,
    pub confidence: ConfidenceInterval,
}

impl PredictionPoint {
    /// `|actual - predicted|`, if the actual value is known.
    pub fn absolute_error(&self) -> Option<f64> {
        self.actual.map(|actual| (actual - self.predicted).abs())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PredictionSeries {
    pub points: Vec<PredictionPoint>,
}

impl PredictionSeries {
    /// Most recent known actual value.
    pub fn latest_actual(&self) -> Option<f64> {
        self.points.iter().rev().find_map(|p| p.actual)
    }

    pub fn first(&self) -> Option<&PredictionPoint> {
        self.points.first()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// A named time-window selector interpreted by the backend, e.g. `24h`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RangePreset(String);

impl RangePreset {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RangePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
