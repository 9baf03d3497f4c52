//! AQI level classification.
//!
//! Both dashboard views classify through this module so that labels and
//! colors stay consistent across charts, tables and summary widgets.

use std::fmt;

/// Air quality category, ordered from cleanest to most polluted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AqiLevel {
    Excellent,
    Good,
    Moderate,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

/// Categories with a finite upper bound, in ascending order.
/// Anything above the last bound is `Hazardous`.
const BOUNDED_LEVELS: [AqiLevel; 5] = [
    AqiLevel::Excellent,
    AqiLevel::Good,
    AqiLevel::Moderate,
    AqiLevel::Unhealthy,
    AqiLevel::VeryUnhealthy,
];

impl AqiLevel {
    pub const ALL: [AqiLevel; 6] = [
        AqiLevel::Excellent,
        AqiLevel::Good,
        AqiLevel::Moderate,
        AqiLevel::Unhealthy,
        AqiLevel::VeryUnhealthy,
        AqiLevel::Hazardous,
    ];

    /// Stable identifier used in markup and exports.
    pub fn id(&self) -> &'static str {
        match self {
            AqiLevel::Excellent => "excellent",
            AqiLevel::Good => "good",
            AqiLevel::Moderate => "moderate",
            AqiLevel::Unhealthy => "unhealthy",
            AqiLevel::VeryUnhealthy => "very-unhealthy",
            AqiLevel::Hazardous => "hazardous",
        }
    }

    /// Human-readable label shown in badges and tables.
    pub fn label(&self) -> &'static str {
        match self {
            AqiLevel::Excellent => "Excellent",
            AqiLevel::Good => "Good",
            AqiLevel::Moderate => "Lightly Polluted",
            AqiLevel::Unhealthy => "Moderately Polluted",
            AqiLevel::VeryUnhealthy => "Heavily Polluted",
            AqiLevel::Hazardous => "Severely Polluted",
        }
    }

    /// Display color as a CSS hex string.
    pub fn color(&self) -> &'static str {
        match self {
            AqiLevel::Excellent => "#00e400",
            AqiLevel::Good => "#ffff00",
            AqiLevel::Moderate => "#ff7e00",
            AqiLevel::Unhealthy => "#ff0000",
            AqiLevel::VeryUnhealthy => "#99004c",
            AqiLevel::Hazardous => "#7e0023",
        }
    }

    /// Inclusive upper bound of the category. `Hazardous` reports 500 but
    /// also absorbs every value above it.
    pub fn upper_bound(&self) -> f64 {
        match self {
            AqiLevel::Excellent => 50.0,
            AqiLevel::Good => 100.0,
            AqiLevel::Moderate => 150.0,
            AqiLevel::Unhealthy => 200.0,
            AqiLevel::VeryUnhealthy => 300.0,
            AqiLevel::Hazardous => 500.0,
        }
    }
}

impl fmt::Display for AqiLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The `(categoryId, label, color)` triple for a single value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub level: AqiLevel,
    pub id: &'static str,
    pub label: &'static str,
    pub color: &'static str,
}

impl From<AqiLevel> for Classification {
    fn from(level: AqiLevel) -> Self {
        Self {
            level,
            id: level.id(),
            label: level.label(),
            color: level.color(),
        }
    }
}

/// Classify an AQI value.
///
/// Boundary values belong to the lower category (`50.0` is `Excellent`).
/// Never fails: negative values are `Excellent`, values above 500 and NaN
/// are `Hazardous`.
pub fn classify(aqi: f64) -> AqiLevel {
    BOUNDED_LEVELS
        .into_iter()
        .find(|level| aqi <= level.upper_bound())
        .unwrap_or(AqiLevel::Hazardous)
}

/// Classify and expand into the full display triple.
pub fn classify_full(aqi: f64) -> Classification {
    classify(aqi).into()
}

/// Round to the nearest integer with halves going toward positive infinity.
///
/// Every integer shown on the dashboard goes through this so `-0.5` and
/// `0.5` render as `0` and `1` respectively.
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}
