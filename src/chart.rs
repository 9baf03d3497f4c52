//! Chart state handed to the charting front-end.
//!
//! A view owns exactly one `ChartState`. Data is swapped in wholesale on a
//! successful load; axes and dataset styling never change after
//! construction.

use chrono::NaiveDateTime;

use crate::{
    level::{classify, round_half_up},
    model::{ConfidenceInterval, HistoricalSeries, PredictionSeries},
};

pub const HISTORICAL_AQI: &str = "AQI";
pub const HISTORICAL_PM25: &str = "PM2.5";
pub const PREDICTION_ACTUAL: &str = "Actual AQI";
pub const PREDICTION_PREDICTED: &str = "Predicted AQI";
pub const PREDICTION_CONFIDENCE: &str = "Confidence interval";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisKind {
    Time,
    Category,
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisPosition {
    Bottom,
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    pub id: &'static str,
    pub kind: AxisKind,
    pub position: AxisPosition,
    pub title: &'static str,
    /// Tick label format for time axes (front-end pattern syntax).
    pub display_format: Option<&'static str>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Whether grid lines for this axis are drawn over the plot area.
    pub grid_on_chart: bool,
}

impl Axis {
    fn new(id: &'static str, kind: AxisKind, position: AxisPosition, title: &'static str) -> Self {
        Self {
            id,
            kind,
            position,
            title,
            display_format: None,
            min: None,
            max: None,
            grid_on_chart: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SeriesData {
    Values(Vec<Option<f64>>),
    Band(Vec<ConfidenceInterval>),
}

impl SeriesData {
    pub fn len(&self) -> usize {
        match self {
            SeriesData::Values(v) => v.len(),
            SeriesData::Band(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub label: &'static str,
    pub border_color: &'static str,
    /// Fill color for area datasets.
    pub fill: Option<&'static str>,
    pub axis_id: &'static str,
    pub data: SeriesData,
}

impl Dataset {
    fn line(label: &'static str, border_color: &'static str, axis_id: &'static str) -> Self {
        Self {
            label,
            border_color,
            fill: None,
            axis_id,
            data: SeriesData::Values(Vec::new()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartState {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
    pub x_axis: Axis,
    pub y_axes: Vec<Axis>,
}

impl ChartState {
    /// AQI on the left axis, PM2.5 on the right, hourly time axis.
    pub fn historical() -> Self {
        let mut x_axis = Axis::new("x", AxisKind::Time, AxisPosition::Bottom, "Time");
        x_axis.display_format = Some("MM-DD HH:mm");

        let mut pm25_axis = Axis::new("y1", AxisKind::Linear, AxisPosition::Right, "PM2.5 (μg/m³)");
        pm25_axis.grid_on_chart = false;

        Self {
            labels: Vec::new(),
            datasets: vec![
                Dataset::line(HISTORICAL_AQI, "rgb(75, 192, 192)", "y"),
                Dataset::line(HISTORICAL_PM25, "rgb(255, 99, 132)", "y1"),
            ],
            x_axis,
            y_axes: vec![
                Axis::new("y", AxisKind::Linear, AxisPosition::Left, "AQI"),
                pm25_axis,
            ],
        }
    }

    /// Actual and predicted lines plus a shaded confidence band, AQI 0-500.
    pub fn prediction() -> Self {
        let mut aqi_axis = Axis::new("y", AxisKind::Linear, AxisPosition::Left, "AQI");
        aqi_axis.min = Some(0.0);
        aqi_axis.max = Some(500.0);

        let mut band = Dataset::line(PREDICTION_CONFIDENCE, "transparent", "y");
        band.fill = Some("rgba(76, 175, 80, 0.1)");
        band.data = SeriesData::Band(Vec::new());

        Self {
            labels: Vec::new(),
            datasets: vec![
                Dataset::line(PREDICTION_ACTUAL, "#2196F3", "y"),
                Dataset::line(PREDICTION_PREDICTED, "#4CAF50", "y"),
                band,
            ],
            x_axis: Axis::new("x", AxisKind::Category, AxisPosition::Bottom, "Time"),
            y_axes: vec![aqi_axis],
        }
    }

    pub fn dataset(&self, label: &str) -> Option<&Dataset> {
        self.datasets.iter().find(|d| d.label == label)
    }

    /// Swap in new labels and per-dataset data, in dataset order.
    ///
    /// Panics in debug builds if the number of data vectors does not match
    /// the datasets this chart was built with.
    pub fn replace_data(&mut self, labels: Vec<String>, data: Vec<SeriesData>) {
        debug_assert_eq!(data.len(), self.datasets.len());
        self.labels = labels;
        for (dataset, series) in self.datasets.iter_mut().zip(data) {
            dataset.data = series;
        }
    }

    pub fn point_count(&self) -> usize {
        self.labels.len()
    }

    pub(crate) fn show_historical(&mut self, series: &HistoricalSeries) {
        let labels = series
            .readings
            .iter()
            .map(|r| r.timestamp.raw().to_string())
            .collect();
        let aqi = series.readings.iter().map(|r| Some(r.aqi)).collect();
        let pm25 = series.readings.iter().map(|r| Some(r.pm25)).collect();
        self.replace_data(labels, vec![SeriesData::Values(aqi), SeriesData::Values(pm25)]);
    }

    pub(crate) fn show_prediction(&mut self, series: &PredictionSeries) {
        let labels = series
            .points
            .iter()
            .map(|p| p.timestamp.raw().to_string())
            .collect();
        let actual = series.points.iter().map(|p| p.actual).collect();
        let predicted = series.points.iter().map(|p| Some(p.predicted)).collect();
        let band = series.points.iter().map(|p| p.confidence).collect();
        self.replace_data(
            labels,
            vec![
                SeriesData::Values(actual),
                SeriesData::Values(predicted),
                SeriesData::Band(band),
            ],
        );
    }
}

// ==================== Tooltip Formatting ====================

/// Tooltip title for the historical chart: the full local date and time.
pub fn historical_tooltip_title(time: &NaiveDateTime) -> String {
    time.format("%Y/%m/%d %H:%M:%S").to_string()
}

/// Tooltip line for a prediction dataset point. Absent values produce no line.
pub fn prediction_tooltip_label(dataset_label: &str, value: Option<f64>) -> Option<String> {
    let value = value?;
    Some(format!(
        "{}: {} ({})",
        dataset_label,
        round_half_up(value),
        classify(value).label()
    ))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::model::{AqiReading, HistoricalStats, MetricStats, PredictionPoint, Timestamp};

    fn stats() -> HistoricalStats {
        let m = MetricStats {
            mean: 0.0,
            max: 0.0,
            min: 0.0,
        };
        HistoricalStats {
            aqi: m,
            pm25: m,
            total_points: 0,
            missing_ratio: 0.0,
            outlier_ratio: 0.0,
        }
    }

    #[test]
    fn test_historical_layout() {
        let chart = ChartState::historical();
        assert_eq!(chart.datasets.len(), 2);
        assert_eq!(chart.dataset(HISTORICAL_PM25).unwrap().axis_id, "y1");
        assert_eq!(chart.x_axis.display_format, Some("MM-DD HH:mm"));
        assert!(!chart.y_axes[1].grid_on_chart);
        assert_eq!(chart.point_count(), 0);
    }

    #[test]
    fn test_prediction_layout() {
        let chart = ChartState::prediction();
        assert_eq!(chart.y_axes[0].min, Some(0.0));
        assert_eq!(chart.y_axes[0].max, Some(500.0));
        let band = chart.dataset(PREDICTION_CONFIDENCE).unwrap();
        assert!(band.fill.is_some());
        assert!(matches!(band.data, SeriesData::Band(_)));
    }

    #[test]
    fn test_show_historical_replaces_everything() {
        let mut chart = ChartState::historical();
        let series = HistoricalSeries {
            stats: stats(),
            readings: vec![AqiReading {
                timestamp: Timestamp::parse("2024-03-01 00:00:00").unwrap(),
                aqi: 42.0,
                pm25: 18.0,
            }],
        };

        chart.show_historical(&series);
        chart.show_historical(&series);

        assert_eq!(chart.labels, vec!["2024-03-01 00:00:00".to_string()]);
        assert_eq!(
            chart.dataset(HISTORICAL_AQI).unwrap().data,
            SeriesData::Values(vec![Some(42.0)])
        );
    }

    #[test]
    fn test_show_prediction_keeps_gaps() {
        let mut chart = ChartState::prediction();
        let series = PredictionSeries {
            points: vec![PredictionPoint {
                timestamp: Timestamp::parse("2024-03-01 12:00").unwrap(),
                actual: None,
                predicted: 60.0,
                confidence: [55.0, 65.0].into(),
            }],
        };

        chart.show_prediction(&series);

        assert_eq!(
            chart.dataset(PREDICTION_ACTUAL).unwrap().data,
            SeriesData::Values(vec![None])
        );
        assert_eq!(chart.dataset(PREDICTION_CONFIDENCE).unwrap().data.len(), 1);
    }

    #[test]
    fn test_prediction_tooltip_label() {
        assert_eq!(
            prediction_tooltip_label(PREDICTION_PREDICTED, Some(42.4)),
            Some("Predicted AQI: 42 (Excellent)".to_string())
        );
        assert_eq!(prediction_tooltip_label(PREDICTION_ACTUAL, None), None);
    }

    #[test]
    fn test_historical_tooltip_title() {
        let t = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(7, 5, 0)
            .unwrap();
        assert_eq!(historical_tooltip_title(&t), "2024/03/01 07:05:00");
    }
}
