//! Plain-text rendering of the dashboard views for the terminal front-end.

use std::fmt::Write;

use crate::{
    chart::{PREDICTION_PREDICTED, historical_tooltip_title, prediction_tooltip_label},
    historical::HistoricalView,
    notify::Toast,
    prediction::{PLACEHOLDER, PredictionView, ViewState},
};

pub fn render_historical(view: &HistoricalView) -> String {
    let mut out = String::new();
    let range = view.range();
    let _ = writeln!(out, "Historical data {} .. {}", range.start, range.end);

    if let Some(s) = view.summary() {
        let _ = writeln!(
            out,
            "AQI    avg {:>7}  max {:>7}  min {:>7}",
            s.average_aqi, s.max_aqi, s.min_aqi
        );
        let _ = writeln!(
            out,
            "PM2.5  avg {:>7}  max {:>7}  min {:>7}",
            s.average_pm25, s.max_pm25, s.min_pm25
        );
        let _ = writeln!(
            out,
            "Points {}  missing {}  outliers {}",
            s.data_points, s.missing_ratio, s.outlier_ratio
        );
    }
    if let Some(last) = view.rows().last() {
        let _ = writeln!(
            out,
            "Latest reading {}",
            historical_tooltip_title(&last.timestamp.local())
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "{:<20} {:>8} {:>8}  Level", "Time", "AQI", "PM2.5");
    for row in view.rows() {
        let _ = writeln!(
            out,
            "{:<20} {:>8} {:>8}  {}",
            row.time_text(),
            row.aqi_text(),
            row.pm25_text(),
            row.badge().label
        );
    }
    out
}

pub fn render_prediction(view: &PredictionView) -> String {
    let mut out = String::new();

    let presets: Vec<String> = view
        .catalog()
        .presets()
        .iter()
        .map(|p| {
            if p == view.active_preset() {
                format!("[{p}]")
            } else {
                p.to_string()
            }
        })
        .collect();
    let status = match view.state() {
        ViewState::Idle => "idle",
        ViewState::Loading => "loading...",
        ViewState::Displaying => "up to date",
        ViewState::ErrorShown => "error",
    };
    let _ = writeln!(out, "Predictions {}  ({})", presets.join(" "), status);

    match view.current_aqi() {
        Some(c) => {
            let _ = writeln!(out, "Current AQI    {:>4}  {}", c.value, c.level.label());
        }
        None => {
            let _ = writeln!(out, "Current AQI    {:>4}", PLACEHOLDER);
        }
    }
    match view.predicted_aqi() {
        Some(p) => {
            let _ = writeln!(
                out,
                "Predicted AQI  {:>4}  {}  (confidence {})",
                p.aqi.value,
                p.aqi.level.label(),
                p.confidence
            );
        }
        None => {
            let _ = writeln!(out, "Predicted AQI  {:>4}", PLACEHOLDER);
        }
    }

    let peak = view
        .rows()
        .iter()
        .max_by(|a, b| a.predicted.total_cmp(&b.predicted));
    if let Some(peak) = peak {
        if let Some(label) = prediction_tooltip_label(PREDICTION_PREDICTED, Some(peak.predicted)) {
            let _ = writeln!(out, "Peak {} at {}", label, peak.time_text());
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{:<20} {:>9} {:>6} {:>6}  Level",
        "Time", "Predicted", "Actual", "Error"
    );
    for row in view.rows() {
        let _ = writeln!(
            out,
            "{:<20} {:>9} {:>6} {:>6}  {}",
            row.time_text(),
            row.predicted_text(),
            row.actual_text(),
            row.error_text(),
            row.label()
        );
    }
    out
}

pub fn render_toasts(toasts: &[Toast]) -> String {
    toasts
        .iter()
        .map(|t| format!("[{}] {}\n", t.title, t.body))
        .collect()
}
