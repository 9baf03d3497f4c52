//! Historical data view: a date-bounded AQI/PM2.5 series with summary
//! statistics, a chart and a table.

use chrono::{Days, NaiveDate};

use crate::{
    api::{ApiError, DashboardApiClient},
    chart::ChartState,
    level::{AqiLevel, Classification, classify},
    model::{HistoricalSeries, HistoricalStats, Timestamp},
    notify::notify_error,
    sequence::{LoadOutcome, LoadTicket, RequestSequence},
    traits::{Clock, Notifier},
};

pub const DEFAULT_HISTORY_DAYS: u32 = 30;
pub const HISTORICAL_LOAD_FAILED: &str = "Failed to load historical data, please try again later";

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// `days` days back from `today`, ending on `today`. Clamps to the
    /// earliest representable date.
    pub fn ending_on(today: NaiveDate, days: u32) -> Self {
        Self {
            start: today
                .checked_sub_days(Days::new(u64::from(days)))
                .unwrap_or(NaiveDate::MIN),
            end: today,
        }
    }
}

/// One table row. The timestamp column shows local date and time.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalRow {
    pub timestamp: Timestamp,
    pub aqi: f64,
    pub pm25: f64,
    pub level: AqiLevel,
}

impl HistoricalRow {
    pub fn time_text(&self) -> String {
        self.timestamp.to_string()
    }

    pub fn aqi_text(&self) -> String {
        format!("{:.1}", self.aqi)
    }

    pub fn pm25_text(&self) -> String {
        format!("{:.1}", self.pm25)
    }

    /// Label and color of the level badge.
    pub fn badge(&self) -> Classification {
        self.level.into()
    }
}

/// Summary widget texts, formatted from the backend's statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoricalSummary {
    pub average_aqi: String,
    pub max_aqi: String,
    pub min_aqi: String,
    pub average_pm25: String,
    pub max_pm25: String,
    pub min_pm25: String,
    pub data_points: String,
    pub missing_ratio: String,
    pub outlier_ratio: String,
}

fn percent(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

impl From<&HistoricalStats> for HistoricalSummary {
    fn from(stats: &HistoricalStats) -> Self {
        Self {
            average_aqi: format!("{:.1}", stats.aqi.mean),
            max_aqi: format!("{:.1}", stats.aqi.max),
            min_aqi: format!("{:.1}", stats.aqi.min),
            average_pm25: format!("{:.1}", stats.pm25.mean),
            max_pm25: format!("{:.1}", stats.pm25.max),
            min_pm25: format!("{:.1}", stats.pm25.min),
            data_points: stats.total_points.to_string(),
            missing_ratio: percent(stats.missing_ratio),
            outlier_ratio: percent(stats.outlier_ratio),
        }
    }
}

pub struct HistoricalView {
    range: DateRange,
    /// Range of the most recently issued load.
    requested: DateRange,
    /// Range of the data currently on display.
    shown_range: Option<DateRange>,
    default_days: u32,
    chart: ChartState,
    rows: Vec<HistoricalRow>,
    summary: Option<HistoricalSummary>,
    stats: Option<HistoricalStats>,
    sequence: RequestSequence,
    last_error: Option<ApiError>,
}

impl HistoricalView {
    /// A view showing nothing yet, with the default range selected.
    pub fn new(clock: &dyn Clock) -> Self {
        Self::with_default_days(clock, DEFAULT_HISTORY_DAYS)
    }

    pub fn with_default_days(clock: &dyn Clock, default_days: u32) -> Self {
        let today = clock.now_local().date_naive();
        let range = DateRange::ending_on(today, default_days);
        Self {
            range,
            requested: range,
            shown_range: None,
            default_days,
            chart: ChartState::historical(),
            rows: Vec::new(),
            summary: None,
            stats: None,
            sequence: RequestSequence::default(),
            last_error: None,
        }
    }

    /// Select the default window ending today, by local calendar day.
    pub fn set_default_range(&mut self, clock: &dyn Clock) {
        let today = clock.now_local().date_naive();
        self.range = DateRange::ending_on(today, self.default_days);
    }

    /// Start and end are not checked against each other; the backend
    /// decides what an inverted range means.
    pub fn set_range(&mut self, start: NaiveDate, end: NaiveDate) {
        self.range = DateRange::new(start, end);
    }

    pub fn range(&self) -> DateRange {
        self.range
    }

    /// The range the displayed rows were fetched for, once anything loaded.
    pub fn shown_range(&self) -> Option<DateRange> {
        self.shown_range
    }

    pub fn chart(&self) -> &ChartState {
        &self.chart
    }

    pub fn rows(&self) -> &[HistoricalRow] {
        &self.rows
    }

    pub fn summary(&self) -> Option<&HistoricalSummary> {
        self.summary.as_ref()
    }

    pub fn stats(&self) -> Option<&HistoricalStats> {
        self.stats.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.sequence.is_pending()
    }

    pub fn last_error(&self) -> Option<&ApiError> {
        self.last_error.as_ref()
    }

    pub fn begin_load(&mut self) -> LoadTicket {
        self.requested = self.range;
        self.sequence.issue()
    }

    /// Apply a completed fetch. Failures notify once and leave the
    /// displayed data untouched.
    pub fn finish(
        &mut self,
        ticket: LoadTicket,
        result: Result<HistoricalSeries, ApiError>,
        notifier: &dyn Notifier,
    ) -> LoadOutcome {
        if !self.sequence.settle(ticket) {
            tracing::debug!(
                "Dropping stale historical response #{} (latest #{})",
                ticket.sequence(),
                self.sequence.latest()
            );
            return LoadOutcome::Stale;
        }

        match result {
            Ok(series) => {
                tracing::info!(
                    "Loaded {} historical readings for {}..{}",
                    series.readings.len(),
                    self.requested.start,
                    self.requested.end
                );
                self.shown_range = Some(self.requested);
                self.show(series);
                self.last_error = None;
                LoadOutcome::Applied
            }
            Err(e) => {
                tracing::error!("Failed to load historical data: {}", e);
                notify_error(notifier, HISTORICAL_LOAD_FAILED);
                self.last_error = Some(e);
                LoadOutcome::Failed
            }
        }
    }

    fn show(&mut self, series: HistoricalSeries) {
        self.chart.show_historical(&series);
        self.summary = Some(HistoricalSummary::from(&series.stats));
        self.rows = series
            .readings
            .into_iter()
            .map(|r| HistoricalRow {
                level: classify(r.aqi),
                timestamp: r.timestamp,
                aqi: r.aqi,
                pm25: r.pm25,
            })
            .collect();
        self.stats = Some(series.stats);
    }

    /// Select `start..=end` and load it.
    pub async fn load_historical(
        &mut self,
        api: &DashboardApiClient,
        start: NaiveDate,
        end: NaiveDate,
        notifier: &dyn Notifier,
    ) -> LoadOutcome {
        self.set_range(start, end);
        self.load(api, notifier).await
    }

    /// Load the currently selected range.
    pub async fn load(&mut self, api: &DashboardApiClient, notifier: &dyn Notifier) -> LoadOutcome {
        let ticket = self.begin_load();
        let range = self.range;
        let result = api.fetch_historical(range.start, range.end).await;
        self.finish(ticket, result, notifier)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::{
        model::{AqiReading, MetricStats},
        traits::{MockClock, MockNotifier},
    };

    fn clock() -> MockClock {
        // Midday UTC keeps the local date stable in any timezone within +-11h
        MockClock::new(Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap())
    }

    fn series(aqi: &[f64]) -> HistoricalSeries {
        let m = MetricStats {
            mean: 72.44,
            max: 130.0,
            min: 20.06,
        };
        HistoricalSeries {
            stats: HistoricalStats {
                aqi: m,
                pm25: m,
                total_points: aqi.len() as u64,
                missing_ratio: 0.0512,
                outlier_ratio: 0.0,
            },
            readings: aqi
                .iter()
                .enumerate()
                .map(|(i, &v)| AqiReading {
                    timestamp: Timestamp::parse(&format!("2024-06-0{} 08:00:00", i + 1)).unwrap(),
                    aqi: v,
                    pm25: v / 2.0,
                })
                .collect(),
        }
    }

    #[test]
    fn test_default_range_is_last_thirty_days() {
        let view = HistoricalView::new(&clock());
        let range = view.range();
        assert_eq!(range.end, NaiveDate::from_ymd_opt(2024, 6, 15).unwrap());
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2024, 5, 16).unwrap());
    }

    #[test]
    fn test_set_default_range_follows_clock() {
        let clock = clock();
        let mut view = HistoricalView::with_default_days(&clock, 7);
        clock.advance(chrono::Duration::days(10));
        view.set_default_range(&clock);
        assert_eq!(view.range().end, NaiveDate::from_ymd_opt(2024, 6, 25).unwrap());
        assert_eq!(view.range().start, NaiveDate::from_ymd_opt(2024, 6, 18).unwrap());
    }

    #[test]
    fn test_huge_default_days_clamps_start() {
        let view = HistoricalView::with_default_days(&clock(), 1_000_000_000);
        assert_eq!(view.range().start, NaiveDate::MIN);
        assert_eq!(view.range().end, NaiveDate::from_ymd_opt(2024, 6, 15).unwrap());
    }

    #[test]
    fn test_shown_range_is_the_fetched_range() {
        let notifier = MockNotifier::new();
        let mut view = HistoricalView::new(&clock());
        let fetched = view.range();
        assert_eq!(view.shown_range(), None);

        let ticket = view.begin_load();
        let later = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        view.set_range(later, later);
        view.finish(ticket, Ok(series(&[30.0])), &notifier);

        assert_eq!(view.shown_range(), Some(fetched));
        assert_eq!(view.range(), DateRange::new(later, later));
    }

    #[test]
    fn test_success_builds_rows_in_order() {
        let notifier = MockNotifier::new();
        let mut view = HistoricalView::new(&clock());
        let ticket = view.begin_load();
        assert!(view.is_loading());

        let outcome = view.finish(ticket, Ok(series(&[30.0, 160.0, 75.0])), &notifier);

        assert_eq!(outcome, LoadOutcome::Applied);
        assert!(!view.is_loading());
        let levels: Vec<_> = view.rows().iter().map(|r| r.level).collect();
        assert_eq!(
            levels,
            vec![AqiLevel::Excellent, AqiLevel::Unhealthy, AqiLevel::Good]
        );
        assert_eq!(view.chart().point_count(), 3);
        assert!(!notifier.was_called());
    }

    #[test]
    fn test_summary_formatting() {
        let summary = HistoricalSummary::from(&series(&[1.0, 2.0]).stats);
        assert_eq!(summary.average_aqi, "72.4");
        assert_eq!(summary.min_aqi, "20.1");
        assert_eq!(summary.data_points, "2");
        assert_eq!(summary.missing_ratio, "5.1%");
        assert_eq!(summary.outlier_ratio, "0.0%");
    }

    #[test]
    fn test_row_texts() {
        let row = HistoricalRow {
            timestamp: Timestamp::parse("2024-06-01 08:00:00").unwrap(),
            aqi: 42.04,
            pm25: 18.25,
            level: classify(42.04),
        };
        assert_eq!(row.aqi_text(), "42.0");
        assert_eq!(row.time_text(), "2024-06-01 08:00:00");
        assert_eq!(row.badge().color, "#00e400");
    }

    #[test]
    fn test_failure_keeps_previous_display() {
        let notifier = MockNotifier::new();
        let mut view = HistoricalView::new(&clock());
        let t = view.begin_load();
        view.finish(t, Ok(series(&[30.0, 60.0])), &notifier);
        let before_rows = view.rows().to_vec();
        let before_chart = view.chart().clone();

        let t = view.begin_load();
        let outcome = view.finish(t, Err(ApiError::Status(500)), &notifier);

        assert_eq!(outcome, LoadOutcome::Failed);
        assert_eq!(view.rows(), before_rows.as_slice());
        assert_eq!(view.chart(), &before_chart);
        assert_eq!(notifier.notification_count(), 1);
        assert_eq!(view.last_error(), Some(&ApiError::Status(500)));
        assert!(!view.is_loading());
    }

    #[test]
    fn test_stale_response_is_dropped() {
        let notifier = MockNotifier::new();
        let mut view = HistoricalView::new(&clock());
        let first = view.begin_load();
        let second = view.begin_load();

        assert_eq!(
            view.finish(second, Ok(series(&[10.0])), &notifier),
            LoadOutcome::Applied
        );
        assert_eq!(
            view.finish(first, Ok(series(&[10.0, 20.0, 30.0])), &notifier),
            LoadOutcome::Stale
        );
        assert_eq!(view.rows().len(), 1);
    }
}
