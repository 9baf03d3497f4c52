use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::{historical::HistoricalRow, traits::Clock};

#[derive(Debug, Serialize)]
struct ExportRecord {
    timestamp: String,
    aqi: f64,
    pm25: f64,
    level: &'static str,
}

impl From<&HistoricalRow> for ExportRecord {
    fn from(row: &HistoricalRow) -> Self {
        Self {
            timestamp: row.timestamp.to_string(),
            aqi: row.aqi,
            pm25: row.pm25,
            level: row.level.id(),
        }
    }
}

/// Write the historical table to `aqi_history_<time>.csv` in `output_dir`.
pub async fn export_historical_csv(
    rows: &[HistoricalRow],
    output_dir: &Path,
    clock: &dyn Clock,
) -> Result<PathBuf> {
    let export_time = clock.now_local();
    let filename = format!("aqi_history_{}.csv", export_time.format("%Y%m%d_%H%M%S"));
    let output_path = output_dir.join(&filename);

    let path = output_path.clone();
    let records: Vec<ExportRecord> = rows.iter().map(ExportRecord::from).collect();

    tokio::task::spawn_blocking(move || -> Result<()> {
        let mut wtr = csv::Writer::from_path(&path).context("Failed to create CSV writer")?;

        for record in records {
            wtr.serialize(record)
                .context("Failed to serialize historical row")?;
        }

        wtr.flush().context("Failed to flush CSV writer")?;
        Ok(())
    })
    .await
    .context("CSV export task failed")??;

    tracing::info!("Exported {} rows to {}", rows.len(), output_path.display());
    Ok(output_path)
}
