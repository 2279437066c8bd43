use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use csv::Writer;

use crate::errors::{OrganoidError, Result};
use crate::measurement::OrganoidRecord;
use crate::overlay::OverlayItem;

/// Column headers of the results table
pub const RESULT_COLUMNS: [&str; 8] = [
    "Organoid",
    "X",
    "Y",
    "Area",
    "Contained Marker-A Area",
    "Contained Marker-B Area",
    "Contained Marker-B Mean",
    "Contained Marker-A Mean",
];

/// Base name shared by all outputs of one analysed plane
pub fn result_stem(title: &str, slice: usize) -> String {
    format!("{}_Z{}", title, slice)
}

/// Write the per-organoid results table as CSV
pub fn write_results_csv<P: AsRef<Path>>(
    records: &[OrganoidRecord],
    output_dir: P,
    title: &str,
    slice: usize,
) -> Result<PathBuf> {
    let output_path = output_dir
        .as_ref()
        .join(format!("{}_Results.csv", result_stem(title, slice)));

    // Create directory if it doesn't exist
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut writer = Writer::from_path(&output_path)?;
    writer.write_record(RESULT_COLUMNS)?;

    for record in records {
        writer.write_record(&[
            record.label.clone(),
            format!("{:.6}", record.x),
            format!("{:.6}", record.y),
            format!("{:.6}", record.area),
            format!("{:.6}", record.marker_a_area),
            format!("{:.6}", record.marker_b_area),
            format!("{:.6}", record.marker_b_mean),
            format!("{:.6}", record.marker_a_mean),
        ])?;
    }

    writer.flush().map_err(|e| OrganoidError::CsvOutput(csv::Error::from(e)))?;

    Ok(output_path)
}

/// Write the overlay items as JSON for an external viewer
pub fn write_overlay_json<P: AsRef<Path>>(
    items: &[OverlayItem],
    output_dir: P,
    title: &str,
    slice: usize,
) -> Result<PathBuf> {
    let output_path = output_dir
        .as_ref()
        .join(format!("{}_Overlay.json", result_stem(title, slice)));

    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let file = File::create(&output_path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), items)?;

    Ok(output_path)
}
