//! Display utilities for formatting CLI output.
//!
//! This module provides table row structures and formatting functions
//! for presenting survey datasets and conversion results in a human-readable format.

use tabled::{Table, Tabled};

use spraykit_core::calculator::VolumeRow;
use spraykit_core::formats::Format;
use spraykit_core::types::{ConversionSummary, DatasetInfo};

/// Table row representation for displaying attribute field information.
#[derive(Tabled)]
pub struct FieldRow {
    /// Name of the field.
    #[tabled(rename = "Field")]
    pub name: String,
    /// dBASE type of the field.
    #[tabled(rename = "Type")]
    pub data_type: String,
    #[tabled(rename = "Width")]
    pub length: u8,
    #[tabled(rename = "Decimals")]
    pub decimals: u8,
}

/// Table row representation for displaying format registry entries.
#[derive(Tabled)]
pub struct FormatRow {
    /// Short identifier for the format (e.g., `ZIP`).
    #[tabled(rename = "Short Name")]
    pub short_name: String,
    /// Full descriptive name of the format.
    #[tabled(rename = "Long Name")]
    pub long_name: String,
    #[tabled(rename = "Extension")]
    pub extension: String,
    /// Support status for reading uploads in this format.
    #[tabled(rename = "Read")]
    pub read: String,
    /// Support status for producing this format.
    #[tabled(rename = "Write")]
    pub write: String,
}

/// Table row representation for one feature's area and volume.
#[derive(Tabled)]
pub struct VolumeTableRow {
    /// 1-based feature number.
    #[tabled(rename = "Feature")]
    pub feature: usize,
    #[tabled(rename = "Area (m²)")]
    pub area_m2: String,
    #[tabled(rename = "Acres")]
    pub acres: String,
    #[tabled(rename = "Volume")]
    pub volume: String,
}

impl VolumeTableRow {
    #[must_use]
    pub fn new(index: usize, row: &VolumeRow) -> Self {
        Self {
            feature: index + 1,
            area_m2: format!("{:.2}", row.area_m2),
            acres: format!("{:.3}", row.reported_acres()),
            volume: format!("{:.2}", row.volume),
        }
    }
}

/// Display dataset information in formatted tables.
///
/// # Arguments
///
/// * `info` - The dataset information to display
pub fn display_dataset_info(info: &DatasetInfo) {
    println!("\nDataset: {}", info.dataset);
    println!("Geometry: {} ({} feature(s))", info.shape_type, info.feature_count);
    if let Some(code_page) = &info.code_page {
        println!("Code page: {code_page}");
    }

    if !info.fields.is_empty() {
        println!("\n=== Fields ===");

        let field_rows: Vec<FieldRow> = info
            .fields
            .iter()
            .map(|f| FieldRow {
                name: f.name.clone(),
                data_type: f.data_type.clone(),
                length: f.length,
                decimals: f.decimals,
            })
            .collect();

        println!("{}", Table::new(field_rows));
    }

    println!("\n=== Projection ===");
    if info.projection.is_empty() {
        println!("N/A");
    } else {
        println!("{}", info.projection);
    }

    println!("\n=== Archive Members ===");
    for member in &info.members {
        println!("{member}");
    }
}

/// Display per-feature volumes followed by totals.
pub fn display_volumes(rows: &[VolumeRow], rate_per_acre: f64) {
    println!("\nRate: {rate_per_acre} per acre");

    let table_rows: Vec<VolumeTableRow> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| VolumeTableRow::new(i, row))
        .collect();
    println!("{}", Table::new(table_rows));

    let area: f64 = rows.iter().map(|r| r.area_m2).sum();
    let acres: f64 = rows.iter().map(|r| r.acres).sum();
    let volume: f64 = rows.iter().map(|r| r.volume).sum();
    println!("Total: {area:.2} m², {acres:.3} acres, volume {volume:.2}");
}

/// Display the format registry.
pub fn display_formats(formats: &[Format]) {
    println!("\nAvailable Formats ({} total):\n", formats.len());

    let rows: Vec<FormatRow> = formats
        .iter()
        .map(|f| FormatRow {
            short_name: f.short_name.to_string(),
            long_name: f.long_name.to_string(),
            extension: f.extension.to_string(),
            read: f.capabilities.read.as_str().to_string(),
            write: f.capabilities.write.as_str().to_string(),
        })
        .collect();

    println!("{}", Table::new(rows));
}

/// One-line summary of a finished conversion.
#[must_use]
pub fn summary_line(summary: &ConversionSummary) -> String {
    let field = summary
        .field_name
        .as_deref()
        .map_or_else(|| "no field written".to_string(), |f| format!("field '{f}'"));
    format!(
        "Converted '{}' to '{}': {} feature(s), {} mode, {field}",
        summary.input_base_name,
        summary.output_base_name,
        summary.feature_count,
        summary.mode.as_str()
    )
}
