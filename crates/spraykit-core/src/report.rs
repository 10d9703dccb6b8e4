//! Per-feature area and volume report as CSV.

use bytes::Bytes;
use csv::WriterBuilder;
use log::debug;

use crate::calculator::{ACRE_DECIMALS, VOLUME_DECIMALS, VolumeRow};
use crate::error::{ContextExt, Result, SchemaError};
use crate::features::FeatureCollection;

/// Suffix appended to the base name of the report member.
pub const REPORT_SUFFIX: &str = "_volumes.csv";

/// Column holding the acreage of each feature.
pub const ACRES_COLUMN: &str = "Acres";

/// Column holding the spray volume of each feature.
pub const VOLUME_COLUMN: &str = "Volume";

/// A derived file that travels alongside the geometry set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFile {
    pub name: String,
    pub data: Bytes,
}

impl ReportFile {
    #[must_use]
    pub fn name_for(base_name: &str) -> String {
        format!("{base_name}{REPORT_SUFFIX}")
    }
}

/// Tabulate the original attributes of each feature with its acreage and volume.
///
/// # Errors
///
/// Returns [`SchemaError::RateCountMismatch`] when `rows` does not hold one
/// entry per feature, and an unexpected error when CSV encoding fails.
pub fn write_report(
    base_name: &str,
    collection: &FeatureCollection,
    rows: &[VolumeRow],
) -> Result<ReportFile> {
    if rows.len() != collection.len() {
        return Err(SchemaError::RateCountMismatch {
            values: rows.len(),
            features: collection.len(),
        }
        .into());
    }

    let mut writer = WriterBuilder::new().from_writer(Vec::new());

    let mut header: Vec<String> = collection
        .schema()
        .iter()
        .map(|f| f.name().to_string())
        .collect();
    let computed = [
        computed_column(ACRES_COLUMN, &header),
        computed_column(VOLUME_COLUMN, &header),
    ];
    header.extend(computed);
    writer
        .write_record(&header)
        .with_context("writing the report header")?;

    let acre_places = ACRE_DECIMALS as usize;
    let volume_places = VOLUME_DECIMALS as usize;
    for (feature, row) in collection.features().zip(rows) {
        let mut record: Vec<String> = (0..feature.record.len())
            .map(|i| feature.record.text(i).unwrap_or_default())
            .collect();
        record.push(format!("{:.acre_places$}", row.reported_acres()));
        record.push(format!("{:.volume_places$}", row.volume));
        writer
            .write_record(&record)
            .with_context(format!("writing report row {}", feature.index + 1))?;
    }

    let data = writer
        .into_inner()
        .map_err(|e| e.into_error())
        .with_context("flushing the report")?;
    debug!("Report for '{base_name}' has {} row(s)", rows.len());

    Ok(ReportFile {
        name: ReportFile::name_for(base_name),
        data: Bytes::from(data),
    })
}

/// Name for a computed column, suffixed with ` (calc)` when an attribute
/// already uses it. dBASE names cannot contain spaces, so the suffixed name is
/// always free.
fn computed_column(name: &str, fields: &[String]) -> String {
    if fields.iter().any(|f| f.eq_ignore_ascii_case(name)) {
        format!("{name} (calc)")
    } else {
        name.to_string()
    }
}
