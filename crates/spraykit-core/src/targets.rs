//! Spot-spray target list for the drone's flight planner.
//!
//! One target per point feature, named `Target_<n>` in feature order.

use csv::WriterBuilder;
use log::info;

use crate::error::{ContextExt, Result, SchemaError};
use crate::features::FeatureCollection;
use crate::options::TargetOptions;

/// Column headers expected by the flight planner.
pub const TARGET_HEADERS: [&str; 5] = ["Longitude", "Latitude", "Radius (m)", "Amount (L)", "Name"];

#[derive(Debug, Clone, PartialEq)]
pub struct SpotTarget {
    pub longitude: f64,
    pub latitude: f64,
    pub radius_m: f64,
    pub amount_l: f64,
    pub name: String,
}

/// Build one target per feature.
///
/// # Errors
///
/// Returns [`SchemaError::UnsupportedGeometry`] for the first feature that is
/// not a single point.
pub fn spot_targets(
    collection: &FeatureCollection,
    options: &TargetOptions,
) -> Result<Vec<SpotTarget>> {
    collection
        .features()
        .map(|feature| -> Result<SpotTarget> {
            let point = feature.geometry.as_point().ok_or_else(|| {
                SchemaError::UnsupportedGeometry {
                    feature: feature.index + 1,
                    shape_type: feature.geometry.shape_type.to_string(),
                }
            })?;
            Ok(SpotTarget {
                longitude: point.x,
                latitude: point.y,
                radius_m: options.radius_m,
                amount_l: options.amount_l,
                name: format!("Target_{}", feature.index + 1),
            })
        })
        .collect()
}

/// Encode targets as CSV with [`TARGET_HEADERS`].
///
/// # Errors
///
/// Returns an unexpected error when CSV encoding fails.
pub fn write_targets_csv(targets: &[SpotTarget]) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    writer
        .write_record(TARGET_HEADERS)
        .with_context("writing the target header")?;
    for target in targets {
        writer
            .write_record([
                target.longitude.to_string(),
                target.latitude.to_string(),
                target.radius_m.to_string(),
                target.amount_l.to_string(),
                target.name.clone(),
            ])
            .with_context(format!("writing {}", target.name))?;
    }
    let data = writer
        .into_inner()
        .map_err(|e| e.into_error())
        .with_context("flushing the target list")?;
    info!("Wrote {} spot target(s)", targets.len());
    Ok(data)
}
