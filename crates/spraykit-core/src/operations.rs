//! Conversion operations over uploaded archive bytes.
//!
//! Each operation is one synchronous pass over a single upload: intake,
//! pairing, optional attribute rewrite, optional volume calculation, and
//! packaging. Nothing is written anywhere until every step has succeeded,
//! so a failed request never yields partial output.

use log::info;

use crate::calculator::{VolumeRow, compute_volumes, shape_area};
use crate::container;
use crate::error::{ConfigError, Result};
use crate::features::FeatureCollection;
use crate::formats;
use crate::intake::{self, Component};
use crate::options::{ConversionOptions, RateMode, TargetOptions};
use crate::packager;
use crate::report::{ReportFile, write_report};
use crate::targets::{spot_targets, write_targets_csv};
use crate::transform::{RateSpec, transform_features};
use crate::types::{ConversionSummary, DatasetInfo, FieldInfo};

/// A finished conversion.
#[derive(Debug, Clone)]
pub struct ConversionOutput {
    /// The output zip archive
    pub archive: Vec<u8>,
    /// The volume report, also embedded in `archive` unless disabled
    pub report: Option<ReportFile>,
    pub summary: ConversionSummary,
}

/// Outcome of [`convert`].
pub type ConversionResult = Result<ConversionOutput>;

/// Convert an uploaded survey archive into a flight-planner archive.
///
/// # Errors
///
/// Returns a configuration error for invalid options before the archive is
/// read, then any intake, pairing or encoding error of the pipeline.
pub fn convert(archive: &[u8], options: &ConversionOptions) -> ConversionResult {
    options.validate()?;

    let set = intake::intake(archive)?;
    let collection = FeatureCollection::read(&set)?;
    let rows = compute_volumes(&collection, options.rate);
    let output_base_name = options
        .output_base_name
        .clone()
        .unwrap_or_else(|| set.base_name().to_string());
    info!(
        "Converting '{}' ({} feature(s), mode {})",
        set.base_name(),
        collection.len(),
        options.mode.as_str()
    );

    let field_name = options.field_name();
    let (output_set, report) = match options.mode {
        RateMode::Passthrough => (set.clone(), None),
        RateMode::Uniform => (
            transform_features(&set, &collection, field_name, &RateSpec::Uniform(options.rate))?,
            None,
        ),
        RateMode::PerArea => {
            let volumes = RateSpec::PerFeature(rows.iter().map(|row| row.volume).collect());
            let transformed = transform_features(&set, &collection, field_name, &volumes)?;
            let report = write_report(&output_base_name, &collection, &rows)?;
            (transformed, Some(report))
        },
    };
    let output_set = output_set.renamed(output_base_name.as_str());

    let embedded = report.as_ref().filter(|_| options.embed_report);
    let members = packager::package_members(&output_set, embedded);
    let output = container::build(&members)?;

    let summary = ConversionSummary {
        input_base_name: set.base_name().to_string(),
        output_base_name,
        feature_count: collection.len(),
        mode: options.mode,
        field_name: (options.mode != RateMode::Passthrough).then(|| field_name.to_string()),
        total_area_m2: rows.iter().map(|row| row.area_m2).sum(),
        total_volume: rows.iter().map(|row| row.volume).sum(),
        members: members.into_iter().map(|m| m.name).collect(),
    };
    info!(
        "Conversion completed: {} member(s) written",
        summary.members.len()
    );

    Ok(ConversionOutput {
        archive: output,
        report,
        summary,
    })
}

/// Describe the geometry set inside an uploaded archive.
///
/// # Errors
///
/// Returns any intake or pairing error.
pub fn inspect(archive: &[u8]) -> Result<DatasetInfo> {
    formats::ensure_readable(archive)?;
    let members = container::list(archive)?;
    let set = intake::select_geometry_set(&container::extract_all(archive)?)?;
    let collection = FeatureCollection::read(&set)?;

    let fields = collection
        .schema()
        .iter()
        .map(|field| FieldInfo {
            name: field.name().to_string(),
            data_type: field.field_type().label().into_owned(),
            length: field.length(),
            decimals: field.decimal_count(),
        })
        .collect();

    Ok(DatasetInfo {
        dataset: set.base_name().to_string(),
        shape_type: collection.shape_type().to_string(),
        feature_count: collection.len(),
        fields,
        projection: String::from_utf8_lossy(set.component(Component::Projection))
            .trim()
            .to_string(),
        code_page: set
            .code_page()
            .map(|cpg| String::from_utf8_lossy(cpg).trim().to_string()),
        members,
    })
}

/// Per-feature area and volume for an uploaded archive.
///
/// # Errors
///
/// Returns [`ConfigError::OutOfRange`] for a negative or non-finite rate and
/// any intake or pairing error.
pub fn volumes(archive: &[u8], rate_per_acre: f64) -> Result<Vec<VolumeRow>> {
    if !rate_per_acre.is_finite() || rate_per_acre < 0.0 {
        return Err(ConfigError::OutOfRange {
            option: "rate".to_string(),
            value: rate_per_acre,
            min: 0.0,
            max: f64::MAX,
        }
        .into());
    }
    let set = intake::intake(archive)?;
    let collection = FeatureCollection::read(&set)?;
    let polygons = collection
        .shapes()
        .iter()
        .filter(|shape| shape_area(shape) > 0.0)
        .count();
    info!(
        "Computed volumes for {} feature(s), {polygons} with area",
        collection.len()
    );
    Ok(compute_volumes(&collection, rate_per_acre))
}

/// Spot-spray target list for a point archive.
///
/// # Errors
///
/// Returns a configuration error for invalid options, any intake or pairing
/// error, and [`SchemaError::UnsupportedGeometry`](crate::error::SchemaError::UnsupportedGeometry)
/// for non-point features.
pub fn export_targets(archive: &[u8], options: &TargetOptions) -> Result<Vec<u8>> {
    options.validate()?;
    let set = intake::intake(archive)?;
    let collection = FeatureCollection::read(&set)?;
    let targets = spot_targets(&collection, options)?;
    write_targets_csv(&targets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{IntakeError, SchemaError, SprayError};
    use crate::test_support::{SetBuilder, rectangle, unit_square};

    fn plots() -> SetBuilder {
        SetBuilder::polygons(vec![
            rectangle(0.0, 0.0, 100.0, 100.0),
            rectangle(200.0, 0.0, 200.0, 100.0),
        ])
        .with_text_field("zone", &["A", "B"])
    }

    #[test]
    fn test_uniform_conversion() {
        let output = convert(&plots().archive(), &ConversionOptions::new().with_rate(2.0)).unwrap();

        assert!(output.report.is_none());
        assert_eq!(output.summary.feature_count, 2);
        assert_eq!(output.summary.field_name.as_deref(), Some("Rate"));
        let set = intake::intake(&output.archive).unwrap();
        let collection = FeatureCollection::read(&set).unwrap();
        let rates: Vec<_> = collection
            .features()
            .map(|f| f.record.text(1).unwrap())
            .collect();
        assert_eq!(rates, vec!["2.00", "2.00"]);
    }

    #[test]
    fn test_per_area_conversion_embeds_report() {
        let options = ConversionOptions::new()
            .with_mode(RateMode::PerArea)
            .with_rate(3.0);
        let output = convert(&plots().archive(), &options).unwrap();

        let report = output.report.as_ref().unwrap();
        assert_eq!(report.name, "field_volumes.csv");
        assert_eq!(
            container::list(&output.archive).unwrap(),
            vec![
                "field.shp",
                "field.shx",
                "field.dbf",
                "field.prj",
                "field_volumes.csv"
            ]
        );

        let collection =
            FeatureCollection::read(&intake::intake(&output.archive).unwrap()).unwrap();
        assert_eq!(collection.schema()[1].name(), "Volume");
        let volumes: Vec<_> = collection
            .features()
            .map(|f| f.record.text(1).unwrap())
            .collect();
        assert_eq!(volumes, vec!["7.41", "14.83"]);
        assert_eq!(output.summary.total_area_m2, 30_000.0);
    }

    #[test]
    fn test_report_can_stay_out_of_the_archive() {
        let options = ConversionOptions::new()
            .with_mode(RateMode::PerArea)
            .with_embed_report(false);
        let output = convert(&plots().archive(), &options).unwrap();

        assert!(output.report.is_some());
        assert_eq!(container::list(&output.archive).unwrap().len(), 4);
    }

    #[test]
    fn test_reconverting_keeps_report_header_unique() {
        let options = ConversionOptions::new()
            .with_mode(RateMode::PerArea)
            .with_rate(3.0);
        let first = convert(&plots().archive(), &options).unwrap();
        let second = convert(&first.archive, &options).unwrap();

        let report = second.report.unwrap();
        let text = std::str::from_utf8(&report.data).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("zone,Volume,Acres,Volume (calc)"));
        assert_eq!(lines.next(), Some("A,7.41,2.471,7.41"));
    }

    #[test]
    fn test_passthrough_with_rename() {
        let input = plots().archive();
        let options = ConversionOptions::new()
            .with_mode(RateMode::Passthrough)
            .with_output_base_name("north");
        let output = convert(&input, &options).unwrap();

        let original = intake::intake(&input).unwrap();
        let renamed = intake::intake(&output.archive).unwrap();
        assert_eq!(renamed.base_name(), "north");
        assert_eq!(renamed, original.renamed("north"));
        assert!(output.summary.field_name.is_none());
    }

    #[test]
    fn test_options_are_checked_before_intake() {
        let options = ConversionOptions::new().with_rate(99.0);
        let err = convert(b"not even a zip", &options).unwrap_err();
        assert!(matches!(err, SprayError::Config(_)));
    }

    #[test]
    fn test_intake_failures_surface() {
        let archive = container::build(&[container::Member::new(
            "notes.txt",
            b"no shapes here".to_vec(),
        )])
        .unwrap();
        let err = convert(&archive, &ConversionOptions::new()).unwrap_err();
        assert!(matches!(err, SprayError::Intake(IntakeError::NoGeometryFile)));
        assert_eq!(err.to_string(), "No .shp file found in the uploaded archive");
    }

    #[test]
    fn test_inspect() {
        let archive = plots().named("survey").archive();
        let info = inspect(&archive).unwrap();

        assert_eq!(info.dataset, "survey");
        assert_eq!(info.shape_type, "Polygon");
        assert_eq!(info.feature_count, 2);
        assert_eq!(info.fields.len(), 1);
        assert_eq!(info.fields[0].name, "zone");
        assert!(info.projection.starts_with("PROJCS"));
        assert_eq!(info.members.len(), 4);
    }

    #[test]
    fn test_volumes() {
        let rows = volumes(&plots().archive(), 1.0).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].area_m2, 20_000.0);
        assert!(volumes(&plots().archive(), -1.0).is_err());
    }

    #[test]
    fn test_export_targets_from_points() {
        let archive = SetBuilder::points(&[(10.0, 20.0)])
            .with_text_field("id", &["1"])
            .archive();
        let csv = export_targets(&archive, &TargetOptions::new().with_amount(2.0)).unwrap();
        assert_eq!(
            String::from_utf8(csv).unwrap(),
            "Longitude,Latitude,Radius (m),Amount (L),Name\n10,20,1,2,Target_1\n"
        );
    }

    #[test]
    fn test_export_targets_rejects_polygons() {
        let archive = SetBuilder::polygons(vec![unit_square(0.0)]).archive();
        let err = export_targets(&archive, &TargetOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            SprayError::Schema(SchemaError::UnsupportedGeometry { .. })
        ));
    }
}
