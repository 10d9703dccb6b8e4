//! End-to-end tests of the `spraykit` binary

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use spraykit_core::container::{self, Member};
use spraykit_shapefile::{FieldDescriptor, Point, Shape, ShapeFile, ShapeType, Table};
use tempfile::TempDir;

fn spraykit() -> Command {
    Command::new(env!("CARGO_BIN_EXE_spraykit"))
}

fn plot(x: f64) -> Shape {
    Shape::polygon(vec![vec![
        Point::new(x, 0.0),
        Point::new(x, 100.0),
        Point::new(x + 100.0, 100.0),
        Point::new(x + 100.0, 0.0),
        Point::new(x, 0.0),
    ]])
}

fn write_archive(path: &Path, shape_type: ShapeType, shapes: Vec<Shape>) {
    let encoded = ShapeFile::new(shape_type, shapes.clone()).write().unwrap();
    let mut table = Table::new(vec![FieldDescriptor::character("Zone", 6).unwrap()]).unwrap();
    for i in 0..shapes.len() {
        let zone = format!("Z{}", i + 1);
        table.push_row(&[zone.as_str()]).unwrap();
    }
    let members = vec![
        Member::new("survey.shp", encoded.shp),
        Member::new("survey.shx", encoded.shx),
        Member::new("survey.dbf", table.to_bytes().unwrap()),
        Member::new("survey.prj", b"PROJCS[\"UTM\"]".to_vec()),
    ];
    fs::write(path, container::build(&members).unwrap()).unwrap();
}

fn polygon_archive(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("survey.zip");
    write_archive(&path, ShapeType::Polygon, vec![plot(0.0), plot(500.0)]);
    path
}

#[test]
fn test_convert_writes_rate_field() {
    let dir = TempDir::new().unwrap();
    let input = polygon_archive(&dir);
    let output = dir.path().join("plan.zip");

    spraykit()
        .args(["convert", "--rate", "2.5", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Converted 'survey' to 'survey': 2 feature(s), uniform mode, field 'Rate'",
        ));

    let names = container::list(&fs::read(&output).unwrap()).unwrap();
    assert_eq!(names, vec!["survey.shp", "survey.shx", "survey.dbf", "survey.prj"]);
}

#[test]
fn test_per_area_convert_with_report() {
    let dir = TempDir::new().unwrap();
    let input = polygon_archive(&dir);
    let output = dir.path().join("plan.zip");
    let report = dir.path().join("volumes.csv");

    spraykit()
        .args(["convert", "--mode", "per-area", "--rate", "10", "--rename", "plan", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .arg("--report-out")
        .arg(&report)
        .assert()
        .success()
        .stdout(predicate::str::contains("total volume: 49.42"));

    let names = container::list(&fs::read(&output).unwrap()).unwrap();
    assert_eq!(
        names,
        vec!["plan.shp", "plan.shx", "plan.dbf", "plan.prj", "plan_volumes.csv"]
    );
    let text = fs::read_to_string(&report).unwrap();
    assert_eq!(text, "Zone,Acres,Volume\nZ1,2.471,24.71\nZ2,2.471,24.71\n");
}

#[test]
fn test_report_requires_per_area_mode() {
    let dir = TempDir::new().unwrap();
    let input = polygon_archive(&dir);
    let output = dir.path().join("plan.zip");

    spraykit()
        .arg("convert")
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .arg("--report-out")
        .arg(dir.path().join("volumes.csv"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("No volume report was produced"));
    assert!(!output.exists());
}

#[test]
fn test_unwritable_archive_leaves_no_report() {
    let dir = TempDir::new().unwrap();
    let input = polygon_archive(&dir);
    let output = dir.path().join("missing").join("plan.zip");
    let report = dir.path().join("volumes.csv");

    spraykit()
        .args(["convert", "--mode", "per-area", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .arg("--report-out")
        .arg(&report)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to create a temporary file"));

    assert!(!output.exists());
    assert!(!report.exists());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_rate_out_of_range_leaves_no_output() {
    let dir = TempDir::new().unwrap();
    let input = polygon_archive(&dir);
    let output = dir.path().join("plan.zip");

    spraykit()
        .args(["convert", "--rate", "35", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "The rate option must be between 0.1 and 20, got 35",
        ));
    assert!(!output.exists());
}

#[test]
fn test_incomplete_archive_names_missing_files() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("partial.zip");
    let encoded = ShapeFile::new(ShapeType::Polygon, vec![plot(0.0)])
        .write()
        .unwrap();
    let members = vec![
        Member::new("base.shp", encoded.shp),
        Member::new("base.shx", encoded.shx),
    ];
    fs::write(&input, container::build(&members).unwrap()).unwrap();

    spraykit()
        .arg("convert")
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(dir.path().join("out.zip"))
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "missing required file(s): base.dbf, base.prj",
        ));
}

#[test]
fn test_input_size_limit() {
    let dir = TempDir::new().unwrap();
    let input = polygon_archive(&dir);

    spraykit()
        .args(["info", "--max-input-bytes", "10"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("above the 10 byte limit"));
}

#[test]
fn test_info_lists_fields() {
    let dir = TempDir::new().unwrap();
    let input = polygon_archive(&dir);

    spraykit()
        .arg("info")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Dataset: survey"))
        .stdout(predicate::str::contains("Polygon (2 feature(s))"))
        .stdout(predicate::str::contains("Zone"))
        .stdout(predicate::str::contains("PROJCS[\"UTM\"]"));
}

#[test]
fn test_volumes_table() {
    let dir = TempDir::new().unwrap();
    let input = polygon_archive(&dir);

    spraykit()
        .args(["volumes", "--rate", "3", "-i"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("10000.00"))
        .stdout(predicate::str::contains("7.41"))
        .stdout(predicate::str::contains("Total: 20000.00 m²"));
}

#[test]
fn test_targets_from_points() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("weeds.zip");
    write_archive(
        &input,
        ShapeType::Point,
        vec![Shape::point(-96.7, 40.8), Shape::point(-96.8, 40.9)],
    );
    let output = dir.path().join("targets.csv");

    spraykit()
        .args(["targets", "--radius", "2", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        "Longitude,Latitude,Radius (m),Amount (L),Name\n\
         -96.7,40.8,2,0.5,Target_1\n\
         -96.8,40.9,2,0.5,Target_2\n"
    );
}

#[test]
fn test_targets_reject_polygons() {
    let dir = TempDir::new().unwrap();
    let input = polygon_archive(&dir);

    spraykit()
        .arg("targets")
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(dir.path().join("targets.csv"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected a single point"));
}

#[test]
fn test_formats_lists_registry() {
    spraykit()
        .arg("formats")
        .assert()
        .success()
        .stdout(predicate::str::contains("Zipped ESRI Shapefile"))
        .stdout(predicate::str::contains("Planned"));
}

#[test]
fn test_non_archive_input_is_unsupported() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("upload.geojson");
    fs::write(&input, br#"{"type": "FeatureCollection", "features": []}"#).unwrap();

    spraykit()
        .arg("info")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported input: GeoJSON (support is planned)"));
}
