//! Output packager: write a geometry set and its report into a new archive.

use log::debug;

use crate::container::{self, Member};
use crate::error::Result;
use crate::intake::{CODE_PAGE_EXTENSION, Component, GeometrySet};
use crate::report::ReportFile;

/// Members for `set` named `<base><ext>`, in `.shp, .shx, .dbf, .prj` order,
/// then `.cpg` when present, then the report.
#[must_use]
pub fn package_members(set: &GeometrySet, report: Option<&ReportFile>) -> Vec<Member> {
    let base = set.base_name();
    let mut members: Vec<Member> = Component::REQUIRED
        .iter()
        .map(|&component| {
            Member::new(
                format!("{base}{}", component.extension()),
                set.component(component).clone(),
            )
        })
        .collect();
    if let Some(code_page) = set.code_page() {
        members.push(Member::new(
            format!("{base}{CODE_PAGE_EXTENSION}"),
            code_page.clone(),
        ));
    }
    if let Some(report) = report {
        members.push(Member::new(report.name.clone(), report.data.clone()));
    }
    members
}

/// Build the output archive.
///
/// # Errors
///
/// Returns an unexpected error when the archive cannot be written.
pub fn package(set: &GeometrySet, report: Option<&ReportFile>) -> Result<Vec<u8>> {
    let members = package_members(set, report);
    debug!(
        "Packaging {} member(s) under base name '{}'",
        members.len(),
        set.base_name()
    );
    container::build(&members)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::{intake, select_geometry_set};
    use crate::test_support::{SetBuilder, unit_square};
    use bytes::Bytes;

    #[test]
    fn test_packaged_set_is_complete() {
        let set = SetBuilder::polygons(vec![unit_square(0.0)])
            .with_text_field("zone", &["A"])
            .build();
        let archive = package(&set, None).unwrap();

        let names = container::list(&archive).unwrap();
        assert_eq!(names, vec!["field.shp", "field.shx", "field.dbf", "field.prj"]);
        assert_eq!(intake(&archive).unwrap(), set);
    }

    #[test]
    fn test_rename_applies_to_every_component() {
        let set = SetBuilder::polygons(vec![unit_square(0.0)])
            .build()
            .with_code_page(b"UTF-8".to_vec())
            .renamed("north");
        let report = ReportFile {
            name: ReportFile::name_for("north"),
            data: Bytes::from_static(b"Acres,Volume\n"),
        };

        let members = package_members(&set, Some(&report));
        let names: Vec<_> = members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "north.shp",
                "north.shx",
                "north.dbf",
                "north.prj",
                "north.cpg",
                "north_volumes.csv"
            ]
        );
        let reread = select_geometry_set(&members).unwrap();
        assert_eq!(reread.base_name(), "north");
        assert_eq!(reread.code_page().unwrap().as_ref(), b"UTF-8");
    }

    #[test]
    fn test_round_trip_is_byte_identical() {
        let set = SetBuilder::polygons(vec![unit_square(0.0), unit_square(3.0)])
            .with_text_field("zone", &["A", "B"])
            .build();
        let direct = package(&set, None).unwrap();
        let via_intake = package(&intake(&direct).unwrap(), None).unwrap();
        assert_eq!(direct, via_intake);
    }
}
