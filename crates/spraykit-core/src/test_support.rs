//! In-memory geometry set fixtures for unit tests.

use spraykit_shapefile::{FieldDescriptor, Point, Shape, ShapeFile, ShapeType, Table};

use crate::container::{self, Member};
use crate::intake::{Component, GeometrySet};

pub(crate) const PROJECTION: &str = "PROJCS[\"WGS_1984_UTM_Zone_15N\",GEOGCS[\"GCS_WGS_1984\"]]";

/// Axis-aligned 1x1 square starting at `(x, 0)`, clockwise and closed.
pub(crate) fn unit_square(x: f64) -> Shape {
    rectangle(x, 0.0, 1.0, 1.0)
}

pub(crate) fn rectangle(x: f64, y: f64, width: f64, height: f64) -> Shape {
    Shape::polygon(vec![vec![
        Point::new(x, y),
        Point::new(x, y + height),
        Point::new(x + width, y + height),
        Point::new(x + width, y),
        Point::new(x, y),
    ]])
}

pub(crate) struct SetBuilder {
    base_name: String,
    shape_type: ShapeType,
    shapes: Vec<Shape>,
    fields: Vec<(FieldDescriptor, Vec<String>)>,
}

impl SetBuilder {
    pub(crate) fn polygons(shapes: Vec<Shape>) -> Self {
        Self::new(ShapeType::Polygon, shapes)
    }

    pub(crate) fn points(coords: &[(f64, f64)]) -> Self {
        Self::new(
            ShapeType::Point,
            coords.iter().map(|&(x, y)| Shape::point(x, y)).collect(),
        )
    }

    pub(crate) fn new(shape_type: ShapeType, shapes: Vec<Shape>) -> Self {
        Self {
            base_name: "field".to_string(),
            shape_type,
            shapes,
            fields: Vec::new(),
        }
    }

    pub(crate) fn named(mut self, base_name: &str) -> Self {
        self.base_name = base_name.to_string();
        self
    }

    pub(crate) fn with_text_field(mut self, name: &str, values: &[&str]) -> Self {
        let width = values.iter().map(|v| v.len()).max().unwrap_or(1).max(1);
        let descriptor =
            FieldDescriptor::character(name, u8::try_from(width).unwrap()).unwrap();
        self.fields
            .push((descriptor, values.iter().map(ToString::to_string).collect()));
        self
    }

    pub(crate) fn with_numeric_field(mut self, name: &str, values: &[&str]) -> Self {
        let descriptor = FieldDescriptor::numeric(name, 10, 2).unwrap();
        self.fields
            .push((descriptor, values.iter().map(ToString::to_string).collect()));
        self
    }

    pub(crate) fn table(&self) -> Table {
        let records = self
            .fields
            .first()
            .map_or(self.shapes.len(), |(_, values)| values.len());
        let mut table =
            Table::new(self.fields.iter().map(|(d, _)| d.clone()).collect()).unwrap();
        for i in 0..records {
            let row: Vec<&str> = self
                .fields
                .iter()
                .map(|(_, values)| values[i].as_str())
                .collect();
            table.push_row(&row).unwrap();
        }
        table
    }

    pub(crate) fn build(&self) -> GeometrySet {
        let encoded = ShapeFile::new(self.shape_type, self.shapes.clone())
            .write()
            .unwrap();
        GeometrySet::new(
            self.base_name.clone(),
            encoded.shp,
            encoded.shx,
            self.table().to_bytes().unwrap(),
            PROJECTION.as_bytes().to_vec(),
        )
    }

    /// Zip the built set with the components in `.shp, .shx, .dbf, .prj` order.
    pub(crate) fn archive(&self) -> Vec<u8> {
        container::build(&members_of(&self.build())).unwrap()
    }
}

pub(crate) fn members_of(set: &GeometrySet) -> Vec<Member> {
    Component::REQUIRED
        .iter()
        .map(|&c| {
            Member::new(
                format!("{}{}", set.base_name(), c.extension()),
                set.component(c).clone(),
            )
        })
        .collect()
}
