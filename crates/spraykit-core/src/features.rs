//! Decoded features: the Nth shape paired with the Nth attribute record.

use log::debug;
use spraykit_shapefile::{FieldDescriptor, Record, Shape, ShapeFile, ShapeType, Table, read_index};

use crate::error::{ContextExt, Result, SchemaError};
use crate::intake::{Component, GeometrySet};

/// One geometry with its attribute record.
#[derive(Debug, Clone, Copy)]
pub struct Feature<'a> {
    /// Zero-based position in file order.
    pub index: usize,
    pub geometry: &'a Shape,
    pub record: &'a Record,
}

/// Shapes and records of a geometry set, checked to pair one to one.
#[derive(Debug, Clone)]
pub struct FeatureCollection {
    shape_type: ShapeType,
    shapes: Vec<Shape>,
    table: Table,
}

impl FeatureCollection {
    /// Decode the geometry, index and attribute components of `set`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::SchemaMismatch`] when the attribute table and
    /// geometry file hold different counts, [`SchemaError::IndexMismatch`]
    /// when the index disagrees with the geometry file, and an unexpected
    /// error when a component cannot be decoded.
    pub fn read(set: &GeometrySet) -> Result<Self> {
        let shape_file = ShapeFile::read(set.component(Component::Geometry))
            .with_context(format!("decoding {}.shp", set.base_name()))?;
        let index = read_index(set.component(Component::Index))
            .with_context(format!("decoding {}.shx", set.base_name()))?;
        let table = Table::read(set.component(Component::Attributes))
            .with_context(format!("decoding {}.dbf", set.base_name()))?;

        let shapes = shape_file.shapes;
        if table.record_count() != shapes.len() {
            return Err(SchemaError::SchemaMismatch {
                records: table.record_count(),
                shapes: shapes.len(),
            }
            .into());
        }
        if index.len() != shapes.len() {
            return Err(SchemaError::IndexMismatch {
                entries: index.len(),
                shapes: shapes.len(),
            }
            .into());
        }

        debug!(
            "Read {} {} feature(s) with {} field(s) from '{}'",
            shapes.len(),
            shape_file.header.shape_type,
            table.fields().len(),
            set.base_name()
        );
        Ok(Self {
            shape_type: shape_file.header.shape_type,
            shapes,
            table,
        })
    }

    /// Shape type declared in the geometry file header.
    #[must_use]
    pub fn shape_type(&self) -> ShapeType {
        self.shape_type
    }

    #[must_use]
    pub fn schema(&self) -> &[FieldDescriptor] {
        self.table.fields()
    }

    #[must_use]
    pub fn table(&self) -> &Table {
        &self.table
    }

    #[must_use]
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    /// Features in file order.
    pub fn features(&self) -> impl Iterator<Item = Feature<'_>> {
        self.shapes
            .iter()
            .zip(self.table.records())
            .enumerate()
            .map(|(index, (geometry, record))| Feature {
                index,
                geometry,
                record,
            })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SprayError;
    use crate::test_support::{SetBuilder, unit_square};

    #[test]
    fn test_features_pair_in_file_order() {
        let set = SetBuilder::polygons(vec![unit_square(0.0), unit_square(5.0)])
            .with_text_field("zone", &["A", "B"])
            .build();
        let collection = FeatureCollection::read(&set).unwrap();

        assert_eq!(collection.len(), 2);
        assert_eq!(collection.shape_type(), ShapeType::Polygon);
        let zones: Vec<_> = collection
            .features()
            .map(|f| (f.index, f.record.text(0).unwrap(), f.geometry.points().next().unwrap().x))
            .collect();
        assert_eq!(
            zones,
            vec![(0, "A".to_string(), 0.0), (1, "B".to_string(), 5.0)]
        );
    }

    #[test]
    fn test_record_count_must_match_shapes() {
        let set = SetBuilder::polygons(vec![unit_square(0.0), unit_square(5.0)])
            .with_text_field("zone", &["A"])
            .build();
        let err = FeatureCollection::read(&set).unwrap_err();
        assert!(matches!(
            err,
            SprayError::Schema(SchemaError::SchemaMismatch {
                records: 1,
                shapes: 2
            })
        ));
    }

    #[test]
    fn test_index_count_must_match_shapes() {
        let two = SetBuilder::polygons(vec![unit_square(0.0), unit_square(5.0)])
            .with_text_field("zone", &["A", "B"])
            .build();
        let one = SetBuilder::polygons(vec![unit_square(0.0)])
            .with_text_field("zone", &["A"])
            .build();
        let set = GeometrySet::new(
            "mixed",
            two.component(Component::Geometry).clone(),
            one.component(Component::Index).clone(),
            two.component(Component::Attributes).clone(),
            two.component(Component::Projection).clone(),
        );

        let err = FeatureCollection::read(&set).unwrap_err();
        assert!(matches!(
            err,
            SprayError::Schema(SchemaError::IndexMismatch {
                entries: 1,
                shapes: 2
            })
        ));
    }

    #[test]
    fn test_corrupt_component_names_the_file() {
        let set = SetBuilder::polygons(vec![unit_square(0.0)])
            .with_text_field("zone", &["A"])
            .build();
        let broken = set.with_attributes(b"not a table".to_vec());

        let err = FeatureCollection::read(&broken).unwrap_err();
        assert!(matches!(err, SprayError::Unexpected { .. }));
        assert!(err.to_string().contains("decoding field.dbf"));
    }
}
