//! `spraykit-shapefile` reads and writes the components of an ESRI Shapefile
//! geometry set at the record level.
//!
//! - [`shp`]: geometry records (`.shp`) and their offset index (`.shx`).
//! - [`dbf`]: the dBASE attribute table (`.dbf`), byte-faithful for untouched columns.
//! - [`error`]: the shared read error with source positions.
//!
//! # Examples
//!
//! ```
//! use spraykit_shapefile::dbf::{FieldDescriptor, Table};
//! use spraykit_shapefile::shp::{Point, Shape, ShapeFile, ShapeType};
//!
//! let ring = vec![
//!     Point::new(0.0, 0.0),
//!     Point::new(0.0, 1.0),
//!     Point::new(1.0, 1.0),
//!     Point::new(0.0, 0.0),
//! ];
//! let encoded = ShapeFile::new(ShapeType::Polygon, vec![Shape::polygon(vec![ring])])
//!     .write()
//!     .unwrap();
//!
//! let mut table = Table::new(vec![FieldDescriptor::character("Zone", 8).unwrap()]).unwrap();
//! table.push_row(&["A"]).unwrap();
//!
//! let shapes = ShapeFile::read(&encoded.shp).unwrap().shapes;
//! let records = Table::read(&table.to_bytes().unwrap()).unwrap();
//! assert_eq!(shapes.len(), records.record_count());
//! ```

pub mod dbf;
pub mod error;
pub mod shp;

pub use dbf::{FieldDescriptor, FieldType, Record, Table};
pub use error::{ShapefileError, ShapefileResult, SourcePosition};
pub use shp::{IndexEntry, Point, Shape, ShapeFile, ShapeType, read_index};
