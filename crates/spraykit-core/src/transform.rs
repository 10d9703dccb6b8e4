//! Attribute transformer: add or overwrite a numeric rate column.
//!
//! The transform is pure. It decodes the attribute table, builds a new one
//! with the target column set for every record in file order, and returns a
//! new [`GeometrySet`] that shares every other component with the input.

use log::{debug, info};
use spraykit_shapefile::{FieldDescriptor, Table};

use crate::error::{ContextExt, Result, SchemaError};
use crate::features::FeatureCollection;
use crate::intake::GeometrySet;

/// Minimum width of the rate column.
pub const RATE_FIELD_WIDTH: usize = 12;
/// Digits after the decimal point in the rate column.
pub const RATE_FIELD_DECIMALS: u8 = 2;

/// Value to place in the target field.
#[derive(Debug, Clone, PartialEq)]
pub enum RateSpec {
    /// The same value for every feature.
    Uniform(f64),
    /// One value per feature, in feature order.
    PerFeature(Vec<f64>),
}

impl RateSpec {
    /// Expand into exactly one finite value per feature.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::RateCountMismatch`] for a per-feature list of
    /// the wrong length and [`SchemaError::NonFiniteValue`] for NaN or
    /// infinite values.
    pub fn values_for(&self, features: usize) -> Result<Vec<f64>> {
        let values = match self {
            RateSpec::Uniform(rate) => vec![*rate; features],
            RateSpec::PerFeature(values) => {
                if values.len() != features {
                    return Err(SchemaError::RateCountMismatch {
                        values: values.len(),
                        features,
                    }
                    .into());
                }
                values.clone()
            },
        };
        if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
            return Err(SchemaError::NonFiniteValue { feature: pos + 1 }.into());
        }
        Ok(values)
    }
}

/// Set `field_name` to `rate` on every feature of `set`.
///
/// # Errors
///
/// Fails when the set's components do not pair up, when the rate does not
/// fit the features, or when the rewritten table cannot be encoded.
pub fn transform(set: &GeometrySet, field_name: &str, rate: &RateSpec) -> Result<GeometrySet> {
    let collection = FeatureCollection::read(set)?;
    transform_features(set, &collection, field_name, rate)
}

/// Like [`transform`] for a set that has already been decoded.
///
/// # Errors
///
/// See [`transform`].
pub fn transform_features(
    set: &GeometrySet,
    collection: &FeatureCollection,
    field_name: &str,
    rate: &RateSpec,
) -> Result<GeometrySet> {
    let table = rewrite_table(collection.table(), field_name, rate)?;
    let attributes = table
        .to_bytes()
        .with_context(format!("encoding {}.dbf", set.base_name()))?;

    info!(
        "Wrote field '{field_name}' on {} feature(s) of '{}'",
        table.record_count(),
        set.base_name()
    );
    Ok(set.with_attributes(attributes))
}

/// Return a copy of `table` whose `field_name` column holds the rate values.
///
/// An existing column keeps its position and is replaced by the rate
/// descriptor. Otherwise the column is appended. Every other column is
/// copied byte for byte.
///
/// # Errors
///
/// See [`transform`].
pub fn rewrite_table(table: &Table, field_name: &str, rate: &RateSpec) -> Result<Table> {
    let values = rate.values_for(table.record_count())?;
    let precision = usize::from(RATE_FIELD_DECIMALS);
    let texts: Vec<String> = values.iter().map(|v| format!("{v:.precision$}")).collect();

    let width = texts
        .iter()
        .map(String::len)
        .max()
        .unwrap_or(0)
        .max(RATE_FIELD_WIDTH);
    let descriptor = u8::try_from(width)
        .map_err(|_| {
            spraykit_shapefile::ShapefileError::layout(format!(
                "a {width}-byte value does not fit a field"
            ))
        })
        .and_then(|width| FieldDescriptor::float(field_name, width, RATE_FIELD_DECIMALS))
        .with_context(format!("defining field '{field_name}'"))?;

    let encoded = texts
        .iter()
        .map(|text| descriptor.encode_text(text))
        .collect::<std::result::Result<Vec<_>, _>>()
        .with_context(format!("encoding field '{field_name}'"))?;

    let mut rewritten = table.clone();
    let written = match rewritten.field_index(field_name) {
        Some(index) => {
            debug!("Overwriting existing field '{field_name}' at column {}", index + 1);
            rewritten.replace_field(index, descriptor, encoded)
        },
        None => {
            debug!("Appending field '{field_name}'");
            rewritten.push_field(descriptor, encoded)
        },
    };
    written.with_context(format!("writing field '{field_name}'"))?;

    Ok(rewritten)
}
