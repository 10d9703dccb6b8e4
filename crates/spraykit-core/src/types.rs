//! Data types describing an uploaded dataset and a finished conversion.

use crate::options::RateMode;

/// Information about an uploaded geometry set.
#[derive(Debug, Clone)]
pub struct DatasetInfo {
    /// Base name of the selected geometry set
    pub dataset: String,
    /// Shape type declared in the geometry file
    pub shape_type: String,
    /// Number of paired features
    pub feature_count: usize,
    /// Attribute table schema
    pub fields: Vec<FieldInfo>,
    /// Contents of the `.prj` file
    pub projection: String,
    /// Contents of the `.cpg` file, if any
    pub code_page: Option<String>,
    /// Every member of the archive, in archive order
    pub members: Vec<String>,
}

/// Information about an attribute field.
#[derive(Debug, Clone)]
pub struct FieldInfo {
    /// Field name
    pub name: String,
    /// Data type
    pub data_type: String,
    /// Width in bytes
    pub length: u8,
    /// Digits after the decimal point
    pub decimals: u8,
}

/// What a conversion did.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionSummary {
    /// Base name of the input geometry set
    pub input_base_name: String,
    /// Base name of the output components
    pub output_base_name: String,
    pub feature_count: usize,
    pub mode: RateMode,
    /// Field written, or `None` for passthrough
    pub field_name: Option<String>,
    /// Sum of all feature areas in square metres
    pub total_area_m2: f64,
    /// Sum of all per-feature volumes
    pub total_volume: f64,
    /// Member names of the output archive, in order
    pub members: Vec<String>,
}
