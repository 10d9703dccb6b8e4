//! Error types for `spraykit` conversions.
//!
//! Every failure a conversion can hit maps to one distinguishable variant.
//! Archive, codec and I/O failures that fall outside the domain taxonomy are
//! carried by [`SprayError::Unexpected`] together with their cause.

use std::error::Error as StdError;

use thiserror::Error;

/// Main error type for `spraykit` operations.
///
/// Domain variants delegate their display formatting to the sub-enums with
/// `#[error(transparent)]`.
#[derive(Debug, Error)]
pub enum SprayError {
    /// The uploaded container could not yield a complete geometry set
    #[error(transparent)]
    Intake(#[from] IntakeError),

    /// Geometry and attribute records disagree, or supplied values do not fit them
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Invalid caller options
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Archive, codec or I/O failure, with the underlying cause
    #[error("Unexpected failure while {context}: {source}")]
    Unexpected {
        /// What the pipeline was doing
        context: String,
        /// The underlying error
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

/// Errors raised while unpacking an upload into a geometry set.
#[derive(Debug, Error)]
pub enum IntakeError {
    /// The container has no member with the `.shp` extension
    #[error("No .shp file found in the uploaded archive")]
    NoGeometryFile,

    /// One or more of the four required companions is absent
    #[error("Shapefile '{base_name}' is incomplete: missing {}", missing.join(", "))]
    IncompleteGeometrySet {
        /// Base name of the selected geometry set
        base_name: String,
        /// Every missing extension, in `.shp, .shx, .dbf, .prj` order
        missing: Vec<String>,
    },

    /// The payload is not a format the pipeline can read
    #[error("Unsupported input: {detected}{}", if *planned { " (support is planned)" } else { "" })]
    UnsupportedInput {
        /// Description of what the payload looks like
        detected: String,
        /// Whether reading this format is on the roadmap
        planned: bool,
    },
}

/// Errors about the pairing of geometry records with attribute records.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Record count and geometry count disagree
    #[error("Attribute table has {records} record(s) but the geometry file has {shapes} shape(s)")]
    SchemaMismatch {
        /// Records in the `.dbf`
        records: usize,
        /// Shapes in the `.shp`
        shapes: usize,
    },

    /// Index entry count and geometry count disagree
    #[error("Spatial index has {entries} entr(ies) but the geometry file has {shapes} shape(s)")]
    IndexMismatch {
        /// Entries in the `.shx`
        entries: usize,
        /// Shapes in the `.shp`
        shapes: usize,
    },

    /// A per-feature value list does not cover every feature exactly once
    #[error("Received {values} per-feature value(s) for {features} feature(s)")]
    RateCountMismatch {
        /// Number of values supplied
        values: usize,
        /// Number of features in the set
        features: usize,
    },

    /// A value to be written is NaN or infinite
    #[error("Value for feature {feature} is not a finite number")]
    NonFiniteValue {
        /// 1-based feature number
        feature: usize,
    },

    /// The geometry is not usable for the requested output
    #[error("Feature {feature} has {shape_type} geometry, expected a single point")]
    UnsupportedGeometry {
        /// 1-based feature number
        feature: usize,
        /// Shape type found
        shape_type: String,
    },
}

/// Configuration errors.
///
/// These errors occur when options are invalid.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid option value
    #[error("Invalid {option} option: {message}")]
    InvalidOption {
        /// The option name
        option: String,
        /// Why it's invalid
        message: String,
    },

    /// Numeric option outside its accepted range
    #[error("The {option} option must be between {min} and {max}, got {value}")]
    OutOfRange {
        /// The option name
        option: String,
        /// The rejected value
        value: f64,
        /// Smallest accepted value
        min: f64,
        /// Largest accepted value
        max: f64,
    },
}

/// Type alias for Results using `SprayError`.
pub type Result<T> = std::result::Result<T, SprayError>;

impl SprayError {
    /// Get a user-friendly error message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Intake(e) => e.user_message(),
            Self::Schema(e @ SchemaError::UnsupportedGeometry { .. }) => e.to_string(),
            Self::Schema(e) => format!("The shapefile is inconsistent: {e}"),
            Self::Config(e) => format!("Configuration error: {e}"),
            Self::Unexpected { .. } => self.to_string(),
        }
    }

    /// Get recovery suggestions if available.
    #[must_use]
    pub fn recovery_suggestion(&self) -> Option<String> {
        match self {
            Self::Intake(e) => e.recovery_suggestion(),
            Self::Schema(SchemaError::UnsupportedGeometry { .. }) => Some(
                "Spot targets need a point shapefile; export points from the survey.".to_string(),
            ),
            Self::Schema(_) => Some(
                "Re-export the shapefile from the survey software; its components are out of sync."
                    .to_string(),
            ),
            Self::Config(_) | Self::Unexpected { .. } => None,
        }
    }

    /// Check if this error is potentially recoverable.
    ///
    /// Recoverable errors can be fixed by retrying with different options.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

impl IntakeError {
    fn user_message(&self) -> String {
        match self {
            Self::IncompleteGeometrySet { base_name, missing } => format!(
                "Shapefile '{base_name}' is missing required file(s): {}",
                missing
                    .iter()
                    .map(|ext| format!("{base_name}{ext}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Self::NoGeometryFile | Self::UnsupportedInput { .. } => self.to_string(),
        }
    }

    fn recovery_suggestion(&self) -> Option<String> {
        match self {
            Self::NoGeometryFile | Self::IncompleteGeometrySet { .. } => Some(
                "Upload a .zip with the .shp, .shx, .dbf and .prj files of one shapefile."
                    .to_string(),
            ),
            Self::UnsupportedInput { planned: true, .. } => {
                Some("This format is coming soon; upload a zipped shapefile for now.".to_string())
            },
            Self::UnsupportedInput { planned: false, .. } => {
                Some("Upload a .zip archive containing the shapefile.".to_string())
            },
        }
    }
}

/// Extension trait for wrapping foreign errors into [`SprayError::Unexpected`].
pub trait ContextExt<T> {
    /// Wrap the error with a description of what the pipeline was doing.
    ///
    /// # Errors
    ///
    /// Returns [`SprayError::Unexpected`] if the underlying operation fails.
    fn with_context(self, context: impl Into<String>) -> Result<T>;
}

impl<T, E> ContextExt<T> for std::result::Result<T, E>
where
    E: StdError + Send + Sync + 'static,
{
    fn with_context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| SprayError::Unexpected {
            context: context.into(),
            source: Box::new(e),
        })
    }
}
