use std::error::Error as StdError;
use std::fmt;

/// A position within a shapefile component, such as a `.dbf` record.
///
/// Record and field indices are 1-based to align with human expectations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourcePosition {
    /// Byte offset from the start of the component
    pub byte_offset: Option<u64>,
    /// Record number (1-based)
    pub record: Option<u64>,
    /// Field number within a record or descriptor table (1-based)
    pub field: Option<u64>,
}

impl SourcePosition {
    /// Position pointing at a byte offset only.
    #[must_use]
    pub fn at_byte(offset: usize) -> Self {
        Self {
            byte_offset: Some(offset as u64),
            ..Self::default()
        }
    }

    /// Position pointing at a 1-based record starting at `offset`.
    #[must_use]
    pub fn at_record(record: usize, offset: usize) -> Self {
        Self {
            byte_offset: Some(offset as u64),
            record: Some(record as u64),
            field: None,
        }
    }

    /// Returns true when the position does not contain any location metadata.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.byte_offset.is_none() && self.record.is_none() && self.field.is_none()
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();

        if let Some(record) = self.record {
            parts.push(format!("record {record}"));
        }
        if let Some(field) = self.field {
            parts.push(format!("field {field}"));
        }
        if let Some(byte) = self.byte_offset {
            parts.push(format!("byte {byte}"));
        }

        if parts.is_empty() {
            write!(f, "unknown position")
        } else {
            write!(f, "{}", parts.join(", "))
        }
    }
}

/// Errors raised while decoding or encoding shapefile components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapefileError {
    /// The input bytes do not follow the expected layout.
    Parse {
        /// Human readable description of the failure.
        message: String,
        /// Optional position describing where the failure occurred.
        position: Option<SourcePosition>,
        /// Optional context describing what was being read.
        context: Option<String>,
    },
    /// A value cannot be represented in the output layout (field too wide,
    /// file too large for 32-bit offsets, duplicate field names, ...).
    Layout {
        /// Human readable description of the failure.
        message: String,
    },
}

impl ShapefileError {
    /// Build a parse error at `position` for the component named by `context`.
    #[must_use]
    pub fn parse(
        message: impl Into<String>,
        position: SourcePosition,
        context: impl Into<String>,
    ) -> Self {
        ShapefileError::Parse {
            message: message.into(),
            position: Some(position),
            context: Some(context.into()),
        }
    }

    /// Parse error for input that ends before `needed` bytes could be read.
    #[must_use]
    pub fn truncated(needed: usize, position: SourcePosition, context: impl Into<String>) -> Self {
        Self::parse(
            format!("unexpected end of data, {needed} more byte(s) required"),
            position,
            context,
        )
    }

    /// Build a layout error.
    #[must_use]
    pub fn layout(message: impl Into<String>) -> Self {
        ShapefileError::Layout {
            message: message.into(),
        }
    }

    fn fmt_context(context: Option<&str>) -> String {
        context
            .map(|c| format!(" while reading {c}"))
            .unwrap_or_default()
    }

    fn fmt_position(position: Option<&SourcePosition>) -> String {
        position
            .filter(|pos| !pos.is_empty())
            .map(|pos| format!(" at {pos}"))
            .unwrap_or_default()
    }

    /// Attach additional context to the error, returning the updated error.
    #[must_use]
    pub fn with_additional_context(mut self, context: impl Into<String>) -> Self {
        let context = context.into();
        match &mut self {
            ShapefileError::Parse {
                context: existing, ..
            } => match existing {
                Some(existing) if !existing.is_empty() => {
                    existing.push_str("; ");
                    existing.push_str(&context);
                },
                _ => *existing = Some(context),
            },
            ShapefileError::Layout { message } => {
                message.push_str(" (");
                message.push_str(&context);
                message.push(')');
            },
        }
        self
    }
}

impl fmt::Display for ShapefileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapefileError::Parse {
                message,
                position,
                context,
            } => write!(
                f,
                "Parse error{}{}: {message}",
                Self::fmt_context(context.as_deref()),
                Self::fmt_position(position.as_ref())
            ),
            ShapefileError::Layout { message } => write!(f, "Layout error: {message}"),
        }
    }
}

impl StdError for ShapefileError {}

/// Result type alias that uses [`ShapefileError`].
pub type ShapefileResult<T> = Result<T, ShapefileError>;
