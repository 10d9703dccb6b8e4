//! Registry of the data formats `spraykit` reads and writes.
//!
//! Each entry carries a [`SupportStatus`] per direction so the CLI can show
//! what is ready and what is still on the roadmap. Uploads are sniffed with
//! [`detect_format`] before intake so an unreadable payload fails with a
//! message naming what it looks like.
//!
//! # Examples
//!
//! ```
//! use spraykit_core::formats::{detect_format, find_format};
//!
//! let zip = find_format("zip").expect("ZIP format should exist");
//! assert!(zip.capabilities.read.is_supported());
//!
//! let detected = detect_format(b"{\"type\": \"FeatureCollection\"}").unwrap();
//! assert_eq!(detected.short_name, "GeoJSON");
//! ```

use log::debug;

use crate::error::{IntakeError, Result};

const ZIP_LOCAL_FILE: &[u8] = b"PK\x03\x04";
const ZIP_EMPTY_ARCHIVE: &[u8] = b"PK\x05\x06";
const SHAPEFILE_CODE: &[u8] = &[0x00, 0x00, 0x27, 0x0A];

/// Support status for one direction of a format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportStatus {
    /// Fully implemented.
    Supported,
    /// Not supported and not planned.
    NotSupported,
    /// On the roadmap.
    Planned,
}

impl SupportStatus {
    /// Returns `true` if the direction is implemented.
    ///
    /// # Examples
    ///
    /// ```
    /// use spraykit_core::formats::SupportStatus;
    ///
    /// assert!(SupportStatus::Supported.is_supported());
    /// assert!(!SupportStatus::Planned.is_supported());
    /// ```
    #[must_use]
    pub fn is_supported(&self) -> bool {
        matches!(self, SupportStatus::Supported)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            SupportStatus::Supported => "Supported",
            SupportStatus::NotSupported => "Not Supported",
            SupportStatus::Planned => "Planned",
        }
    }
}

/// What `spraykit` can do with a format.
#[derive(Debug, Clone, Copy)]
pub struct FormatCapabilities {
    /// Accepted as an upload.
    pub read: SupportStatus,
    /// Produced as an output.
    pub write: SupportStatus,
}

/// A data format known to the registry.
#[derive(Debug, Clone)]
pub struct Format {
    /// Short name used in the CLI (e.g. `"ZIP"`).
    pub short_name: &'static str,
    /// Descriptive name for display.
    pub long_name: &'static str,
    /// Typical file extension.
    pub extension: &'static str,
    pub capabilities: FormatCapabilities,
}

impl Format {
    #[must_use]
    pub const fn new(
        short_name: &'static str,
        long_name: &'static str,
        extension: &'static str,
        read: SupportStatus,
        write: SupportStatus,
    ) -> Self {
        Self {
            short_name,
            long_name,
            extension,
            capabilities: FormatCapabilities { read, write },
        }
    }
}

/// Returns every format in the registry.
#[must_use]
pub fn get_formats() -> Vec<Format> {
    use SupportStatus::{NotSupported, Planned, Supported};

    vec![
        Format::new("ZIP", "Zipped ESRI Shapefile", ".zip", Supported, Supported),
        Format::new(
            "ESRI Shapefile",
            "Bare ESRI Shapefile geometry file",
            ".shp",
            NotSupported,
            NotSupported,
        ),
        Format::new("GeoJSON", "GeoJSON", ".geojson", Planned, NotSupported),
        Format::new(
            "SpotCSV",
            "Spot-spray target list (.csv)",
            ".csv",
            NotSupported,
            Supported,
        ),
    ]
}

/// Finds a format by its short name (case-insensitive).
#[must_use]
pub fn find_format(name: &str) -> Option<Format> {
    get_formats()
        .into_iter()
        .find(|f| f.short_name.eq_ignore_ascii_case(name))
}

/// Sniff the leading bytes of a payload.
///
/// Returns `None` when the payload matches nothing in the registry.
#[must_use]
pub fn detect_format(bytes: &[u8]) -> Option<Format> {
    let name = if bytes.starts_with(ZIP_LOCAL_FILE) || bytes.starts_with(ZIP_EMPTY_ARCHIVE) {
        "ZIP"
    } else if bytes.starts_with(SHAPEFILE_CODE) {
        "ESRI Shapefile"
    } else if matches!(
        bytes.iter().find(|b| !b.is_ascii_whitespace()),
        Some(b'{' | b'[')
    ) {
        "GeoJSON"
    } else {
        return None;
    };
    find_format(name)
}

/// Check that a payload is in a format the pipeline can read.
///
/// # Errors
///
/// Returns [`IntakeError::UnsupportedInput`] when the payload is unrecognized
/// or its format is not readable yet.
pub fn ensure_readable(bytes: &[u8]) -> Result<Format> {
    let Some(format) = detect_format(bytes) else {
        return Err(IntakeError::UnsupportedInput {
            detected: "unrecognized data".to_string(),
            planned: false,
        }
        .into());
    };
    debug!("Detected input format: {}", format.long_name);

    match format.capabilities.read {
        SupportStatus::Supported => Ok(format),
        status => Err(IntakeError::UnsupportedInput {
            detected: format.long_name.to_string(),
            planned: status == SupportStatus::Planned,
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SprayError;

    #[test]
    fn test_find_format_case_insensitive() {
        let format = find_format("geojson");
        assert!(format.is_some());
        assert_eq!(format.unwrap().short_name, "GeoJSON");
    }

    #[test]
    fn test_only_zip_is_readable() {
        let formats: Vec<Format> = get_formats()
            .into_iter()
            .filter(|f| f.capabilities.read.is_supported())
            .collect();
        assert_eq!(formats.len(), 1);
        assert_eq!(formats[0].short_name, "ZIP");
    }

    #[test]
    fn test_detect_zip_signatures() {
        assert_eq!(detect_format(b"PK\x03\x04rest").unwrap().short_name, "ZIP");
        assert_eq!(detect_format(b"PK\x05\x06").unwrap().short_name, "ZIP");
    }

    #[test]
    fn test_geojson_is_planned() {
        let err = ensure_readable(b"  \n[{\"type\": \"Feature\"}]").unwrap_err();
        assert!(matches!(
            err,
            SprayError::Intake(IntakeError::UnsupportedInput { planned: true, .. })
        ));
    }

    #[test]
    fn test_bare_geometry_file_is_rejected() {
        let err = ensure_readable(&[0x00, 0x00, 0x27, 0x0A, 0, 0]).unwrap_err();
        match err {
            SprayError::Intake(IntakeError::UnsupportedInput { detected, planned }) => {
                assert_eq!(detected, "Bare ESRI Shapefile geometry file");
                assert!(!planned);
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unrecognized_payload() {
        assert!(detect_format(b"hello").is_none());
        assert!(detect_format(b"").is_none());
        assert!(ensure_readable(b"hello").is_err());
    }
}
