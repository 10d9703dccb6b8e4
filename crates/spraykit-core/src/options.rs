//! Caller options for conversions and target exports.

use spraykit_shapefile::dbf::validate_field_name;

use crate::error::ConfigError;

/// How the rate field is filled during conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RateMode {
    /// Re-package the geometry set without touching attributes.
    Passthrough,
    /// Write the same rate on every feature.
    #[default]
    Uniform,
    /// Write each feature's area-derived volume and produce a volume report.
    PerArea,
}

impl RateMode {
    /// Field written when the caller does not name one.
    #[must_use]
    pub fn default_field_name(self) -> &'static str {
        match self {
            RateMode::Passthrough | RateMode::Uniform => "Rate",
            RateMode::PerArea => "Volume",
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            RateMode::Passthrough => "passthrough",
            RateMode::Uniform => "uniform",
            RateMode::PerArea => "per-area",
        }
    }
}

/// Options for [`convert`](crate::operations::convert).
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionOptions {
    /// Application rate in gallons per acre (default: 1.0)
    pub rate: f64,
    /// Smallest accepted rate (default: 0.1)
    pub min_rate: f64,
    /// Largest accepted rate (default: 20.0)
    pub max_rate: f64,
    pub mode: RateMode,
    /// Target field name (default: depends on the mode)
    pub field_name: Option<String>,
    /// Base name of the output components (default: the input base name)
    pub output_base_name: Option<String>,
    /// Add the volume report to the output archive (default: true)
    pub embed_report: bool,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            rate: 1.0,
            min_rate: 0.1,
            max_rate: 20.0,
            mode: RateMode::default(),
            field_name: None,
            output_base_name: None,
            embed_report: true,
        }
    }
}

impl ConversionOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_rate(mut self, rate: f64) -> Self {
        self.rate = rate;
        self
    }

    /// Set the accepted rate range
    #[must_use]
    pub fn with_rate_bounds(mut self, min_rate: f64, max_rate: f64) -> Self {
        self.min_rate = min_rate;
        self.max_rate = max_rate;
        self
    }

    #[must_use]
    pub fn with_mode(mut self, mode: RateMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_field_name(mut self, name: impl Into<String>) -> Self {
        self.field_name = Some(name.into());
        self
    }

    /// Rename every output component to `base_name`
    #[must_use]
    pub fn with_output_base_name(mut self, base_name: impl Into<String>) -> Self {
        self.output_base_name = Some(base_name.into());
        self
    }

    #[must_use]
    pub fn with_embed_report(mut self, embed_report: bool) -> Self {
        self.embed_report = embed_report;
        self
    }

    /// Field the rate is written to.
    #[must_use]
    pub fn field_name(&self) -> &str {
        self.field_name
            .as_deref()
            .unwrap_or_else(|| self.mode.default_field_name())
    }

    /// Check the options before any input is touched.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OutOfRange`] for a rate outside the bounds and
    /// [`ConfigError::InvalidOption`] for unusable bounds, field or base names.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.min_rate.is_finite() && self.max_rate.is_finite())
            || self.min_rate <= 0.0
            || self.min_rate > self.max_rate
        {
            return Err(ConfigError::InvalidOption {
                option: "rate bounds".to_string(),
                message: format!(
                    "expected 0 < min <= max, got {} to {}",
                    self.min_rate, self.max_rate
                ),
            });
        }
        if !(self.min_rate..=self.max_rate).contains(&self.rate) {
            return Err(ConfigError::OutOfRange {
                option: "rate".to_string(),
                value: self.rate,
                min: self.min_rate,
                max: self.max_rate,
            });
        }
        if self.mode != RateMode::Passthrough {
            validate_field_name(self.field_name()).map_err(|e| ConfigError::InvalidOption {
                option: "field".to_string(),
                message: e.to_string(),
            })?;
        }
        if let Some(base_name) = &self.output_base_name {
            validate_base_name(base_name)?;
        }
        Ok(())
    }
}

fn validate_base_name(base_name: &str) -> Result<(), ConfigError> {
    let problem = if base_name.trim().is_empty() {
        Some("must not be empty")
    } else if base_name == "." || base_name == ".." {
        Some("must not be a relative path component")
    } else if base_name.contains(['/', '\\']) {
        Some("must not contain path separators")
    } else if base_name.chars().any(char::is_control) {
        Some("must not contain control characters")
    } else {
        None
    };
    match problem {
        Some(message) => Err(ConfigError::InvalidOption {
            option: "output base name".to_string(),
            message: format!("'{base_name}' {message}"),
        }),
        None => Ok(()),
    }
}

/// Options for [`export_targets`](crate::operations::export_targets).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetOptions {
    /// Spray radius in metres (default: 1.0)
    pub radius_m: f64,
    /// Liquid per target in litres (default: 0.5)
    pub amount_l: f64,
}

impl TargetOptions {
    /// Smallest radius and amount the drone accepts.
    pub const MINIMUM: f64 = 0.1;

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_radius(mut self, radius_m: f64) -> Self {
        self.radius_m = radius_m;
        self
    }

    #[must_use]
    pub fn with_amount(mut self, amount_l: f64) -> Self {
        self.amount_l = amount_l;
        self
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::OutOfRange`] when a value is below
    /// [`TargetOptions::MINIMUM`] or not finite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (option, value) in [("radius", self.radius_m), ("amount", self.amount_l)] {
            if !value.is_finite() || value < Self::MINIMUM {
                return Err(ConfigError::OutOfRange {
                    option: option.to_string(),
                    value,
                    min: Self::MINIMUM,
                    max: f64::MAX,
                });
            }
        }
        Ok(())
    }
}

impl Default for TargetOptions {
    fn default() -> Self {
        Self {
            radius_m: 1.0,
            amount_l: 0.5,
        }
    }
}
