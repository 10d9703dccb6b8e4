//! `spraykit-core` turns zipped drone-survey shapefiles into archives ready
//! for a spray drone's flight planner.
//!
//! This crate includes:
//! - **Format Registry**: what uploads can be read and what outputs are produced.
//! - **Archive Intake**: locating one complete `.shp`/`.shx`/`.dbf`/`.prj` set in an upload.
//! - **Attribute Transformer**: adding or overwriting a numeric rate field on every feature.
//! - **Area/Volume Calculator**: shoelace areas, acreage and per-feature spray volume.
//! - **Output Packager**: re-assembling the set and its volume report into a new archive.
//!
//! The [`operations`] module ties the stages together and is what the CLI calls.

pub mod calculator;
pub mod container;
pub mod error;
pub mod features;
pub mod formats;
pub mod intake;
pub mod operations;
pub mod options;
pub mod packager;
pub mod report;
pub mod targets;
pub mod transform;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{Result, SprayError};
pub use operations::{ConversionOutput, ConversionResult, convert, export_targets, inspect, volumes};
pub use options::{ConversionOptions, RateMode, TargetOptions};
