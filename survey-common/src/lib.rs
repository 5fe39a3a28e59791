//! # Survey Common Library
//!
//! Shared code for converting study surveys to the legacy (v1) format:
//! - Error types
//! - Configuration loading
//! - Survey file discovery
//! - Survey transforms (legacy 1.1 layout, identity)
//! - Batch conversion of a study's survey folder

pub mod config;
pub mod converter;
pub mod error;
pub mod scanner;
pub mod transform;

pub use config::ConverterConfig;
pub use converter::{BatchConverter, Conversion, ConversionReport};
pub use error::{Error, Result};
pub use transform::{IdentityTransform, LegacyTransform, SurveyTransform, TransformError, TransformKind};
