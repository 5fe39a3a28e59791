//! Batch conversion of a study's surveys to the legacy format
//!
//! One pass over `<output_root>/<study>/surveys`: every `*.json` file that is
//! not itself a `*.v1.json` output is parsed, transformed and written next to
//! the input as `<name>.v1.json`. The first failure aborts the pass; files
//! converted before it are left in place.

use crate::config::ConverterConfig;
use crate::scanner::{is_converted_file, legacy_output_path, SurveyScanner};
use crate::transform::SurveyTransform;
use crate::{Error, Result};
use serde::Serialize;
use serde_json::Value;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Indentation of written survey files
const JSON_INDENT: &[u8] = b"    ";

/// One converted survey
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    pub input: PathBuf,
    pub output: PathBuf,
}

/// Outcome of a conversion run
#[derive(Debug, Clone, Default)]
pub struct ConversionReport {
    /// Directory that was scanned
    pub surveys_dir: PathBuf,
    /// Surveys converted, in processing order
    pub converted: Vec<Conversion>,
    /// Inputs left alone (prior outputs, or existing outputs with `skip_existing`)
    pub skipped: Vec<PathBuf>,
}

/// Converts every survey of a study with a [`SurveyTransform`]
pub struct BatchConverter {
    config: ConverterConfig,
    transform: Box<dyn SurveyTransform>,
}

impl BatchConverter {
    pub fn new(config: ConverterConfig, transform: Box<dyn SurveyTransform>) -> Self {
        Self { config, transform }
    }

    /// Converter using the transform named in the config
    pub fn from_config(config: ConverterConfig) -> Self {
        let transform = config.transform.build();
        Self::new(config, transform)
    }

    /// Folder scanned for the given study
    pub fn surveys_dir(&self, study: &str) -> PathBuf {
        self.config.surveys_dir(study)
    }

    /// Convert all surveys of `study`
    ///
    /// Prints the scanned folder to stdout before starting.
    pub fn run(&self, study: &str) -> Result<ConversionReport> {
        if study.is_empty() {
            return Err(Error::InvalidInput("study key must not be empty".to_string()));
        }

        let surveys_dir = self.surveys_dir(study);
        println!("{}", surveys_dir.display());
        debug!("Using {} transform", self.transform.name());

        let files = SurveyScanner::new()
            .recursive(self.config.recursive)
            .scan(&surveys_dir)?;

        let mut report = ConversionReport {
            surveys_dir,
            ..Default::default()
        };

        for input in files {
            if is_converted_file(&input) {
                debug!("Skipping converted file {}", input.display());
                report.skipped.push(input);
                continue;
            }

            if self.config.skip_existing && legacy_output_path(&input).exists() {
                debug!("Output exists, skipping {}", input.display());
                report.skipped.push(input);
                continue;
            }

            let output = self.convert_file(&input, study)?;
            report.converted.push(Conversion { input, output });
        }

        info!(
            "Converted {} surveys ({} skipped) in {}",
            report.converted.len(),
            report.skipped.len(),
            report.surveys_dir.display()
        );

        Ok(report)
    }

    /// Read, transform and write a single survey; returns the output path
    pub fn convert_file(&self, input: &Path, study: &str) -> Result<PathBuf> {
        let survey = read_survey_json(input)?;

        let legacy = self
            .transform
            .transform(survey, study)
            .map_err(|source| Error::Transform {
                path: input.to_path_buf(),
                source,
            })?;

        let output = legacy_output_path(input);
        write_survey_json(&output, &legacy)?;

        info!("{} -> {}", input.display(), output.display());
        Ok(output)
    }
}

/// Load a survey file as an untyped JSON value
pub fn read_survey_json(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| Error::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Serialize a value as JSON indented by four spaces
///
/// Non-ASCII characters are written as-is, not escaped.
fn write_pretty<W: Write, T: Serialize + ?Sized>(writer: W, value: &T) -> serde_json::Result<()> {
    let formatter = serde_json::ser::PrettyFormatter::with_indent(JSON_INDENT);
    let mut ser = serde_json::Serializer::with_formatter(writer, formatter);
    value.serialize(&mut ser)
}

/// Render a value as survey JSON text
pub fn to_survey_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    write_pretty(&mut buf, value)?;
    String::from_utf8(buf).map_err(|e| Error::Serialize(serde::ser::Error::custom(e)))
}

/// Write a value to `path`, replacing any existing file
pub fn write_survey_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let write_error = |source: std::io::Error| Error::Write {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(write_error)?;
    let mut writer = BufWriter::new(file);
    write_pretty(&mut writer, value).map_err(|e| {
        if e.is_io() {
            write_error(e.into())
        } else {
            Error::Serialize(e)
        }
    })?;
    writer.flush().map_err(write_error)
}
