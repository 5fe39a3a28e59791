//! Survey document transforms
//!
//! A transform maps one survey document to another for a given study. The
//! batch converter treats it as a pure function over untyped JSON values:
//! the document schema belongs to the transform, not to the converter.
//!
//! [`LegacyTransform`] produces the 1.1 upload layout expected by older
//! deployments:
//!
//! ```text
//! 1.2 export                      1.1 upload
//! {                               {
//!   "versionId": "..",              "studyKey": "<study>",
//!   "published": 1700000000,        "survey": {
//!   "surveyDefinition": {..},         "current": {
//!   "props": {..}                       "versionId": "..",
//! }                                     "published": 1700000000,
//!                                       "surveyDefinition": {..}
//!                                     },
//!                                     "props": {..},
//!                                     "history": []
//!                                   }
//!                                 }
//! ```

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Fields moved from the survey root into `current`, in output order
const VERSION_FIELDS: [&str; 4] = ["versionId", "published", "unpublished", "surveyDefinition"];

/// Transform failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransformError {
    /// Survey document root is not a JSON object
    #[error("survey document is not a JSON object (found {0})")]
    NotAnObject(&'static str),

    /// Required field is absent from the survey document
    #[error("missing required field '{0}'")]
    MissingField(&'static str),
}

/// Survey-to-survey mapping for one study
pub trait SurveyTransform {
    /// Transform identifier used in logs (e.g., "legacy", "identity")
    fn name(&self) -> &'static str {
        "custom"
    }

    /// Map one survey document
    ///
    /// # Arguments
    /// * `survey` - Parsed survey file
    /// * `study_key` - Study the survey belongs to
    ///
    /// # Errors
    /// Returns `TransformError` if the document cannot be mapped
    fn transform(&self, survey: Value, study_key: &str) -> Result<Value, TransformError>;
}

impl<F> SurveyTransform for F
where
    F: Fn(Value, &str) -> Result<Value, TransformError>,
{
    fn transform(&self, survey: Value, study_key: &str) -> Result<Value, TransformError> {
        self(survey, study_key)
    }
}

/// Selects a built-in transform by name (`legacy`, `identity`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformKind {
    #[default]
    Legacy,
    Identity,
}

impl TransformKind {
    pub fn build(self) -> Box<dyn SurveyTransform> {
        match self {
            TransformKind::Legacy => Box::new(LegacyTransform),
            TransformKind::Identity => Box::new(IdentityTransform),
        }
    }
}

/// Returns the document unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTransform;

impl SurveyTransform for IdentityTransform {
    fn name(&self) -> &'static str {
        "identity"
    }

    fn transform(&self, survey: Value, _study_key: &str) -> Result<Value, TransformError> {
        Ok(survey)
    }
}

/// Converts a 1.2 survey export into the 1.1 upload layout
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyTransform;

impl SurveyTransform for LegacyTransform {
    fn name(&self) -> &'static str {
        "legacy"
    }

    fn transform(&self, survey: Value, study_key: &str) -> Result<Value, TransformError> {
        let survey = unwrap_envelope(survey);
        let survey = match survey {
            Value::Object(map) => map,
            other => return Err(TransformError::NotAnObject(json_type_name(&other))),
        };

        let legacy = if survey.get("current").is_some_and(Value::is_object) {
            survey
        } else {
            move_into_current(survey)?
        };

        let mut envelope = Map::new();
        envelope.insert("studyKey".to_string(), Value::String(study_key.to_string()));
        envelope.insert("survey".to_string(), Value::Object(legacy));
        Ok(Value::Object(envelope))
    }
}

/// Strips a `{"studyKey": .., "survey": {..}}` wrapper if present
fn unwrap_envelope(survey: Value) -> Value {
    match survey {
        Value::Object(mut map) if map.get("survey").is_some_and(Value::is_object) => {
            map.remove("survey").unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn move_into_current(survey: Map<String, Value>) -> Result<Map<String, Value>, TransformError> {
    if !survey.contains_key("surveyDefinition") {
        return Err(TransformError::MissingField("surveyDefinition"));
    }

    let mut legacy = Map::with_capacity(survey.len());
    let mut moved = Map::new();

    for (key, value) in survey {
        if VERSION_FIELDS.contains(&key.as_str()) {
            // `current` takes the slot of the first version field
            if !legacy.contains_key("current") {
                legacy.insert("current".to_string(), Value::Null);
            }
            moved.insert(key, value);
        } else {
            legacy.insert(key, value);
        }
    }

    let mut current = Map::with_capacity(moved.len());
    for field in VERSION_FIELDS {
        if let Some(value) = moved.remove(field) {
            current.insert(field.to_string(), value);
        }
    }
    legacy.insert("current".to_string(), Value::Object(current));

    if !legacy.contains_key("history") {
        legacy.insert("history".to_string(), Value::Array(Vec::new()));
    }

    Ok(legacy)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
