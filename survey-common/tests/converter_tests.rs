//! Integration tests for batch survey conversion
//!
//! Covers:
//! - one `.v1.json` output per input, written next to it
//! - prior outputs never read as input
//! - reruns reconvert originals with identical output
//! - missing and empty survey folders are a no-op
//! - the first bad file aborts the run, earlier files stay converted
//! - `skip_existing` and `recursive` options

use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use survey_common::{
    BatchConverter, ConverterConfig, Error, IdentityTransform, LegacyTransform, TransformError,
};
use tempfile::TempDir;

struct Study {
    _tmp: TempDir,
    root: PathBuf,
    surveys: PathBuf,
}

impl Study {
    fn new(key: &str) -> Self {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("output");
        let surveys = root.join(key).join("surveys");
        fs::create_dir_all(&surveys).unwrap();
        Self {
            _tmp: tmp,
            root,
            surveys,
        }
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.surveys.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    fn read(&self, name: &str) -> String {
        fs::read_to_string(self.surveys.join(name)).unwrap()
    }

    fn config(&self) -> ConverterConfig {
        ConverterConfig {
            output_root: self.root.clone(),
            ..ConverterConfig::default()
        }
    }

    fn identity(&self) -> BatchConverter {
        BatchConverter::new(self.config(), Box::new(IdentityTransform))
    }

    fn file_names(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(&self.surveys)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

fn file_name(path: &Path) -> String {
    path.file_name().unwrap().to_string_lossy().into_owned()
}

#[test]
fn test_identity_scenario_output() {
    let study = Study::new("studyA");
    study.write("s1.json", r#"{"id": 1}"#);

    let report = study.identity().run("studyA").unwrap();

    assert_eq!(report.converted.len(), 1);
    assert_eq!(report.converted[0].output, study.surveys.join("s1.v1.json"));
    assert_eq!(study.read("s1.v1.json"), "{\n    \"id\": 1\n}");
}

#[test]
fn test_one_output_per_input() {
    let study = Study::new("studyA");
    study.write("intake.json", r#"{"key": "intake"}"#);
    study.write("weekly.json", r#"{"key": "weekly"}"#);
    study.write("vaccination.json", r#"{"key": "vaccination"}"#);

    let report = study.identity().run("studyA").unwrap();

    assert_eq!(report.converted.len(), 3);
    assert_eq!(
        study.file_names(),
        vec![
            "intake.json",
            "intake.v1.json",
            "vaccination.json",
            "vaccination.v1.json",
            "weekly.json",
            "weekly.v1.json",
        ]
    );
}

#[test]
fn test_inputs_left_untouched() {
    let study = Study::new("studyA");
    let original = r#"{"key":"weekly","items":[1,2]}"#;
    study.write("weekly.json", original);

    study.identity().run("studyA").unwrap();

    assert_eq!(study.read("weekly.json"), original);
}

#[test]
fn test_converted_files_not_reprocessed() {
    let study = Study::new("studyA");
    study.write("s1.json", r#"{"id": 1}"#);
    study.write("old.v1.json", "this is not json");

    let report = study.identity().run("studyA").unwrap();

    assert_eq!(report.converted.len(), 1);
    assert_eq!(report.skipped, vec![study.surveys.join("old.v1.json")]);
    assert!(!study.surveys.join("old.v1.v1.json").exists());
    assert_eq!(study.read("old.v1.json"), "this is not json");
}

#[test]
fn test_rerun_is_idempotent() {
    let study = Study::new("studyA");
    study.write("s1.json", r#"{"id": 1, "label": "Grippe"}"#);
    study.write("s2.json", r#"[true, null]"#);

    let converter = study.identity();
    let first = converter.run("studyA").unwrap();
    let s1_first = study.read("s1.v1.json");
    let s2_first = study.read("s2.v1.json");

    let second = converter.run("studyA").unwrap();

    // originals are converted again, prior outputs are skipped
    assert_eq!(first.converted, second.converted);
    assert_eq!(second.skipped.len(), 2);
    assert_eq!(study.read("s1.v1.json"), s1_first);
    assert_eq!(study.read("s2.v1.json"), s2_first);
    assert_eq!(study.file_names().len(), 4);
}

#[test]
fn test_existing_output_overwritten() {
    let study = Study::new("studyA");
    study.write("s1.json", r#"{"id": 2}"#);
    study.write("s1.v1.json", r#"{"id": 1}"#);

    study.identity().run("studyA").unwrap();

    assert_eq!(study.read("s1.v1.json"), "{\n    \"id\": 2\n}");
}

#[test]
fn test_skip_existing_keeps_output() {
    let study = Study::new("studyA");
    study.write("s1.json", r#"{"id": 2}"#);
    study.write("s1.v1.json", r#"{"id": 1}"#);
    study.write("s2.json", r#"{"id": 3}"#);

    let config = ConverterConfig {
        skip_existing: true,
        ..study.config()
    };
    let report = BatchConverter::new(config, Box::new(IdentityTransform))
        .run("studyA")
        .unwrap();

    assert_eq!(study.read("s1.v1.json"), r#"{"id": 1}"#);
    assert_eq!(report.converted.len(), 1);
    assert_eq!(file_name(&report.converted[0].input), "s2.json");
    assert!(report.skipped.contains(&study.surveys.join("s1.json")));
}

#[test]
fn test_empty_folder_is_noop() {
    let study = Study::new("studyA");

    let report = study.identity().run("studyA").unwrap();

    assert!(report.converted.is_empty());
    assert!(study.file_names().is_empty());
}

#[test]
fn test_missing_folder_is_noop() {
    let study = Study::new("studyA");

    let report = study.identity().run("unknown-study").unwrap();

    assert!(report.converted.is_empty());
    assert_eq!(report.surveys_dir, study.root.join("unknown-study").join("surveys"));
    assert!(!report.surveys_dir.exists());
}

#[test]
fn test_malformed_json_aborts_run() {
    let study = Study::new("studyA");
    study.write("a.json", r#"{"id": "a"}"#);
    study.write("b.json", r#"{"id": "b""#);
    study.write("c.json", r#"{"id": "c"}"#);

    let result = study.identity().run("studyA");

    match result {
        Err(Error::Parse { path, .. }) => assert_eq!(path, study.surveys.join("b.json")),
        other => panic!("Expected parse error, got {:?}", other),
    }
    assert!(study.surveys.join("a.v1.json").exists());
    assert!(!study.surveys.join("b.v1.json").exists());
    assert!(!study.surveys.join("c.v1.json").exists());
}

#[cfg(unix)]
#[test]
fn test_unreadable_survey_aborts_run() {
    let study = Study::new("studyA");
    study.write("a.json", r#"{"id": "a"}"#);
    std::os::unix::fs::symlink(study.surveys.join("gone.json"), study.surveys.join("b.json"))
        .unwrap();
    study.write("c.json", r#"{"id": "c"}"#);

    let result = study.identity().run("studyA");

    match result {
        Err(Error::Read { path, .. }) => assert_eq!(path, study.surveys.join("b.json")),
        other => panic!("Expected read error, got {:?}", other),
    }
    assert!(study.surveys.join("a.v1.json").exists());
    assert!(!study.surveys.join("b.v1.json").exists());
    assert!(!study.surveys.join("c.v1.json").exists());
}

#[test]
fn test_large_integers_round_trip() {
    let study = Study::new("studyA");
    study.write("s1.json", r#"{"n": 123456789012345678901234567890, "small": -7}"#);

    study.identity().run("studyA").unwrap();

    assert_eq!(
        study.read("s1.v1.json"),
        "{\n    \"n\": 123456789012345678901234567890,\n    \"small\": -7\n}"
    );
}

#[test]
fn test_transform_failure_aborts_run() {
    let study = Study::new("studyA");
    study.write("a.json", r#"{"surveyDefinition": {"key": "a"}}"#);
    study.write("b.json", r#"{"props": {}}"#);
    study.write("c.json", r#"{"surveyDefinition": {"key": "c"}}"#);

    let converter = BatchConverter::new(study.config(), Box::new(LegacyTransform));
    let result = converter.run("studyA");

    match result {
        Err(Error::Transform { path, source }) => {
            assert_eq!(path, study.surveys.join("b.json"));
            assert_eq!(source, TransformError::MissingField("surveyDefinition"));
        }
        other => panic!("Expected transform error, got {:?}", other),
    }
    assert!(study.surveys.join("a.v1.json").exists());
    assert!(!study.surveys.join("c.v1.json").exists());
}

#[test]
fn test_study_key_passed_to_transform() {
    let study = Study::new("grippenet");
    study.write("weekly.json", r#"{"key": "weekly"}"#);

    let tag = |mut survey: Value, study_key: &str| {
        survey["studyKey"] = Value::String(study_key.to_string());
        Ok::<_, TransformError>(survey)
    };
    BatchConverter::new(study.config(), Box::new(tag))
        .run("grippenet")
        .unwrap();

    let output: Value = serde_json::from_str(&study.read("weekly.v1.json")).unwrap();
    assert_eq!(output, json!({"key": "weekly", "studyKey": "grippenet"}));
}

#[test]
fn test_legacy_transform_end_to_end() {
    let study = Study::new("influenzanet");
    study.write(
        "intake.json",
        r#"{
            "versionId": "24-1",
            "surveyDefinition": {"key": "intake", "items": []},
            "props": {"name": [{"code": "fr", "parts": [{"str": "Questionnaire préliminaire"}]}]}
        }"#,
    );

    BatchConverter::from_config(study.config())
        .run("influenzanet")
        .unwrap();

    let text = study.read("intake.v1.json");
    assert!(text.contains("Questionnaire préliminaire"));
    assert!(text.starts_with("{\n    \"studyKey\": \"influenzanet\",\n    \"survey\": {\n        \"current\": {"));

    let output: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(output["survey"]["current"]["versionId"], "24-1");
    assert_eq!(output["survey"]["history"], json!([]));
}

#[test]
fn test_recursive_converts_nested_surveys() {
    let study = Study::new("studyA");
    study.write("top.json", r#"{"id": 1}"#);
    study.write("archive/old.json", r#"{"id": 0}"#);

    study.identity().run("studyA").unwrap();
    assert!(!study.surveys.join("archive/old.v1.json").exists());

    let config = ConverterConfig {
        recursive: true,
        ..study.config()
    };
    let report = BatchConverter::new(config, Box::new(IdentityTransform))
        .run("studyA")
        .unwrap();

    assert_eq!(report.converted.len(), 2);
    assert!(study.surveys.join("archive/old.v1.json").exists());
}

#[test]
fn test_empty_study_rejected() {
    let study = Study::new("studyA");
    let result = study.identity().run("");
    assert!(matches!(result, Err(Error::InvalidInput(_))));
}
