use dynmod_schema::{FieldSpec, ModelConfig, SchemaError, parse_models};
use pretty_assertions::assert_eq;
use std::io::Write;

const MANAGER: &str = r#"{
    "name": "Manager",
    "extends": ["Person"],
    "fields": [
        {"name": "Reports", "ref": "Person", "array": true},
        {"name": "Office", "children": [
            {"name": "Floor", "type": "int", "tag": "json:\"floor\""}
        ]},
        {"name": "Base", "type": "struct", "anonymous": true}
    ]
}"#;

// ── Parsing ──────────────────────────────────────────────────────

#[test]
fn parses_all_field_attributes() {
    let config = ModelConfig::from_json(MANAGER).unwrap();
    assert_eq!(config.name, "Manager");
    assert_eq!(config.extends, vec!["Person"]);

    let reports = &config.fields[0];
    assert_eq!(reports.ref_model.as_deref(), Some("Person"));
    assert!(reports.array);
    assert!(reports.ty.is_none());

    let floor = &config.fields[1].children[0];
    assert_eq!(floor.ty.as_deref(), Some("int"));
    assert_eq!(floor.tag, "json:\"floor\"");

    assert!(config.fields[2].anonymous);
}

#[test]
fn defaults_apply_to_omitted_attributes() {
    let config = ModelConfig::from_json(r#"{"name": "Tiny"}"#).unwrap();
    assert!(config.fields.is_empty());
    assert!(config.extends.is_empty());
    assert!(config.source().is_none());
}

#[test]
fn missing_name_is_a_parse_error() {
    let err = ModelConfig::from_json(r#"{"fields": []}"#).unwrap_err();
    assert!(matches!(err, SchemaError::Parse { .. }));
}

#[test]
fn parse_models_accepts_bundles_and_singles() {
    let bundle = r#"{"models": [{"name": "A"}, {"name": "B"}]}"#;
    let parsed = parse_models(bundle, "bundle.json").unwrap();
    assert_eq!(parsed.len(), 2);
    assert_eq!(parsed[1].name, "B");

    let single = parse_models(r#"{"name": "C"}"#, "c.json").unwrap();
    assert_eq!(single[0].name, "C");
}

#[test]
fn parse_error_names_location() {
    let err = parse_models("{not json", "broken.json").unwrap_err();
    assert!(err.to_string().contains("broken.json"));
}

#[test]
fn from_file_records_source() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(MANAGER.as_bytes()).unwrap();
    let config = ModelConfig::from_file(file.path()).unwrap();
    assert_eq!(config.source(), Some(file.path()));
    assert_eq!(config.location(), file.path().display().to_string());
}

#[test]
fn from_file_missing_is_io_error() {
    let err = ModelConfig::from_file(std::path::Path::new("/nonexistent/model.json")).unwrap_err();
    assert!(matches!(err, SchemaError::Io { .. }));
}

// ── Dump ─────────────────────────────────────────────────────────

#[test]
fn dump_omits_defaults_and_round_trips() {
    let config = ModelConfig::new(
        "Person",
        vec![FieldSpec::leaf("Name", "string"), FieldSpec::reference("Friends", "Person").array()],
    );
    let dumped = config.dump();
    assert!(!dumped.contains("anonymous"));
    assert!(!dumped.contains("extends"));
    assert!(dumped.contains("\"ref\": \"Person\""));
    assert_eq!(ModelConfig::from_json(&dumped).unwrap(), config);
}

// ── FieldSpec helpers ────────────────────────────────────────────

#[test]
fn accepts_children_rules() {
    assert!(FieldSpec::group("G", vec![]).accepts_children());
    assert!(FieldSpec::leaf("S", "struct").accepts_children());
    assert!(!FieldSpec::leaf("N", "int").accepts_children());
    assert!(!FieldSpec::group("G", vec![]).array().accepts_children());
}
