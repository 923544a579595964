use dynmod::{LoaderConfig, Models, TypeRef, Value};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::PathBuf;

#[test]
fn parses_all_sections() {
    let config = LoaderConfig::from_toml(
        r#"
        schema_dirs = ["schemas", "/srv/shared"]
        schema_files = ["extra.json"]

        [types]
        money = "float64"
        uuid = "string"
        "#,
    )
    .unwrap();

    assert_eq!(
        config.schema_dirs,
        vec![PathBuf::from("schemas"), PathBuf::from("/srv/shared")]
    );
    assert_eq!(config.schema_files, vec![PathBuf::from("extra.json")]);
    assert_eq!(config.types["money"], "float64");
}

#[test]
fn empty_document_uses_defaults() {
    assert_eq!(LoaderConfig::from_toml("").unwrap(), LoaderConfig::default());
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let config = LoaderConfig::load_from(std::path::Path::new("/nonexistent/dynmod.toml"));
    assert_eq!(config, LoaderConfig::default());
}

#[test]
fn malformed_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dynmod.toml");
    fs::write(&path, "schema_dirs = 3").unwrap();
    assert_eq!(LoaderConfig::load_from(&path), LoaderConfig::default());
}

#[test]
fn relative_paths_are_anchored_at_the_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dynmod.toml");
    fs::write(&path, "schema_dirs = [\"schemas\", \"/abs\"]\nschema_files = [\"one.json\"]").unwrap();

    let config = LoaderConfig::load_from(&path);
    assert_eq!(config.schema_dirs, vec![dir.path().join("schemas"), PathBuf::from("/abs")]);
    assert_eq!(config.schema_files, vec![dir.path().join("one.json")]);
}

#[test]
fn named_types_skip_unknown_targets() {
    let config = LoaderConfig::from_toml(
        r#"
        [types]
        money = "float64"
        maybe = "*int"
        bogus = "decimal"
        "#,
    )
    .unwrap();

    let mut types = config.named_types();
    types.sort_by(|a, b| a.name.cmp(&b.name));
    let pairs: Vec<(&str, TypeRef)> = types.iter().map(|t| (t.name.as_str(), t.ty.clone())).collect();
    assert_eq!(
        pairs,
        vec![
            ("maybe", TypeRef::optional(TypeRef::Int)),
            ("money", TypeRef::Float64),
        ]
    );
}

#[test]
fn registry_loads_everything_a_config_names() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("schemas/billing")).unwrap();
    fs::write(
        dir.path().join("schemas/billing/invoice.json"),
        r#"{"name": "Invoice", "fields": [{"name": "Total", "type": "money"}, {"name": "Buyer", "ref": "Customer"}]}"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("customer.json"),
        r#"{"name": "Customer", "fields": [{"name": "Name", "type": "string"}]}"#,
    )
    .unwrap();
    let path = dir.path().join("dynmod.toml");
    fs::write(
        &path,
        "schema_dirs = [\"schemas\"]\nschema_files = [\"customer.json\"]\n\n[types]\nmoney = \"float64\"\n",
    )
    .unwrap();

    let models = Models::new();
    models.load_from_config(&LoaderConfig::load_from(&path)).unwrap();

    assert_eq!(models.model_names(), vec!["Customer", "Invoice"]);
    let invoice = models.produce_by_name("Invoice", &[]).unwrap();
    assert_eq!(invoice.get("Total"), Some(&Value::Float(0.0)));
}
