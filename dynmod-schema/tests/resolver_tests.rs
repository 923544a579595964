use dynmod_schema::{FieldSpec, ModelConfig, SchemaError, resolve};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::BTreeMap;

fn configs(models: Vec<ModelConfig>) -> BTreeMap<String, ModelConfig> {
    models.into_iter().map(|m| (m.name.clone(), m)).collect()
}

fn person() -> ModelConfig {
    ModelConfig::new(
        "Person",
        vec![FieldSpec::leaf("Name", "string"), FieldSpec::leaf("Age", "int")],
    )
}

fn names(fields: &[FieldSpec]) -> Vec<&str> {
    fields.iter().map(|f| f.name.as_str()).collect()
}

// ── extends ──────────────────────────────────────────────────────

#[test]
fn extends_appends_parent_fields_after_own() {
    let set = configs(vec![
        person(),
        ModelConfig::new("Manager", vec![FieldSpec::reference("Reports", "Person").array()])
            .with_extends(["Person"]),
    ]);
    let resolved = resolve(&set).unwrap();
    assert_eq!(names(&resolved["Manager"]), vec!["Reports", "Name", "Age"]);

    let reports = &resolved["Manager"][0];
    assert!(reports.array);
    assert_eq!(reports.children, person().fields);
}

#[test]
fn extends_concatenates_parents_in_order() {
    let set = configs(vec![
        ModelConfig::new("A", vec![FieldSpec::leaf("A1", "string"), FieldSpec::leaf("A2", "int")]),
        ModelConfig::new("B", vec![FieldSpec::leaf("B1", "bool")]),
        ModelConfig::new("C", vec![FieldSpec::leaf("C1", "uint")]).with_extends(["A", "B"]),
    ]);
    let resolved = resolve(&set).unwrap();
    assert_eq!(names(&resolved["C"]), vec!["C1", "A1", "A2", "B1"]);
}

#[test]
fn extends_is_transitive() {
    let set = configs(vec![
        ModelConfig::new("Root", vec![FieldSpec::leaf("Id", "int64")]),
        ModelConfig::new("Mid", vec![FieldSpec::leaf("Kind", "string")]).with_extends(["Root"]),
        ModelConfig::new("Leaf", vec![FieldSpec::leaf("Extra", "bool")]).with_extends(["Mid"]),
    ]);
    let resolved = resolve(&set).unwrap();
    assert_eq!(names(&resolved["Leaf"]), vec!["Extra", "Kind", "Id"]);
}

#[test]
fn unknown_extends_target_is_reported() {
    let mut orphan = ModelConfig::new("Orphan", vec![]).with_extends(["Ghost"]);
    orphan.set_source("schemas/orphan.json");
    let err = resolve(&configs(vec![orphan])).unwrap_err();
    match err {
        SchemaError::UnknownExtends { model, location, target } => {
            assert_eq!(model, "Orphan");
            assert_eq!(location, "schemas/orphan.json");
            assert_eq!(target, "Ghost");
        }
        other => panic!("unexpected error: {other}"),
    }
}

// ── ref ──────────────────────────────────────────────────────────

#[test]
fn nested_refs_resolve_transitively() {
    let set = configs(vec![
        ModelConfig::new("Geo", vec![FieldSpec::leaf("Lat", "float64"), FieldSpec::leaf("Lng", "float64")]),
        ModelConfig::new(
            "Address",
            vec![FieldSpec::leaf("Street", "string"), FieldSpec::reference("Location", "Geo")],
        ),
        ModelConfig::new(
            "Company",
            vec![FieldSpec::group("Office", vec![FieldSpec::reference("Address", "Address")])],
        ),
    ]);
    let resolved = resolve(&set).unwrap();

    let office = &resolved["Company"][0];
    let address = &office.children[0];
    assert_eq!(names(&address.children), vec!["Street", "Location"]);
    let location = &address.children[1];
    assert_eq!(names(&location.children), vec!["Lat", "Lng"]);
}

#[test]
fn diamond_references_resolve_identically() {
    let set = configs(vec![
        ModelConfig::new("Money", vec![FieldSpec::leaf("Amount", "int64"), FieldSpec::leaf("Currency", "string")]),
        ModelConfig::new(
            "Invoice",
            vec![FieldSpec::reference("Total", "Money"), FieldSpec::reference("Tax", "Money")],
        ),
    ]);
    let resolved = resolve(&set).unwrap();
    assert_eq!(resolved["Invoice"][0].children, resolved["Invoice"][1].children);
    assert_eq!(resolved["Invoice"][0].children, set["Money"].fields);
}

#[test]
fn ref_children_exclude_inherited_fields() {
    let set = configs(vec![
        person(),
        ModelConfig::new("Employee", vec![FieldSpec::leaf("Badge", "string")]).with_extends(["Person"]),
        ModelConfig::new("Team", vec![FieldSpec::reference("Lead", "Employee")]),
    ]);
    let resolved = resolve(&set).unwrap();
    assert_eq!(names(&resolved["Team"][0].children), vec!["Badge"]);
}

#[test]
fn unknown_ref_target_is_reported() {
    let set = configs(vec![ModelConfig::new("Order", vec![FieldSpec::reference("Buyer", "Customer")])]);
    let err = resolve(&set).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("Order"));
    assert!(msg.contains("Buyer"));
    assert!(msg.contains("Customer"));
    assert!(msg.contains("<inline>"));
}

#[test]
fn self_reference_is_a_cycle_error() {
    let set = configs(vec![ModelConfig::new("Node", vec![FieldSpec::reference("Next", "Node")])]);
    match resolve(&set).unwrap_err() {
        SchemaError::CyclicReference { kind, chain } => {
            assert_eq!(kind, "ref");
            assert_eq!(chain, vec!["Node", "Node"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn mutual_extends_is_a_cycle_error() {
    let set = configs(vec![
        ModelConfig::new("A", vec![]).with_extends(["B"]),
        ModelConfig::new("B", vec![]).with_extends(["A"]),
    ]);
    let err = resolve(&set).unwrap_err();
    assert!(matches!(err, SchemaError::CyclicReference { kind: "extends", .. }));
    assert!(err.to_string().contains("A -> B -> A"));
}

// ── Re-resolution ────────────────────────────────────────────────

#[test]
fn resolution_leaves_configs_untouched() {
    let set = configs(vec![
        person(),
        ModelConfig::new("Manager", vec![FieldSpec::reference("Boss", "Person")]).with_extends(["Person"]),
    ]);
    let before = set.clone();
    resolve(&set).unwrap();
    assert_eq!(set, before);
}

#[test]
fn re_resolving_merged_superset_does_not_duplicate() {
    let mut set = configs(vec![
        person(),
        ModelConfig::new("Manager", vec![FieldSpec::leaf("Level", "int")]).with_extends(["Person"]),
    ]);
    let first = resolve(&set).unwrap();

    set.insert(
        "Director".into(),
        ModelConfig::new("Director", vec![FieldSpec::leaf("Budget", "float64")]).with_extends(["Manager"]),
    );
    let second = resolve(&set).unwrap();

    assert_eq!(first["Manager"], second["Manager"]);
    assert_eq!(names(&second["Director"]), vec!["Budget", "Level", "Name", "Age"]);
}

// ── Properties ───────────────────────────────────────────────────

fn chain_strategy() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(1usize..4, 1..6)
}

/// Builds models M0..Mn where Mi has `sizes[i]` leaves, refs M(i-1)
/// and extends M(i-1).
fn chained(sizes: &[usize]) -> BTreeMap<String, ModelConfig> {
    let mut models = Vec::new();
    for (i, size) in sizes.iter().enumerate() {
        let mut fields: Vec<FieldSpec> = (0..*size)
            .map(|j| FieldSpec::leaf(&format!("F{i}_{j}"), "string"))
            .collect();
        let mut config = ModelConfig::new(&format!("M{i}"), Vec::new());
        if i > 0 {
            fields.push(FieldSpec::reference("Prev", &format!("M{}", i - 1)));
            config = config.with_extends([format!("M{}", i - 1)]);
        }
        config.fields = fields;
        models.push(config);
    }
    configs(models)
}

proptest! {
    /// Resolving the same config set twice yields identical results.
    #[test]
    fn resolution_is_idempotent(sizes in chain_strategy()) {
        let set = chained(&sizes);
        let first = resolve(&set).unwrap();
        let second = resolve(&set).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Final field count is own fields plus every ancestor's own fields.
    #[test]
    fn extends_lengths_accumulate(sizes in chain_strategy()) {
        let set = chained(&sizes);
        let resolved = resolve(&set).unwrap();
        let mut expected = 0;
        for (i, size) in sizes.iter().enumerate() {
            expected += size + usize::from(i > 0);
            prop_assert_eq!(resolved[&format!("M{i}")].len(), expected);
        }
    }
}
