//! `ref` / `extends` resolution over a named set of model configs.
//!
//! Resolution runs in two passes. The ref pass gives every model its own
//! fields with each `ref` field's children replaced by the referenced
//! model's ref-resolved fields (transitively). The extends pass then builds
//! each model's final field list: own ref-resolved fields first, followed by
//! every parent's final fields in `extends` order.
//!
//! Both passes memoize per model, so shared (diamond) references resolve
//! once. A chain that revisits a model still on it is reported as
//! [`SchemaError::CyclicReference`].

use crate::{FieldSpec, ModelConfig, SchemaError, SchemaResult};
use std::collections::{BTreeMap, HashMap};

/// Resolved field lists keyed by model name.
pub type ResolvedFields = BTreeMap<String, Vec<FieldSpec>>;

/// Resolves every model in `configs`.
///
/// The configs themselves are left untouched; call again over a merged
/// set to re-resolve after new models arrive.
pub fn resolve(configs: &BTreeMap<String, ModelConfig>) -> SchemaResult<ResolvedFields> {
    let mut resolver = Resolver {
        configs,
        own: HashMap::new(),
        full: BTreeMap::new(),
        chain: Vec::new(),
    };

    for name in configs.keys() {
        resolver.own_fields(name)?;
    }
    for name in configs.keys() {
        resolver.full_fields(name)?;
    }

    Ok(resolver.full)
}

struct Resolver<'a> {
    configs: &'a BTreeMap<String, ModelConfig>,
    /// Ref-resolved own fields.
    own: HashMap<String, Vec<FieldSpec>>,
    /// Own fields followed by inherited ones.
    full: ResolvedFields,
    chain: Vec<String>,
}

impl<'a> Resolver<'a> {
    /// Callers only pass names already checked against `configs`.
    fn config(&self, name: &str) -> &'a ModelConfig {
        &self.configs[name]
    }

    fn enter(&mut self, kind: &'static str, name: &str) -> SchemaResult<()> {
        if self.chain.iter().any(|n| n == name) {
            let mut chain = self.chain.clone();
            chain.push(name.to_string());
            return Err(SchemaError::CyclicReference { kind, chain });
        }
        self.chain.push(name.to_string());
        Ok(())
    }

    fn own_fields(&mut self, name: &str) -> SchemaResult<Vec<FieldSpec>> {
        if let Some(fields) = self.own.get(name) {
            return Ok(fields.clone());
        }

        self.enter("ref", name)?;
        let config = self.config(name);
        let mut fields = config.fields.clone();
        for field in &mut fields {
            self.resolve_ref(name, field)?;
        }
        self.chain.pop();

        self.own.insert(name.to_string(), fields.clone());
        Ok(fields)
    }

    fn resolve_ref(&mut self, model: &str, field: &mut FieldSpec) -> SchemaResult<()> {
        let Some(target) = field.ref_model.as_deref() else {
            for child in &mut field.children {
                self.resolve_ref(model, child)?;
            }
            return Ok(());
        };

        if !self.configs.contains_key(target) {
            return Err(SchemaError::UnknownRef {
                model: model.to_string(),
                field: field.name.clone(),
                location: self.config(model).location(),
                target: target.to_string(),
            });
        }

        let target = target.to_string();
        field.children = self.own_fields(&target)?;
        Ok(())
    }

    fn full_fields(&mut self, name: &str) -> SchemaResult<Vec<FieldSpec>> {
        if let Some(fields) = self.full.get(name) {
            return Ok(fields.clone());
        }

        let mut fields = self.own_fields(name)?;

        self.enter("extends", name)?;
        let parents = self.config(name).extends.clone();
        for parent in &parents {
            if !self.configs.contains_key(parent) {
                return Err(SchemaError::UnknownExtends {
                    model: name.to_string(),
                    location: self.config(name).location(),
                    target: parent.clone(),
                });
            }
            fields.extend(self.full_fields(parent)?);
        }
        self.chain.pop();

        self.full.insert(name.to_string(), fields.clone());
        Ok(fields)
    }
}
