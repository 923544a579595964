//! The model registry.
//!
//! Holds every loaded schema document and the model built from it. Each
//! batch load merges the new documents into the known set, re-resolves
//! the whole set and rebuilds every model, so later batches may reference
//! models loaded earlier (and vice versa).

use crate::builder::{Builder, TypeBuilder};
use crate::config::LoaderConfig;
use crate::error::{RegistryError, RegistryResult};
use crate::mapper::{BasicMapper, CombineMapper};
use crate::model::Model;
use dynmod_schema::{FieldSpec, ModelConfig, parse_models, resolve};
use dynmod_types::{Record, Value};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

#[derive(Default)]
struct Registry {
    configs: BTreeMap<String, ModelConfig>,
    models: HashMap<String, Arc<Model>>,
}

pub struct Models {
    inner: Mutex<Registry>,
    mapper: Arc<dyn CombineMapper>,
    builder: Arc<dyn TypeBuilder>,
}

impl Default for Models {
    fn default() -> Self {
        Self::new()
    }
}

impl Models {
    /// An empty registry with the default builder and mapper.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Registry::default()),
            mapper: Arc::new(BasicMapper::new()),
            builder: Arc::new(Builder::new()),
        }
    }

    #[must_use]
    pub fn with_mapper(mut self, mapper: Arc<dyn CombineMapper>) -> Self {
        self.mapper = mapper;
        self
    }

    #[must_use]
    pub fn with_builder(mut self, builder: Arc<dyn TypeBuilder>) -> Self {
        self.builder = builder;
        self
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn combine_mapper(&self) -> &Arc<dyn CombineMapper> {
        &self.mapper
    }

    pub fn builder(&self) -> &Arc<dyn TypeBuilder> {
        &self.builder
    }

    /// Drops every model and schema document.
    pub fn flush(&self) {
        let mut registry = self.lock();
        registry.configs.clear();
        registry.models.clear();
        info!("model registry flushed");
    }

    /// Pretty JSON of every live model's original document, keyed by name.
    pub fn dump(&self) -> String {
        let registry = self.lock();
        let configs: BTreeMap<&str, &ModelConfig> = registry
            .models
            .values()
            .map(|model| (model.name(), model.config()))
            .collect();
        serde_json::to_string_pretty(&configs).unwrap_or_default()
    }

    /// Removes a model and its document. Returns `false` if it was unknown.
    pub fn delete_model(&self, name: &str) -> bool {
        let mut registry = self.lock();
        let known = registry.configs.remove(name).is_some();
        registry.models.remove(name);
        if known {
            debug!(model = %name, "model deleted");
        }
        known
    }

    /// Loads a batch of schema documents given as JSON text.
    pub fn load_models<S: AsRef<str>>(&self, schemas: &[S]) -> RegistryResult<()> {
        let mut batch = Vec::new();
        for (i, schema) in schemas.iter().enumerate() {
            batch.extend(parse_models(schema.as_ref(), &format!("<schema {i}>"))?);
        }
        self.load_batch(batch)
    }

    /// Loads a batch of schema documents from files.
    pub fn load_from_files<P: AsRef<Path>>(&self, files: &[P]) -> RegistryResult<()> {
        let mut batch = Vec::new();
        for file in files {
            batch.extend(read_schema_file(file.as_ref())?);
        }
        self.load_batch(batch)
    }

    /// Loads every `.json` document under `dir` as one batch. Hidden
    /// directories are skipped.
    pub fn load_from_dir(&self, dir: &Path) -> RegistryResult<()> {
        let files = collect_schema_files(dir)?;
        info!(dir = ?dir, files = files.len(), "loading schema directory");
        self.load_from_files(&files)
    }

    /// Registers the configured type aliases, then loads every configured
    /// directory and file as one batch.
    pub fn load_from_config(&self, config: &LoaderConfig) -> RegistryResult<()> {
        self.builder.register_types(config.named_types());

        let mut files = Vec::new();
        for dir in &config.schema_dirs {
            files.extend(collect_schema_files(dir)?);
        }
        files.extend(config.schema_files.iter().cloned());
        self.load_from_files(&files)
    }

    fn load_batch(&self, batch: Vec<ModelConfig>) -> RegistryResult<()> {
        if batch.iter().any(|config| config.name.is_empty()) {
            return Err(RegistryError::EmptyName);
        }

        let mut registry = self.lock();
        let mut merged = registry.configs.clone();
        let batch_len = batch.len();
        for config in batch {
            if let Some(existing) = merged.get(&config.name) {
                warn!(
                    model = %config.name,
                    previous = %existing.location(),
                    file = %config.location(),
                    "model already exists, later definition wins"
                );
            }
            debug!(model = %config.name, file = %config.location(), "model loaded");
            merged.insert(config.name.clone(), config);
        }

        let resolved = resolve(&merged)?;
        registry.configs = merged;
        for (name, fields) in resolved {
            let Some(config) = registry.configs.get(&name).cloned() else {
                continue;
            };
            self.install(&mut registry, config, fields)?;
        }

        info!(loaded = batch_len, models = registry.models.len(), "model batch loaded");
        Ok(())
    }

    fn install(
        &self,
        registry: &mut Registry,
        config: ModelConfig,
        fields: Vec<FieldSpec>,
    ) -> RegistryResult<Arc<Model>> {
        let model = self.build_model(config, fields)?;
        registry.models.insert(model.name().to_string(), Arc::clone(&model));
        Ok(model)
    }

    fn build_model(&self, config: ModelConfig, fields: Vec<FieldSpec>) -> RegistryResult<Arc<Model>> {
        let name = config.name.clone();
        let injected = self
            .mapper
            .get_mapper(&name)
            .map(|mapper| mapper(&name, &fields))
            .unwrap_or_default();

        let model = Model::build(config, fields, injected, Arc::clone(&self.builder))
            .map_err(|source| RegistryError::Build {
                model: name.clone(),
                source,
            })?;
        debug!(model = %name, members = model.composite_type().len(), "model built");
        Ok(Arc::new(model))
    }

    /// Builds `config` and every live model whose resolved fields change
    /// because of it. Nothing is committed unless all of them build.
    fn set_model_locked(&self, registry: &mut Registry, config: ModelConfig) -> RegistryResult<Arc<Model>> {
        if config.name.is_empty() {
            return Err(RegistryError::EmptyName);
        }

        let name = config.name.clone();
        let mut merged = registry.configs.clone();
        merged.insert(name.clone(), config.clone());
        let mut resolved = resolve(&merged)?;
        let previous = resolve(&registry.configs).unwrap_or_default();

        let fields = resolved.remove(&name).unwrap_or_default();
        let model = self.build_model(config, fields)?;

        let mut staged = vec![Arc::clone(&model)];
        for (dependent, fields) in resolved {
            if !registry.models.contains_key(&dependent) || previous.get(&dependent) == Some(&fields) {
                continue;
            }
            let Some(config) = merged.get(&dependent).cloned() else {
                continue;
            };
            staged.push(self.build_model(config, fields)?);
        }

        registry.configs = merged;
        for built in staged {
            if built.name() != name {
                debug!(model = %built.name(), changed = %name, "dependent model rebuilt");
            }
            registry.models.insert(built.name().to_string(), built);
        }
        Ok(model)
    }

    /// Adds a model. Fails if one with the same name exists.
    pub fn new_model(&self, config: ModelConfig) -> RegistryResult<Arc<Model>> {
        let mut registry = self.lock();
        if registry.models.contains_key(&config.name) {
            return Err(RegistryError::AlreadyExists(config.name));
        }
        self.set_model_locked(&mut registry, config)
    }

    /// Adds or replaces a model, resolving it against everything loaded.
    /// Models that `ref` or `extend` it are rebuilt along with it.
    pub fn set_model(&self, config: ModelConfig) -> RegistryResult<Arc<Model>> {
        let mut registry = self.lock();
        self.set_model_locked(&mut registry, config)
    }

    pub fn get_model(&self, name: &str) -> Option<Arc<Model>> {
        self.lock().models.get(name).cloned()
    }

    /// Every model, ordered by name.
    pub fn models(&self) -> Vec<Arc<Model>> {
        let registry = self.lock();
        let mut models: Vec<Arc<Model>> = registry.models.values().cloned().collect();
        models.sort_by(|a, b| a.name().cmp(b.name()));
        models
    }

    pub fn model_names(&self) -> Vec<String> {
        let registry = self.lock();
        let mut names: Vec<String> = registry.models.keys().cloned().collect();
        names.sort();
        names
    }

    /// Produces an instance of the registered model named like `model`.
    pub fn produce(&self, model: &Model, values: &[Value]) -> RegistryResult<Record> {
        self.produce_by_name(model.name(), values)
    }

    pub fn produce_by_name(&self, name: &str, values: &[Value]) -> RegistryResult<Record> {
        let model = self
            .get_model(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
        Ok(model.new_instance(values)?)
    }
}

impl std::fmt::Debug for Models {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Models")
            .field("models", &self.model_names())
            .finish()
    }
}

fn read_schema_file(path: &Path) -> RegistryResult<Vec<ModelConfig>> {
    let data = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut configs = parse_models(&data, &path.display().to_string())?;
    for config in &mut configs {
        config.set_source(path);
    }
    Ok(configs)
}

/// Every `.json` file below `dir`, in path order. Directories whose name
/// starts with `.` are not entered.
fn collect_schema_files(dir: &Path) -> RegistryResult<Vec<PathBuf>> {
    let io_err = |source| RegistryError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = std::fs::read_dir(dir)
        .map_err(io_err)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_err)?;
    entries.sort();

    let mut files = Vec::new();
    for path in entries {
        if path.is_dir() {
            let hidden = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with('.'));
            if !hidden {
                files.extend(collect_schema_files(&path)?);
            }
        } else if path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    Ok(files)
}
