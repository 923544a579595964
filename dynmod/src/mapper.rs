//! Per-model injection callbacks.
//!
//! A combine mapper is consulted whenever the registry builds a model: the
//! callback registered under the model's name receives the model name and
//! its resolved fields, and returns the prototypes to embed.

use crate::builder::InjectedMembers;
use dynmod_schema::FieldSpec;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Callback producing the injected members for one model.
pub type MapperFn = Arc<dyn Fn(&str, &[FieldSpec]) -> InjectedMembers + Send + Sync>;

/// Wraps a closure as a [`MapperFn`].
pub fn mapper_fn<F>(f: F) -> MapperFn
where
    F: Fn(&str, &[FieldSpec]) -> InjectedMembers + Send + Sync + 'static,
{
    Arc::new(f)
}

pub trait CombineMapper: Send + Sync {
    /// Registers a callback for `model`.
    ///
    /// # Panics
    ///
    /// Implementations panic when `model` already has a callback.
    fn register(&self, model: &str, mapper: MapperFn);

    fn unregister(&self, model: &str);

    fn get_mapper(&self, model: &str) -> Option<MapperFn>;
}

/// Thread-safe name → callback table.
#[derive(Default)]
pub struct BasicMapper {
    maps: Mutex<HashMap<String, MapperFn>>,
}

impl BasicMapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.maps.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CombineMapper for BasicMapper {
    fn register(&self, model: &str, mapper: MapperFn) {
        if model.is_empty() {
            return;
        }
        let mut maps = self.maps.lock().unwrap_or_else(PoisonError::into_inner);
        if maps.contains_key(model) {
            drop(maps);
            panic!("combine mapper for model {model} already registered");
        }
        maps.insert(model.to_string(), mapper);
        debug!(model = %model, "combine mapper registered");
    }

    fn unregister(&self, model: &str) {
        let mut maps = self.maps.lock().unwrap_or_else(PoisonError::into_inner);
        if maps.remove(model).is_some() {
            debug!(model = %model, "combine mapper removed");
        }
    }

    fn get_mapper(&self, model: &str) -> Option<MapperFn> {
        let maps = self.maps.lock().unwrap_or_else(PoisonError::into_inner);
        maps.get(model).cloned()
    }
}

impl std::fmt::Debug for BasicMapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let maps = self.maps.lock().unwrap_or_else(PoisonError::into_inner);
        let mut models: Vec<&str> = maps.keys().map(String::as_str).collect();
        models.sort_unstable();
        f.debug_struct("BasicMapper").field("models", &models).finish()
    }
}
