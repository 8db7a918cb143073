use crate::config::{ModelCatalogConfig, ModelDescriptor};
use std::collections::HashMap;
use std::sync::Arc;

/// Read-only model catalog, built once at startup. Lookups never fail: an
/// absent or unknown key resolves to the default descriptor.
#[derive(Clone)]
pub struct ModelRegistry {
    models: Arc<HashMap<String, ModelDescriptor>>,
    default_key: String,
}

impl ModelRegistry {
    pub fn from_config(config: ModelCatalogConfig) -> Result<Self, String> {
        config.validate()?;
        let default_key = config.default_model;
        let models = config
            .models
            .into_iter()
            .map(|descriptor| (descriptor.key.clone(), descriptor))
            .collect();
        Ok(Self {
            models: Arc::new(models),
            default_key,
        })
    }

    pub fn lookup(&self, key: Option<&str>) -> &ModelDescriptor {
        key.and_then(|k| self.models.get(k))
            .unwrap_or_else(|| self.default_descriptor())
    }

    pub fn default_descriptor(&self) -> &ModelDescriptor {
        // Validated at construction: the default key is always present.
        &self.models[&self.default_key]
    }

    pub fn all(&self) -> Vec<&ModelDescriptor> {
        let mut descriptors: Vec<&ModelDescriptor> = self.models.values().collect();
        descriptors.sort_by(|a, b| a.key.cmp(&b.key));
        descriptors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ModelRegistry {
        ModelRegistry::from_config(ModelCatalogConfig::builtin()).unwrap()
    }

    #[test]
    fn known_key_resolves_to_its_descriptor() {
        let registry = registry();
        let descriptor = registry.lookup(Some("llama-3.1-70b"));
        assert_eq!(descriptor.upstream_id, "meta-llama/Meta-Llama-3.1-70B-Instruct");
    }

    #[test]
    fn unknown_and_absent_keys_fall_back_to_default() {
        let registry = registry();
        let default_id = registry.default_descriptor().upstream_id.clone();
        assert_eq!(registry.lookup(Some("gpt-oss-120b")).upstream_id, default_id);
        assert_eq!(registry.lookup(None).upstream_id, default_id);
    }

    #[test]
    fn repeated_lookups_are_identical() {
        let registry = registry();
        let first = registry.lookup(Some("mistral-nemo")).clone();
        let second = registry.lookup(Some("mistral-nemo")).clone();
        assert_eq!(first, second);
    }

    #[test]
    fn all_is_sorted_by_key() {
        let registry = registry();
        let keys: Vec<&str> = registry.all().into_iter().map(|d| d.key.as_str()).collect();
        assert_eq!(keys, vec!["llama-3.1-70b", "mistral-nemo", "qwen-2.5-72b"]);
    }
}
