use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One entry of the model catalog: a short key the chat UI sends, the
/// identifier the upstream API expects, and optional per-million-token
/// pricing used for display.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModelDescriptor {
    pub key: String,
    pub upstream_id: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pricing: Option<ModelPricing>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModelPricing {
    pub input: Decimal,
    pub output: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelCatalogConfig {
    pub default_model: String,
    pub models: Vec<ModelDescriptor>,
}

impl ModelCatalogConfig {
    pub fn load(path: &Path) -> Result<Self, String> {
        let raw = std::fs::read_to_string(path)
            .map_err(|err| format!("failed to read {}: {}", path.display(), err))?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|err| format!("failed to parse {}: {}", path.display(), err))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.models.is_empty() {
            return Err("model catalog is empty".to_string());
        }
        if !self.models.iter().any(|m| m.key == self.default_model) {
            return Err(format!(
                "default_model '{}' is not in the catalog",
                self.default_model
            ));
        }
        Ok(())
    }

    /// Catalog shipped with the binary, used when no catalog file is
    /// configured.
    pub fn builtin() -> Self {
        Self {
            default_model: "qwen-2.5-72b".to_string(),
            models: vec![
                ModelDescriptor {
                    key: "qwen-2.5-72b".to_string(),
                    upstream_id: "Qwen/Qwen2.5-72B-Instruct".to_string(),
                    display_name: "Qwen 2.5 72B Instruct".to_string(),
                    pricing: None,
                },
                ModelDescriptor {
                    key: "llama-3.1-70b".to_string(),
                    upstream_id: "meta-llama/Meta-Llama-3.1-70B-Instruct".to_string(),
                    display_name: "Llama 3.1 70B Instruct".to_string(),
                    pricing: None,
                },
                ModelDescriptor {
                    key: "mistral-nemo".to_string(),
                    upstream_id: "mistralai/Mistral-Nemo-Instruct-2407".to_string(),
                    display_name: "Mistral Nemo Instruct".to_string(),
                    pricing: None,
                },
            ],
        }
    }
}
