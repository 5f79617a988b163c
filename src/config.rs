use anyhow::Context;
use serde::Deserialize;
use std::path::PathBuf;

/// Server settings, read from the client's `initializationOptions`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    /// Base interface that marks the configuration declaration
    pub marker_type: String,
    /// Workspace-relative files searched for the configuration declaration
    /// when the requested document has none
    pub schema_files: Vec<PathBuf>,
    /// Directory names never indexed
    pub exclude_dirs: Vec<String>,
    pub max_completion_items: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            marker_type: "EggAppConfig".to_string(),
            schema_files: Vec::new(),
            exclude_dirs: ["node_modules", ".git", "dist", "run", "logs", "coverage"]
                .iter()
                .map(|d| d.to_string())
                .collect(),
            max_completion_items: 1000,
        }
    }
}

impl ServerConfig {
    pub fn from_initialization_options(options: Option<serde_json::Value>) -> anyhow::Result<Self> {
        match options {
            None | Some(serde_json::Value::Null) => Ok(Self::default()),
            Some(value) => serde_json::from_value(value).context("invalid initializationOptions"),
        }
    }

    pub fn is_excluded_dir(&self, name: &str) -> bool {
        self.exclude_dirs.iter().any(|d| d == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_without_options() {
        let config = ServerConfig::from_initialization_options(None).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.marker_type, "EggAppConfig");
        assert!(config.is_excluded_dir("node_modules"));
    }

    #[test]
    fn test_partial_options_keep_defaults() {
        let config = ServerConfig::from_initialization_options(Some(json!({
            "markerType": "AppConfigBase",
            "schemaFiles": ["typings/config/index.d.ts"]
        })))
        .unwrap();

        assert_eq!(config.marker_type, "AppConfigBase");
        assert_eq!(config.schema_files, vec![PathBuf::from("typings/config/index.d.ts")]);
        assert_eq!(config.max_completion_items, 1000);
        assert!(config.is_excluded_dir(".git"));
    }

    #[test]
    fn test_invalid_options() {
        let result = ServerConfig::from_initialization_options(Some(json!({
            "maxCompletionItems": "many"
        })));
        assert!(result.is_err());
    }
}
