//! Configuration management for shellq
//!
//! The configuration is a YAML document listing the models the assistant can
//! talk to, user preferences and logging options. [`ConfigStore`] owns the
//! file on disk and its backup copy. It is constructed explicitly and passed
//! to whatever needs it.

use crate::error::{Result, ShellqError};
use crate::providers::{Credentials, Message, ProviderKind};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration written on first run and by `q config reset`
pub const DEFAULT_CONFIG: &str = include_str!("../config/default.yaml");

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// Models available for selection
    pub models: Vec<ModelConfig>,

    /// User preferences
    #[serde(default)]
    pub preferences: Preferences,

    /// Log output options
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// One model endpoint and the prompt used with it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelConfig {
    /// Model identifier sent to the endpoint
    pub name: String,

    /// Full URL of the chat completion endpoint
    pub endpoint: String,

    /// Wire format spoken by the endpoint
    #[serde(default)]
    pub provider: ProviderKind,

    /// Name of the environment variable holding the API key
    pub auth_env_var: String,

    /// Name of the environment variable holding an organization id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_env_var: Option<String>,

    /// Name of the environment variable holding a project id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_env_var: Option<String>,

    /// Sampling temperature
    #[serde(default)]
    pub temperature: f32,

    /// System prompt and few-shot examples that seed every conversation
    #[serde(default)]
    pub prompt: Vec<Message>,
}

impl ModelConfig {
    /// Resolves credentials from the process environment
    ///
    /// # Errors
    ///
    /// Returns `MissingCredentials` when the API key variable is unset or empty
    pub fn resolve_credentials(&self) -> Result<Credentials> {
        self.resolve_credentials_with(|name| std::env::var(name).ok())
    }

    /// Resolves credentials through an arbitrary variable lookup
    ///
    /// Optional organization and project values are only kept when the
    /// variable is set to something non-empty.
    pub fn resolve_credentials_with<F>(&self, lookup: F) -> Result<Credentials>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let api_key = non_empty(&self.auth_env_var).ok_or_else(|| {
            ShellqError::MissingCredentials {
                provider: self.provider.display_name().to_string(),
                env_var: self.auth_env_var.clone(),
            }
        })?;

        Ok(Credentials {
            api_key,
            organization: self.org_env_var.as_deref().and_then(non_empty),
            project: self.project_env_var.as_deref().and_then(non_empty),
        })
    }
}

/// User preferences
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Preferences {
    /// Model used when `--model` is not given
    #[serde(default)]
    pub default_model: String,

    /// Overall timeout for one streaming request
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_request_timeout() -> u64 {
    120
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            default_model: String::new(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

/// Log output options
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub level: String,

    /// File receiving log output; logging to the terminal would corrupt
    /// the interactive view
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// Write JSON lines instead of human readable text
    #[serde(default)]
    pub json_format: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_path: None,
            json_format: false,
        }
    }
}

impl AppConfig {
    /// Parses the configuration embedded in the binary
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the embedded document is invalid
    pub fn embedded_default() -> Result<Self> {
        Self::from_yaml(DEFAULT_CONFIG)
    }

    /// Parses a configuration document
    pub fn from_yaml(contents: &str) -> Result<Self> {
        serde_yaml::from_str(contents)
            .map_err(|e| ShellqError::Config(format!("Failed to parse config: {}", e)).into())
    }

    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error describing the first problem found
    pub fn validate(&self) -> Result<()> {
        if self.models.is_empty() {
            return Err(ShellqError::Config("No models configured".to_string()).into());
        }

        let mut seen = HashSet::new();
        for model in &self.models {
            if model.name.trim().is_empty() {
                return Err(ShellqError::Config("Model name cannot be empty".to_string()).into());
            }
            if model.endpoint.trim().is_empty() {
                return Err(ShellqError::Config(format!(
                    "Model '{}' has an empty endpoint",
                    model.name
                ))
                .into());
            }
            if model.auth_env_var.trim().is_empty() {
                return Err(ShellqError::Config(format!(
                    "Model '{}' has an empty auth_env_var",
                    model.name
                ))
                .into());
            }
            if !seen.insert(model.name.as_str()) {
                return Err(ShellqError::Config(format!(
                    "Model '{}' is configured more than once",
                    model.name
                ))
                .into());
            }
        }

        if self.preferences.request_timeout_seconds == 0 {
            return Err(ShellqError::Config(
                "request_timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }

    /// Looks up a model by name
    pub fn model(&self, name: &str) -> Option<&ModelConfig> {
        self.models.iter().find(|model| model.name == name)
    }

    /// Chooses the model for this run
    ///
    /// An explicit override must name a configured model. Otherwise the
    /// preferred default is used, falling back to the first model when the
    /// preference is empty or stale.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unknown override or when no
    /// models are configured
    pub fn select_model(&self, requested: Option<&str>) -> Result<&ModelConfig> {
        if let Some(name) = requested {
            return self.model(name).ok_or_else(|| {
                ShellqError::Config(format!(
                    "Unknown model '{}'. Configured models: {}",
                    name,
                    self.model_names().join(", ")
                ))
                .into()
            });
        }

        let preferred = self.preferences.default_model.as_str();
        if !preferred.is_empty() {
            if let Some(model) = self.model(preferred) {
                return Ok(model);
            }
            tracing::warn!(
                default_model = preferred,
                "Default model is not configured, using the first model"
            );
        }

        self.models
            .first()
            .ok_or_else(|| ShellqError::Config("No models configured".to_string()).into())
    }

    /// Names of all configured models in file order
    pub fn model_names(&self) -> Vec<&str> {
        self.models.iter().map(|model| model.name.as_str()).collect()
    }
}

/// Owner of the configuration file and its backup copy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigStore {
    path: PathBuf,
    backup_path: PathBuf,
}

impl ConfigStore {
    /// Creates a store for the file at `path`; the backup lives next to it
    /// with a `.bak` suffix
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut backup = path.clone().into_os_string();
        backup.push(".bak");
        Self {
            path,
            backup_path: PathBuf::from(backup),
        }
    }

    /// Creates a store at the per-user configuration directory
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no home directory can be found
    pub fn default_location() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "shellq").ok_or_else(|| {
            ShellqError::Config("Could not determine the user configuration directory".to_string())
        })?;
        Ok(Self::new(dirs.config_dir().join("config.yaml")))
    }

    /// Path of the configuration file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the last known good copy
    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    /// Loads and validates the configuration, creating it on first run
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the file cannot be read, parsed
    /// or validated
    pub fn load(&self) -> Result<AppConfig> {
        self.ensure_exists()?;

        let contents = fs::read_to_string(&self.path).map_err(|e| {
            ShellqError::Config(format!(
                "Failed to read config file {}: {}",
                self.path.display(),
                e
            ))
        })?;
        let config = AppConfig::from_yaml(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Writes the embedded default when no configuration file exists yet
    ///
    /// # Returns
    ///
    /// Whether the file was created by this call
    pub fn ensure_exists(&self) -> Result<bool> {
        if self.path.exists() {
            return Ok(false);
        }
        self.write_file(&self.path, DEFAULT_CONFIG)?;
        Ok(true)
    }

    /// Writes the configuration and refreshes the backup copy
    pub fn save(&self, config: &AppConfig) -> Result<()> {
        config.validate()?;
        let contents = serde_yaml::to_string(config)?;
        self.write_file(&self.path, &contents)?;
        self.write_file(&self.backup_path, &contents)?;
        tracing::info!(path = %self.path.display(), "Configuration saved");
        Ok(())
    }

    /// Copies the current file over the backup after it loaded successfully
    pub fn mark_known_good(&self) -> Result<()> {
        fs::copy(&self.path, &self.backup_path)?;
        Ok(())
    }

    /// Replaces the configuration with the embedded default
    pub fn reset(&self) -> Result<()> {
        self.write_file(&self.path, DEFAULT_CONFIG)?;
        self.write_file(&self.backup_path, DEFAULT_CONFIG)?;
        tracing::info!(path = %self.path.display(), "Configuration reset to defaults");
        Ok(())
    }

    /// Restores the configuration from its backup copy
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no backup exists
    pub fn revert(&self) -> Result<()> {
        if !self.backup_path.exists() {
            return Err(ShellqError::Config(format!(
                "No backup found at {}",
                self.backup_path.display()
            ))
            .into());
        }
        fs::copy(&self.backup_path, &self.path)?;
        tracing::info!(path = %self.path.display(), "Configuration reverted from backup");
        Ok(())
    }

    fn write_file(&self, path: &Path, contents: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::Role;
    use tempfile::TempDir;

    fn sample_model(name: &str) -> ModelConfig {
        ModelConfig {
            name: name.to_string(),
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            provider: ProviderKind::OpenAi,
            auth_env_var: "OPENAI_API_KEY".to_string(),
            org_env_var: Some("OPENAI_ORG_ID".to_string()),
            project_env_var: None,
            temperature: 0.0,
            prompt: vec![Message::system("be brief")],
        }
    }

    fn sample_config() -> AppConfig {
        AppConfig {
            models: vec![sample_model("a"), sample_model("b")],
            preferences: Preferences {
                default_model: "b".to_string(),
                ..Preferences::default()
            },
            logging: LoggingConfig::default(),
        }
    }

    #[test]
    fn test_embedded_default_is_valid() {
        let config = AppConfig::embedded_default().unwrap();
        config.validate().unwrap();
        let selected = config.select_model(None).unwrap();
        assert_eq!(selected.name, config.preferences.default_model);
        assert_eq!(selected.prompt[0].role, Role::System);
        assert!(config
            .models
            .iter()
            .any(|model| model.provider == ProviderKind::Gemini));
    }

    #[test]
    fn test_provider_defaults_to_openai() {
        let yaml = r#"
models:
  - name: local
    endpoint: http://localhost:8080/v1/chat/completions
    auth_env_var: LOCAL_KEY
"#;
        let config = AppConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.models[0].provider, ProviderKind::OpenAi);
        assert!(config.models[0].prompt.is_empty());
        assert_eq!(config.preferences.request_timeout_seconds, 120);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_validate_rejects_problems() {
        let mut config = sample_config();
        config.models.clear();
        assert!(config.validate().is_err());

        let mut config = sample_config();
        config.models[1].name = "a".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("more than once"));

        let mut config = sample_config();
        config.models[0].auth_env_var = " ".to_string();
        assert!(config.validate().is_err());

        let mut config = sample_config();
        config.preferences.request_timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_select_model() {
        let config = sample_config();
        assert_eq!(config.select_model(None).unwrap().name, "b");
        assert_eq!(config.select_model(Some("a")).unwrap().name, "a");

        let err = config.select_model(Some("zzz")).unwrap_err();
        assert!(err.to_string().contains("Unknown model 'zzz'"));

        let mut stale = sample_config();
        stale.preferences.default_model = "gone".to_string();
        assert_eq!(stale.select_model(None).unwrap().name, "a");
    }

    #[test]
    fn test_resolve_credentials() {
        let model = sample_model("a");
        let creds = model
            .resolve_credentials_with(|name| match name {
                "OPENAI_API_KEY" => Some("sk-test".to_string()),
                "OPENAI_ORG_ID" => Some("".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(creds.api_key, "sk-test");
        assert_eq!(creds.organization, None);
        assert_eq!(creds.project, None);
    }

    #[test]
    fn test_missing_credentials() {
        let model = sample_model("a");
        let err = model.resolve_credentials_with(|_| None).unwrap_err();
        match err.downcast_ref::<ShellqError>() {
            Some(ShellqError::MissingCredentials { env_var, .. }) => {
                assert_eq!(env_var, "OPENAI_API_KEY")
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    #[serial_test::serial]
    fn test_resolve_credentials_from_environment() {
        let mut model = sample_model("a");
        model.auth_env_var = "SHELLQ_TEST_API_KEY".to_string();
        model.org_env_var = None;

        std::env::set_var("SHELLQ_TEST_API_KEY", "sk-env");
        let creds = model.resolve_credentials().unwrap();
        assert_eq!(creds.api_key, "sk-env");

        std::env::set_var("SHELLQ_TEST_API_KEY", "  ");
        assert!(model.resolve_credentials().is_err());

        std::env::remove_var("SHELLQ_TEST_API_KEY");
        assert!(model.resolve_credentials().is_err());
    }

    #[test]
    fn test_store_creates_default_on_first_load() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path().join("nested").join("config.yaml"));
        assert!(!store.path().exists());

        let config = store.load().unwrap();
        assert!(store.path().exists());
        assert_eq!(config, AppConfig::embedded_default().unwrap());
        assert_eq!(
            store.backup_path(),
            dir.path().join("nested").join("config.yaml.bak")
        );
    }

    #[test]
    fn test_ensure_exists_reports_creation_once() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path().join("config.yaml"));

        assert!(store.ensure_exists().unwrap());
        assert!(!store.ensure_exists().unwrap());
        assert_eq!(fs::read_to_string(store.path()).unwrap(), DEFAULT_CONFIG);
    }

    #[test]
    fn test_store_save_writes_backup_and_revert_restores_it() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path().join("config.yaml"));
        let config = sample_config();
        store.save(&config).unwrap();

        fs::write(store.path(), "models: [not: valid").unwrap();
        assert!(store.load().is_err());

        store.revert().unwrap();
        assert_eq!(store.load().unwrap(), config);
    }

    #[test]
    fn test_store_reset_restores_default() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path().join("config.yaml"));
        store.save(&sample_config()).unwrap();

        store.reset().unwrap();
        assert_eq!(store.load().unwrap(), AppConfig::embedded_default().unwrap());
    }

    #[test]
    fn test_revert_without_backup_fails() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path().join("config.yaml"));
        let err = store.revert().unwrap_err();
        assert!(err.to_string().contains("No backup found"));
    }

    #[test]
    fn test_mark_known_good_copies_file() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path().join("config.yaml"));
        store.load().unwrap();
        assert!(!store.backup_path().exists());
        store.mark_known_good().unwrap();
        assert_eq!(
            fs::read_to_string(store.backup_path()).unwrap(),
            DEFAULT_CONFIG
        );
    }
}
