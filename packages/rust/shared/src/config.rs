//! Application configuration for autopress.
//!
//! The config file is `autopress.toml`, looked up at `--config`, then in the
//! working directory, then at `~/.autopress/autopress.toml`. It is read once
//! at startup and never mutated afterwards.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, de};
use url::Url;

use crate::error::{AutopressError, Result};
use crate::types::PostStatus;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "autopress.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".autopress";

/// Placeholder written in place of secrets by [`AppConfig::redacted`].
const REDACTED: &str = "********";

// ---------------------------------------------------------------------------
// Config structs (matching autopress.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Text-generation service settings.
    pub openai: OpenAiConfig,

    /// CMS connection and post settings.
    pub wordpress: WordPressConfig,

    /// Batch settings.
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// `[openai]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// API key. When empty, the key is read from `api_key_env`.
    #[serde(default)]
    pub api_key: String,

    /// Env var consulted when `api_key` is empty.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Model identifier sent with every generation request.
    pub model: String,

    /// Base URL of the OpenAI-compatible API.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Append `credit_text` to every article (`yes`/`no` or a boolean).
    #[serde(default, deserialize_with = "deserialize_yes_no")]
    pub add_credits: bool,

    /// Credit line appended when `add_credits` is on.
    #[serde(default)]
    pub credit_text: String,
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn default_api_base() -> String {
    "https://api.openai.com/v1".into()
}

/// `[wordpress]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordPressConfig {
    pub username: String,
    /// Application password used for basic auth.
    pub password: String,
    /// `publish`, or anything else for the CMS default (draft).
    #[serde(default = "default_post_status")]
    pub post_status: String,
    /// Base REST endpoint, e.g. `https://example.com/wp-json/wp/v2`.
    pub site: String,
}

fn default_post_status() -> String {
    "draft".into()
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Maximum generation-and-publish tasks in flight.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Topic spreadsheet (CSV).
    #[serde(default = "default_input_file")]
    pub input_file: String,

    /// Plain-text system instruction for the generator.
    #[serde(default = "default_system_prompt_file")]
    pub system_prompt_file: String,

    /// Per-request HTTP timeout for both remote APIs.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            input_file: default_input_file(),
            system_prompt_file: default_system_prompt_file(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_concurrency() -> usize {
    2
}
fn default_input_file() -> String {
    "input.csv".into()
}
fn default_system_prompt_file() -> String {
    "system_prompt.txt".into()
}
fn default_request_timeout_secs() -> u64 {
    120
}

/// Accept `yes`/`no` strings as well as TOML booleans.
fn deserialize_yes_no<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum YesNo {
        Bool(bool),
        Text(String),
    }

    match YesNo::deserialize(deserializer)? {
        YesNo::Bool(value) => Ok(value),
        YesNo::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
            "yes" | "y" | "true" | "on" => Ok(true),
            "no" | "n" | "false" | "off" | "" => Ok(false),
            other => Err(de::Error::custom(format!(
                "expected yes or no, got '{other}'"
            ))),
        },
    }
}

impl AppConfig {
    /// A filled-in example config for `autopress config init`.
    pub fn template() -> Self {
        Self {
            openai: OpenAiConfig {
                api_key: String::new(),
                api_key_env: default_api_key_env(),
                model: "gpt-4o-mini".into(),
                api_base: default_api_base(),
                add_credits: false,
                credit_text: "This article was generated with AI assistance.".into(),
            },
            wordpress: WordPressConfig {
                username: "editor".into(),
                password: "application-password".into(),
                post_status: default_post_status(),
                site: "https://example.com/wp-json/wp/v2".into(),
            },
            pipeline: PipelineConfig::default(),
        }
    }

    /// Copy of the config with credentials masked, for display.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.openai.api_key.is_empty() {
            copy.openai.api_key = REDACTED.into();
        }
        copy.wordpress.password = REDACTED.into();
        copy
    }

    /// The API key from the file, or from the configured env var.
    pub fn resolved_api_key(&self) -> Option<String> {
        let key = self.openai.api_key.trim();
        if !key.is_empty() {
            return Some(key.to_string());
        }
        std::env::var(&self.openai.api_key_env)
            .ok()
            .filter(|v| !v.trim().is_empty())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.pipeline.request_timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// Component settings (runtime, derived from the config)
// ---------------------------------------------------------------------------

/// Post assembly settings.
#[derive(Debug, Clone)]
pub struct PublishSettings {
    pub add_credits: bool,
    pub credit_text: String,
    pub post_status: PostStatus,
}

impl From<&AppConfig> for PublishSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            add_credits: config.openai.add_credits,
            credit_text: config.openai.credit_text.clone(),
            post_status: PostStatus::from_config(&config.wordpress.post_status),
        }
    }
}

/// Text-generation client settings.
#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
}

impl TryFrom<&AppConfig> for GeneratorSettings {
    type Error = AutopressError;

    fn try_from(config: &AppConfig) -> Result<Self> {
        let api_key = config.resolved_api_key().ok_or_else(|| {
            AutopressError::config(format!(
                "OpenAI API key not found. Set `openai.api_key` or the {} environment variable.",
                config.openai.api_key_env
            ))
        })?;

        Ok(Self {
            api_base: config.openai.api_base.trim().trim_end_matches('/').to_string(),
            api_key,
            model: config.openai.model.trim().to_string(),
            timeout: config.request_timeout(),
        })
    }
}

/// CMS connection settings.
#[derive(Debug, Clone)]
pub struct CmsSettings {
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub timeout: Duration,
}

impl From<&AppConfig> for CmsSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            base_url: config.wordpress.site.trim().trim_end_matches('/').to_string(),
            username: config.wordpress.username.clone(),
            password: config.wordpress.password.clone(),
            timeout: config.request_timeout(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.autopress/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| AutopressError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the user config file (`~/.autopress/autopress.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Find the config file: explicit path, then `./autopress.toml`, then the
/// user config file.
pub fn locate_config(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(AutopressError::config(format!(
                "config file {} does not exist",
                path.display()
            )));
        }
        return Ok(path.to_path_buf());
    }

    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return Ok(local);
    }

    let user = config_file_path()?;
    if user.exists() {
        return Ok(user);
    }

    Err(AutopressError::config(format!(
        "no {CONFIG_FILE_NAME} found in the working directory or at {}. \
         Run `autopress config init` to create one.",
        user.display()
    )))
}

/// Locate, load and validate the config.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    let path = locate_config(explicit)?;
    tracing::debug!(?path, "loading config");
    let config = load_config_from(&path)?;
    validate_config(&config)?;
    Ok(config)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| AutopressError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        AutopressError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Write a template config file and return its path. Refuses to overwrite.
pub fn init_config(path: Option<&Path>) -> Result<PathBuf> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => config_file_path()?,
    };

    if path.exists() {
        return Err(AutopressError::config(format!(
            "{} already exists; remove it first to regenerate",
            path.display()
        )));
    }

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| AutopressError::io(dir, e))?;
    }

    let content = toml::to_string_pretty(&AppConfig::template())
        .map_err(|e| AutopressError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| AutopressError::io(&path, e))?;
    tracing::info!(?path, "created config file");

    Ok(path)
}

/// Reject configs that cannot possibly work before any network call.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    if config.openai.model.trim().is_empty() {
        return Err(AutopressError::config("`openai.model` must not be empty"));
    }

    if config.resolved_api_key().is_none() {
        let var_name = &config.openai.api_key_env;
        return Err(AutopressError::config(format!(
            "OpenAI API key not found. Set `openai.api_key` or the {var_name} environment variable."
        )));
    }

    if config.wordpress.username.trim().is_empty() {
        return Err(AutopressError::config("`wordpress.username` must not be empty"));
    }

    let site = Url::parse(config.wordpress.site.trim()).map_err(|e| {
        AutopressError::config(format!(
            "`wordpress.site` is not a valid URL ('{}'): {e}",
            config.wordpress.site
        ))
    })?;
    if site.scheme() != "http" && site.scheme() != "https" {
        return Err(AutopressError::config(format!(
            "`wordpress.site` must be http or https, got '{}'",
            site.scheme()
        )));
    }

    if config.pipeline.concurrency == 0 {
        return Err(AutopressError::config("`pipeline.concurrency` must be at least 1"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[openai]
api_key = "sk-test"
model = "gpt-4o-mini"

[wordpress]
username = "editor"
password = "secret"
site = "https://example.com/wp-json/wp/v2/"
"#;

    #[test]
    fn minimal_config_uses_defaults() {
        let config: AppConfig = toml::from_str(MINIMAL).expect("parse");
        assert!(!config.openai.add_credits);
        assert_eq!(config.openai.api_base, "https://api.openai.com/v1");
        assert_eq!(config.wordpress.post_status, "draft");
        assert_eq!(config.pipeline.concurrency, 2);
        assert_eq!(config.pipeline.input_file, "input.csv");
        validate_config(&config).expect("valid");
    }

    #[test]
    fn missing_required_key_is_rejected() {
        let toml_str = r#"
[openai]
model = "gpt-4o-mini"

[wordpress]
username = "editor"
password = "secret"
"#;
        let err = toml::from_str::<AppConfig>(toml_str).unwrap_err();
        assert!(err.to_string().contains("site"));
    }

    #[test]
    fn add_credits_accepts_yes_no_and_bool() {
        for (raw, expected) in [("\"yes\"", true), ("\"No\"", false), ("true", true)] {
            let toml_str = MINIMAL.replace(
                "model = \"gpt-4o-mini\"",
                &format!("model = \"gpt-4o-mini\"\nadd_credits = {raw}"),
            );
            let config: AppConfig = toml::from_str(&toml_str).expect("parse");
            assert_eq!(config.openai.add_credits, expected, "input {raw}");
        }

        let toml_str = MINIMAL.replace(
            "model = \"gpt-4o-mini\"",
            "model = \"gpt-4o-mini\"\nadd_credits = \"maybe\"",
        );
        assert!(toml::from_str::<AppConfig>(&toml_str).is_err());
    }

    #[test]
    fn publish_settings_from_app_config() {
        let mut config: AppConfig = toml::from_str(MINIMAL).expect("parse");
        config.wordpress.post_status = "Publish".into();
        config.openai.add_credits = true;
        config.openai.credit_text = "Generated by AI".into();

        let settings = PublishSettings::from(&config);
        assert!(settings.add_credits);
        assert_eq!(settings.credit_text, "Generated by AI");
        assert_eq!(settings.post_status, PostStatus::Publish);
    }

    #[test]
    fn generator_settings_from_app_config() {
        let config: AppConfig = toml::from_str(MINIMAL).expect("parse");
        let settings = GeneratorSettings::try_from(&config).expect("settings");
        assert_eq!(settings.api_key, "sk-test");
        assert_eq!(settings.api_base, "https://api.openai.com/v1");
        assert_eq!(settings.model, "gpt-4o-mini");
    }

    #[test]
    fn cms_settings_trim_trailing_slash() {
        let config: AppConfig = toml::from_str(MINIMAL).expect("parse");
        let cms = CmsSettings::from(&config);
        assert_eq!(cms.base_url, "https://example.com/wp-json/wp/v2");
        assert_eq!(cms.timeout, Duration::from_secs(120));
    }

    #[test]
    fn api_key_validation() {
        let mut config: AppConfig = toml::from_str(MINIMAL).expect("parse");
        config.openai.api_key = String::new();
        // Use a unique env var name to avoid interfering with other tests
        config.openai.api_key_env = "AUTOPRESS_TEST_NONEXISTENT_KEY_12345".into();
        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("API key not found"));
    }

    #[test]
    fn invalid_site_and_concurrency_rejected() {
        let mut config: AppConfig = toml::from_str(MINIMAL).expect("parse");
        config.wordpress.site = "not a url".into();
        assert!(validate_config(&config).is_err());

        let mut config: AppConfig = toml::from_str(MINIMAL).expect("parse");
        config.pipeline.concurrency = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn redacted_hides_secrets() {
        let config: AppConfig = toml::from_str(MINIMAL).expect("parse");
        let shown = toml::to_string_pretty(&config.redacted()).expect("serialize");
        assert!(!shown.contains("sk-test"));
        assert!(!shown.contains("secret"));
        assert!(shown.contains(REDACTED));
    }

    #[test]
    fn template_roundtrip() {
        let toml_str = toml::to_string_pretty(&AppConfig::template()).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.openai.model, "gpt-4o-mini");
        assert_eq!(parsed.pipeline.concurrency, 2);
    }

    #[test]
    fn init_then_load_from_path() {
        let dir = std::env::temp_dir().join(format!("autopress-config-{}", uuid::Uuid::now_v7()));
        let path = dir.join("autopress.toml");

        let written = init_config(Some(&path)).expect("init");
        assert_eq!(written, path);
        assert!(init_config(Some(&path)).is_err(), "must not overwrite");

        let loaded = load_config_from(&path).expect("load");
        assert_eq!(loaded.wordpress.username, "editor");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn explicit_missing_path_is_config_error() {
        let err = locate_config(Some(Path::new("/nonexistent/autopress.toml"))).unwrap_err();
        assert!(err.is_fatal());
    }
}
