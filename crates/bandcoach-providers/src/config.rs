//! Configuration loading and invoker factory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use bandcoach_core::traits::ModelInvoker;
use bandcoach_core::PipelineConfig;

use crate::openai::{OpenAiInvoker, DEFAULT_TIMEOUT_SECS};

/// Environment variable that overrides the configured API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Connection settings for the OpenAI-compatible service.
///
/// Note: Custom Debug impl masks the API key to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub org_id: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            org_id: None,
            timeout_secs: default_timeout(),
        }
    }
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("base_url", &self.base_url)
            .field("org_id", &self.org_id)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Top-level bandcoach configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BandcoachConfig {
    /// Model service connection.
    #[serde(default)]
    pub openai: OpenAiConfig,
    /// Completion model.
    #[serde(default = "default_model")]
    pub model: String,
    /// Transcription model.
    #[serde(default = "default_transcription_model")]
    pub transcription_model: String,
    /// Language hint for transcription.
    #[serde(default = "default_transcription_language")]
    pub transcription_language: String,
    /// Max tokens per completion.
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Address the HTTP server binds to.
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_transcription_model() -> String {
    "whisper-1".to_string()
}
fn default_transcription_language() -> String {
    "en".to_string()
}
fn default_bind() -> String {
    "0.0.0.0:3000".to_string()
}

impl Default for BandcoachConfig {
    fn default() -> Self {
        Self {
            openai: OpenAiConfig::default(),
            model: default_model(),
            transcription_model: default_transcription_model(),
            transcription_language: default_transcription_language(),
            max_tokens: None,
            bind: default_bind(),
        }
    }
}

impl BandcoachConfig {
    /// Whether a non-blank API key is configured.
    pub fn has_credential(&self) -> bool {
        self.openai
            .api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty())
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            model: self.model.clone(),
            transcription_model: self.transcription_model.clone(),
            transcription_language: self.transcription_language.clone(),
            max_tokens: self.max_tokens,
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str, env: &dyn Fn(&str) -> Option<String>) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = env(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `bandcoach.toml` in the current directory
/// 2. `~/.config/bandcoach/config.toml`
///
/// `OPENAI_API_KEY` overrides the configured key.
pub fn load_config() -> Result<BandcoachConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<BandcoachConfig> {
    load_config_with(path, &|name| std::env::var(name).ok())
}

fn load_config_with(
    path: Option<&Path>,
    env: &dyn Fn(&str) -> Option<String>,
) -> Result<BandcoachConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("bandcoach.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path(env)
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<BandcoachConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => BandcoachConfig::default(),
    };

    // Apply env var override
    if let Some(key) = env(API_KEY_ENV) {
        config.openai.api_key = Some(key);
    }

    let openai = &mut config.openai;
    openai.api_key = openai
        .api_key
        .as_deref()
        .map(|k| resolve_env_vars(k, env))
        .filter(|k| !k.trim().is_empty());
    openai.base_url = openai.base_url.as_deref().map(|u| resolve_env_vars(u, env));
    openai.org_id = openai.org_id.as_deref().map(|o| resolve_env_vars(o, env));

    Ok(config)
}

fn dirs_path(env: &dyn Fn(&str) -> Option<String>) -> Option<PathBuf> {
    env("HOME").map(|h| PathBuf::from(h).join(".config").join("bandcoach"))
}

/// Create the model invoker described by the configuration.
pub fn create_invoker(config: &BandcoachConfig) -> Result<Box<dyn ModelInvoker>> {
    let openai = &config.openai;
    let invoker = OpenAiInvoker::new(
        openai.api_key.clone(),
        openai.base_url.clone(),
        openai.org_id.clone(),
        openai.timeout_secs,
    )
    .context("failed to create OpenAI client")?;
    Ok(Box::new(invoker))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bandcoach.toml");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn resolve_env_vars_basic() {
        let env = env_of(&[("_BANDCOACH_TEST_VAR", "hello")]);
        assert_eq!(resolve_env_vars("${_BANDCOACH_TEST_VAR}", &env), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_BANDCOACH_TEST_VAR}_suffix", &env),
            "prefix_hello_suffix"
        );
        assert_eq!(resolve_env_vars("${MISSING}", &env), "");
        assert_eq!(resolve_env_vars("${unterminated", &env), "${unterminated");
    }

    #[test]
    fn default_config() {
        let config = BandcoachConfig::default();
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.transcription_model, "whisper-1");
        assert_eq!(config.transcription_language, "en");
        assert_eq!(config.openai.timeout_secs, 120);
        assert!(!config.has_credential());
    }

    #[test]
    fn parse_full_config() {
        let (_dir, path) = write_config(
            r#"
model = "gpt-4o"
max_tokens = 1500
bind = "127.0.0.1:8080"

[openai]
api_key = "${_BANDCOACH_KEY}"
base_url = "http://localhost:9999"
timeout_secs = 30
"#,
        );
        let env = env_of(&[("_BANDCOACH_KEY", "sk-from-env")]);
        let config = load_config_with(Some(&path), &env).unwrap();
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.max_tokens, Some(1500));
        assert_eq!(config.bind, "127.0.0.1:8080");
        assert_eq!(config.openai.api_key.as_deref(), Some("sk-from-env"));
        assert_eq!(config.openai.timeout_secs, 30);

        let pipeline = config.pipeline_config();
        assert_eq!(pipeline.model, "gpt-4o");
        assert_eq!(pipeline.max_tokens, Some(1500));
    }

    #[test]
    fn env_key_overrides_file() {
        let (_dir, path) = write_config("[openai]\napi_key = \"sk-file\"\n");
        let env = env_of(&[(API_KEY_ENV, "sk-env")]);
        let config = load_config_with(Some(&path), &env).unwrap();
        assert_eq!(config.openai.api_key.as_deref(), Some("sk-env"));
    }

    #[test]
    fn blank_key_counts_as_absent() {
        let (_dir, path) = write_config("[openai]\napi_key = \"${UNSET_KEY}\"\n");
        let config = load_config_with(Some(&path), &env_of(&[])).unwrap();
        assert!(config.openai.api_key.is_none());
        assert!(!config.has_credential());

        let env = env_of(&[(API_KEY_ENV, "  ")]);
        let config = load_config_with(Some(&path), &env).unwrap();
        assert!(!config.has_credential());
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let err = load_config_with(Some(Path::new("/nonexistent/bandcoach.toml")), &env_of(&[]))
            .unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn malformed_toml_is_an_error() {
        let (_dir, path) = write_config("model = [unclosed");
        let err = load_config_with(Some(&path), &env_of(&[])).unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse config"));
    }

    #[test]
    fn debug_masks_api_key() {
        let mut config = BandcoachConfig::default();
        config.openai.api_key = Some("sk-secret".into());
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn invoker_reflects_credential() {
        let mut config = BandcoachConfig::default();
        assert!(!create_invoker(&config).unwrap().has_credential());

        config.openai.api_key = Some("sk-test".into());
        let invoker = create_invoker(&config).unwrap();
        assert!(invoker.has_credential());
        assert_eq!(invoker.name(), "openai");
    }
}
