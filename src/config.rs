use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_GEMINI_TEMPERATURE: f32 = 0.4;
const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Deserialize, Default)]
struct DetectConfigFile {
    use_custom_api: Option<bool>,
    timeout_secs: Option<u64>,
    custom: Option<CustomConfigFile>,
    gemini: Option<GeminiConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct CustomConfigFile {
    endpoint: Option<String>,
    models_url: Option<String>,
    model: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct GeminiConfigFile {
    api_key: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
    temperature: Option<f32>,
}

/// Runtime configuration, built once at startup and passed down.
#[derive(Debug, Clone)]
pub struct DetectConfig {
    /// Selects the custom inference endpoint instead of the remote model.
    pub use_custom_api: bool,
    pub timeout: Duration,
    pub custom: CustomSettings,
    pub gemini: GeminiConfig,
}

#[derive(Debug, Clone, Default)]
pub struct CustomSettings {
    pub endpoint: Option<String>,
    pub models_url: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
}

impl DetectConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("DETECT_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) if !path.trim().is_empty() => Some(read_config_file(Path::new(path))?),
            _ => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: DetectConfigFile) -> Self {
        let custom = file.custom.unwrap_or_default();
        let gemini = file.gemini.unwrap_or_default();
        Self {
            use_custom_api: file.use_custom_api.unwrap_or(false),
            timeout: Duration::from_secs(file.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            custom: CustomSettings {
                endpoint: custom.endpoint,
                models_url: custom.models_url,
                model: custom.model,
            },
            gemini: GeminiConfig {
                api_key: gemini.api_key,
                model: gemini
                    .model
                    .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
                base_url: gemini
                    .base_url
                    .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
                temperature: gemini.temperature.unwrap_or(DEFAULT_GEMINI_TEMPERATURE),
            },
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(flag) = non_blank_env("DETECT_USE_CUSTOM_API") {
            self.use_custom_api = flag.trim().eq_ignore_ascii_case("true");
        }
        if let Some(endpoint) = non_blank_env("DETECT_API_ENDPOINT") {
            self.custom.endpoint = Some(endpoint);
        }
        if let Some(url) = non_blank_env("DETECT_MODELS_URL") {
            self.custom.models_url = Some(url);
        }
        if let Some(model) = non_blank_env("DETECT_MODEL") {
            self.custom.model = Some(model);
        }
        if let Some(key) = non_blank_env("GEMINI_API_KEY").or_else(|| non_blank_env("API_KEY")) {
            self.gemini.api_key = Some(key);
        }
        if let Some(model) = non_blank_env("DETECT_GEMINI_MODEL") {
            self.gemini.model = model;
        }
        if let Some(timeout) = non_blank_env("DETECT_TIMEOUT_SECS") {
            let seconds: u64 = timeout.trim().parse().map_err(|_| {
                anyhow!("DETECT_TIMEOUT_SECS must be an integer number of seconds")
            })?;
            self.timeout = Duration::from_secs(seconds);
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.timeout.as_secs() == 0 {
            return Err(anyhow!("timeout must be greater than zero"));
        }
        if self.use_custom_api {
            let endpoint = self.custom.endpoint.as_deref().unwrap_or("");
            if endpoint.trim().is_empty() {
                return Err(anyhow!(
                    "API endpoint is not configured. Set DETECT_API_ENDPOINT or custom.endpoint."
                ));
            }
            url::Url::parse(endpoint)
                .map_err(|e| anyhow!("invalid API endpoint '{}': {}", endpoint, e))?;
        } else if self.gemini.api_key.is_none() {
            return Err(anyhow!(
                "API key is missing. Set GEMINI_API_KEY (or API_KEY) or gemini.api_key."
            ));
        }
        Ok(())
    }

    /// Full URL of the model listing, when a listing origin is configured.
    pub fn models_listing_url(&self) -> Option<Result<url::Url>> {
        let base = self
            .custom
            .models_url
            .as_deref()
            .or(self.custom.endpoint.as_deref())?;
        Some(crate::models::listing_url(base))
    }
}

fn non_blank_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

fn read_config_file(path: &Path) -> Result<DetectConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let is_toml = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("toml"))
        .unwrap_or(false);
    let cfg: DetectConfigFile = if is_toml {
        toml::from_str(&raw).map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    } else {
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    };
    Ok(cfg)
}
