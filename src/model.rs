use reqwest::Client;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::Config;
use crate::error::{ConfigError, ModelError};
use crate::providers;

/// Everything needed to reach one hosted chat-completion model.
#[derive(Clone)]
pub struct ModelSettings {
    pub model_id: String,
    pub base_url: String,
    pub api_key: String,
    pub max_output_tokens: u32,
    pub timeout_secs: u64,
}

impl ModelSettings {
    pub fn from_config(cfg: &Config, api_key: impl Into<String>) -> Self {
        Self {
            model_id: cfg.model.clone(),
            base_url: cfg.model_base_url.clone(),
            api_key: api_key.into(),
            max_output_tokens: cfg.model_max_tokens,
            timeout_secs: cfg.model_timeout_secs,
        }
    }
}

// Hand-written so the key never ends up in logs.
impl std::fmt::Debug for ModelSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelSettings")
            .field("model_id", &self.model_id)
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("max_output_tokens", &self.max_output_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

pub type ModelFuture<'a> = Pin<Box<dyn Future<Output = Result<String, ModelError>> + Send + 'a>>;

pub trait ModelClient: Send + Sync {
    /// Sends one prompt and returns the model's text. One request per call.
    fn complete<'a>(&'a self, prompt: &'a str) -> ModelFuture<'a>;
}

pub trait ModelClientFactory: Send + Sync {
    fn build(&self, api_key: &str) -> Result<Arc<dyn ModelClient>, ConfigError>;
}

pub struct HttpModelClient {
    client: Client,
    settings: ModelSettings,
}

impl HttpModelClient {
    pub fn new(settings: ModelSettings) -> Result<Self, ConfigError> {
        if settings.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        reqwest::Url::parse(&settings.base_url).map_err(|err| {
            ConfigError::ClientInit(format!("invalid base URL '{}': {err}", settings.base_url))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|err| ConfigError::ClientInit(format!("failed to build HTTP client: {err}")))?;

        Ok(Self { client, settings })
    }
}

impl ModelClient for HttpModelClient {
    fn complete<'a>(&'a self, prompt: &'a str) -> ModelFuture<'a> {
        Box::pin(async move {
            debug!(
                model = %self.settings.model_id,
                prompt_len = prompt.len(),
                "dispatching model completion request"
            );
            providers::chat_completions::complete(&self.client, &self.settings, prompt).await
        })
    }
}

/// Builds [`HttpModelClient`]s from the runtime configuration.
#[derive(Debug, Clone)]
pub struct HttpModelClientFactory {
    cfg: Config,
}

impl HttpModelClientFactory {
    pub fn new(cfg: Config) -> Self {
        Self { cfg }
    }
}

impl ModelClientFactory for HttpModelClientFactory {
    fn build(&self, api_key: &str) -> Result<Arc<dyn ModelClient>, ConfigError> {
        let settings = ModelSettings::from_config(&self.cfg, api_key.trim());
        Ok(Arc::new(HttpModelClient::new(settings)?))
    }
}

#[cfg(test)]
mod tests {
    use super::{HttpModelClient, HttpModelClientFactory, ModelClientFactory, ModelSettings};
    use crate::config::Config;
    use crate::error::ConfigError;

    fn settings(api_key: &str, base_url: &str) -> ModelSettings {
        ModelSettings {
            model_id: "glm-4.5".to_string(),
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            max_output_tokens: 16384,
            timeout_secs: 120,
        }
    }

    #[test]
    fn from_config_copies_limits() {
        let cfg = Config::default();
        let settings = ModelSettings::from_config(&cfg, "secret");
        assert_eq!(settings.model_id, "glm-4.5");
        assert_eq!(settings.max_output_tokens, 16384);
        assert_eq!(settings.timeout_secs, 120);
        assert_eq!(settings.api_key, "secret");
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let rendered = format!("{:?}", settings("sk-very-secret", "http://localhost"));
        assert!(!rendered.contains("sk-very-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn new_rejects_blank_key() {
        let err = HttpModelClient::new(settings("  ", "http://localhost"))
            .err()
            .expect("blank key should fail");
        assert_eq!(err, ConfigError::MissingApiKey);
    }

    #[test]
    fn new_rejects_invalid_base_url() {
        let err = HttpModelClient::new(settings("key", "not a url"))
            .err()
            .expect("invalid url should fail");
        assert!(matches!(err, ConfigError::ClientInit(msg) if msg.contains("not a url")));
    }

    #[test]
    fn factory_trims_key() {
        let factory = HttpModelClientFactory::new(Config::default());
        assert!(factory.build("  key  ").is_ok());
        assert!(matches!(
            factory.build("   "),
            Err(ConfigError::MissingApiKey)
        ));
    }
}
