use thiserror::Error;

/// Failure of a single hosted-model call. Never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Model API rejected the API key ({status}). Check the GLM API Key.")]
    Auth { status: u16 },
    #[error(
        "Model request timed out after {secs}s while calling '{url}'. \
         Increase MODEL_TIMEOUT_SECS or try again later."
    )]
    Timeout { secs: u64, url: String },
    #[error("Model request failed with status {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("{0}")]
    Connect(String),
    #[error("Failed to parse model chat response: {0}")]
    InvalidResponse(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("请输入您的 GLM API Key 才能生成计划")]
    MissingApiKey,
    #[error("初始化 GLM 模型出错: {0}")]
    ClientInit(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("{field} is not a number: '{raw}'")]
    NotANumber { field: &'static str, raw: String },
    #[error("unknown {field} option '{raw}'")]
    UnknownOption { field: &'static str, raw: String },
    #[error("问题不能为空")]
    EmptyQuestion,
}

/// Everything that can fail a user action (key, generate, ask).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActionError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[cfg(test)]
mod tests {
    use super::{ActionError, ConfigError, ModelError, ValidationError};

    #[test]
    fn action_error_displays_inner_message() {
        let err = ActionError::from(ModelError::Timeout {
            secs: 120,
            url: "https://example.test/chat/completions".to_string(),
        });
        let msg = err.to_string();
        assert!(msg.contains("timed out after 120s"), "unexpected: {msg}");
        assert!(msg.contains("MODEL_TIMEOUT_SECS"), "unexpected: {msg}");
    }

    #[test]
    fn out_of_range_names_field_and_bounds() {
        let err = ValidationError::OutOfRange {
            field: "age",
            min: 10.0,
            max: 100.0,
            value: 9.0,
        };
        assert_eq!(err.to_string(), "age must be between 10 and 100, got 9");
    }

    #[test]
    fn config_errors_convert_into_action_errors() {
        let err: ActionError = ConfigError::MissingApiKey.into();
        assert!(matches!(err, ActionError::Config(ConfigError::MissingApiKey)));
    }
}
