use std::env;

const DEFAULT_MODEL: &str = "glm-4.5";
const DEFAULT_MODEL_BASE_URL: &str = "https://open.bigmodel.cn/api/paas/v4/";
const DEFAULT_MODEL_MAX_TOKENS: u32 = 16384;
const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 120;
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8501";
pub const DEFAULT_SESSION_IDLE_SECS: u64 = 3600;
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub model: String,
    pub model_base_url: String,
    pub model_max_tokens: u32,
    pub model_timeout_secs: u64,
    pub bind_addr: String,
    pub session_idle_secs: u64,
    pub max_sessions: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env_with(|_| None)
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_env_with(|key| env::var(key).ok())
    }

    fn from_env_with(mut get_var: impl FnMut(&str) -> Option<String>) -> Self {
        Self {
            model: non_empty(get_var("MODEL")).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            model_base_url: non_empty(get_var("MODEL_BASE_URL"))
                .unwrap_or_else(|| DEFAULT_MODEL_BASE_URL.to_string()),
            model_max_tokens: parse_model_max_tokens(get_var("MODEL_MAX_TOKENS").as_deref()),
            model_timeout_secs: parse_model_timeout_secs(get_var("MODEL_TIMEOUT_SECS").as_deref()),
            bind_addr: non_empty(get_var("BIND_ADDR"))
                .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            session_idle_secs: parse_positive_u64(
                get_var("SESSION_IDLE_SECS").as_deref(),
                DEFAULT_SESSION_IDLE_SECS,
            ),
            max_sessions: parse_max_sessions(get_var("MAX_SESSIONS").as_deref()),
        }
    }
}

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_positive_u64(raw: Option<&str>, default: u64) -> u64 {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

fn parse_model_timeout_secs(raw: Option<&str>) -> u64 {
    parse_positive_u64(raw, DEFAULT_MODEL_TIMEOUT_SECS)
}

fn parse_model_max_tokens(raw: Option<&str>) -> u32 {
    raw.and_then(|value| value.trim().parse::<u32>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_MODEL_MAX_TOKENS)
}

fn parse_max_sessions(raw: Option<&str>) -> usize {
    raw.and_then(|value| value.trim().parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_MAX_SESSIONS)
}
