use std::env;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(DEFAULT_TIMEOUT_SECS);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_base: String,
    pub character_id: Option<u32>,
    pub http_timeout: Duration,
}

impl Config {
    /// Reads the process environment (call `dotenvy` first) and arguments.
    pub fn from_env_and_args() -> Self {
        Self::from_lookup(|key| env::var(key).ok(), env::args().skip(1))
    }

    pub fn from_lookup<F, I>(lookup: F, args: I) -> Self
    where
        F: Fn(&str) -> Option<String>,
        I: IntoIterator<Item = String>,
    {
        let api_base = lookup("CHARSHEET_API_BASE")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        // A positional argument wins over the environment, like a query
        // parameter on the page URL.
        let character_id = args
            .into_iter()
            .find(|arg| !arg.starts_with("--"))
            .and_then(|arg| parse_character_id(&arg))
            .or_else(|| lookup("CHARSHEET_CHARACTER_ID").and_then(|v| parse_character_id(&v)));

        let http_timeout = lookup("CHARSHEET_HTTP_TIMEOUT_SECS")
            .and_then(|val| val.trim().parse::<u64>().ok())
            .map(|secs| Duration::from_secs(secs.max(1)))
            .unwrap_or(DEFAULT_HTTP_TIMEOUT);

        Self {
            api_base,
            character_id,
            http_timeout,
        }
    }
}

/// Accepts `7`, `id=7`, `?id=7` and `?foo=bar&id=7`.
pub fn parse_character_id(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if let Ok(id) = raw.parse::<u32>() {
        return Some(id);
    }
    raw.trim_start_matches('?')
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "id")
        .and_then(|(_, value)| value.trim().parse::<u32>().ok())
}
