// src/config.rs
//! Runtime settings read from environment variables.

use crate::errors::TimeMachineError;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_key: String,
    pub model: String,
    pub api_base_url: String,
    pub bind_addr: String,
    /// `None` leaves remote calls unbounded.
    pub request_timeout: Option<Duration>,
}

impl Config {
    /// Required: `GEMINI_API_KEY` (or `API_KEY`).
    ///
    /// Optional:
    /// - `TIME_MACHINE_MODEL`: default `gemini-2.5-flash-image`
    /// - `TIME_MACHINE_API_BASE_URL`: default Gemini v1beta endpoint
    /// - `TIME_MACHINE_BIND_ADDR`: default `127.0.0.1:8080`
    /// - `TIME_MACHINE_REQUEST_TIMEOUT_SECS`: unset means no timeout
    pub fn from_env() -> Result<Self, TimeMachineError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, TimeMachineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = non_empty("GEMINI_API_KEY")
            .or_else(|| non_empty("API_KEY"))
            .ok_or_else(|| {
                TimeMachineError::Config("GEMINI_API_KEY (or API_KEY) must be set".to_string())
            })?;

        let model = non_empty("TIME_MACHINE_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let api_base_url = non_empty("TIME_MACHINE_API_BASE_URL")
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let bind_addr =
            non_empty("TIME_MACHINE_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let request_timeout = match non_empty("TIME_MACHINE_REQUEST_TIMEOUT_SECS") {
            None => None,
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
                _ => {
                    return Err(TimeMachineError::Config(format!(
                        "TIME_MACHINE_REQUEST_TIMEOUT_SECS must be a positive integer, got '{}'",
                        raw
                    )));
                }
            },
        };

        Ok(Self {
            api_key,
            model,
            api_base_url,
            bind_addr,
            request_timeout,
        })
    }
}
