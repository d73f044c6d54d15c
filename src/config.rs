use std::{env, net::SocketAddr, time::Duration};

use thiserror::Error;

pub const DEFAULT_TOOL_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_token: Option<String>,
    pub bind_addr: String,
    pub bind_port: u16,
    pub tool_timeout: Duration,
    pub interactive: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("BIND_PORT must be a valid u16")]
    InvalidPort,
    #[error("MCP_TOOL_TIMEOUT_MS must be a positive integer")]
    InvalidToolTimeout,
    #[error("MCP_INTERACTIVE must be a boolean")]
    InvalidInteractive,
    #[error("invalid bind address or port")]
    InvalidSocket,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_token = lookup("MCP_API_TOKEN")
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty());

        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| "127.0.0.1".to_string());
        let bind_port = lookup("BIND_PORT")
            .map(|value| value.parse::<u16>().map_err(|_| ConfigError::InvalidPort))
            .transpose()?
            .unwrap_or(8080);
        let tool_timeout_ms = lookup("MCP_TOOL_TIMEOUT_MS")
            .map(|value| {
                value
                    .trim()
                    .parse::<u64>()
                    .ok()
                    .filter(|millis| *millis > 0)
                    .ok_or(ConfigError::InvalidToolTimeout)
            })
            .transpose()?
            .unwrap_or(DEFAULT_TOOL_TIMEOUT_MS);
        let interactive = lookup("MCP_INTERACTIVE")
            .map(|value| parse_flag(&value).ok_or(ConfigError::InvalidInteractive))
            .transpose()?
            .unwrap_or(false);

        let config = Self {
            api_token,
            bind_addr,
            bind_port,
            tool_timeout: Duration::from_millis(tool_timeout_ms),
            interactive,
        };

        let _ = config.bind_socket()?;
        Ok(config)
    }

    pub fn bind_socket(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_addr, self.bind_port)
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidSocket)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
