//! Environment configuration for the API server.

use record_workflow::ApprovalPolicy;
use std::net::SocketAddr;
use std::path::PathBuf;

const DEFAULT_LISTEN: &str = "0.0.0.0:5000";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid RECORDS_LISTEN {value:?}: {reason}")]
    Listen { value: String, reason: String },
    #[error("invalid RECORDS_REQUIRED_LEVELS: {0}")]
    RequiredLevels(String),
}

/// Server configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `RECORDS_LISTEN`, default `0.0.0.0:5000`.
    pub listen: SocketAddr,
    /// `RECORDS_SQLITE_PATH`; in-memory store when unset.
    pub sqlite_path: Option<PathBuf>,
    /// `RECORDS_REQUIRED_LEVELS`, comma-separated; default `1,2,3`, empty for none.
    pub approval: ApprovalPolicy,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (env, test map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen_raw = lookup("RECORDS_LISTEN").unwrap_or_else(|| DEFAULT_LISTEN.to_string());
        let listen = listen_raw.parse::<SocketAddr>().map_err(|e| ConfigError::Listen {
            value: listen_raw.clone(),
            reason: e.to_string(),
        })?;
        let sqlite_path = lookup("RECORDS_SQLITE_PATH")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);
        let approval = match lookup("RECORDS_REQUIRED_LEVELS") {
            Some(raw) => raw
                .parse::<ApprovalPolicy>()
                .map_err(ConfigError::RequiredLevels)?,
            None => ApprovalPolicy::default(),
        };
        Ok(Self {
            listen,
            sqlite_path,
            approval,
        })
    }
}
