use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::api::{DEFAULT_SOURCE_URL, DEFAULT_USER_AGENT};
use crate::store::StoreBackend;

#[derive(Debug, Clone)]
pub struct Config {
    pub source_url: String,
    pub store_path: PathBuf,
    pub store_backend: StoreBackend,
    /// True when KENO_STORE_BACKEND named the backend.
    pub store_backend_explicit: bool,
    pub fetch_timeout: Duration,
    pub user_agent: String,
    pub notify_webhook_url: Option<String>,
    pub notify_token: Option<String>,
}

impl Config {
    /// Point the config at another store, re-inferring the backend unless
    /// one was set explicitly.
    pub fn with_store_path(mut self, path: PathBuf) -> Self {
        if !self.store_backend_explicit {
            self.store_backend = StoreBackend::infer(&path);
        }
        self.store_path = path;
        self
    }
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub fn load() -> Result<Config> {
    dotenvy::dotenv().ok();

    let source_url = optional("KENO_SOURCE_URL").unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string());
    let store_path = PathBuf::from(optional("KENO_STORE_PATH").unwrap_or_else(|| "results.csv".to_string()));

    let backend_name = optional("KENO_STORE_BACKEND");
    let store_backend_explicit = backend_name.is_some();
    let store_backend = match backend_name {
        Some(name) => name.parse::<StoreBackend>().map_err(anyhow::Error::msg)?,
        None => StoreBackend::infer(&store_path),
    };

    let fetch_timeout = match optional("KENO_FETCH_TIMEOUT_SECS") {
        Some(secs) => Duration::from_secs(
            secs.parse::<u64>()
                .with_context(|| format!("KENO_FETCH_TIMEOUT_SECS is not a number: {}", secs))?,
        ),
        None => Duration::from_secs(60),
    };

    let user_agent = optional("KENO_USER_AGENT").unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

    Ok(Config {
        source_url,
        store_path,
        store_backend,
        store_backend_explicit,
        fetch_timeout,
        user_agent,
        notify_webhook_url: optional("KENO_NOTIFY_WEBHOOK_URL"),
        notify_token: optional("KENO_NOTIFY_TOKEN"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(backend: StoreBackend, explicit: bool) -> Config {
        Config {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            store_path: PathBuf::from("results.csv"),
            store_backend: backend,
            store_backend_explicit: explicit,
            fetch_timeout: Duration::from_secs(60),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            notify_webhook_url: None,
            notify_token: None,
        }
    }

    #[test]
    fn store_override_reinfers_backend_when_not_named() {
        let config = config(StoreBackend::Csv, false).with_store_path(PathBuf::from("data/keno.db"));
        assert_eq!(config.store_backend, StoreBackend::Sqlite);
        assert_eq!(config.store_path, PathBuf::from("data/keno.db"));
    }

    #[test]
    fn store_override_keeps_named_backend() {
        let config = config(StoreBackend::Csv, true).with_store_path(PathBuf::from("data/keno.db"));
        assert_eq!(config.store_backend, StoreBackend::Csv);
    }
}
