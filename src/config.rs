use std::path::PathBuf;

/// Settings read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub user: String,
    pub metrics_port: Option<u16>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let data_dir = get("MODELWEEK_DATA_DIR").unwrap_or_else(|| "./data".into());
        let user = get("MODELWEEK_USER").unwrap_or_else(|| "default".into());
        let metrics_port = get("MODELWEEK_METRICS_PORT").and_then(|s| s.parse().ok());
        Self {
            data_dir: PathBuf::from(data_dir),
            user,
            metrics_port,
        }
    }
}
