use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "MedAssist";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default bind address for the HTTP API.
const DEFAULT_BIND: &str = "127.0.0.1:5000";

/// Default base URL of the primary (network) diagnosis backend.
const DEFAULT_PRIMARY_URL: &str = "http://localhost:8000";

/// Timeout for the primary backend. The fallback decision triggers on
/// timeout as well as transport errors, so this bounds the whole call.
pub const PRIMARY_TIMEOUT: Duration = Duration::from_secs(28);

/// Timeout for an HTTP-configured fallback backend.
pub const FALLBACK_TIMEOUT: Duration = Duration::from_secs(10);

/// Get the application data directory
/// ~/MedAssist/ on all platforms (user-visible, survives restarts)
pub fn app_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("MEDASSIST_DATA_DIR") {
        return PathBuf::from(dir);
    }
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("MedAssist")
}

/// Path of the SQLite database file.
pub fn database_path() -> PathBuf {
    app_data_dir().join("medassist.db")
}

/// Path of the snapshot cache file.
pub fn snapshot_path() -> PathBuf {
    app_data_dir().join("snapshot.json")
}

/// Runtime settings resolved from the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Socket the HTTP API binds to.
    pub bind_addr: SocketAddr,
    /// Base URL of the primary diagnosis backend.
    pub primary_url: String,
    /// Base URL of an HTTP fallback backend. `None` selects the
    /// embedded rule engine.
    pub fallback_url: Option<String>,
}

impl Settings {
    /// Resolve settings from `MEDASSIST_*` environment variables,
    /// falling back to defaults suitable for local development.
    pub fn from_env() -> Self {
        let bind_addr = std::env::var("MEDASSIST_BIND")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(|| DEFAULT_BIND.parse().expect("default bind address is valid"));

        let primary_url = std::env::var("MEDASSIST_PRIMARY_URL")
            .unwrap_or_else(|_| DEFAULT_PRIMARY_URL.to_string());

        let fallback_url = std::env::var("MEDASSIST_FALLBACK_URL").ok();

        Self {
            bind_addr,
            primary_url,
            fallback_url,
        }
    }
}

/// Default log filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "medassist=info,tower_http=warn"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_path_under_data_dir() {
        let db = database_path();
        assert!(db.starts_with(app_data_dir()));
        assert!(db.ends_with("medassist.db"));
    }

    #[test]
    fn snapshot_path_under_data_dir() {
        let snap = snapshot_path();
        assert!(snap.starts_with(app_data_dir()));
        assert!(snap.ends_with("snapshot.json"));
    }

    #[test]
    fn app_name_is_medassist() {
        assert_eq!(APP_NAME, "MedAssist");
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }

    #[test]
    fn primary_timeout_is_bounded() {
        assert_eq!(PRIMARY_TIMEOUT.as_secs(), 28);
        assert!(FALLBACK_TIMEOUT < PRIMARY_TIMEOUT);
    }
}
