//! Runtime configuration, read from the environment (and `.env` via dotenvy).
//!
//! | variable                  | default                      |
//! |---------------------------|------------------------------|
//! | `SWEETSHOP_API_BASE_URL`  | `http://localhost:8080/api`  |
//! | `SWEETSHOP_TIMEOUT_SECS`  | `10`                         |
//! | `SWEETSHOP_DATA_DIR`      | `sweetshop_data`             |
//! | `SWEETSHOP_OFFLINE`       | unset (remote enabled)       |
//! | `SWEETSHOP_LOGOUT_SCOPE`  | `all` or `protected`         |
//! | `SWEETSHOP_LOG_FORMAT`    | `text`                       |

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_DATA_DIR: &str = "sweetshop_data";

/// Which remote calls clear the session when they come back 401.
///
/// Neither scope covers `/auth/login` or `/auth/register`. A 401 from those
/// is treated as rejected credentials and the session is kept, which departs
/// from an interceptor that logs out on every 401. This keeps a failed login
/// from ending the session that was active before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogoutScope {
    /// Any bearer-carrying call, including catalog reads
    #[default]
    AllEndpoints,
    /// Only calls that need a session (purchase, admin CRUD, restock)
    ProtectedEndpointsOnly,
}

impl LogoutScope {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "all" | "all-endpoints" | "all_endpoints" => Some(Self::AllEndpoints),
            "protected" | "protected-only" | "protected_only" => Some(Self::ProtectedEndpointsOnly),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub request_timeout: Duration,
    pub data_dir: PathBuf,
    /// Skip the remote collaborator and go straight to the local fallback
    pub offline: bool,
    pub logout_scope: LogoutScope,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(10),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            offline: false,
            logout_scope: LogoutScope::default(),
            log_format: LogFormat::default(),
        }
    }
}

impl Config {
    /// Load `.env` if present, then read `SWEETSHOP_*` variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source; unparsable values keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Config::default();
        if let Some(url) = lookup("SWEETSHOP_API_BASE_URL").filter(|v| !v.trim().is_empty()) {
            cfg.api_base_url = url.trim().trim_end_matches('/').to_string();
        }
        if let Some(secs) = lookup("SWEETSHOP_TIMEOUT_SECS").and_then(|v| v.trim().parse::<u64>().ok()) {
            cfg.request_timeout = Duration::from_secs(secs);
        }
        if let Some(dir) = lookup("SWEETSHOP_DATA_DIR").filter(|v| !v.trim().is_empty()) {
            cfg.data_dir = PathBuf::from(dir);
        }
        if let Some(flag) = lookup("SWEETSHOP_OFFLINE") {
            cfg.offline = matches!(flag.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }
        if let Some(scope) = lookup("SWEETSHOP_LOGOUT_SCOPE").and_then(|v| LogoutScope::from_str(&v)) {
            cfg.logout_scope = scope;
        }
        if let Some(fmt) = lookup("SWEETSHOP_LOG_FORMAT") {
            if fmt.eq_ignore_ascii_case("json") {
                cfg.log_format = LogFormat::Json;
            }
        }
        cfg
    }

    /// Apply command-line flags on top of the environment
    pub fn with_overrides(mut self, api_base_url: Option<&str>, data_dir: Option<PathBuf>, offline: bool) -> Self {
        if let Some(url) = api_base_url {
            self.api_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(dir) = data_dir {
            self.data_dir = dir;
        }
        self.offline |= offline;
        self
    }
}
