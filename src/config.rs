use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use reqwest::Url;
use tracing::{debug, warn};

use crate::error::ConfigError;
use crate::types::{Config, Credentials};

pub const DEFAULT_CONFIG_FILE: &str = ".env";
pub const DEFAULT_OUTPUT_FILE: &str = "metrics.json";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Trait for abstracting configuration key lookup
pub trait EnvironmentProvider {
    fn get_var(&self, key: &str) -> Option<String>;
}

/// Production implementation using std::env
pub struct SystemEnvironment;

impl EnvironmentProvider for SystemEnvironment {
    fn get_var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Key-value pairs read from a dotenv-format file.
///
/// The file is parsed once; the process environment is left untouched.
#[derive(Debug, Default)]
pub struct FileEnvironment {
    vars: HashMap<String, String>,
}

impl FileEnvironment {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let file_error = |e: dotenv::Error| ConfigError::File {
            path: path.display().to_string(),
            message: e.to_string(),
        };
        let mut vars = HashMap::new();
        for item in dotenv::from_path_iter(path).map_err(file_error)? {
            let (key, value) = item.map_err(file_error)?;
            vars.insert(key, value);
        }
        debug!("Loaded {} keys from {}", vars.len(), path.display());
        Ok(Self { vars })
    }
}

impl EnvironmentProvider for FileEnvironment {
    fn get_var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

/// Looks a key up in `primary` first, then in `fallback`.
pub struct LayeredEnvironment<P, F> {
    primary: P,
    fallback: F,
}

impl<P: EnvironmentProvider, F: EnvironmentProvider> LayeredEnvironment<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

impl<P: EnvironmentProvider, F: EnvironmentProvider> EnvironmentProvider for LayeredEnvironment<P, F> {
    fn get_var(&self, key: &str) -> Option<String> {
        self.primary.get_var(key).or_else(|| self.fallback.get_var(key))
    }
}

/// Mock implementation for testing
#[derive(Debug, Default)]
pub struct MockEnvironment {
    vars: HashMap<String, String>,
}

impl MockEnvironment {
    pub fn new() -> Self {
        Self {
            vars: HashMap::new(),
        }
    }

    pub fn set_var<K, V>(&mut self, key: K, value: V) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn with_var<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.set_var(key, value);
        self
    }
}

impl EnvironmentProvider for MockEnvironment {
    fn get_var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

/// Load configuration from the process environment layered over a
/// dotenv file. An explicitly named file must exist; the default `.env`
/// is optional.
pub fn load_config(config_file: Option<&Path>) -> Result<Config, ConfigError> {
    let file_env = match config_file {
        Some(path) => FileEnvironment::from_path(path)?,
        None => {
            let default = Path::new(DEFAULT_CONFIG_FILE);
            if default.is_file() {
                FileEnvironment::from_path(default)?
            } else {
                FileEnvironment::default()
            }
        }
    };
    load_config_with_env(&LayeredEnvironment::new(SystemEnvironment, file_env))
}

pub fn load_config_with_env<E: EnvironmentProvider>(env: &E) -> Result<Config, ConfigError> {
    let host = non_empty(env, "HOST").ok_or(ConfigError::Missing { key: "HOST" })?;
    let host = parse_host(&host)?;

    let credentials = load_credentials(env)?;

    let verify_ssl = env
        .get_var("VERIFY_SSL")
        .map(|v| parse_bool(&v))
        .unwrap_or(false);

    let output_file = match env.get_var("OUTPUT_FILE") {
        Some(v) if v.trim().is_empty() => None,
        Some(v) => Some(v.trim().to_string()),
        None => Some(DEFAULT_OUTPUT_FILE.to_string()),
    };

    let deployment_filter = non_empty(env, "DEPLOYMENT_FILTER").unwrap_or_else(|| "*".to_string());

    let timeout_seconds: u64 = match non_empty(env, "REQUEST_TIMEOUT_SECONDS") {
        Some(v) => v.parse().map_err(|_| ConfigError::Invalid {
            key: "REQUEST_TIMEOUT_SECONDS",
            message: format!("'{}' is not a whole number of seconds", v),
        })?,
        None => DEFAULT_TIMEOUT_SECONDS,
    };
    if timeout_seconds == 0 {
        return Err(ConfigError::Invalid {
            key: "REQUEST_TIMEOUT_SECONDS",
            message: "must be greater than zero".to_string(),
        });
    }

    Ok(Config {
        host,
        credentials,
        verify_ssl,
        output_file,
        deployment_filter,
        request_timeout: Duration::from_secs(timeout_seconds),
    })
}

/// Validate HOST as an absolute http(s) URL and return it without a trailing slash.
fn parse_host(raw: &str) -> Result<String, ConfigError> {
    let invalid = |message: String| ConfigError::Invalid { key: "HOST", message };
    let url = Url::parse(raw).map_err(|e| invalid(format!("'{}' is not a valid URL: {}", raw, e)))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(invalid(format!("{} must start with http:// or https://", raw)));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid(format!("'{}' has no host name", raw)));
    }
    Ok(raw.trim_end_matches('/').to_string())
}

fn load_credentials<E: EnvironmentProvider>(env: &E) -> Result<Credentials, ConfigError> {
    let api_key = non_empty(env, "API_KEY");
    let username = non_empty(env, "USERNAME");
    let password = non_empty(env, "PASSWORD");

    match (api_key, username, password) {
        (Some(key), user, pass) => {
            if user.is_some() || pass.is_some() {
                warn!("API_KEY and USERNAME/PASSWORD are both set; using API_KEY");
            }
            Ok(Credentials::ApiKey(key))
        }
        (None, Some(username), Some(password)) => Ok(Credentials::Basic { username, password }),
        (None, Some(_), None) => Err(ConfigError::Missing { key: "PASSWORD" }),
        (None, None, Some(_)) => Err(ConfigError::Missing { key: "USERNAME" }),
        (None, None, None) => Err(ConfigError::Missing {
            key: "API_KEY (or USERNAME and PASSWORD)",
        }),
    }
}

fn non_empty<E: EnvironmentProvider>(env: &E, key: &str) -> Option<String> {
    env.get_var(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_bool(v: &str) -> bool {
    matches!(v.trim(), "1" | "true" | "TRUE" | "True")
}
