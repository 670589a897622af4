use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Secrets and identity used by the authenticator.
#[derive(Clone)]
pub struct AuthConfig {
    pub shared_secret: String,
    pub admin_secret: String,
    pub admin_login: String,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("shared_secret", &"<redacted>")
            .field("admin_secret", &"<redacted>")
            .field("admin_login", &self.admin_login)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub auth: AuthConfig,
    /// Log to this file instead of stdout.
    pub log_file: Option<PathBuf>,
    pub score_cache_ttl: Duration,
    pub score_cache_capacity: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = |key: &str| -> anyhow::Result<String> {
            lookup(key)
                .ok_or_else(|| anyhow::anyhow!("{} environment variable required", key))
                .and_then(|value| {
                    if value.trim().is_empty() {
                        anyhow::bail!("{} cannot be empty", key);
                    }
                    Ok(value)
                })
        };

        let config = Self {
            host: lookup("HOST")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "127.0.0.1".to_string()),
            port: lookup("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            auth: AuthConfig {
                shared_secret: secret("SHARED_SECRET")?,
                admin_secret: secret("ADMIN_SECRET")?,
                admin_login: lookup("ADMIN_LOGIN")
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or_else(|| "admin".to_string()),
            },
            log_file: lookup("LOG_FILE")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            score_cache_ttl: lookup("SCORE_CACHE_TTL_SECS")
                .unwrap_or_else(|| "3600".to_string())
                .parse()
                .map(Duration::from_secs)
                .map_err(|_| anyhow::anyhow!("SCORE_CACHE_TTL_SECS must be a number of seconds"))?,
            score_cache_capacity: lookup("SCORE_CACHE_CAPACITY")
                .unwrap_or_else(|| "10000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("SCORE_CACHE_CAPACITY must be a positive number"))?,
        };

        Ok(config)
    }
}
