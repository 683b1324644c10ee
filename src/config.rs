use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub cache: CacheConfig,
    pub autosave: AutoSaveConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Field definitions kept in the LRU
    pub field_capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoSaveConfig {
    pub debounce_ms: u64,
}

impl AutoSaveConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite:data/video_fields.db".to_string(),
            },
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            cache: CacheConfig { field_capacity: 1000 },
            autosave: AutoSaveConfig { debounce_ms: 500 },
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or(defaults.database.url),
            },
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: parse_var("SERVER_PORT", defaults.server.port)?,
            },
            cache: CacheConfig {
                field_capacity: parse_var("FIELD_CACHE_CAPACITY", defaults.cache.field_capacity)?,
            },
            autosave: AutoSaveConfig {
                debounce_ms: parse_var("AUTOSAVE_DEBOUNCE_MS", defaults.autosave.debounce_ms)?,
            },
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Unset means the default; a value that does not parse is an error
fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid {}='{}': {}", name, raw, e)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server_address(), "0.0.0.0:3000");
        assert_eq!(config.cache.field_capacity, 1000);
        assert_eq!(config.autosave.debounce(), Duration::from_millis(500));
    }

    #[test]
    fn test_parse_var_rejects_garbage() {
        let name = "VIDEO_FIELDS_TEST_PORT";
        env::set_var(name, "not-a-port");
        assert!(parse_var::<u16>(name, 3000).is_err());
        env::set_var(name, " 8080 ");
        assert_eq!(parse_var::<u16>(name, 3000).unwrap(), 8080);
        env::remove_var(name);
        assert_eq!(parse_var::<u16>(name, 3000).unwrap(), 3000);
    }
}
