use serde::Deserialize;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Connection settings for the document store. Either value being absent puts
/// the store in degraded mode.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub host: String,
    pub port: u16,
}

impl Config {
    /// Loads `.env` (if present) and reads the process environment once.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let config = Self {
            database: DatabaseConfig {
                url: non_empty("DATABASE_URL"),
                name: non_empty("DATABASE_NAME"),
            },
            host: non_empty("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: match non_empty("PORT") {
                Some(port) => port.trim().parse().map_err(|_| {
                    anyhow::anyhow!("PORT must be a valid number between 1-65535, got '{}'", port)
                })?,
                None => DEFAULT_PORT,
            },
        };

        // Log without sensitive values
        match &config.database.url {
            Some(url) => tracing::debug!(
                "Database URL: {}...",
                url.chars().take(20).collect::<String>()
            ),
            None => tracing::warn!("DATABASE_URL not set"),
        }
        match &config.database.name {
            Some(name) => tracing::debug!("Database name: {}", name),
            None => tracing::warn!("DATABASE_NAME not set"),
        }
        tracing::debug!("Server: {}:{}", config.host, config.port);

        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
