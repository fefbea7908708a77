use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub connection_string: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    pub issuer: Option<String>,
    pub audience: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiConfig {
    pub path: Option<String>,
    pub version: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, an optional config file, and
    /// `CATALOG_`-prefixed environment variables.
    pub fn load() -> anyhow::Result<Self> {
        let mut config = config::Config::builder();

        config = config.add_source(config::Config::try_from(&AppConfig::default())?);

        config = config.add_source(config::File::with_name("config").required(false));

        config = config.add_source(
            config::Environment::with_prefix("CATALOG")
                .separator("_")
                .prefix_separator("_"),
        );

        let config = config.build()?;
        let app_config: AppConfig = config.try_deserialize()?;

        Ok(app_config)
    }

    /// Store connection URI, falling back to the conventional MONGODB_URL
    /// variable. Required; there is no in-code default.
    pub fn database_url(&self) -> anyhow::Result<String> {
        if let Some(connection_string) = &self.database.connection_string {
            return Ok(connection_string.clone());
        }
        if let Ok(url) = std::env::var("MONGODB_URL") {
            return Ok(url);
        }
        anyhow::bail!("MONGODB_URL is not set")
    }

    pub fn database_name(&self) -> String {
        self.database
            .name
            .clone()
            .or_else(|| std::env::var("MONGODB_DB").ok())
            .unwrap_or_else(|| "catalog".to_string())
    }

    /// Token issuer base URL (the JWKS endpoint hangs off it). Required.
    pub fn auth_issuer(&self) -> anyhow::Result<String> {
        if let Some(issuer) = &self.auth.issuer {
            return Ok(issuer.clone());
        }
        if let Ok(issuer) = std::env::var("AUTH_ISSUER") {
            return Ok(issuer);
        }
        anyhow::bail!("AUTH_ISSUER is not set")
    }

    /// Expected audience claim. Required.
    pub fn auth_audience(&self) -> anyhow::Result<String> {
        if let Some(audience) = &self.auth.audience {
            return Ok(audience.clone());
        }
        if let Ok(audience) = std::env::var("AUTH_AUDIENCE") {
            return Ok(audience);
        }
        anyhow::bail!("AUTH_AUDIENCE is not set")
    }

    pub fn api_path(&self) -> String {
        self.api
            .path
            .clone()
            .or_else(|| std::env::var("API_PATH").ok())
            .unwrap_or_else(|| "api".to_string())
    }

    pub fn api_version(&self) -> String {
        self.api
            .version
            .clone()
            .or_else(|| std::env::var("API_VERSION").ok())
            .unwrap_or_else(|| "v1".to_string())
    }

    /// Base path prefix for the model routes.
    pub fn api_base_path(&self) -> String {
        format!("/{}/{}", self.api_path(), self.api_version())
    }

    /// Get the server bind address. APP_PORT overrides the configured port
    /// when the process is run outside the managed deployment.
    pub fn server_address(&self) -> String {
        let port = std::env::var("APP_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(self.server.port);
        format!("{}:{}", self.server.host, port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_build_a_usable_bind_address() {
        let config = AppConfig::default();
        assert_eq!(config.server_address(), "127.0.0.1:3001");
    }

    #[test]
    fn base_path_combines_path_and_version() {
        let config = AppConfig {
            api: ApiConfig {
                path: Some("api".to_string()),
                version: Some("v1".to_string()),
            },
            ..AppConfig::default()
        };
        assert_eq!(config.api_base_path(), "/api/v1");
    }

    #[test]
    fn database_name_defaults() {
        let config = AppConfig::default();
        if std::env::var("MONGODB_DB").is_err() {
            assert_eq!(config.database_name(), "catalog");
        }
    }
}
