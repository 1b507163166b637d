use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub filter: FilterConfig,
    pub database: DatabaseConfig,
    pub oauth: OAuthConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Upper bound applied to `count` on list endpoints. `None` leaves
    /// client page sizes untouched.
    pub max_count: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    /// Seconds to wait for a pooled connection.
    pub connection_timeout: u64,
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            connection_timeout: 30,
            run_migrations: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OAuthConfig {
    pub client_id: String,
    #[serde(skip_serializing)]
    pub client_secret: String,
    pub redirect_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Mark session cookies `Secure`. Off in development so plain http works.
    pub secure_cookies: bool,
    pub enable_cors: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        Self::for_environment(environment).with_env_overrides()
    }

    pub fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    /// `host:port` for the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides. PORT is what most hosting platforms set.
        if let Ok(v) = env::var("SERVER_HOST") {
            self.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT").or_else(|_| env::var("PORT")) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }

        // Filter overrides
        if let Ok(v) = env::var("FILTER_MAX_COUNT") {
            self.filter.max_count = v.parse().ok().filter(|n: &u32| *n > 0);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v).filter(|s| !s.is_empty());
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_RUN_MIGRATIONS") {
            self.database.run_migrations = v.parse().unwrap_or(self.database.run_migrations);
        }

        // OAuth overrides
        if let Ok(v) = env::var("OAUTH_CLIENT_ID") {
            self.oauth.client_id = v;
        }
        if let Ok(v) = env::var("OAUTH_CLIENT_SECRET") {
            self.oauth.client_secret = v;
        }
        if let Ok(v) = env::var("OAUTH_REDIRECT_URL") {
            self.oauth.redirect_url = v;
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_SECURE_COOKIES") {
            self.security.secure_cookies = v.parse().unwrap_or(self.security.secure_cookies);
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            filter: FilterConfig { max_count: None },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
                run_migrations: true,
            },
            oauth: OAuthConfig {
                redirect_url: "http://localhost:8080/api/auth/oauth2callback".to_string(),
                ..OAuthConfig::default()
            },
            security: SecurityConfig {
                secure_cookies: false,
                enable_cors: true,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            filter: FilterConfig { max_count: Some(500) },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
                run_migrations: true,
            },
            oauth: OAuthConfig::default(),
            security: SecurityConfig {
                secure_cookies: true,
                enable_cors: true,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            filter: FilterConfig { max_count: Some(100) },
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
                run_migrations: false,
            },
            oauth: OAuthConfig::default(),
            security: SecurityConfig {
                secure_cookies: true,
                enable_cors: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert!(config.is_development());
        assert_eq!(config.filter.max_count, None);
        assert!(!config.security.secure_cookies);
        assert!(config.database.run_migrations);
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::for_environment(Environment::Production);
        assert!(!config.is_development());
        assert_eq!(config.filter.max_count, Some(100));
        assert!(config.security.secure_cookies);
        assert!(!config.database.run_migrations);
        assert_eq!(config.database.url, None);
    }

    #[test]
    fn development_redirect_targets_callback_route() {
        let config = AppConfig::development();
        let url = url::Url::parse(&config.oauth.redirect_url).unwrap();
        assert_eq!(url.path(), "/api/auth/oauth2callback");
        assert_eq!(url.port(), Some(config.server.port));
    }

    #[test]
    fn client_secret_is_not_serialized() {
        let mut config = AppConfig::development();
        config.oauth.client_secret = "hunter2".to_string();
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("hunter2"));
    }
}
