use anyhow::Result;
use dotenvy::dotenv;
use secrecy::Secret;
use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthServiceConfig,
    pub service_name: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Deserialize, Clone, Debug)]
pub struct AuthServiceConfig {
    pub base_url: String,
    #[serde(skip)]
    pub connect_timeout: Option<Duration>,
    #[serde(skip)]
    pub request_timeout: Option<Duration>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let host = env::var("CHARGE_SERVICE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("CHARGE_SERVICE_PORT")
            .unwrap_or_else(|_| "3004".to_string())
            .parse()?;

        let db_url = env::var("CHARGE_DATABASE_URL").expect("CHARGE_DATABASE_URL must be set");
        let max_connections = env::var("CHARGE_DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()?;
        let min_connections = env::var("CHARGE_DATABASE_MIN_CONNECTIONS")
            .unwrap_or_else(|_| "1".to_string())
            .parse()?;

        let auth_base_url =
            env::var("AUTH_SERVICE_URL").unwrap_or_else(|_| "http://localhost:3001".to_string());

        Ok(Self {
            server: ServerConfig { host, port },
            database: DatabaseConfig {
                url: Secret::new(db_url),
                max_connections,
                min_connections,
            },
            auth: AuthServiceConfig {
                base_url: auth_base_url,
                connect_timeout: None,
                request_timeout: None,
            },
            service_name: "charge-service".to_string(),
        })
    }
}
