use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_expire_hours: i64,
    pub public_rps: u32,
    /// Completed attempts a single device may record for one quiz package.
    pub guest_device_attempt_cap: i64,
    /// In-progress attempts older than this are swept to `abandoned`. Unset disables the sweep.
    pub abandon_after_minutes: Option<i64>,
    pub cors_allowed_origins: Option<Vec<String>>,
    pub admin_seed: Option<AdminSeed>,
}

#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
    pub name: String,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let admin_seed = match (env::var("ADMIN_EMAIL"), env::var("ADMIN_PASSWORD")) {
            (Ok(email), Ok(password)) => Some(AdminSeed {
                email,
                password,
                name: get_env_or("ADMIN_NAME", "Administrator"),
            }),
            _ => None,
        };

        Ok(Self {
            server_address: get_env_or("SERVER_ADDRESS", "0.0.0.0:8080"),
            database_url: get_env("DATABASE_URL")?,
            database_max_connections: get_env_parse_or("DATABASE_MAX_CONNECTIONS", 20)?,
            jwt_secret: get_env("JWT_SECRET")?,
            jwt_expire_hours: get_env_parse_or("JWT_EXPIRE_HOURS", 24)?,
            public_rps: get_env_parse_or("PUBLIC_RPS", 50)?,
            guest_device_attempt_cap: get_env_parse_or("GUEST_DEVICE_ATTEMPT_CAP", 3)?,
            abandon_after_minutes: get_env_parse_opt("ABANDON_AFTER_MINUTES")?,
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS").ok().map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            }),
            admin_seed,
        })
    }

    /// Defaults used by tests and local tooling; no environment is read.
    pub fn for_tests(jwt_secret: &str) -> Self {
        Self {
            server_address: "127.0.0.1:0".to_string(),
            database_url: String::new(),
            database_max_connections: 1,
            jwt_secret: jwt_secret.to_string(),
            jwt_expire_hours: 24,
            public_rps: 1000,
            guest_device_attempt_cap: 3,
            abandon_after_minutes: None,
            cors_allowed_origins: None,
            admin_seed: None,
        }
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    Ok(get_env_parse_opt(name)?.unwrap_or(default))
}

fn get_env_parse_opt<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(None),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> Result<&'static Config> {
    CONFIG
        .get()
        .ok_or_else(|| Error::Config("Configuration has not been initialized".to_string()))
}
