use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DB_READERS: usize = 4;

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub db_readers: usize,
    pub jwt_secret: String,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// `SOCIAL_DB_PATH` and `SOCIAL_JWT_SECRET` are required; the rest
    /// fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let db_path = required(&lookup, "SOCIAL_DB_PATH")?;
        let jwt_secret = required(&lookup, "SOCIAL_JWT_SECRET")?;

        let host = lookup("SOCIAL_HOST").unwrap_or_else(|| DEFAULT_HOST.into());
        let port = match lookup("SOCIAL_PORT") {
            Some(raw) => raw.parse::<u16>().context("SOCIAL_PORT must be a port number")?,
            None => DEFAULT_PORT,
        };
        let db_readers = match lookup("SOCIAL_DB_READERS") {
            Some(raw) => raw
                .parse::<usize>()
                .context("SOCIAL_DB_READERS must be a non-negative integer")?,
            None => DEFAULT_DB_READERS,
        };

        Ok(Self {
            db_path: PathBuf::from(db_path),
            db_readers,
            jwt_secret,
            host,
            port,
        })
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse::<SocketAddr>()
            .with_context(|| format!("invalid listen address {addr}"))
    }
}

fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    match lookup(key) {
        Some(value) if !value.is_empty() => Ok(value),
        Some(_) => bail!("{key} must not be empty"),
        None => bail!("{key} is not set"),
    }
}
