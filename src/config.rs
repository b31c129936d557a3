use std::{env, net::SocketAddr, path::PathBuf};

use crate::error::AppError;

const DEFAULT_SESSION_TTL_SECS: i64 = 3600;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub listen_addr: SocketAddr,
    pub submissions_dir: PathBuf,
    pub session_ttl_secs: i64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://gradebook.db".to_string());
        let listen_addr: SocketAddr = env::var("APP_LISTEN_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
            .parse()
            .map_err(|err| AppError::Config(format!("invalid APP_LISTEN_ADDR: {err}")))?;

        let submissions_dir = env::var("SUBMISSIONS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("submissions"));

        let session_ttl_secs = match env::var("SESSION_TTL_SECS") {
            Ok(raw) => raw
                .parse::<i64>()
                .map_err(|err| AppError::Config(format!("invalid SESSION_TTL_SECS: {err}")))?,
            Err(_) => DEFAULT_SESSION_TTL_SECS,
        };
        if session_ttl_secs <= 0 {
            return Err(AppError::Config(
                "SESSION_TTL_SECS must be positive".to_string(),
            ));
        }

        Ok(Self {
            database_url,
            listen_addr,
            submissions_dir,
            session_ttl_secs,
        })
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.session_ttl_secs)
    }
}
