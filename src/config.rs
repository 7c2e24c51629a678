use crate::service::RelationPolicy;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_ADDR: &str = "127.0.0.1:8080";

const ADDR_VAR: &str = "FILMORATE_ADDR";
const DB_PATH_VAR: &str = "FILMORATE_DB_PATH";
const RELATIONS_VAR: &str = "FILMORATE_UPDATE_RELATIONS";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{var} must not be empty")]
    Empty { var: &'static str },

    #[error("invalid {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub bind_address: String,
    /// On-disk location of the database. `None` opens a temporary one.
    pub db_path: Option<PathBuf>,
    pub relation_policy: RelationPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_address: DEFAULT_ADDR.to_owned(),
            db_path: None,
            relation_policy: RelationPolicy::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self, ConfigError> {
        let mut config = Config::default();
        if let Some(addr) = lookup(ADDR_VAR) {
            if addr.trim().is_empty() {
                return Err(ConfigError::Empty { var: ADDR_VAR });
            }
            config.bind_address = addr.trim().to_owned();
        }
        config.db_path = lookup(DB_PATH_VAR)
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);
        if let Some(policy) = lookup(RELATIONS_VAR) {
            config.relation_policy = policy.parse().map_err(|reason| ConfigError::Invalid {
                var: RELATIONS_VAR,
                reason,
            })?;
        }
        Ok(config)
    }

    pub fn open_db(&self) -> sled::Result<sled::Db> {
        match &self.db_path {
            Some(path) => sled::Config::new().path(path).open(),
            None => sled::Config::new().temporary(true).open(),
        }
    }
}
