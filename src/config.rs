use std::fmt;
use std::path::PathBuf;

pub const PORT_VAR: &str = "TODO_NOTES_PORT";
pub const DB_VAR: &str = "TODO_NOTES_DB";
pub const ENV_VAR: &str = "TODO_NOTES_ENV";

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DB: &str = "data/todos.sqlite";
const FRONTEND_DIR: &str = "frontend";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn default_log_filter(self) -> &'static str {
        match self {
            Environment::Development => "todo_notes=debug,tower_http=debug",
            Environment::Production => "todo_notes=info,tower_http=info",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub database_path: PathBuf,
    pub environment: Environment,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    InvalidPort(String),
    InvalidEnvironment(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort(value) => {
                write!(f, "{PORT_VAR} must be a port number, got {value:?}")
            }
            ConfigError::InvalidEnvironment(value) => write!(
                f,
                "{ENV_VAR} must be \"development\" or \"production\", got {value:?}"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let port = match var(PORT_VAR) {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(value))?,
            None => DEFAULT_PORT,
        };

        let database_path = var(DB_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB));

        let environment = match var(ENV_VAR).as_deref().map(str::trim) {
            None | Some("development") => Environment::Development,
            Some("production") => Environment::Production,
            Some(other) => return Err(ConfigError::InvalidEnvironment(other.to_string())),
        };

        Ok(Config {
            port,
            database_path,
            environment,
        })
    }

    /// Where development builds look for live frontend files.
    pub fn frontend_dir(&self) -> Option<PathBuf> {
        match self.environment {
            Environment::Development => Some(PathBuf::from(FRONTEND_DIR)),
            Environment::Production => None,
        }
    }
}
