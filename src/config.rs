use anyhow::Result;
use clap::Parser;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "livros")]
#[command(about = "Runs the book donation catalog service", long_about = None)]
pub struct Cli {
    #[arg(short = 'c', long = "config")]
    pub config_path: Option<String>,
}

pub fn default_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".livros")
}

pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.yaml")
}

#[derive(Debug, Deserialize, Clone)]
pub struct App {
    #[serde(default = "default_database")]
    database: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default)]
    pub frontend_origin: Option<String>,
}

fn default_database() -> String {
    "database.db".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for App {
    fn default() -> Self {
        App {
            database: default_database(),
            port: default_port(),
            frontend_origin: None,
        }
    }
}

impl App {
    pub fn get_db(&self) -> &str {
        &self.database
    }

    pub fn get_port(&self) -> u16 {
        self.port
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub app: App,
    // Relative database paths resolve against the config file's directory.
    #[serde(skip)]
    base_dir: PathBuf,
}

impl Config {
    pub fn new(path: &str) -> Result<Self> {
        let mut cfg = Config::load_config(path)?;
        cfg.base_dir = Path::new(path)
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_default();
        Ok(cfg)
    }

    /// Loads `path` when given, else the default config file if it exists,
    /// else built-in defaults. `FRONTEND_ORIGIN` fills in a missing origin.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut cfg = match path {
            Some(path) => Config::new(path)?,
            None => {
                let default_path = default_config_path();
                if default_path.exists() {
                    Config::new(&default_path.to_string_lossy())?
                } else {
                    tracing::info!("no config file found, using defaults");
                    Config::default()
                }
            }
        };

        if cfg.app.frontend_origin.is_none() {
            cfg.app.frontend_origin = env::var("FRONTEND_ORIGIN").ok();
        }
        cfg.app.frontend_origin = cfg.app.frontend_origin.take().filter(|o| !o.trim().is_empty());

        Ok(cfg)
    }

    pub fn database_path(&self) -> PathBuf {
        self.base_dir.join(self.app.get_db())
    }

    fn load_config(path: &str) -> Result<Config> {
        let yaml_str = fs::read_to_string(path)?;
        let yaml_with_env = Config::substitute_env_vars(&yaml_str);
        let config: Config = serde_yaml::from_str(&yaml_with_env)?;
        Ok(config)
    }

    /// Expands `${VAR}` and `${VAR:-fallback}` placeholders. Unset variables
    /// without a fallback expand to nothing; an unterminated `${` is kept as is.
    fn substitute_env_vars(yaml_str: &str) -> String {
        let mut out = String::with_capacity(yaml_str.len());
        let mut rest = yaml_str;

        while let Some(open) = rest.find("${") {
            let (before, tail) = rest.split_at(open);
            out.push_str(before);

            let Some(close) = tail.find('}') else {
                rest = tail;
                break;
            };
            out.push_str(&expand_placeholder(&tail[2..close]));
            rest = &tail[close + 1..];
        }

        out.push_str(rest);
        out
    }
}

fn expand_placeholder(expr: &str) -> String {
    let (name, fallback) = match expr.split_once(":-") {
        Some((name, fallback)) => (name, Some(fallback)),
        None => (expr, None),
    };

    match (env::var(name), fallback) {
        (Ok(value), _) => value,
        (Err(_), Some(fallback)) => fallback.to_string(),
        (Err(_), None) => {
            tracing::warn!(var = name, "config references unset environment variable");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitute_env_vars_uses_default() {
        let out = Config::substitute_env_vars("port: ${LIVROS_TEST_SURELY_UNSET_PORT:-5001}");
        assert_eq!(out, "port: 5001");
    }

    #[test]
    fn test_substitute_env_vars_reads_environment() {
        let Ok(path) = env::var("PATH") else {
            return;
        };
        let out = Config::substitute_env_vars("x: ${PATH} y: ${PATH:-none}");
        assert_eq!(out, format!("x: {path} y: {path}"));
    }

    #[test]
    fn test_substitute_env_vars_missing_is_empty() {
        let out = Config::substitute_env_vars("a: '${LIVROS_TEST_SURELY_UNSET}' b: ${x");
        assert_eq!(out, "a: '' b: ${x");
    }

    #[test]
    fn test_new_reads_yaml_and_resolves_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            "app:\n  database: acervo.db\n  port: ${LIVROS_TEST_SURELY_UNSET_PORT:-8080}\n  frontend_origin: http://localhost:3000\n",
        )
        .unwrap();

        let cfg = Config::new(path.to_str().unwrap()).unwrap();

        assert_eq!(cfg.app.get_port(), 8080);
        assert_eq!(cfg.app.frontend_origin.as_deref(), Some("http://localhost:3000"));
        assert_eq!(cfg.database_path(), dir.path().join("acervo.db"));
    }

    #[test]
    fn test_missing_keys_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "app: {}\n").unwrap();

        let cfg = Config::new(path.to_str().unwrap()).unwrap();

        assert_eq!(cfg.app.get_db(), "database.db");
        assert_eq!(cfg.app.get_port(), 5000);
    }

    #[test]
    fn test_load_rejects_missing_explicit_file() {
        assert!(Config::load(Some("/nonexistent/livros/config.yaml")).is_err());
    }
}
