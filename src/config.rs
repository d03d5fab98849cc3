use anyhow::Result;
use clap::Parser;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::pagination::DEFAULT_PAGE_SIZE;

#[derive(Parser, Debug)]
#[command(name = "shelf")]
#[command(about = "Runs the shelf book catalog", long_about = None)]
pub struct Cli {
    #[arg(short = 'c', long = "config")]
    pub config_path: Option<String>,

    /// Overrides `app.port` from the config file.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,
}

pub fn default_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".shelf")
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
    #[serde(default = "default_page_size")]
    page_size: u32,
}

fn default_database() -> String {
    "shelf.db".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for App {
    fn default() -> Self {
        App {
            database: default_database(),
            port: default_port(),
            page_size: default_page_size(),
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

    pub fn set_port(&mut self, port: u16) {
        self.port = port;
    }

    pub fn get_page_size(&self) -> u32 {
        self.page_size.max(1)
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    #[serde(default)]
    pub app: App,
}

impl Config {
    pub fn new(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::warn!(path = ?path, "config file not found, using defaults");
            return Ok(Config::default());
        }
        let cfg = Config::load_config(path)?;
        Ok(cfg)
    }

    /// Config for an in-memory catalog, used by tests.
    pub fn in_memory() -> Self {
        Config {
            app: App {
                database: ":memory:".to_string(),
                ..App::default()
            },
        }
    }

    fn load_config(path: &Path) -> Result<Config> {
        let yaml_str = fs::read_to_string(path)?;
        Config::from_yaml(&yaml_str)
    }

    pub fn from_yaml(yaml_str: &str) -> Result<Config> {
        let yaml_with_env = Config::substitute_env_vars(yaml_str)?;
        let config: Config = serde_yaml::from_str(&yaml_with_env)?;
        Ok(config)
    }

    fn substitute_env_vars(yaml_str: &str) -> Result<String> {
        let mut result = yaml_str.to_string();
        let mut offset = 0;

        while let Some(start) = result[offset..].find("${") {
            let actual_start = offset + start;
            if let Some(end) = result[actual_start..].find('}') {
                let var_name = &result[actual_start + 2..actual_start + end];

                // ${VAR:-default}
                let env_value = if let Some(default_start) = var_name.find(":-") {
                    let actual_var = &var_name[..default_start];
                    let default_val = &var_name[default_start + 2..];
                    env::var(actual_var).unwrap_or_else(|_| default_val.to_string())
                } else {
                    env::var(var_name).unwrap_or_else(|_| {
                        tracing::warn!(var = var_name, "environment variable not found");
                        String::new()
                    })
                };

                result.replace_range(actual_start..actual_start + end + 1, &env_value);
                offset = actual_start + env_value.len();
            } else {
                break;
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_sections_missing() {
        let cfg = Config::from_yaml("app: {}\n").unwrap();
        assert_eq!(cfg.app.get_db(), "shelf.db");
        assert_eq!(cfg.app.get_port(), 3000);
        assert_eq!(cfg.app.get_page_size(), 5);
    }

    #[test]
    fn test_env_default_substitution() {
        let yaml = "app:\n  database: ${SHELF_TEST_SURELY_UNSET_DB:-catalog.db}\n  port: 8080\n";
        let cfg = Config::from_yaml(yaml).unwrap();
        assert_eq!(cfg.app.get_db(), "catalog.db");
        assert_eq!(cfg.app.get_port(), 8080);
    }

    #[test]
    fn test_zero_page_size_is_clamped() {
        let cfg = Config::from_yaml("app:\n  page_size: 0\n").unwrap();
        assert_eq!(cfg.app.get_page_size(), 1);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let cfg = Config::new(Path::new("/nonexistent/shelf/config.yaml")).unwrap();
        assert_eq!(cfg.app.get_port(), 3000);
    }
}
