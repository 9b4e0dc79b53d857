use crate::parser::FragmentPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file name, looked up in the working directory
pub const CONFIG_FILE: &str = "problemdata.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3456
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory scanned for course files
    #[serde(default = "default_course_dir")]
    pub course_dir: PathBuf,
}

fn default_course_dir() -> PathBuf {
    PathBuf::from("courses")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            course_dir: default_course_dir(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,
}

fn default_page_size() -> usize {
    10
}

fn default_max_page_size() -> usize {
    100
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

impl PaginationConfig {
    /// Requested page size, falling back to the default and capped at the maximum
    pub fn effective_page_size(&self, requested: Option<usize>) -> usize {
        requested
            .filter(|&size| size > 0)
            .unwrap_or(self.page_size)
            .min(self.max_page_size)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Handling of fragments that fail extraction
    #[serde(default)]
    pub fragment_policy: FragmentPolicy,
}

/// problemdata configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemDataConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub pagination: PaginationConfig,
    #[serde(default)]
    pub parser: ParserConfig,
}

impl ProblemDataConfig {
    /// Load config from `path`, defaults when the file does not exist
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: ProblemDataConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load `problemdata.toml` from `dir`
    pub fn load_from_dir(dir: &Path) -> anyhow::Result<Self> {
        Self::load(&dir.join(CONFIG_FILE))
    }
}
