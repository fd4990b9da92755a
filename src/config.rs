//! Configuration for the workbench tools.
//!
//! Loaded from `./workbench.yml` or `~/.config/workbench/workbench.yml`,
//! falling back to defaults. Command-line flags override these values.

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::merge::MergeMode;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub geo: GeoConfig,
    pub merge: MergeConfig,
    pub blog: BlogConfig,
    pub server: ServerConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoConfig {
    pub threshold_km: f64,
    pub input: PathBuf,
    pub output: PathBuf,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            threshold_km: crate::geo::DEFAULT_THRESHOLD_KM,
            input: PathBuf::from("cities.json"),
            output: PathBuf::from("cities_with_nearby.json"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    pub mode: MergeMode,
    pub output: PathBuf,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            mode: MergeMode::Object,
            output: PathBuf::from("merged.json"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlogConfig {
    pub root: PathBuf,
    pub posts_config: String,
    pub site_name: String,
    pub default_category: String,
    pub default_cover_image: String,
    pub date_format: String,
    pub excerpt_fallback: String,
}

impl Default for BlogConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            posts_config: "posts-config.json".to_string(),
            site_name: "博客世界".to_string(),
            default_category: "其他".to_string(),
            default_cover_image:
                "https://images.unsplash.com/photo-1555066931-4365d14bab8c?auto=format&fit=crop&w=1170&q=80"
                    .to_string(),
            date_format: "%Y年%m月%d日".to_string(),
            excerpt_fallback: "点击阅读全文...".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    pub root: PathBuf,
    pub cors: CorsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8000,
            root: PathBuf::from("."),
            cors: CorsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allow_origin: String,
    pub allow_methods: String,
    pub allow_headers: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origin: "*".to_string(),
            allow_methods: "GET, POST, OPTIONS".to_string(),
            allow_headers: "Content-Type".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub reporter: Option<String>,
    pub input: PathBuf,
    pub bug_keywords: Vec<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            reporter: None,
            input: PathBuf::from("task_data.json"),
            bug_keywords: ["bug", "Bug", "BUG", "修复", "问题", "优化"]
                .iter()
                .map(|k| k.to_string())
                .collect(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            geo: GeoConfig::default(),
            merge: MergeConfig::default(),
            blog: BlogConfig::default(),
            server: ServerConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        let project_name = env!("CARGO_PKG_NAME");

        // Try project config: ./<project>.yml
        let project_config = PathBuf::from(format!("{}.yml", project_name));
        if project_config.exists() {
            match Self::load_from_file(&project_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", project_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/<project>/<project>.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.geo.threshold_km, 40.0);
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.cors.allow_origin, "*");
        assert_eq!(config.blog.posts_config, "posts-config.json");
        assert_eq!(config.merge.mode, MergeMode::Object);
        assert_eq!(config.report.bug_keywords.len(), 6);
    }

    #[test]
    fn test_load_partial_yaml_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("workbench.yml");
        fs::write(&path, "server:\n  port: 9090\ngeo:\n  threshold_km: 12.5\n").unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.bind, "0.0.0.0");
        assert_eq!(config.geo.threshold_km, 12.5);
        assert_eq!(config.blog.default_category, "其他");
    }

    #[test]
    fn test_load_merge_mode() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("workbench.yml");
        fs::write(&path, "merge:\n  mode: array\n  output: companies.json\n").unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.merge.mode, MergeMode::Array);
        assert_eq!(config.merge.output, PathBuf::from("companies.json"));
    }

    #[test]
    fn test_load_explicit_missing_file_fails() {
        let missing = PathBuf::from("/nonexistent/workbench.yml");
        assert!(Config::load(Some(&missing)).is_err());
    }

    #[test]
    fn test_load_invalid_yaml_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.yml");
        fs::write(&path, "server: [unclosed").unwrap();
        assert!(Config::load_from_file(&path).is_err());
    }
}
