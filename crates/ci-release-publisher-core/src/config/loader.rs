//! Configuration file discovery and parsing

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ConfigError, Result};

use super::defaults::config_file_names;
use super::types::PublisherConfig;
use super::validation::validate_config;

/// Parse and validate a TOML or YAML configuration file, chosen by extension
pub fn load_config(path: &Path) -> Result<PublisherConfig> {
    let is_toml = path.extension().is_some_and(|e| e == "toml");
    let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

    let config: PublisherConfig = if is_toml {
        toml::from_str(&content).map_err(ConfigError::TomlError)?
    } else {
        serde_yaml::from_str(&content).map_err(ConfigError::YamlError)?
    };
    validate_config(&config)?;

    info!(path = %path.display(), tag_prefix = %config.tag_prefix, "loaded config");
    Ok(config)
}

/// Nearest configuration file at or above `start_dir`
///
/// Each directory is checked directly and under `.github/`, trying every
/// known file name before moving up to the parent.
pub fn find_config(start_dir: &Path) -> Option<PathBuf> {
    start_dir.ancestors().find_map(|dir| {
        config_file_names()
            .into_iter()
            .flat_map(|name| [dir.join(name), dir.join(".github").join(name)])
            .find(|candidate| candidate.is_file())
    })
}

/// Load the nearest configuration file, or the defaults when there is none
///
/// A file that exists but fails to parse or validate is an error.
pub fn load_config_or_default(dir: &Path) -> Result<(PublisherConfig, Option<PathBuf>)> {
    match find_config(dir) {
        Some(path) => Ok((load_config(&path)?, Some(path))),
        None => {
            debug!(dir = %dir.display(), "no config file, using defaults");
            Ok((PublisherConfig::default(), None))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_config_toml() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("ci-release-publisher.toml");
        std::fs::write(&config_path, "tag_prefix = \"build\"\n").unwrap();

        assert_eq!(find_config(temp.path()), Some(config_path));
    }

    #[test]
    fn test_find_config_prefers_toml_over_yaml() {
        let temp = TempDir::new().unwrap();
        let toml_path = temp.path().join("ci-release-publisher.toml");
        let yaml_path = temp.path().join("ci-release-publisher.yaml");
        std::fs::write(&toml_path, "tag_prefix = \"a\"\n").unwrap();
        std::fs::write(&yaml_path, "tag_prefix: b\n").unwrap();

        assert_eq!(find_config(temp.path()).unwrap(), toml_path);
    }

    #[test]
    fn test_find_config_in_github_dir() {
        let temp = TempDir::new().unwrap();
        let github_dir = temp.path().join(".github");
        std::fs::create_dir_all(&github_dir).unwrap();
        let config_path = github_dir.join(".ci-release-publisher.yaml");
        std::fs::write(&config_path, "tag_prefix: b\n").unwrap();

        assert_eq!(find_config(temp.path()), Some(config_path));
    }

    #[test]
    fn test_find_config_in_parent() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        let config_path = temp.path().join("ci-release-publisher.toml");
        std::fs::write(&config_path, "").unwrap();

        assert_eq!(find_config(&nested), Some(config_path));
    }

    #[test]
    fn test_load_config_yaml() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("ci-release-publisher.yaml");
        std::fs::write(
            &config_path,
            "tag_prefix: nightly\ntravis: private\nhttp:\n  max_attempts: 3\n",
        )
        .unwrap();

        let config = load_config(&config_path).unwrap();
        assert_eq!(config.tag_prefix, "nightly");
        assert_eq!(
            config.travis,
            ci_release_publisher_providers::TravisEndpoint::Private
        );
        assert_eq!(config.http.max_attempts, 3);
    }

    #[test]
    fn test_load_config_rejects_invalid_values() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("ci-release-publisher.toml");
        std::fs::write(&config_path, "tag_prefix = \"\"\n").unwrap();

        assert!(load_config(&config_path).is_err());
        assert!(load_config_or_default(temp.path()).is_err());
    }

    #[test]
    fn test_load_config_or_default_without_file() {
        let temp = TempDir::new().unwrap();
        let (config, path) = load_config_or_default(temp.path()).unwrap();
        assert_eq!(config, PublisherConfig::default());
        assert!(path.is_none());
    }
}
