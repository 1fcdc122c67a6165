//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading every country
//! rule set found in a directory of YAML files.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{EngineError, EngineResult};

use super::types::{CountryConfig, CountryConfigFile};

/// Loads and provides access to country rule sets.
///
/// The `ConfigLoader` reads one YAML file per country from a directory and
/// indexes the validated [`CountryConfig`]s by their `country` key.
///
/// # Directory Structure
///
/// ```text
/// config/countries/
/// ├── canada.yaml
/// ├── ireland.yaml
/// └── spain.yaml
/// ```
///
/// The file name is irrelevant; each file names its country in the `country`
/// field.
///
/// # Example
///
/// ```no_run
/// use payroll_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/countries")?;
/// let spain = loader.get_country("Spain")?;
/// println!("Spain pays {} periods per year", spain.periods_per_year());
/// # Ok::<(), payroll_engine::error::EngineError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    countries: BTreeMap<String, CountryConfig>,
}

impl ConfigLoader {
    /// Loads every `.yaml`/`.yml` file in the specified directory.
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` instance on success, or an error if:
    /// - The directory does not exist or contains no rule files
    /// - Any file contains invalid YAML
    /// - Any rule set violates a load-time invariant
    /// - Two files declare the same country
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();
        let dir_str = path.display().to_string();

        if !path.is_dir() {
            return Err(EngineError::ConfigNotFound { path: dir_str });
        }

        let entries = fs::read_dir(path).map_err(|_| EngineError::ConfigNotFound {
            path: dir_str.clone(),
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|_| EngineError::ConfigNotFound {
                path: dir_str.clone(),
            })?;
            let file_path = entry.path();
            if file_path
                .extension()
                .is_some_and(|ext| ext == "yaml" || ext == "yml")
            {
                files.push(file_path);
            }
        }
        files.sort();

        if files.is_empty() {
            return Err(EngineError::ConfigNotFound {
                path: format!("{} (no country files found)", dir_str),
            });
        }

        let mut configs = Vec::with_capacity(files.len());
        for file_path in &files {
            let file = Self::load_yaml::<CountryConfigFile>(file_path)?;
            let config = CountryConfig::try_from(file)?;
            debug!(
                country = %config.country(),
                path = %file_path.display(),
                "Loaded country rule set"
            );
            configs.push(config);
        }

        Self::from_configs(configs)
    }

    /// Builds a loader from already-validated rule sets.
    ///
    /// Fails with `InvalidConfig` if two rule sets share a country key.
    pub fn from_configs(configs: Vec<CountryConfig>) -> EngineResult<Self> {
        let mut countries = BTreeMap::new();
        for config in configs {
            let key = config.country().to_string();
            if countries.contains_key(&key) {
                return Err(EngineError::InvalidConfig {
                    country: key,
                    message: "country is defined more than once".to_string(),
                });
            }
            countries.insert(key, config);
        }
        Ok(Self { countries })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Gets the rule set for a country.
    ///
    /// Returns `CountryConfigNotFound` when no rule set is registered under
    /// `country`.
    pub fn get_country(&self, country: &str) -> EngineResult<&CountryConfig> {
        self.countries
            .get(country)
            .ok_or_else(|| EngineError::CountryConfigNotFound {
                country: country.to_string(),
            })
    }

    /// Returns the registered country keys in sorted order.
    pub fn countries(&self) -> impl Iterator<Item = &str> {
        self.countries.keys().map(String::as_str)
    }
}
