use crate::Result;
use crate::crawl::RetryPolicy;
use camino::{Utf8Path, Utf8PathBuf};
use core::time::Duration;
use ohno::{IntoAppError, app_err};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io;

/// The default configuration TOML content, embedded from `default_config.toml`
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../default_config.toml");

/// GitHub's upper bound for `per_page`
const MAX_RESULTS_PER_PAGE: u32 = 100;

fn default_api_base_url() -> String {
    "https://api.github.com".to_string()
}

fn default_raw_base_url() -> String {
    "https://raw.githubusercontent.com".to_string()
}

fn default_library_index_url() -> String {
    "http://downloads.arduino.cc/libraries/library_index.json".to_string()
}

const fn default_include_library_index() -> bool {
    true
}

const fn default_results_per_page() -> u32 {
    MAX_RESULTS_PER_PAGE
}

fn default_retry_statuses() -> Vec<u16> {
    vec![403, 502, 503]
}

const fn default_retry_delay() -> u64 {
    60
}

const fn default_max_retries() -> u32 {
    5
}

const fn default_notification_interval() -> u64 {
    300
}

const fn default_search_ceiling() -> u64 {
    1000
}

/// Which repositories a search includes with respect to forks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ForkFilter {
    /// Forks and non-forks.
    #[default]
    True,

    /// Non-forks only.
    False,

    /// Forks only.
    Only,
}

impl ForkFilter {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::True => "true",
            Self::False => "false",
            Self::Only => "only",
        }
    }
}

/// One search of the search plan.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SearchSpec {
    pub name: String,

    /// Search terms and qualifiers, without `created:` or `fork:`.
    pub query: String,

    /// Creation date ranges, each searched separately.
    #[serde(default)]
    pub created: Vec<String>,

    #[serde(default)]
    pub fork: ForkFilter,

    /// Only catalog repositories holding a library at their root that doesn't look like a sketch.
    #[serde(default)]
    pub verify: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_raw_base_url")]
    pub raw_base_url: String,

    #[serde(default = "default_library_index_url")]
    pub library_index_url: String,

    #[serde(default = "default_include_library_index")]
    pub include_library_index: bool,

    #[serde(default = "default_results_per_page")]
    pub results_per_page: u32,

    #[serde(default = "default_retry_statuses")]
    pub retry_statuses: Vec<u16>,

    /// Seconds to wait before retrying a temporary failure
    #[serde(default = "default_retry_delay")]
    pub retry_delay: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Seconds between notices while waiting for a quota reset
    #[serde(default = "default_notification_interval")]
    pub notification_interval: u64,

    #[serde(default = "default_search_ceiling")]
    pub search_ceiling: u64,

    #[serde(default)]
    pub searches: Vec<SearchSpec>,
}

impl Config {
    /// Load configuration from a file or use defaults
    ///
    /// Without an explicit path, the first of `inoliblist.toml`, `inoliblist.yml`, `inoliblist.yaml` and
    /// `inoliblist.json` found in `dir` is used.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn load(dir: &Utf8Path, config_path: Option<&Utf8Path>) -> Result<(Self, Vec<String>)> {
        let (final_path, text) = if let Some(path) = config_path {
            let text = fs::read_to_string(path).into_app_err_with(|| format!("reading inoliblist configuration from {path}"))?;
            (path.to_path_buf(), text)
        } else {
            let candidates: [Utf8PathBuf; 4] = [
                dir.join("inoliblist.toml"),
                dir.join("inoliblist.yml"),
                dir.join("inoliblist.yaml"),
                dir.join("inoliblist.json"),
            ];

            let mut found = None;
            for path in &candidates {
                match fs::read_to_string(path) {
                    Ok(text) => {
                        found = Some((path.clone(), text));
                        break;
                    }
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => return Err(e).into_app_err_with(|| format!("reading inoliblist configuration from {path}")),
                }
            }

            let Some(result) = found else {
                let config = Self::default();
                let mut warnings = Vec::new();
                config.validate(&mut warnings);
                return Ok((config, warnings));
            };
            result
        };

        let extension = final_path.extension().unwrap_or_default();
        let config: Self = match extension {
            "toml" => toml::from_str(&text).into_app_err_with(|| format!("parsing TOML configuration from {final_path}"))?,
            "yml" | "yaml" => serde_yaml::from_str(&text).into_app_err_with(|| format!("parsing YAML configuration from {final_path}"))?,
            "json" => serde_json::from_str(&text).into_app_err_with(|| format!("parsing JSON configuration from {final_path}"))?,
            _ => return Err(app_err!("unsupported configuration file extension: {extension}")),
        };

        let mut warnings = Vec::new();
        config.validate(&mut warnings);
        Ok((config, warnings))
    }

    /// Save configuration to a file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save(&self, output_path: &Utf8Path) -> Result<()> {
        let extension = output_path.extension().unwrap_or_default();
        let text = match extension {
            "toml" => toml::to_string_pretty(self)
                .into_app_err_with(|| format!("serializing configuration to TOML for saving to {output_path}"))?,
            "yml" | "yaml" => serde_yaml::to_string(self)
                .into_app_err_with(|| format!("serializing configuration to YAML for saving to {output_path}"))?,
            "json" => serde_json::to_string_pretty(self)
                .into_app_err_with(|| format!("serializing configuration to JSON for saving to {output_path}"))?,
            _ => return Err(app_err!("unsupported configuration file extension: {extension}")),
        };

        fs::write(output_path, text).into_app_err_with(|| format!("writing configuration to {output_path}"))?;
        Ok(())
    }

    /// Save the default configuration to a file, preserving comments for TOML format
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn save_default(output_path: &Utf8Path) -> Result<()> {
        if output_path.extension() == Some("toml") {
            fs::write(output_path, DEFAULT_CONFIG_TOML).into_app_err_with(|| format!("writing default configuration to {output_path}"))?;
            Ok(())
        } else {
            Self::default().save(output_path)
        }
    }

    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            statuses: self.retry_statuses.clone(),
            delay: Duration::from_secs(self.retry_delay),
            max_retries: self.max_retries,
        }
    }

    /// Detect configurations that load fine but won't crawl as intended
    fn validate(&self, warnings: &mut Vec<String>) {
        if self.searches.is_empty() {
            warnings.push("the search plan is empty, only the Library Manager index will be crawled".to_string());
        }

        if !(1..=MAX_RESULTS_PER_PAGE).contains(&self.results_per_page) {
            warnings.push(format!(
                "results_per_page is {}, GitHub only honors values from 1 to {MAX_RESULTS_PER_PAGE}",
                self.results_per_page
            ));
        }

        let mut names = HashSet::new();
        for search in &self.searches {
            if search.created.is_empty() {
                warnings.push(format!(
                    "search '{}' has no created date ranges, results beyond {} will be lost",
                    search.name, self.search_ceiling
                ));
            }

            if !names.insert(search.name.as_str()) {
                warnings.push(format!("search name '{}' is used more than once", search.name));
            }
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG_TOML).expect("default_config.toml should be valid TOML that deserializes to Config")
    }
}
