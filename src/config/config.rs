use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub fields: FieldConfig,
    pub values: ValueConfig,
    pub search: SearchConfig,
    pub index: IndexConfig,
}

/// How query field names are matched against column names
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Compare field names case-sensitively
    pub case_sensitive: bool,

    /// Characters stripped from both sides before comparing
    pub ignore_chars: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValueConfig {
    /// Case-insensitive equality and substring matching for text columns
    pub case_insensitive: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Case-insensitive substring match on any column
    Substring,
    /// Skim-style fuzzy match on any column
    Fuzzy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub mode: SearchMode,

    /// Minimum fuzzy score a cell must exceed in fuzzy mode
    pub fuzzy_threshold: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Build secondary indices right after import
    pub auto_build: bool,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            ignore_chars: "_- ".to_string(),
        }
    }
}

impl Default for ValueConfig {
    fn default() -> Self {
        Self {
            case_insensitive: true,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            mode: SearchMode::Substring,
            fuzzy_threshold: 0,
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self { auto_build: true }
    }
}

impl FieldConfig {
    /// Normalise a field or column name for comparison
    pub fn normalize(&self, name: &str) -> String {
        let stripped = name
            .chars()
            .filter(|c| !self.ignore_chars.contains(*c))
            .collect::<String>();
        if self.case_sensitive {
            stripped
        } else {
            stripped.to_lowercase()
        }
    }
}

impl EngineConfig {
    /// Load config from the default location
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            // Create default config if it doesn't exist
            let default_config = Self::default();
            default_config.save_to(&config_path)?;
            return Ok(default_config);
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        debug!("EngineConfig: loading {:?}", path);
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;

        Ok(())
    }

    /// Get the default config file path
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("grid-query").join("config.toml"))
    }

    /// Create a default config file with comments
    pub fn create_default_with_comments() -> String {
        r#"# grid-query configuration
# Location: ~/.config/grid-query/config.toml (Linux)

[fields]
# Match query field names case-sensitively
case_sensitive = false
# Characters ignored when matching field names ("first_name" == "FirstName")
ignore_chars = "_- "

[values]
# Case-insensitive equality and substring matching for text columns
case_insensitive = true

[search]
# "substring" or "fuzzy"
mode = "substring"
# Minimum score for fuzzy mode
fuzzy_threshold = 0

[index]
# Build secondary indices right after import
auto_build = true
"#
        .to_string()
    }
}
