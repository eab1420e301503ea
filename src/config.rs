use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::batch::DEFAULT_BATCH_SIZE;
use crate::convert::FormatOptions;
use crate::fields::FieldAliases;
use crate::models::Field;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub tables: TablesConfig,
    #[serde(default)]
    pub conversion: ConversionConfig,
    #[serde(default)]
    pub output: OutputConfig,
    /// Per-field alias overrides, keyed by canonical field name.
    #[serde(default)]
    pub fields: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TablesConfig {
    #[serde(default = "default_charities_table")]
    pub charities: String,
    #[serde(default = "default_rag_contexts_table")]
    pub rag_contexts: String,
}

impl Default for TablesConfig {
    fn default() -> Self {
        Self {
            charities: default_charities_table(),
            rag_contexts: default_rag_contexts_table(),
        }
    }
}

fn default_charities_table() -> String {
    "charities".to_string()
}
fn default_rag_contexts_table() -> String {
    "rag_contexts".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ConversionConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_include_metadata")]
    pub include_metadata: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            include_metadata: true,
        }
    }
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}
fn default_include_metadata() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            file_prefix: default_file_prefix(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./outputs")
}
fn default_file_prefix() -> String {
    "charity_rag".to_string()
}

impl Config {
    /// Defaults for commands that can run without a config file.
    pub fn minimal() -> Self {
        Self {
            db: DbConfig {
                path: PathBuf::from("./data/charity.sqlite"),
            },
            tables: TablesConfig::default(),
            conversion: ConversionConfig::default(),
            output: OutputConfig::default(),
            fields: BTreeMap::new(),
        }
    }

    pub fn format_options(&self) -> FormatOptions {
        FormatOptions {
            include_metadata: self.conversion.include_metadata,
            batch_size: self.conversion.batch_size,
        }
    }

    /// The default alias table with any `[fields]` overrides applied.
    pub fn field_aliases(&self) -> Result<FieldAliases> {
        let mut aliases = FieldAliases::default();
        for (key, list) in &self.fields {
            let field = Field::from_key(key).with_context(|| {
                format!(
                    "Unknown field '{}' in [fields]. Known fields: {}",
                    key,
                    Field::ALL.map(|f| f.key()).join(", ")
                )
            })?;
            aliases = aliases.with_override(field, list.clone())?;
        }
        Ok(aliases)
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.conversion.batch_size == 0 {
        bail!("conversion.batch_size must be > 0");
    }

    validate_identifier("tables.charities", &config.tables.charities)?;
    validate_identifier("tables.rag_contexts", &config.tables.rag_contexts)?;
    if config.tables.charities == config.tables.rag_contexts {
        bail!("tables.charities and tables.rag_contexts must differ");
    }

    if config.output.file_prefix.trim().is_empty() {
        bail!("output.file_prefix must not be empty");
    }

    config.field_aliases()?;
    Ok(())
}

/// Table names are interpolated into SQL, so only plain identifiers pass.
pub fn validate_identifier(setting: &str, name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false);
    if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        bail!(
            "{} must be a plain identifier (letters, digits, underscore), got '{}'",
            setting,
            name
        );
    }
    Ok(())
}
