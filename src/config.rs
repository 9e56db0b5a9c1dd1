use anyhow::{Context, Result};
use serde::{de, Deserialize, Deserializer};
use std::{fs, path::Path};

use crate::schema::RecordLayout;

/// Reader settings, loadable from YAML.
///
/// ```yaml
/// delimiter: ";"
/// trim_leading_space: true
/// clean_cells: false
/// limit: 100
/// layout:
///   columns:
///     - name: ID
///       type: u64
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    #[serde(deserialize_with = "ascii_delimiter")]
    pub delimiter: u8,
    /// Strip leading whitespace from every cell; trailing whitespace is kept.
    pub trim_leading_space: bool,
    /// Install [`crate::hooks::clean`] on cells and header names.
    pub clean_cells: bool,
    pub limit: Option<usize>,
    pub layout: Option<RecordLayout>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            delimiter: b',',
            trim_leading_space: true,
            clean_cells: false,
            limit: None,
            layout: None,
        }
    }
}

impl ReaderConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("parsing reader config")
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text =
            fs::read_to_string(path).with_context(|| format!("reading config {:?}", path))?;
        Self::from_yaml_str(&text).with_context(|| format!("loading config {:?}", path))
    }
}

fn ascii_delimiter<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let c = char::deserialize(deserializer)?;
    if c.is_ascii() {
        Ok(c as u8)
    } else {
        Err(de::Error::custom(format!(
            "delimiter {:?} is not a single ASCII character",
            c
        )))
    }
}
