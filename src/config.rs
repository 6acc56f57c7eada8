// src/config.rs

use std::{
    collections::BTreeMap,
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

use crate::schema::{Field, FieldAliases};

pub const CONFIG_ENV: &str = "REPD_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "repd.yaml";

const DEFAULT_PAGE_URL: &str =
    "https://www.gov.uk/government/publications/renewable-energy-planning-database-monthly-extract";

/// Text encoding of an extract on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// Valid UTF-8 is taken as such, anything else is read as Latin-1.
    #[default]
    Auto,
    #[serde(alias = "utf-8")]
    Utf8,
    #[serde(alias = "iso-8859-1", alias = "latin-1")]
    Latin1,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub max_retries: u32,
    pub backoff_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_ms: 500,
        }
    }
}

/// Non-secret notification settings. Relay address and credentials are read
/// from the environment by [`crate::notify::Notifier::from_env`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub enabled: bool,
    pub subject_prefix: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            subject_prefix: "REPD".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Publication page scanned for the latest extract link.
    pub page_url: String,
    pub link_extension: String,
    pub link_keyword: String,
    pub raw_dir: PathBuf,
    pub accumulated_file: PathBuf,
    pub log_file: PathBuf,
    pub export_dir: PathBuf,
    pub encoding: Encoding,
    pub http: HttpConfig,
    /// Extra source labels per canonical field, merged over the built-in table.
    pub aliases: BTreeMap<Field, Vec<String>>,
    pub notify: NotifyConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_url: DEFAULT_PAGE_URL.into(),
            link_extension: ".csv".into(),
            link_keyword: "repd".into(),
            raw_dir: PathBuf::from("raw_data"),
            accumulated_file: PathBuf::from("cleaned_repd.csv"),
            log_file: PathBuf::from("update_log.txt"),
            export_dir: PathBuf::from("exports"),
            encoding: Encoding::Auto,
            http: HttpConfig::default(),
            aliases: BTreeMap::new(),
            notify: NotifyConfig::default(),
        }
    }
}

impl Config {
    /// Load from `$REPD_CONFIG` (which must exist when set), else `repd.yaml`
    /// in the working directory if present, else defaults.
    pub fn load() -> Result<Self> {
        match env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path)),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))
            }
            None => {
                debug!("no config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text =
            fs::read_to_string(path).with_context(|| format!("reading config {:?}", path))?;
        let cfg = Self::from_yaml(&text).with_context(|| format!("parsing config {:?}", path))?;
        info!(path = %path.display(), "loaded config");
        Ok(cfg)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn field_aliases(&self) -> FieldAliases {
        FieldAliases::builtin().with_overrides(&self.aliases)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_gives_defaults() {
        let cfg = Config::from_yaml("").unwrap();
        assert_eq!(cfg.link_extension, ".csv");
        assert_eq!(cfg.accumulated_file, PathBuf::from("cleaned_repd.csv"));
        assert_eq!(cfg.encoding, Encoding::Auto);
        assert_eq!(cfg.http.max_retries, 3);
    }

    #[test]
    fn partial_yaml_overrides_only_named_fields() {
        let cfg = Config::from_yaml(
            r#"
raw_dir: cache
encoding: iso-8859-1
http:
  max_retries: 5
aliases:
  region: ["Region Name"]
notify:
  enabled: false
"#,
        )
        .unwrap();
        assert_eq!(cfg.raw_dir, PathBuf::from("cache"));
        assert_eq!(cfg.encoding, Encoding::Latin1);
        assert_eq!(cfg.http.max_retries, 5);
        assert_eq!(cfg.http.backoff_ms, 500);
        assert!(!cfg.notify.enabled);
        assert_eq!(cfg.notify.subject_prefix, "REPD");

        let aliases = cfg.field_aliases();
        assert_eq!(aliases.resolve(" \"Region Name\" "), Some(Field::Region));
        assert_eq!(aliases.resolve("Region"), Some(Field::Region));
    }

    #[test]
    fn unknown_alias_field_is_rejected() {
        assert!(Config::from_yaml("aliases:\n  not_a_field: [x]\n").is_err());
    }
}
