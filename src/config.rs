use std::path::{Path, PathBuf};

use crate::error::Error;

/// Name of the config file looked up in the working directory.
pub const CONFIG_FILE: &str = ".wikiref.toml";

/// Project configuration loaded from `.wikiref.toml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// TemplateData dump, resolved against the config's directory.
    pub catalog: PathBuf,
    /// Language for labels and descriptions.
    pub language: String,
    /// Change tag recorded when a session writes; `None` when disabled.
    pub tag: Option<String>,
}

/// Raw TOML structure for `.wikiref.toml`.
#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct WikirefTomlConfig {
    /// Catalog path relative to the config file.
    #[serde(default = "default_catalog")]
    catalog: PathBuf,
    /// Label language.
    #[serde(default = "default_language")]
    language: String,
    /// Change tag; an empty string disables tagging.
    #[serde(default = "default_tag")]
    tag: String,
}

impl Config {
    /// Defaults used when no config file exists.
    fn defaults_in(root: &Path) -> Self {
        return Self {
            catalog: root.join(default_catalog()),
            language: default_language(),
            tag: Some(default_tag()),
        };
    }

    /// Load config from `.wikiref.toml` in the given root directory.
    /// Returns defaults if the file doesn't exist.
    /// Returns an error if the file exists but is malformed; a config the
    /// user wrote is never silently replaced by defaults.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// or `Error::TomlDe` if the TOML is malformed.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(CONFIG_FILE);
        let content = match std::fs::read_to_string(&path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::defaults_in(root)),
            Err(e) => return Err(Error::Io(e)),
            Ok(c) => c,
        };

        let raw: WikirefTomlConfig = toml::from_str(&content)?;
        let tag = raw.tag.trim();
        return Ok(Self {
            catalog: root.join(raw.catalog),
            language: raw.language,
            tag: (!tag.is_empty()).then(|| return tag.to_string()),
        });
    }
}

/// Default TemplateData dump file name.
fn default_catalog() -> PathBuf {
    return PathBuf::from("templates.json");
}

/// Default label language.
fn default_language() -> String {
    return "en".to_string();
}

/// Default change tag.
fn default_tag() -> String {
    return "ProveIt".to_string();
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, reason = "test code")]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.catalog, dir.path().join("templates.json"));
        assert_eq!(config.language, "en");
        assert_eq!(config.tag.as_deref(), Some("ProveIt"));
    }

    #[test]
    fn reads_values_and_disables_empty_tag() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "catalog = \"data/td.json\"\nlanguage = \"es\"\ntag = \"\"\n",
        )
        .unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.catalog, dir.path().join("data/td.json"));
        assert_eq!(config.language, "es");
        assert_eq!(config.tag, None);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "languag = \"es\"\n").unwrap();
        assert!(matches!(Config::load(dir.path()), Err(Error::TomlDe(_))));
    }
}
