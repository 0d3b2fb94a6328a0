//! Configuration provider using Figment for formtree

use crate::{error::ConfigError, types::FormtreeConfig, ConfigResult};
use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Base name of configuration files, without extension.
pub const CONFIG_FILE_STEM: &str = "formtree";

/// Extensions probed in each search directory, in merge order.
pub const CONFIG_EXTENSIONS: [&str; 4] = ["toml", "yaml", "yml", "json"];

/// Environment variable prefix; nested keys are separated by `__`.
pub const ENV_PREFIX: &str = "FORMTREE_";

/// Configuration file format detected from file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
    Json,
}

impl ConfigFormat {
    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
            .ok_or_else(|| ConfigError::UnsupportedFormat {
                path: path.to_path_buf(),
            })
    }
}

/// Configuration provider using figment
///
/// Sources are merged in precedence order (later sources override earlier ones):
/// 1. Default values from [`FormtreeConfig::default`]
/// 2. `formtree.{toml,yaml,yml,json}` in each search directory, in the order added
/// 3. Explicit files added with [`with_file`](Self::with_file)
/// 4. Environment variables prefixed with `FORMTREE_`
///
/// Nothing is cached; every [`load`](Self::load) reads the sources again.
#[derive(Debug, Clone, Default)]
pub struct ConfigProvider {
    search_dirs: Vec<PathBuf>,
    files: Vec<PathBuf>,
    skip_env: bool,
}

impl ConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look for `formtree.*` in `dir`. Later directories take precedence.
    pub fn with_search_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_dirs.push(dir.into());
        self
    }

    /// Merge a specific file. Its format comes from the extension.
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push(path.into());
        self
    }

    /// Ignore `FORMTREE_*` environment variables.
    pub fn without_env(mut self) -> Self {
        self.skip_env = true;
        self
    }

    /// Load and validate the configuration from all sources.
    pub fn load(&self) -> ConfigResult<FormtreeConfig> {
        let config: FormtreeConfig = self.build_figment()?.extract()?;
        config.validate()?;
        debug!(
            mode = ?config.validation.mode,
            definitions = ?config.definitions.dir,
            "loaded formtree configuration"
        );
        Ok(config)
    }

    /// Configuration files that exist, in merge order.
    pub fn discover_files(&self) -> Vec<PathBuf> {
        let mut found = Vec::new();
        for dir in &self.search_dirs {
            for ext in CONFIG_EXTENSIONS {
                let path = dir.join(format!("{CONFIG_FILE_STEM}.{ext}"));
                if path.is_file() {
                    found.push(path);
                }
            }
        }
        found
    }

    fn build_figment(&self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(FormtreeConfig::default()));

        for path in self.discover_files() {
            trace!(path = %path.display(), "merging discovered config file");
            figment = figment.merge(Self::file_provider(&path)?);
        }

        for path in &self.files {
            trace!(path = %path.display(), "merging explicit config file");
            figment = figment.merge(Self::file_provider(path)?);
        }

        if !self.skip_env {
            figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        }

        Ok(figment)
    }

    fn file_provider(path: &Path) -> ConfigResult<Figment> {
        Ok(match ConfigFormat::from_path(path)? {
            ConfigFormat::Toml => Figment::from(Toml::file(path)),
            ConfigFormat::Yaml => Figment::from(Yaml::file(path)),
            ConfigFormat::Json => Figment::from(Json::file(path)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formtree_fields::ValidationMode;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ConfigFormat::from_extension("TOML"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("yml"), Some(ConfigFormat::Yaml));
        assert_eq!(ConfigFormat::from_extension("json"), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_extension("ini"), None);
    }

    #[test]
    fn test_defaults_without_sources() {
        let config = ConfigProvider::new().without_env().load().unwrap();
        assert_eq!(config, FormtreeConfig::default());
    }

    #[test]
    fn test_discovers_files_in_merge_order() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("formtree.json"), "{}").unwrap();
        fs::write(temp.path().join("formtree.toml"), "").unwrap();
        fs::write(temp.path().join("other.toml"), "").unwrap();

        let files = ConfigProvider::new()
            .with_search_dir(temp.path())
            .discover_files();
        assert_eq!(
            files,
            vec![
                temp.path().join("formtree.toml"),
                temp.path().join("formtree.json")
            ]
        );
    }

    #[test]
    fn test_later_directory_wins() {
        let global = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        fs::write(
            global.path().join("formtree.toml"),
            "[actions]\nsubmit_label = \"Save\"\ncancel_label = \"Cancel\"\n",
        )
        .unwrap();
        fs::write(
            project.path().join("formtree.yaml"),
            "actions:\n  submit_label: Create\n",
        )
        .unwrap();

        let config = ConfigProvider::new()
            .with_search_dir(global.path())
            .with_search_dir(project.path())
            .without_env()
            .load()
            .unwrap();
        assert_eq!(config.actions.submit_label, "Create");
        assert_eq!(config.actions.cancel_label.as_deref(), Some("Cancel"));
        assert_eq!(config.actions.pending_label, "Submitting...");
    }

    #[test]
    fn test_explicit_file_with_unknown_extension() {
        let err = ConfigProvider::new()
            .with_file("settings.ini")
            .without_env()
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("formtree.toml"),
            "[validation]\nmode = \"sometimes\"\n",
        )
        .unwrap();
        let err = ConfigProvider::new()
            .with_search_dir(temp.path())
            .without_env()
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    #[serial]
    fn test_env_overrides_files() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("formtree.toml"),
            "[validation]\nmode = \"on-submit\"\n",
        )
        .unwrap();

        std::env::set_var("FORMTREE_VALIDATION__MODE", "on-change");
        std::env::set_var("FORMTREE_DEFINITIONS__DIR", "/srv/forms");
        let result = ConfigProvider::new().with_search_dir(temp.path()).load();
        std::env::remove_var("FORMTREE_VALIDATION__MODE");
        std::env::remove_var("FORMTREE_DEFINITIONS__DIR");

        let config = result.unwrap();
        assert_eq!(config.validation.mode, ValidationMode::OnChange);
        assert_eq!(config.definitions.dir, Some(PathBuf::from("/srv/forms")));
    }
}
