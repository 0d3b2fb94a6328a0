//! Layered configuration for formtree using Figment
//!
//! Defaults, `formtree.{toml,yaml,yml,json}` files and `FORMTREE_`
//! environment variables are merged into a typed [`FormtreeConfig`].
//!
//! ```no_run
//! use formtree_config::ConfigProvider;
//!
//! let config = ConfigProvider::new()
//!     .with_search_dir("/etc/formtree")
//!     .with_search_dir(".formtree")
//!     .load()?;
//! println!("submit label: {}", config.actions.submit_label);
//! # Ok::<(), formtree_config::ConfigError>(())
//! ```

pub mod error;
pub mod provider;
pub mod types;

pub use error::{ConfigError, ConfigResult};
pub use provider::{ConfigFormat, ConfigProvider, CONFIG_EXTENSIONS, CONFIG_FILE_STEM, ENV_PREFIX};
pub use types::{ActionsConfig, DefinitionsConfig, FormtreeConfig, ValidationConfig};

/// Directory searched by [`load_configuration`], relative to the working directory.
pub const PROJECT_CONFIG_DIR: &str = ".formtree";

/// Load configuration from `./.formtree/` and the environment.
pub fn load_configuration() -> ConfigResult<FormtreeConfig> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::CurrentDirectoryNotFound)?;
    ConfigProvider::new()
        .with_search_dir(cwd.join(PROJECT_CONFIG_DIR))
        .load()
}
