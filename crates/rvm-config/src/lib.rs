#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
//! Configuration for the rvm runtime bootstrapper.
//!
//! A single [`Config`] holds every tunable the bootstrapper and the control
//! plane read at startup: the control socket address, the runtime download
//! base and executable name, HTTP client knobs and logging defaults.
//!
//! # Configuration Precedence
//!
//! From highest to lowest priority:
//!
//! 1. **Explicit file** (`rvm --settings <path>`)
//! 2. **User** (`~/.rvm/config.toml`)
//! 3. **Environment variables** (`RVM_*`), used only for fields no file set
//! 4. **Embedded defaults** (`defaults.toml` compiled into binary)
//!
//! Command-line flags are applied on top of the resolved value by the binary.
//!
//! ```rust,no_run
//! use rvm_config::Config;
//!
//! let resolved = Config::load(None).unwrap();
//! println!("control socket: {}", resolved.config.control.socket_path.display());
//! ```

/// Environment variable fallbacks.
pub mod env;
/// Configuration error types.
pub mod error;
/// Configuration file discovery and loading.
pub mod loader;
/// Deep merge of TOML layers.
pub mod merge;
/// Configuration struct definitions.
pub mod types;
/// Configuration validation rules.
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::ResolvedConfig;
pub use types::*;

impl Config {
    /// Load configuration with the full precedence chain.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if any config file is malformed or the final
    /// configuration fails validation.
    pub fn load(explicit: Option<&std::path::Path>) -> ConfigResult<ResolvedConfig> {
        loader::load(explicit, None, &env::collect_env_vars())
    }

    /// Load configuration from a single file layered over the defaults.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read, parsed, or fails
    /// validation.
    pub fn load_file(path: &std::path::Path) -> ConfigResult<Self> {
        loader::load_file(path)
    }
}
