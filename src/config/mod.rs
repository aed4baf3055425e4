//! Writer configuration, loadable from a `ckw.toml` file.
//!
//! ```toml
//! emit_extensions = true
//! debug_comments = false
//! return_dims_by_value = false
//! ```
//!
//! Missing keys take their defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// File looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "ckw.toml";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    /// Prepend the OpenCL extension pragmas to emitted kernels.
    pub emit_extensions: bool,
    /// Make `op_comment` emit `// …` lines.
    pub debug_comments: bool,
    /// Fold statically known dimensions into literals instead of parameters.
    pub return_dims_by_value: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        WriterConfig {
            emit_extensions: true,
            debug_comments: false,
            return_dims_by_value: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config '{}': {source}", path.display())]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl WriterConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&content).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), ?config, "loaded writer config");
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load `path` if given, else `./ckw.toml` if present, else defaults.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }
        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.is_file() {
            return Self::load(local);
        }
        Ok(Self::default())
    }

    pub fn to_toml(&self) -> String {
        // A flat struct of booleans always serializes.
        toml::to_string(self).unwrap_or_default()
    }

    pub fn with_emit_extensions(mut self, enabled: bool) -> Self {
        self.emit_extensions = enabled;
        self
    }

    pub fn with_debug_comments(mut self, enabled: bool) -> Self {
        self.debug_comments = enabled;
        self
    }

    pub fn with_return_dims_by_value(mut self, enabled: bool) -> Self {
        self.return_dims_by_value = enabled;
        self
    }
}
