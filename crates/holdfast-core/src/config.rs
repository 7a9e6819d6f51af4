// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Verbosity configuration for terminal load outcomes.
//!
//! The configuration only decides how loudly each outcome is logged. It has
//! no effect on loading behavior. It is stored as RON:
//!
//! ```ron
//! (
//!   succeeded: Log,
//!   canceled: Warning,
//!   timeout: Warning,
//!   failed: Error,
//!   null_owner: Warning,
//! )
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The verbosity used to report one kind of outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogLevel {
    /// The outcome is not logged.
    None,
    /// Informational record.
    Log,
    /// Warning record.
    Warning,
    /// Error record.
    Error,
}

impl LogLevel {
    /// Maps to the `log` crate level, `None` meaning "do not log".
    pub fn as_level(self) -> Option<log::Level> {
        match self {
            LogLevel::None => None,
            LogLevel::Log => Some(log::Level::Info),
            LogLevel::Warning => Some(log::Level::Warn),
            LogLevel::Error => Some(log::Level::Error),
        }
    }
}

/// Errors raised while reading or writing an [`AccessConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read or written.
    #[error("config file '{path}': {source}")]
    Io {
        /// The file involved.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The text is not a valid configuration.
    #[error("invalid config: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// The configuration could not be serialized.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] ron::Error),
}

/// Log level per terminal outcome of an access operation.
///
/// Missing fields take their default, so a file only needs to list the
/// levels it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Level for successful loads.
    pub succeeded: LogLevel,
    /// Level for canceled loads.
    pub canceled: LogLevel,
    /// Level for timed out loads.
    pub timeout: LogLevel,
    /// Level for failed loads.
    pub failed: LogLevel,
    /// Level for a destruction cascade without an owner.
    pub null_owner: LogLevel,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            succeeded: LogLevel::Log,
            canceled: LogLevel::Warning,
            timeout: LogLevel::Warning,
            failed: LogLevel::Error,
            null_owner: LogLevel::Warning,
        }
    }
}

impl AccessConfig {
    /// A configuration that logs nothing.
    pub fn silent() -> Self {
        Self {
            succeeded: LogLevel::None,
            canceled: LogLevel::None,
            timeout: LogLevel::None,
            failed: LogLevel::None,
            null_owner: LogLevel::None,
        }
    }

    /// Parses a configuration from RON text.
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    /// Reads a configuration from a RON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron_str(&text)
    }

    /// Serializes the configuration as pretty RON.
    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        let pretty = ron::ser::PrettyConfig::default().indentor("  ".to_string());
        Ok(ron::ser::to_string_pretty(self, pretty)?)
    }

    /// Reads the configuration at `path`, writing the default one first if
    /// the file does not exist.
    pub fn load_or_create(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            return Self::from_file(path);
        }

        let config = Self::default();
        let io_error = |source: io::Error| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        fs::write(path, config.to_ron_string()?).map_err(io_error)?;
        log::info!("AccessConfig: wrote default configuration to {}", path.display());
        Ok(config)
    }
}
