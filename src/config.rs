//! # Per-instance server configuration.
//!
//! [`ServerConfig`] describes one supervised server: its unique name (which
//! is also the working-directory name), the artifact version to provision,
//! and the runtime options. Every field has a default, so a persisted entry
//! may specify only what it overrides.
//!
//! A config is immutable once the instance is constructed; changing it means
//! creating a new instance.

use serde::{Deserialize, Serialize};

/// Version value that disables artifact download entirely (case-insensitive).
pub const CUSTOM_VERSION: &str = "custom";

fn default_name() -> String {
    "server".to_string()
}

fn default_version() -> String {
    "latest".to_string()
}

fn default_java() -> String {
    "java".to_string()
}

fn default_ram() -> String {
    "1G".to_string()
}

fn default_jar() -> String {
    "minecraft_server.jar".to_string()
}

/// Configuration of a single supervised server instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Unique instance name; doubles as the working-directory name.
    pub name: String,
    /// Artifact version to provision. The literal `custom` skips download.
    pub version: String,
    /// Runtime tuning options.
    pub options: ServerOptions,
}

/// Runtime options for launching the server process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerOptions {
    /// Path of the runtime executable.
    pub java: String,
    /// Heap size, applied to both the minimum and maximum heap flags.
    pub ram: String,
    /// Artifact filename inside the working directory.
    pub jar: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            version: default_version(),
            options: ServerOptions::default(),
        }
    }
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            java: default_java(),
            ram: default_ram(),
            jar: default_jar(),
        }
    }
}

impl ServerConfig {
    /// Creates a config with the given name and version and default options.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            options: ServerOptions::default(),
        }
    }

    /// True when provisioning must not download or copy any artifact.
    pub fn is_custom_version(&self) -> bool {
        self.version.eq_ignore_ascii_case(CUSTOM_VERSION)
    }
}
