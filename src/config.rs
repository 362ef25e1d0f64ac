//! Startup configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{NodeInfoError, Result};

/// NodeInfo versions this crate ships contributors for, in registration order.
pub const SUPPORTED_VERSIONS: [&str; 5] = ["1.0", "1.1", "2.0", "2.1", "2.2"];

/// Identity of the advertised server software.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoftwareConfig {
    /// Lowercase software name, as the NodeInfo schemas require.
    pub name: String,
    /// Source repository, advertised from 2.1 on.
    pub repository: String,
    /// Project homepage, advertised from 2.1 on when set.
    pub homepage: Option<String>,
}

impl Default for SoftwareConfig {
    fn default() -> Self {
        Self {
            name: "wordpress".to_string(),
            repository: "https://github.com/wordpress/wordpress".to_string(),
            homepage: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub software: SoftwareConfig,
    /// NodeInfo versions to serve and advertise.
    pub versions: Vec<String>,
    /// Serve the NodeInfo2 document.
    pub nodeinfo2: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            software: SoftwareConfig::default(),
            versions: SUPPORTED_VERSIONS.iter().map(|v| v.to_string()).collect(),
            nodeinfo2: true,
        }
    }
}

impl Config {
    /// Parse and validate a JSON configuration document.
    ///
    /// Missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)
            .map_err(|e| NodeInfoError::Config(format!("invalid JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| NodeInfoError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_json(&json)
    }

    /// Reject versions without a shipped contributor and an empty software name.
    pub fn validate(&self) -> Result<()> {
        if let Some(unknown) = self
            .versions
            .iter()
            .find(|v| !SUPPORTED_VERSIONS.contains(&v.as_str()))
        {
            return Err(NodeInfoError::Config(format!(
                "unsupported NodeInfo version {unknown}"
            )));
        }
        if self.software.name.is_empty() {
            return Err(NodeInfoError::Config("software name is empty".to_string()));
        }
        Ok(())
    }
}
