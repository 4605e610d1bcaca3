//! Configuration schema for thumbcask
//!
//! Configuration is stored at `~/.config/thumbcask/config.toml`

use crate::size::SizeClass;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Cache location settings
    pub cache: CacheConfig,

    /// Backend selection settings
    pub backends: BackendsConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// App name used for failure markers when the CLI is not given one
    pub app_name: Option<String>,

    /// Size class generated when a request names none
    pub default_size: SizeClass,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            app_name: None,
            default_size: SizeClass::Large,
        }
    }
}

/// Cache location settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache root override; unset means `$XDG_CACHE_HOME/thumbnails`
    pub root: Option<PathBuf>,
}

/// Backend selection settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendsConfig {
    /// Backend names never to dispatch (see `BackendRegistry::names`)
    pub disabled: Vec<String>,
}
