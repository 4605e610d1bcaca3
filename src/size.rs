//! Thumbnail size classes
//!
//! The cache layout fixes a small set of named pixel tiers. Every numeric
//! size request maps to the smallest class that can contain it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Named pixel-dimension tier for thumbnails
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SizeClass {
    /// 128px tier
    #[serde(rename = "normal")]
    Normal,
    /// 256px tier
    #[serde(rename = "large")]
    Large,
    /// 512px tier
    #[serde(rename = "x-large")]
    XLarge,
    /// 1024px tier
    #[serde(rename = "xx-large")]
    XxLarge,
}

impl SizeClass {
    /// Pixel dimension of this tier
    pub fn pixels(&self) -> u32 {
        match self {
            Self::Normal => 128,
            Self::Large => 256,
            Self::XLarge => 512,
            Self::XxLarge => 1024,
        }
    }

    /// Directory name under the cache root
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Large => "large",
            Self::XLarge => "x-large",
            Self::XxLarge => "xx-large",
        }
    }

    /// All classes, ascending by pixel dimension
    pub fn all() -> &'static [Self] {
        &[Self::Normal, Self::Large, Self::XLarge, Self::XxLarge]
    }

    /// Probe order for unsized lookups: larger tiers first, since a larger
    /// thumbnail is a safe superset for display.
    pub fn probe_order() -> &'static [Self] {
        &[Self::XxLarge, Self::XLarge, Self::Large, Self::Normal]
    }

    /// Map a pixel request to the smallest class that covers it, clamped to
    /// the largest tier.
    pub fn from_pixels(px: u32) -> Self {
        Self::all()
            .iter()
            .copied()
            .find(|c| px <= c.pixels())
            .unwrap_or(Self::XxLarge)
    }
}

impl fmt::Display for SizeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dir_name())
    }
}

impl FromStr for SizeClass {
    type Err = String;

    /// Accepts a tier name or a bare pixel count
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Self::Normal),
            "large" => Ok(Self::Large),
            "x-large" => Ok(Self::XLarge),
            "xx-large" => Ok(Self::XxLarge),
            other => match other.parse::<u32>() {
                Ok(px) if px > 0 => Ok(Self::from_pixels(px)),
                _ => Err(format!("unsupported size: '{s}'")),
            },
        }
    }
}
