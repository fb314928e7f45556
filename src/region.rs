//! Region routing between the US and EU Armory hosts.

use crate::error::{ArmoryError, Result};
use std::fmt;

/// The two Armory deployments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    /// United States (also the fallback for every non-EU locale)
    US,
    /// Europe
    EU,
}

impl Region {
    /// Classify a locale. `eu` selects Europe, anything else (including none) the US.
    pub fn from_locale(locale: Option<&str>) -> Self {
        match locale {
            Some(locale) if locale.eq_ignore_ascii_case("eu") => Region::EU,
            _ => Region::US,
        }
    }

    /// Convert region to lowercase string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::US => "us",
            Region::EU => "eu",
        }
    }

    /// Cache subdirectory for this region
    pub fn cache_prefix(&self) -> &'static str {
        match self {
            Region::US => "us/",
            Region::EU => "eu/",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Base hosts for both regions
#[derive(Debug, Clone)]
pub struct RegionRouter {
    us_base_url: String,
    eu_base_url: String,
}

impl RegionRouter {
    pub fn new(us_base_url: impl Into<String>, eu_base_url: impl Into<String>) -> Self {
        Self {
            us_base_url: us_base_url.into(),
            eu_base_url: eu_base_url.into(),
        }
    }

    /// Base URL for a region
    pub fn base_url(&self, region: Region) -> &str {
        match region {
            Region::US => &self.us_base_url,
            Region::EU => &self.eu_base_url,
        }
    }

    /// Base URL selected by a locale
    pub fn base_host(&self, locale: Option<&str>) -> &str {
        self.base_url(Region::from_locale(locale))
    }

    /// Split a URL built by this router into its region and host-relative remainder.
    ///
    /// When both hosts match (one is a prefix of the other) the longer one wins.
    pub fn classify<'a>(&self, url: &'a str) -> Result<(Region, &'a str)> {
        let candidates = [
            (Region::US, self.us_base_url.as_str()),
            (Region::EU, self.eu_base_url.as_str()),
        ];

        candidates
            .iter()
            .filter_map(|(region, host)| {
                url.strip_prefix(host)
                    .map(|rest| (host.len(), *region, rest))
            })
            .max_by_key(|(len, _, _)| *len)
            .map(|(_, region, rest)| (region, rest))
            .ok_or_else(|| ArmoryError::UnknownHost {
                url: url.to_string(),
            })
    }

    /// Cache-relative path for a URL: region prefix plus the URL with its host stripped
    pub fn region_prefix(&self, url: &str) -> Result<String> {
        let (region, rest) = self.classify(url)?;
        Ok(format!("{}{}", region.cache_prefix(), rest))
    }
}
