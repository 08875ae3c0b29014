use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RestrictionStatus;

/// EITB streaming platforms sharing the same SSO and API shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "primeran.eus")]
    Primeran,
    #[serde(rename = "makusi.eus")]
    Makusi,
    #[serde(rename = "etbon.eus")]
    Etbon,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Primeran, Platform::Makusi, Platform::Etbon];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Primeran => "primeran.eus",
            Platform::Makusi => "makusi.eus",
            Platform::Etbon => "etbon.eus",
        }
    }

    pub fn origin(&self) -> String {
        format!("https://{}", self.as_str())
    }

    /// Public page for an item, as linked from the exported catalog.
    pub fn content_url(&self, item: &ContentItem) -> String {
        let slug = urlencoding::encode(&item.slug);
        match self {
            Platform::Makusi => match item.media_type {
                MediaType::Series => format!("{}/ikusi/s/{}", self.origin(), slug),
                MediaType::Episode => format!("{}/ikusi/w/{}", self.origin(), slug),
                _ if item.series_slug.is_some() => format!("{}/ikusi/w/{}", self.origin(), slug),
                _ => format!("{}/ikusi/m/{}", self.origin(), slug),
            },
            Platform::Primeran | Platform::Etbon => format!("{}/m/{}", self.origin(), slug),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "primeran" | "primeran.eus" => Ok(Platform::Primeran),
            "makusi" | "makusi.eus" => Ok(Platform::Makusi),
            "etbon" | "etbon.eus" => Ok(Platform::Etbon),
            other => Err(format!("unknown platform: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Series,
    Episode,
    Audio,
    Live,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Series => "series",
            MediaType::Episode => "episode",
            MediaType::Audio => "audio",
            MediaType::Live => "live",
        }
    }

    /// Series only group episodes; they have no playable manifest of their own.
    pub fn is_probable(&self) -> bool {
        !matches!(self, MediaType::Series)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(MediaType::Movie),
            "series" => Ok(MediaType::Series),
            "episode" => Ok(MediaType::Episode),
            "audio" => Ok(MediaType::Audio),
            "live" => Ok(MediaType::Live),
            other => Err(format!("unknown media type: {}", other)),
        }
    }
}

/// A catalog entry as supplied by discovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub slug: String,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub platform: Platform,
    #[serde(default)]
    pub series_slug: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, rename = "duration")]
    pub duration_secs: Option<u32>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub drm_schemes: Vec<String>,
    #[serde(default)]
    pub available_until: Option<DateTime<Utc>>,
    /// Manifest URL template with `{slug}`, `{lang}` and `{drm}` placeholders.
    #[serde(default)]
    pub manifest_template: Option<String>,
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub season_number: Option<u32>,
    #[serde(default)]
    pub episode_number: Option<u32>,
}

#[cfg(test)]
impl ContentItem {
    pub fn new(slug: impl Into<String>, media_type: MediaType, platform: Platform) -> Self {
        Self {
            slug: slug.into(),
            media_type,
            platform,
            series_slug: None,
            title: None,
            duration_secs: None,
            languages: Vec::new(),
            drm_schemes: Vec::new(),
            available_until: None,
            manifest_template: None,
            audio_url: None,
            season_number: None,
            episode_number: None,
        }
    }
}

/// An item together with its current restriction status, as read back for export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogEntry {
    pub item: ContentItem,
    pub stale: bool,
    pub status: Option<RestrictionStatus>,
}
