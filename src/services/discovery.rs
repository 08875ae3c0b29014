use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::Result;
use crate::models::{ContentItem, Platform};

/// Supplies the items a scan should look at.
#[async_trait]
pub trait ContentDiscovery: Send + Sync {
    async fn discover(&self) -> Result<Vec<ContentItem>>;
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Listing {
    Items(Vec<ContentItem>),
    // shape of an exported content.json
    Export { content: Vec<ContentItem> },
}

/// Reads items from a JSON file: either a bare array of items or an object
/// with a `content` array, as written by the exporter.
pub struct JsonFileDiscovery {
    path: PathBuf,
    platform: Option<Platform>,
}

impl JsonFileDiscovery {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            platform: None,
        }
    }

    pub fn for_platform(mut self, platform: Option<Platform>) -> Self {
        self.platform = platform;
        self
    }
}

#[async_trait]
impl ContentDiscovery for JsonFileDiscovery {
    async fn discover(&self) -> Result<Vec<ContentItem>> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        let mut items = match serde_json::from_str::<Listing>(&raw)? {
            Listing::Items(items) => items,
            Listing::Export { content } => content,
        };
        if let Some(platform) = self.platform {
            items.retain(|item| item.platform == platform);
        }
        tracing::info!("Discovered {} items in {}", items.len(), self.path.display());
        Ok(items)
    }
}
