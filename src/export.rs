use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::Repository;
use crate::error::Result;
use crate::models::{CatalogEntry, ContentItem, Verdict};

pub const CONTENT_FILE: &str = "content.json";
pub const RESTRICTED_FILE: &str = "geo_restricted.json";

#[derive(Debug, Serialize)]
struct ExportedItem {
    #[serde(flatten)]
    item: ContentItem,
    content_url: String,
    /// None until the item has been checked.
    is_geo_restricted: Option<bool>,
    verdict: Option<Verdict>,
    restriction_type: Option<String>,
    last_checked: Option<DateTime<Utc>>,
    stale: bool,
}

impl From<CatalogEntry> for ExportedItem {
    fn from(entry: CatalogEntry) -> Self {
        let content_url = entry.item.platform.content_url(&entry.item);
        let verdict = entry.status.as_ref().map(|s| s.verdict);
        Self {
            content_url,
            is_geo_restricted: verdict
                .filter(|v| v.is_known())
                .map(|v| v == Verdict::Restricted),
            verdict,
            restriction_type: entry
                .status
                .as_ref()
                .filter(|s| s.verdict == Verdict::Restricted)
                .map(|s| s.reason_tag.to_string()),
            last_checked: entry.status.as_ref().map(|s| s.last_checked_at),
            stale: entry.stale,
            item: entry.item,
        }
    }
}

#[derive(Serialize)]
struct ExportFile<'a> {
    export_date: DateTime<Utc>,
    total: usize,
    content: &'a [ExportedItem],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    pub output_dir: PathBuf,
    pub items: usize,
    pub restricted: usize,
}

/// Writes the catalog and its restricted subset as JSON files.
pub struct Exporter {
    store: Arc<Repository>,
    output_dir: PathBuf,
}

impl Exporter {
    pub fn new(store: Arc<Repository>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            output_dir: output_dir.into(),
        }
    }

    pub async fn export_all(&self) -> Result<ExportSummary> {
        tokio::fs::create_dir_all(&self.output_dir).await?;
        let export_date = Utc::now();

        let content: Vec<ExportedItem> = self
            .store
            .catalog(None, false)
            .await?
            .into_iter()
            .map(ExportedItem::from)
            .collect();
        let restricted: Vec<ExportedItem> = self
            .store
            .catalog(None, true)
            .await?
            .into_iter()
            .map(ExportedItem::from)
            .collect();

        self.write(CONTENT_FILE, export_date, &content).await?;
        self.write(RESTRICTED_FILE, export_date, &restricted).await?;

        tracing::info!(
            "Exported {} items ({} restricted) to {}",
            content.len(),
            restricted.len(),
            self.output_dir.display()
        );
        Ok(ExportSummary {
            output_dir: self.output_dir.clone(),
            items: content.len(),
            restricted: restricted.len(),
        })
    }

    async fn write(
        &self,
        name: &str,
        export_date: DateTime<Utc>,
        content: &[ExportedItem],
    ) -> Result<()> {
        let file = ExportFile {
            export_date,
            total: content.len(),
            content,
        };
        let json = serde_json::to_string_pretty(&file)?;
        tokio::fs::write(self.path(name), json).await?;
        Ok(())
    }

    fn path(&self, name: &str) -> PathBuf {
        Path::new(&self.output_dir).join(name)
    }
}
