use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde::Serialize;

use crate::db::Repository;
use crate::error::{AppError, Result};
use crate::models::{ContentItem, Platform, StoreResult, Verdict};

use super::check::Checker;

#[derive(Debug, Clone)]
pub struct ScanSettings {
    pub max_concurrency: usize,
    /// Pause after each item, per worker, to stay under platform rate limits.
    pub request_delay: Duration,
    /// Refresh metadata only. Used when running behind a VPN, where probes
    /// would report everything as accessible.
    pub disable_geo_check: bool,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            request_delay: Duration::ZERO,
            disable_geo_check: false,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub items_seen: usize,
    pub probed: usize,
    pub accessible: usize,
    pub restricted: usize,
    pub unknown: usize,
    /// Series and items whose probe targets could not be built.
    pub skipped: usize,
    /// Unknown results that did not replace an existing verdict.
    pub kept_known: usize,
    pub marked_stale: usize,
}

/// Drives discovery output through the probe pipeline with a bounded worker pool.
pub struct Scanner {
    checker: Arc<Checker>,
    store: Arc<Repository>,
    settings: ScanSettings,
}

impl Scanner {
    pub fn new(checker: Arc<Checker>, store: Arc<Repository>, settings: ScanSettings) -> Self {
        Self {
            checker,
            store,
            settings,
        }
    }

    /// Stores every item's metadata, then probes the playable ones.
    ///
    /// With `complete_listing` the items are taken as the full catalog of
    /// their platforms and anything else stored for those platforms is marked
    /// stale.
    pub async fn run(&self, items: Vec<ContentItem>, complete_listing: bool) -> Result<ScanReport> {
        let mut report = ScanReport {
            items_seen: items.len(),
            ..ScanReport::default()
        };

        for item in &items {
            self.store.upsert_item(item.clone()).await?;
        }

        if complete_listing {
            let mut seen: HashMap<Platform, Vec<String>> = HashMap::new();
            for item in &items {
                seen.entry(item.platform).or_default().push(item.slug.clone());
            }
            for (platform, slugs) in seen {
                report.marked_stale += self.store.mark_stale(platform, slugs).await?;
            }
        }

        if self.settings.disable_geo_check {
            tracing::info!(
                "Geo checks disabled; refreshed metadata for {} items",
                items.len()
            );
            return Ok(report);
        }

        let (playable, series): (Vec<_>, Vec<_>) = items
            .into_iter()
            .partition(|item| item.media_type.is_probable());
        report.skipped = series.len();

        let results: Vec<Result<Option<(Verdict, StoreResult)>>> = stream::iter(playable)
            .map(|item| self.scan_item(item))
            .buffer_unordered(self.settings.max_concurrency.max(1))
            .collect()
            .await;

        for result in results {
            match result? {
                Some((verdict, stored)) => {
                    report.probed += 1;
                    match verdict {
                        Verdict::Accessible => report.accessible += 1,
                        Verdict::Restricted => report.restricted += 1,
                        Verdict::Unknown => report.unknown += 1,
                    }
                    if !stored.is_written() {
                        report.kept_known += 1;
                    }
                }
                None => report.skipped += 1,
            }
        }

        tracing::info!(
            "Scan finished: {} probed, {} accessible, {} restricted, {} unknown",
            report.probed,
            report.accessible,
            report.restricted,
            report.unknown
        );
        Ok(report)
    }

    async fn scan_item(&self, item: ContentItem) -> Result<Option<(Verdict, StoreResult)>> {
        let check = match self.checker.check(&item).await {
            Ok(check) => check,
            Err(e @ (AppError::NotProbableKind { .. } | AppError::InvalidTemplate { .. })) => {
                tracing::warn!("Skipping {}: {}", item.slug, e);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let stored = self.store.upsert(&item.slug, check.candidate(), false).await?;
        tracing::info!(
            "{} [{}]: {} ({}, {} probes)",
            item.slug,
            item.platform,
            check.verdict(),
            check.classification.reason,
            check.observations.len()
        );

        if !self.settings.request_delay.is_zero() {
            tokio::time::sleep(self.settings.request_delay).await;
        }

        Ok(Some((check.verdict(), stored)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MediaType, ReasonTag};
    use crate::probe::{ClassificationPolicy, Outcome, PlatformResolvers};
    use crate::test_support::{api_url, manifest_url, temp_store, ScriptedProbe};

    fn scanner(probe: Arc<ScriptedProbe>, store: Arc<Repository>, settings: ScanSettings) -> Scanner {
        let checker = Checker::new(
            Arc::new(PlatformResolvers::new("eu")),
            probe,
            ClassificationPolicy::default(),
        );
        Scanner::new(Arc::new(checker), store, settings)
    }

    fn movie(slug: &str) -> ContentItem {
        ContentItem::new(slug, MediaType::Movie, Platform::Primeran)
    }

    #[tokio::test]
    async fn scenarios_a_b_c_first_checks_land_in_the_store() {
        let (_dir, store) = temp_store().await;
        let probe = Arc::new(ScriptedProbe::new(Outcome::Status(200)));
        probe.respond(&manifest_url(Platform::Primeran, "y", "eu"), [Outcome::Status(403)]);
        probe.respond(&api_url(Platform::Primeran, "z"), [Outcome::Status(404)]);
        probe.respond(&manifest_url(Platform::Primeran, "z", "eu"), [Outcome::Status(404)]);

        let report = scanner(probe, store.clone(), ScanSettings::default())
            .run(vec![movie("x"), movie("y"), movie("z")], false)
            .await
            .unwrap();

        assert_eq!(report.probed, 3);
        assert_eq!((report.accessible, report.restricted, report.unknown), (1, 1, 1));

        let x = store.get_record("x").await.unwrap().unwrap();
        assert_eq!((x.verdict, x.reason), (Verdict::Accessible, ReasonTag::Manifest200));
        let y = store.get_record("y").await.unwrap().unwrap();
        assert_eq!((y.verdict, y.reason), (Verdict::Restricted, ReasonTag::Manifest403));
        let z = store.get_record("z").await.unwrap().unwrap();
        assert_eq!((z.verdict, z.reason), (Verdict::Unknown, ReasonTag::NotFound));
        assert_eq!(z.attempt_count, 1);
    }

    #[tokio::test]
    async fn rescan_failure_does_not_erase_a_known_verdict() {
        let (_dir, store) = temp_store().await;
        let probe = Arc::new(ScriptedProbe::new(Outcome::Status(200)));
        let scanner = scanner(probe.clone(), store.clone(), ScanSettings::default());
        scanner.run(vec![movie("x")], false).await.unwrap();

        probe.respond(&api_url(Platform::Primeran, "x"), [Outcome::ConnectionError]);
        probe.respond(&manifest_url(Platform::Primeran, "x", "eu"), [Outcome::ConnectionError]);
        let report = scanner.run(vec![movie("x")], false).await.unwrap();

        assert_eq!(report.kept_known, 1);
        let x = store.get_status("x").await.unwrap().unwrap();
        assert_eq!(x.verdict, Verdict::Accessible);
    }

    #[tokio::test]
    async fn series_are_stored_but_not_probed() {
        let (_dir, store) = temp_store().await;
        let probe = Arc::new(ScriptedProbe::new(Outcome::Status(200)));
        let mut episode = ContentItem::new("lau-hankan-1", MediaType::Episode, Platform::Primeran);
        episode.series_slug = Some("lau-hankan".into());
        let series = ContentItem::new("lau-hankan", MediaType::Series, Platform::Primeran);

        let report = scanner(probe.clone(), store.clone(), ScanSettings::default())
            .run(vec![series, episode], false)
            .await
            .unwrap();

        assert_eq!(report.skipped, 1);
        assert_eq!(report.probed, 1);
        assert!(store.get_item("lau-hankan").await.unwrap().is_some());
        assert!(probe.calls().iter().all(|url| !url.ends_with("/lau-hankan")));
        let aggregate = store.series_aggregate("lau-hankan").await.unwrap();
        assert_eq!(aggregate.accessible_count, 1);
    }

    #[tokio::test]
    async fn disabled_geo_check_only_refreshes_metadata() {
        let (_dir, store) = temp_store().await;
        let probe = Arc::new(ScriptedProbe::new(Outcome::Status(200)));
        let settings = ScanSettings {
            disable_geo_check: true,
            ..ScanSettings::default()
        };

        let report = scanner(probe.clone(), store.clone(), settings)
            .run(vec![movie("vpn-only")], false)
            .await
            .unwrap();

        assert_eq!(report.probed, 0);
        assert!(probe.calls().is_empty());
        assert!(store.get_item("vpn-only").await.unwrap().is_some());
        assert!(store.get_record("vpn-only").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn complete_listing_marks_missing_items_stale() {
        let (_dir, store) = temp_store().await;
        let probe = Arc::new(ScriptedProbe::new(Outcome::Status(200)));
        let scanner = scanner(probe, store.clone(), ScanSettings::default());
        scanner.run(vec![movie("old"), movie("kept")], true).await.unwrap();

        let report = scanner.run(vec![movie("kept")], true).await.unwrap();

        assert_eq!(report.marked_stale, 1);
        let catalog = store.catalog(None, false).await.unwrap();
        assert!(catalog.iter().any(|e| e.item.slug == "old" && e.stale));
        assert!(catalog.iter().any(|e| e.item.slug == "kept" && !e.stale));
    }
}
