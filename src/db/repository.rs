use std::collections::HashSet;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row};
use tokio_rusqlite::Connection;

use crate::error::Result;
use crate::models::{
    CatalogEntry, CheckHistoryEntry, ContentItem, Platform, RestrictionCandidate,
    RestrictionRecord, RestrictionStatus, SeriesAggregate, StoreResult, Verdict,
};

use super::schema::SCHEMA;

const ITEM_COLUMNS: &str = "c.slug, c.media_type, c.platform, c.series_slug, c.title, \
     c.duration_secs, c.languages, c.drm_schemes, c.available_until, c.manifest_template, \
     c.audio_url, c.season_number, c.episode_number, c.is_stale";

/// SQLite-backed catalog and restriction store.
///
/// All statements run on the single worker thread behind `tokio_rusqlite`,
/// and every restriction upsert is one transaction, so writes for the same
/// slug never interleave.
pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;

        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    // Content operations

    /// Inserts or refreshes an item's metadata. The restriction record is untouched.
    pub async fn upsert_item(&self, item: ContentItem) -> Result<()> {
        let languages = serde_json::to_string(&item.languages)?;
        let drm_schemes = serde_json::to_string(&item.drm_schemes)?;
        self.conn
            .call(move |conn| {
                conn.execute(
                    r#"INSERT INTO content (slug, media_type, platform, series_slug, title, duration_secs,
                                            languages, drm_schemes, available_until, manifest_template,
                                            audio_url, season_number, episode_number)
                       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                       ON CONFLICT(slug) DO UPDATE SET
                           media_type = excluded.media_type,
                           platform = excluded.platform,
                           series_slug = excluded.series_slug,
                           title = excluded.title,
                           duration_secs = excluded.duration_secs,
                           languages = excluded.languages,
                           drm_schemes = excluded.drm_schemes,
                           available_until = excluded.available_until,
                           manifest_template = excluded.manifest_template,
                           audio_url = excluded.audio_url,
                           season_number = excluded.season_number,
                           episode_number = excluded.episode_number,
                           is_stale = 0,
                           updated_at = datetime('now')"#,
                    params![
                        item.slug,
                        item.media_type.as_str(),
                        item.platform.as_str(),
                        item.series_slug,
                        item.title,
                        item.duration_secs,
                        languages,
                        drm_schemes,
                        item.available_until.map(|dt| dt.to_rfc3339()),
                        item.manifest_template,
                        item.audio_url,
                        item.season_number,
                        item.episode_number,
                    ],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Flags every item of `platform` that the latest discovery run did not list.
    pub async fn mark_stale(&self, platform: Platform, seen: Vec<String>) -> Result<usize> {
        let marked = self
            .conn
            .call(move |conn| {
                let seen: HashSet<String> = seen.into_iter().collect();
                let tx = conn.transaction()?;
                let slugs = {
                    let mut stmt = tx.prepare(
                        "SELECT slug FROM content WHERE platform = ?1 AND is_stale = 0",
                    )?;
                    let slugs = stmt
                        .query_map(params![platform.as_str()], |row| row.get::<_, String>(0))?
                        .collect::<std::result::Result<Vec<_>, _>>()?;
                    slugs
                };

                let mut marked = 0;
                for slug in slugs.iter().filter(|slug| !seen.contains(*slug)) {
                    marked += tx.execute(
                        "UPDATE content SET is_stale = 1, updated_at = datetime('now') WHERE slug = ?1",
                        params![slug],
                    )?;
                }
                tx.commit()?;
                Ok(marked)
            })
            .await?;
        Ok(marked)
    }

    pub async fn get_item(&self, slug: &str) -> Result<Option<ContentItem>> {
        let slug = slug.to_string();
        let item = self
            .conn
            .call(move |conn| {
                let sql = format!(
                    "SELECT {} FROM content c WHERE c.slug = ?1 AND c.media_type IS NOT NULL AND c.platform IS NOT NULL",
                    ITEM_COLUMNS
                );
                let item = conn
                    .query_row(&sql, params![slug], item_from_row)
                    .optional()?;
                Ok(item)
            })
            .await?;
        Ok(item)
    }

    /// Items that still need a definitive verdict: Unknown or never classified.
    /// Series and stale items are left out.
    pub async fn pending_repair(&self, platform: Option<Platform>) -> Result<Vec<ContentItem>> {
        let platform = platform.map(|p| p.as_str());
        let items = self
            .conn
            .call(move |conn| {
                let sql = format!(
                    r#"SELECT {} FROM content c
                       LEFT JOIN restrictions r ON r.slug = c.slug
                       WHERE c.media_type IS NOT NULL AND c.platform IS NOT NULL
                         AND c.media_type != 'series'
                         AND c.is_stale = 0
                         AND (r.slug IS NULL OR r.verdict IS NULL OR r.verdict = 'unknown')
                         AND (?1 IS NULL OR c.platform = ?1)
                       ORDER BY c.slug"#,
                    ITEM_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let items = stmt
                    .query_map(params![platform], item_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(items)
            })
            .await?;
        Ok(items)
    }

    /// Every item with its current status, for export.
    pub async fn catalog(
        &self,
        platform: Option<Platform>,
        restricted_only: bool,
    ) -> Result<Vec<CatalogEntry>> {
        let platform = platform.map(|p| p.as_str());
        let entries = self
            .conn
            .call(move |conn| {
                let sql = format!(
                    r#"SELECT {}, r.verdict, r.reason, r.last_checked_at FROM content c
                       LEFT JOIN restrictions r ON r.slug = c.slug
                       WHERE c.media_type IS NOT NULL AND c.platform IS NOT NULL
                         AND (?1 IS NULL OR c.platform = ?1)
                         AND (?2 = 0 OR r.verdict = 'restricted')
                       ORDER BY c.platform, c.series_slug, c.season_number, c.episode_number, c.slug"#,
                    ITEM_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let entries = stmt
                    .query_map(params![platform, restricted_only], |row| {
                        Ok(CatalogEntry {
                            item: item_from_row(row)?,
                            stale: row.get::<_, i64>(13)? != 0,
                            status: status_from_row(row, 14)?,
                        })
                    })?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(entries)
            })
            .await?;
        Ok(entries)
    }

    // Restriction operations

    /// Writes `candidate` as the current record of `slug`.
    ///
    /// An Unknown candidate never replaces an Accessible or Restricted record
    /// unless `force` is set; such writes come back as `Rejected`. The attempt
    /// is appended to the check history either way.
    pub async fn upsert(
        &self,
        slug: &str,
        candidate: RestrictionCandidate,
        force: bool,
    ) -> Result<StoreResult> {
        let key = slug.to_string();
        let result = self
            .conn
            .call(move |conn| {
                let slug = key;
                let tx = conn.transaction()?;

                let existing: Option<Option<String>> = tx
                    .query_row(
                        "SELECT verdict FROM restrictions WHERE slug = ?1",
                        params![slug],
                        |row| row.get(0),
                    )
                    .optional()?;
                let current = match existing.as_ref().and_then(|v| v.as_deref()) {
                    Some(text) => Some(parse_column::<Verdict>(0, text)?),
                    None => None,
                };

                let now = Utc::now().to_rfc3339();
                let result = match current {
                    Some(current)
                        if current.is_known() && !candidate.verdict.is_known() && !force =>
                    {
                        StoreResult::Rejected { current }
                    }
                    _ => {
                        tx.execute(
                            "INSERT OR IGNORE INTO content (slug) VALUES (?1)",
                            params![slug],
                        )?;
                        tx.execute(
                            r#"INSERT INTO restrictions (slug, verdict, reason, status_code, last_error,
                                                         attempt_count, last_checked_at)
                               VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)
                               ON CONFLICT(slug) DO UPDATE SET
                                   verdict = excluded.verdict,
                                   reason = excluded.reason,
                                   status_code = excluded.status_code,
                                   last_error = excluded.last_error,
                                   attempt_count = restrictions.attempt_count + 1,
                                   last_checked_at = excluded.last_checked_at"#,
                            params![
                                slug,
                                candidate.verdict.as_str(),
                                candidate.reason.as_str(),
                                candidate.status_code,
                                candidate.last_error,
                                now,
                            ],
                        )?;
                        if existing.is_some() {
                            StoreResult::Updated
                        } else {
                            StoreResult::Created
                        }
                    }
                };

                tx.execute(
                    r#"INSERT INTO check_history (slug, checked_at, verdict, reason, status_code, error, accepted)
                       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"#,
                    params![
                        slug,
                        now,
                        candidate.verdict.as_str(),
                        candidate.reason.as_str(),
                        candidate.status_code,
                        candidate.last_error,
                        result.is_written(),
                    ],
                )?;
                tx.commit()?;
                Ok(result)
            })
            .await?;

        if let StoreResult::Rejected { current } = result {
            tracing::warn!(
                "Kept {} verdict for {}; an unknown result does not replace it",
                current,
                slug
            );
        }
        Ok(result)
    }

    pub async fn get_record(&self, slug: &str) -> Result<Option<RestrictionRecord>> {
        let slug = slug.to_string();
        let record = self
            .conn
            .call(move |conn| {
                let record = conn
                    .query_row(
                        r#"SELECT slug, verdict, reason, last_checked_at, attempt_count, status_code, last_error
                           FROM restrictions WHERE slug = ?1 AND verdict IS NOT NULL"#,
                        params![slug],
                        record_from_row,
                    )
                    .optional()?;
                Ok(record)
            })
            .await?;
        Ok(record)
    }

    pub async fn get_status(&self, slug: &str) -> Result<Option<RestrictionStatus>> {
        let record = self.get_record(slug).await?;
        Ok(record.as_ref().map(RestrictionStatus::from))
    }

    pub async fn check_history(&self, slug: &str) -> Result<Vec<CheckHistoryEntry>> {
        let slug = slug.to_string();
        let entries = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    r#"SELECT id, slug, checked_at, verdict, reason, status_code, error, accepted
                       FROM check_history WHERE slug = ?1 ORDER BY id"#,
                )?;
                let entries = stmt
                    .query_map(params![slug], history_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(entries)
            })
            .await?;
        Ok(entries)
    }

    /// Counts the current verdicts of every episode of a series. Episodes
    /// without a record count as unknown.
    pub async fn series_aggregate(&self, series_slug: &str) -> Result<SeriesAggregate> {
        let series = series_slug.to_string();
        let verdicts = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    r#"SELECT r.verdict FROM content c
                       LEFT JOIN restrictions r ON r.slug = c.slug
                       WHERE c.series_slug = ?1 AND c.media_type IS NOT NULL AND c.media_type != 'series'"#,
                )?;
                let verdicts = stmt
                    .query_map(params![series], |row| {
                        match row.get::<_, Option<String>>(0)? {
                            Some(text) => parse_column::<Verdict>(0, &text),
                            None => Ok(Verdict::Unknown),
                        }
                    })?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(verdicts)
            })
            .await?;
        Ok(SeriesAggregate::from_verdicts(series_slug, verdicts))
    }
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    // Try RFC3339 first (e.g., "2026-01-11T12:34:56+00:00")
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Try SQLite datetime format (e.g., "2026-01-11 12:34:56")
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

fn parse_column<T>(idx: usize, value: &str) -> rusqlite::Result<T>
where
    T: FromStr<Err = String>,
{
    value
        .parse()
        .map_err(|e: String| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into()))
}

fn json_list(row: &Row, idx: usize) -> rusqlite::Result<Vec<String>> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn timestamp(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    Ok(row
        .get::<_, Option<String>>(idx)?
        .and_then(|s| parse_datetime(&s))
        .unwrap_or_else(Utc::now))
}

fn item_from_row(row: &Row) -> rusqlite::Result<ContentItem> {
    Ok(ContentItem {
        slug: row.get(0)?,
        media_type: parse_column(1, &row.get::<_, String>(1)?)?,
        platform: parse_column(2, &row.get::<_, String>(2)?)?,
        series_slug: row.get(3)?,
        title: row.get(4)?,
        duration_secs: row.get(5)?,
        languages: json_list(row, 6)?,
        drm_schemes: json_list(row, 7)?,
        available_until: row
            .get::<_, Option<String>>(8)?
            .and_then(|s| parse_datetime(&s)),
        manifest_template: row.get(9)?,
        audio_url: row.get(10)?,
        season_number: row.get(11)?,
        episode_number: row.get(12)?,
    })
}

/// Reads `verdict, reason, last_checked_at` starting at `offset`.
fn status_from_row(row: &Row, offset: usize) -> rusqlite::Result<Option<RestrictionStatus>> {
    let verdict = row.get::<_, Option<String>>(offset)?;
    let reason = row.get::<_, Option<String>>(offset + 1)?;
    match (verdict, reason) {
        (Some(verdict), Some(reason)) => Ok(Some(RestrictionStatus {
            verdict: parse_column(offset, &verdict)?,
            reason_tag: parse_column(offset + 1, &reason)?,
            last_checked_at: timestamp(row, offset + 2)?,
        })),
        _ => Ok(None),
    }
}

fn record_from_row(row: &Row) -> rusqlite::Result<RestrictionRecord> {
    Ok(RestrictionRecord {
        slug: row.get(0)?,
        verdict: parse_column(1, &row.get::<_, String>(1)?)?,
        reason: parse_column(2, &row.get::<_, String>(2)?)?,
        last_checked_at: timestamp(row, 3)?,
        attempt_count: row.get(4)?,
        status_code: row.get(5)?,
        last_error: row.get(6)?,
    })
}

fn history_from_row(row: &Row) -> rusqlite::Result<CheckHistoryEntry> {
    Ok(CheckHistoryEntry {
        id: row.get(0)?,
        slug: row.get(1)?,
        checked_at: timestamp(row, 2)?,
        verdict: parse_column(3, &row.get::<_, String>(3)?)?,
        reason: parse_column(4, &row.get::<_, String>(4)?)?,
        status_code: row.get(5)?,
        error: row.get(6)?,
        accepted: row.get::<_, i64>(7)? != 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MediaType, ReasonTag};
    use crate::test_support::temp_store;

    fn candidate(verdict: Verdict, reason: ReasonTag, status: Option<u16>) -> RestrictionCandidate {
        RestrictionCandidate {
            verdict,
            reason,
            status_code: status,
            last_error: None,
        }
    }

    #[tokio::test]
    async fn first_upsert_creates_item_shell_and_record() {
        let (_dir, store) = temp_store().await;

        let result = store
            .upsert("x", candidate(Verdict::Accessible, ReasonTag::Manifest200, Some(200)), false)
            .await
            .unwrap();

        assert_eq!(result, StoreResult::Created);
        let record = store.get_record("x").await.unwrap().unwrap();
        assert_eq!(record.verdict, Verdict::Accessible);
        assert_eq!(record.reason, ReasonTag::Manifest200);
        assert_eq!(record.attempt_count, 1);
        // a shell has no media type, so it is not a catalog item yet
        assert!(store.get_item("x").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unknown_never_overwrites_a_known_verdict() {
        let (_dir, store) = temp_store().await;
        for (verdict, reason) in [
            (Verdict::Accessible, ReasonTag::Manifest200),
            (Verdict::Restricted, ReasonTag::Api403),
        ] {
            let slug = format!("known-{}", verdict);
            store.upsert(&slug, candidate(verdict, reason, None), false).await.unwrap();

            let result = store
                .upsert(&slug, candidate(Verdict::Unknown, ReasonTag::NetworkError, None), false)
                .await
                .unwrap();

            assert_eq!(result, StoreResult::Rejected { current: verdict });
            let record = store.get_record(&slug).await.unwrap().unwrap();
            assert_eq!(record.verdict, verdict);
            assert_eq!(record.reason, reason);
            assert_eq!(record.attempt_count, 1);
        }
    }

    #[tokio::test]
    async fn forced_writes_may_regress_and_known_may_change() {
        let (_dir, store) = temp_store().await;
        store
            .upsert("y", candidate(Verdict::Restricted, ReasonTag::Manifest403, Some(403)), false)
            .await
            .unwrap();

        let flipped = store
            .upsert("y", candidate(Verdict::Accessible, ReasonTag::Manifest200, Some(200)), false)
            .await
            .unwrap();
        assert_eq!(flipped, StoreResult::Updated);

        let forced = store
            .upsert("y", candidate(Verdict::Unknown, ReasonTag::NotFound, Some(404)), true)
            .await
            .unwrap();
        assert_eq!(forced, StoreResult::Updated);

        let record = store.get_record("y").await.unwrap().unwrap();
        assert_eq!(record.verdict, Verdict::Unknown);
        assert_eq!(record.status_code, Some(404));
        assert_eq!(record.attempt_count, 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_writes_to_one_slug_are_serialized() {
        let (_dir, store) = temp_store().await;
        let writes = 40;

        let handles: Vec<_> = (0..writes)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    let candidate = if i % 2 == 0 {
                        candidate(Verdict::Unknown, ReasonTag::NetworkError, None)
                    } else {
                        candidate(Verdict::Accessible, ReasonTag::Manifest200, Some(200))
                    };
                    store.upsert("busy", candidate, false).await.unwrap()
                })
            })
            .collect();
        let mut written = 0;
        for handle in handles {
            if handle.await.unwrap().is_written() {
                written += 1;
            }
        }

        let history = store.check_history("busy").await.unwrap();
        let accepted = history.iter().filter(|h| h.accepted).count();
        let record = store.get_record("busy").await.unwrap().unwrap();

        assert_eq!(history.len(), writes);
        assert_eq!(accepted, written);
        assert_eq!(record.attempt_count as usize, accepted);
        // every Accessible write lands, so the slug ends known
        assert_eq!(record.verdict, Verdict::Accessible);
        assert!(written >= writes / 2);
    }

    #[tokio::test]
    async fn history_keeps_every_attempt_including_rejected_ones() {
        let (_dir, store) = temp_store().await;
        store
            .upsert("z", candidate(Verdict::Unknown, ReasonTag::NotFound, Some(404)), false)
            .await
            .unwrap();
        store
            .upsert("z", candidate(Verdict::Restricted, ReasonTag::Api403, Some(403)), false)
            .await
            .unwrap();
        store
            .upsert("z", candidate(Verdict::Unknown, ReasonTag::NetworkError, None), false)
            .await
            .unwrap();

        let history = store.check_history("z").await.unwrap();

        assert_eq!(history.len(), 3);
        assert_eq!(
            history.iter().map(|h| h.reason).collect::<Vec<_>>(),
            vec![ReasonTag::NotFound, ReasonTag::Api403, ReasonTag::NetworkError]
        );
        assert_eq!(
            history.iter().map(|h| h.accepted).collect::<Vec<_>>(),
            vec![true, true, false]
        );
    }

    #[tokio::test]
    async fn item_metadata_refresh_keeps_the_verdict() {
        let (_dir, store) = temp_store().await;
        let mut item = ContentItem::new("la-infiltrada", MediaType::Movie, Platform::Primeran);
        item.languages = vec!["eu".into(), "es".into()];
        store.upsert_item(item.clone()).await.unwrap();
        store
            .upsert(&item.slug, candidate(Verdict::Restricted, ReasonTag::Manifest403, Some(403)), false)
            .await
            .unwrap();

        item.title = Some("La infiltrada".into());
        store.upsert_item(item.clone()).await.unwrap();

        assert_eq!(store.get_item(&item.slug).await.unwrap(), Some(item));
        let status = store.get_status("la-infiltrada").await.unwrap().unwrap();
        assert_eq!(status.verdict, Verdict::Restricted);
        assert_eq!(status.reason_tag, ReasonTag::Manifest403);
    }

    #[tokio::test]
    async fn pending_repair_selects_unknown_and_unchecked_items_only() {
        let (_dir, store) = temp_store().await;
        for slug in ["a-open", "b-unknown", "c-never-checked"] {
            store
                .upsert_item(ContentItem::new(slug, MediaType::Episode, Platform::Makusi))
                .await
                .unwrap();
        }
        store
            .upsert_item(ContentItem::new("d-series", MediaType::Series, Platform::Makusi))
            .await
            .unwrap();
        store
            .upsert_item(ContentItem::new("e-other", MediaType::Movie, Platform::Primeran))
            .await
            .unwrap();
        store
            .upsert("a-open", candidate(Verdict::Accessible, ReasonTag::Manifest200, Some(200)), false)
            .await
            .unwrap();
        store
            .upsert("b-unknown", candidate(Verdict::Unknown, ReasonTag::NotFound, Some(404)), false)
            .await
            .unwrap();

        let pending = store.pending_repair(Some(Platform::Makusi)).await.unwrap();

        let slugs: Vec<_> = pending.iter().map(|i| i.slug.as_str()).collect();
        assert_eq!(slugs, vec!["b-unknown", "c-never-checked"]);
        assert_eq!(store.pending_repair(None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn stale_items_are_flagged_not_deleted() {
        let (_dir, store) = temp_store().await;
        for slug in ["kept", "gone"] {
            store
                .upsert_item(ContentItem::new(slug, MediaType::Movie, Platform::Primeran))
                .await
                .unwrap();
        }

        let marked = store
            .mark_stale(Platform::Primeran, vec!["kept".to_string()])
            .await
            .unwrap();

        assert_eq!(marked, 1);
        let catalog = store.catalog(None, false).await.unwrap();
        assert_eq!(catalog.len(), 2);
        let gone = catalog.iter().find(|e| e.item.slug == "gone").unwrap();
        assert!(gone.stale);
        assert!(store.pending_repair(None).await.unwrap().iter().all(|i| i.slug != "gone"));
    }

    #[tokio::test]
    async fn series_aggregate_reflects_current_episode_verdicts() {
        let (_dir, store) = temp_store().await;
        let verdicts = [
            ("ep-1", Verdict::Restricted, ReasonTag::Manifest403),
            ("ep-2", Verdict::Accessible, ReasonTag::Manifest200),
            ("ep-3", Verdict::Restricted, ReasonTag::Api500),
        ];
        for (slug, verdict, reason) in verdicts {
            let mut episode = ContentItem::new(slug, MediaType::Episode, Platform::Primeran);
            episode.series_slug = Some("lau-hankan".into());
            store.upsert_item(episode).await.unwrap();
            store.upsert(slug, candidate(verdict, reason, None), false).await.unwrap();
        }

        let aggregate = store.series_aggregate("lau-hankan").await.unwrap();

        assert_eq!(aggregate.restricted_count, 2);
        assert_eq!(aggregate.accessible_count, 1);
        assert_eq!(aggregate.unknown_count, 0);

        store
            .upsert("ep-2", candidate(Verdict::Restricted, ReasonTag::Manifest403, None), false)
            .await
            .unwrap();
        let aggregate = store.series_aggregate("lau-hankan").await.unwrap();
        assert_eq!(aggregate.restricted_count, 3);
        assert_eq!(aggregate.overall(), Verdict::Restricted);
    }

    #[tokio::test]
    async fn catalog_can_list_restricted_items_only() {
        let (_dir, store) = temp_store().await;
        for slug in ["open", "blocked", "unchecked"] {
            store
                .upsert_item(ContentItem::new(slug, MediaType::Movie, Platform::Etbon))
                .await
                .unwrap();
        }
        store
            .upsert("open", candidate(Verdict::Accessible, ReasonTag::Manifest200, None), false)
            .await
            .unwrap();
        store
            .upsert("blocked", candidate(Verdict::Restricted, ReasonTag::Manifest500, None), false)
            .await
            .unwrap();

        let all = store.catalog(Some(Platform::Etbon), false).await.unwrap();
        let restricted = store.catalog(None, true).await.unwrap();

        assert_eq!(all.len(), 3);
        assert!(all.iter().any(|e| e.item.slug == "unchecked" && e.status.is_none()));
        assert_eq!(restricted.len(), 1);
        assert_eq!(restricted[0].item.slug, "blocked");
    }
}
