use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use rand::Rng;
use serde::Serialize;

use crate::db::Repository;
use crate::error::{AppError, Result};
use crate::models::{ContentItem, Platform, StoreResult, Verdict};

use super::check::Checker;

/// Which Unknown items a repair pass should pick up.
#[derive(Debug, Clone, Default)]
pub struct RepairSelector {
    pub platform: Option<Platform>,
    /// Restrict the pass to these slugs; empty means all pending items.
    pub slugs: Vec<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// Exponential delay before attempt `attempt + 1`, plus up to 50% jitter.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(10);
        let delay = self
            .base_backoff
            .checked_mul(1u32 << exponent)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff);
        let jitter_ms = (delay.as_millis() / 2) as u64;
        if jitter_ms == 0 {
            return delay;
        }
        delay + Duration::from_millis(rand::rng().random_range(0..=jitter_ms))
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct RepairReport {
    pub resolved_to_accessible: usize,
    pub resolved_to_restricted: usize,
    pub still_unknown: usize,
    /// Slugs left for manual review, sorted.
    pub still_unknown_slugs: Vec<String>,
}

/// Re-probes items left Unknown by earlier runs.
pub struct RepairScheduler {
    checker: Arc<Checker>,
    store: Arc<Repository>,
    retry: RetryPolicy,
    max_concurrency: usize,
}

impl RepairScheduler {
    pub fn new(
        checker: Arc<Checker>,
        store: Arc<Repository>,
        retry: RetryPolicy,
        max_concurrency: usize,
    ) -> Self {
        Self {
            checker,
            store,
            retry,
            max_concurrency,
        }
    }

    pub async fn repair(&self, selector: &RepairSelector) -> Result<RepairReport> {
        let mut pending = self.store.pending_repair(selector.platform).await?;
        if !selector.slugs.is_empty() {
            let wanted: HashSet<&str> = selector.slugs.iter().map(String::as_str).collect();
            pending.retain(|item| wanted.contains(item.slug.as_str()));
        }
        if let Some(limit) = selector.limit {
            pending.truncate(limit);
        }
        tracing::info!("Repairing {} unknown items", pending.len());

        let results: Vec<Result<(String, Verdict)>> = stream::iter(pending)
            .map(|item| self.repair_item(item))
            .buffer_unordered(self.max_concurrency.max(1))
            .collect()
            .await;

        let mut report = RepairReport::default();
        for result in results {
            let (slug, verdict) = result?;
            match verdict {
                Verdict::Accessible => report.resolved_to_accessible += 1,
                Verdict::Restricted => report.resolved_to_restricted += 1,
                Verdict::Unknown => report.still_unknown_slugs.push(slug),
            }
        }
        report.still_unknown_slugs.sort();
        report.still_unknown = report.still_unknown_slugs.len();

        tracing::info!(
            "Repair finished: {} accessible, {} restricted, {} still unknown",
            report.resolved_to_accessible,
            report.resolved_to_restricted,
            report.still_unknown
        );
        Ok(report)
    }

    /// Checks one item, persisting every attempt, until a verdict is known or
    /// the failure is not worth retrying.
    async fn repair_item(&self, item: ContentItem) -> Result<(String, Verdict)> {
        let mut attempt = 1;
        loop {
            let check = match self.checker.check(&item).await {
                Ok(check) => check,
                Err(e @ (AppError::NotProbableKind { .. } | AppError::InvalidTemplate { .. })) => {
                    tracing::warn!("Cannot repair {}: {}", item.slug, e);
                    return Ok((item.slug, Verdict::Unknown));
                }
                Err(e) => return Err(e),
            };

            let verdict = match self.store.upsert(&item.slug, check.candidate(), false).await? {
                // resolved elsewhere while this pass was running
                StoreResult::Rejected { current } => current,
                StoreResult::Created | StoreResult::Updated => check.verdict(),
            };
            if verdict.is_known() {
                tracing::info!(
                    "Repaired {}: {} ({}) after {} attempt(s)",
                    item.slug,
                    verdict,
                    check.classification.reason,
                    attempt
                );
                return Ok((item.slug, verdict));
            }

            let retryable = self.checker.policy().is_retryable(check.decisive.outcome);
            if !retryable || attempt >= self.retry.max_attempts {
                tracing::debug!(
                    "{} still unknown after {} attempt(s): {}",
                    item.slug,
                    attempt,
                    check.decisive.outcome
                );
                return Ok((item.slug, Verdict::Unknown));
            }

            let delay = self.retry.backoff(attempt);
            tracing::debug!(
                "{}: {} on attempt {}, retrying in {:?}",
                item.slug,
                check.decisive.outcome,
                attempt,
                delay
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
