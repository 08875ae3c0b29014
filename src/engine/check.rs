use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::{ContentItem, RestrictionCandidate, Verdict};
use crate::probe::{
    decisive_index, Classification, ClassificationPolicy, GeoProbe, Outcome, ProbeKind,
    ProbeTarget, ProbeTargetResolver,
};

/// One probe request and how it was classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeObservation {
    pub target: ProbeTarget,
    pub outcome: Outcome,
    pub classification: Classification,
}

/// Result of checking one item end to end.
#[derive(Debug, Clone)]
pub struct ItemCheck {
    pub classification: Classification,
    /// The observation the verdict was taken from.
    pub decisive: ProbeObservation,
    pub observations: Vec<ProbeObservation>,
}

impl ItemCheck {
    pub fn verdict(&self) -> Verdict {
        self.classification.verdict
    }

    pub fn candidate(&self) -> RestrictionCandidate {
        let last_error = match self.classification.verdict {
            Verdict::Unknown => Some(format!(
                "{} from {}",
                self.decisive.outcome, self.decisive.target.url
            )),
            _ => None,
        };
        RestrictionCandidate {
            verdict: self.classification.verdict,
            reason: self.classification.reason,
            status_code: self.decisive.outcome.status_code(),
            last_error,
        }
    }
}

/// Runs resolve, probe and classify for a single item. Holds no state between items.
pub struct Checker {
    resolver: Arc<dyn ProbeTargetResolver>,
    probe: Arc<dyn GeoProbe>,
    policy: ClassificationPolicy,
}

impl Checker {
    pub fn new(
        resolver: Arc<dyn ProbeTargetResolver>,
        probe: Arc<dyn GeoProbe>,
        policy: ClassificationPolicy,
    ) -> Self {
        Self {
            resolver,
            probe,
            policy,
        }
    }

    pub fn policy(&self) -> &ClassificationPolicy {
        &self.policy
    }

    /// Probes the item's targets in resolver order.
    ///
    /// A Restricted answer from the metadata API ends the check. An Accessible
    /// API answer only clears the way to the playback targets, which are tried
    /// until the first one answers 200. A playback block still wins over the
    /// API 200; playback targets that are all Unknown do not, and the item is
    /// Accessible (`ok_200`). Fails only when the item cannot be resolved
    /// (series, broken templates).
    pub async fn check(&self, item: &ContentItem) -> Result<ItemCheck> {
        let targets = self.resolver.resolve(item)?;

        let mut observations: Vec<ProbeObservation> = Vec::with_capacity(targets.len());
        let mut considered: Vec<usize> = Vec::new();
        let mut api_accessible: Option<usize> = None;

        for target in targets {
            let outcome = self.probe.probe(&target.url).await;
            let classification = self.policy.classify(target.kind, outcome);
            let is_api = target.kind == ProbeKind::MetadataApi;
            tracing::debug!(
                "{}: {:?} {} -> {} ({})",
                item.slug,
                target.kind,
                target.url,
                classification.verdict,
                classification.reason
            );

            let idx = observations.len();
            observations.push(ProbeObservation {
                target,
                outcome,
                classification,
            });

            match (is_api, classification.verdict) {
                (true, Verdict::Restricted) => {
                    considered = vec![idx];
                    break;
                }
                (true, Verdict::Accessible) => api_accessible = Some(idx),
                (false, Verdict::Accessible) => {
                    considered.push(idx);
                    break;
                }
                _ => considered.push(idx),
            }
        }

        let picks: Vec<Classification> = considered
            .iter()
            .map(|&i| observations[i].classification)
            .collect();
        // an API 200 outranks playback targets that all came back Unknown
        let decisive = match (decisive_index(&picks).map(|pos| considered[pos]), api_accessible) {
            (Some(idx), Some(api)) if !observations[idx].classification.verdict.is_known() => api,
            (Some(idx), _) => idx,
            (None, api) => api.ok_or_else(|| {
                AppError::Other(anyhow::anyhow!("no probe targets for {}", item.slug))
            })?,
        };

        let decisive = observations[decisive].clone();
        Ok(ItemCheck {
            classification: decisive.classification,
            decisive,
            observations,
        })
    }
}
