use serde::Serialize;

use super::Verdict;

/// Series-level counts, recomputed from the episodes on every read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeriesAggregate {
    pub series_slug: String,
    pub restricted_count: usize,
    pub accessible_count: usize,
    pub unknown_count: usize,
}

impl SeriesAggregate {
    pub fn from_verdicts<I>(series_slug: impl Into<String>, verdicts: I) -> Self
    where
        I: IntoIterator<Item = Verdict>,
    {
        let mut aggregate = Self {
            series_slug: series_slug.into(),
            ..Self::default()
        };
        for verdict in verdicts {
            match verdict {
                Verdict::Restricted => aggregate.restricted_count += 1,
                Verdict::Accessible => aggregate.accessible_count += 1,
                Verdict::Unknown => aggregate.unknown_count += 1,
            }
        }
        aggregate
    }

    pub fn total(&self) -> usize {
        self.restricted_count + self.accessible_count + self.unknown_count
    }

    /// Restricted or Accessible only when every episode agrees.
    pub fn overall(&self) -> Verdict {
        let total = self.total();
        if total > 0 && self.restricted_count == total {
            Verdict::Restricted
        } else if total > 0 && self.accessible_count == total {
            Verdict::Accessible
        } else {
            Verdict::Unknown
        }
    }
}
