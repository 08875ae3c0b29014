use crate::models::{ReasonTag, Verdict};

use super::outcome::{FailureClass, Outcome};
use super::resolver::ProbeKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub verdict: Verdict,
    pub reason: ReasonTag,
}

impl Classification {
    fn new(verdict: Verdict, reason: ReasonTag) -> Self {
        Self { verdict, reason }
    }
}

/// Maps raw probe outcomes to verdicts. Holds configuration only, never state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassificationPolicy {
    /// Whether HTTP 500 counts as a geo block. The platforms answer 500 to
    /// out-of-region requests often enough that this defaults to true, but a
    /// 500 can just as well be an unrelated upstream failure.
    pub restrict_on_500: bool,
}

impl Default for ClassificationPolicy {
    fn default() -> Self {
        Self {
            restrict_on_500: true,
        }
    }
}

impl ClassificationPolicy {
    pub fn new(restrict_on_500: bool) -> Self {
        Self { restrict_on_500 }
    }

    pub fn classify(&self, kind: ProbeKind, outcome: Outcome) -> Classification {
        match outcome {
            Outcome::Status(200) => Classification::new(
                Verdict::Accessible,
                match kind {
                    ProbeKind::MetadataApi => ReasonTag::Ok200,
                    ProbeKind::Manifest => ReasonTag::Manifest200,
                    ProbeKind::AudioFile => ReasonTag::Audio200,
                },
            ),
            Outcome::Status(403) => Classification::new(
                Verdict::Restricted,
                match kind {
                    ProbeKind::MetadataApi => ReasonTag::Api403,
                    ProbeKind::Manifest => ReasonTag::Manifest403,
                    ProbeKind::AudioFile => ReasonTag::Audio403,
                },
            ),
            Outcome::Status(500) if self.restrict_on_500 => Classification::new(
                Verdict::Restricted,
                match kind {
                    ProbeKind::MetadataApi => ReasonTag::Api500,
                    ProbeKind::Manifest => ReasonTag::Manifest500,
                    ProbeKind::AudioFile => ReasonTag::Audio500,
                },
            ),
            Outcome::Status(404) => Classification::new(Verdict::Unknown, ReasonTag::NotFound),
            Outcome::Status(_) => {
                Classification::new(Verdict::Unknown, ReasonTag::UnexpectedStatus)
            }
            Outcome::Timeout | Outcome::ConnectionError | Outcome::TlsError => {
                Classification::new(Verdict::Unknown, ReasonTag::NetworkError)
            }
        }
    }

    pub fn failure_class(&self, outcome: Outcome) -> FailureClass {
        match outcome {
            Outcome::Status(200) => FailureClass::DefinitiveAccess,
            Outcome::Status(403) => FailureClass::DefinitiveRestriction,
            Outcome::Status(500) if self.restrict_on_500 => FailureClass::DefinitiveRestriction,
            Outcome::Status(404) => FailureClass::AmbiguousNotFound,
            Outcome::Status(429) => FailureClass::RateLimited,
            Outcome::Status(500 | 502 | 503) => FailureClass::UpstreamServerError,
            Outcome::Status(_) => FailureClass::UnexpectedStatus,
            Outcome::Timeout | Outcome::ConnectionError | Outcome::TlsError => {
                FailureClass::TransientNetworkFailure
            }
        }
    }

    pub fn is_retryable(&self, outcome: Outcome) -> bool {
        self.failure_class(outcome).is_retryable()
    }
}

/// Position of the result that decides an item's verdict: the first
/// Accessible, else the first non-Unknown, else the first one probed.
pub fn decisive_index(results: &[Classification]) -> Option<usize> {
    results
        .iter()
        .position(|c| c.verdict == Verdict::Accessible)
        .or_else(|| results.iter().position(|c| c.verdict.is_known()))
        .or(if results.is_empty() { None } else { Some(0) })
}
