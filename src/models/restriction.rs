use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Accessible,
    Restricted,
    Unknown,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Accessible => "accessible",
            Verdict::Restricted => "restricted",
            Verdict::Unknown => "unknown",
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Verdict::Unknown)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verdict {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accessible" => Ok(Verdict::Accessible),
            "restricted" => Ok(Verdict::Restricted),
            "unknown" => Ok(Verdict::Unknown),
            other => Err(format!("unknown verdict: {}", other)),
        }
    }
}

/// Which check and status code produced a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReasonTag {
    #[serde(rename = "ok_200")]
    Ok200,
    #[serde(rename = "manifest_200")]
    Manifest200,
    #[serde(rename = "audio_200")]
    Audio200,
    #[serde(rename = "api_403")]
    Api403,
    #[serde(rename = "manifest_403")]
    Manifest403,
    #[serde(rename = "audio_403")]
    Audio403,
    #[serde(rename = "api_500")]
    Api500,
    #[serde(rename = "manifest_500")]
    Manifest500,
    #[serde(rename = "audio_500")]
    Audio500,
    #[serde(rename = "not_found")]
    NotFound,
    #[serde(rename = "unexpected_status")]
    UnexpectedStatus,
    #[serde(rename = "network_error")]
    NetworkError,
}

impl ReasonTag {
    const ALL: [ReasonTag; 12] = [
        ReasonTag::Ok200,
        ReasonTag::Manifest200,
        ReasonTag::Audio200,
        ReasonTag::Api403,
        ReasonTag::Manifest403,
        ReasonTag::Audio403,
        ReasonTag::Api500,
        ReasonTag::Manifest500,
        ReasonTag::Audio500,
        ReasonTag::NotFound,
        ReasonTag::UnexpectedStatus,
        ReasonTag::NetworkError,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonTag::Ok200 => "ok_200",
            ReasonTag::Manifest200 => "manifest_200",
            ReasonTag::Audio200 => "audio_200",
            ReasonTag::Api403 => "api_403",
            ReasonTag::Manifest403 => "manifest_403",
            ReasonTag::Audio403 => "audio_403",
            ReasonTag::Api500 => "api_500",
            ReasonTag::Manifest500 => "manifest_500",
            ReasonTag::Audio500 => "audio_500",
            ReasonTag::NotFound => "not_found",
            ReasonTag::UnexpectedStatus => "unexpected_status",
            ReasonTag::NetworkError => "network_error",
        }
    }
}

impl fmt::Display for ReasonTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReasonTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReasonTag::ALL
            .into_iter()
            .find(|tag| tag.as_str() == s)
            .ok_or_else(|| format!("unknown reason tag: {}", s))
    }
}

/// A freshly classified result waiting to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestrictionCandidate {
    pub verdict: Verdict,
    pub reason: ReasonTag,
    pub status_code: Option<u16>,
    pub last_error: Option<String>,
}

/// The current, authoritative restriction record of one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestrictionRecord {
    pub slug: String,
    pub verdict: Verdict,
    pub reason: ReasonTag,
    pub last_checked_at: DateTime<Utc>,
    pub attempt_count: u32,
    pub status_code: Option<u16>,
    pub last_error: Option<String>,
}

/// What the export step and the dashboard read per slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestrictionStatus {
    pub verdict: Verdict,
    pub reason_tag: ReasonTag,
    pub last_checked_at: DateTime<Utc>,
}

impl From<&RestrictionRecord> for RestrictionStatus {
    fn from(record: &RestrictionRecord) -> Self {
        Self {
            verdict: record.verdict,
            reason_tag: record.reason,
            last_checked_at: record.last_checked_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckHistoryEntry {
    pub id: i64,
    pub slug: String,
    pub checked_at: DateTime<Utc>,
    pub verdict: Verdict,
    pub reason: ReasonTag,
    pub status_code: Option<u16>,
    pub error: Option<String>,
    /// False when the non-regression rule kept the previous record.
    pub accepted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreResult {
    Created,
    Updated,
    Rejected { current: Verdict },
}

impl StoreResult {
    pub fn is_written(&self) -> bool {
        !matches!(self, StoreResult::Rejected { .. })
    }
}
