//! Learning memory type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::Error;

/// Opaque structured payload attached to a memory.
///
/// The store never interprets these values.
pub type MemoryData = serde_json::Map<String, serde_json::Value>;

/// Classification of a memory.
///
/// Declaration order is the order categories are scanned in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MemoryCategory {
    /// Approaches that worked
    #[serde(rename = "success_patterns")]
    SuccessPattern,
    /// Approaches that failed, with the lesson drawn
    #[serde(rename = "failure_patterns")]
    FailurePattern,
    /// Directions that must not be retried
    #[serde(rename = "dead_ends")]
    DeadEnd,
    /// High-value findings
    #[serde(rename = "insights")]
    Insight,
    /// Anything else
    #[serde(rename = "general")]
    General,
}

impl MemoryCategory {
    /// Every category, in scan order.
    pub const ALL: [MemoryCategory; 5] = [
        MemoryCategory::SuccessPattern,
        MemoryCategory::FailurePattern,
        MemoryCategory::DeadEnd,
        MemoryCategory::Insight,
        MemoryCategory::General,
    ];

    /// Convert to string for storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryCategory::SuccessPattern => "success_patterns",
            MemoryCategory::FailurePattern => "failure_patterns",
            MemoryCategory::DeadEnd => "dead_ends",
            MemoryCategory::Insight => "insights",
            MemoryCategory::General => "general",
        }
    }
}

impl std::fmt::Display for MemoryCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MemoryCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success_patterns" => Ok(MemoryCategory::SuccessPattern),
            "failure_patterns" => Ok(MemoryCategory::FailurePattern),
            "dead_ends" => Ok(MemoryCategory::DeadEnd),
            "insights" => Ok(MemoryCategory::Insight),
            "general" => Ok(MemoryCategory::General),
            other => Err(Error::invalid_argument(
                "category",
                format!(
                    "unknown value '{}'; expected one of success_patterns, failure_patterns, dead_ends, insights, general",
                    other
                ),
            )),
        }
    }
}

/// A stored unit of agent experience.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memory {
    /// Fingerprint of category, content and creation time
    pub id: String,
    /// Fixed at creation
    pub category: MemoryCategory,
    /// Free text
    pub content: String,
    /// Importance score (0.0 - 1.0)
    pub importance: f64,
    /// Tags for filtering and keyword search
    pub tags: Vec<String>,
    /// Category-specific payload
    pub data: MemoryData,
    /// When this memory was created
    pub created_at: DateTime<Utc>,
    /// When this memory was last returned by a ranked query
    pub last_accessed: DateTime<Utc>,
    /// Number of times this memory was returned by a ranked query
    pub access_count: u64,
}

impl Memory {
    /// Record a retrieval.
    pub(crate) fn mark_accessed(&mut self, at: DateTime<Utc>) {
        self.access_count += 1;
        self.last_accessed = at;
    }

    /// Whole days elapsed since creation, never negative.
    pub fn age_days(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_at).num_days().max(0)
    }

    /// Recency-decayed importance: `importance / (age_days + 1)`.
    pub fn score(&self, now: DateTime<Utc>) -> f64 {
        self.importance / (self.age_days(now) + 1) as f64
    }

    /// Check whether any of `tags` is attached to this memory.
    pub fn has_any_tag(&self, tags: &[String]) -> bool {
        tags.iter().any(|t| self.tags.contains(t))
    }
}

/// Identity of one experiment, used for duplicate detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentFingerprint {
    pub hypothesis_fingerprint: String,
    pub protocol_fingerprint: String,
    pub combined_fingerprint: String,
    pub created_at: DateTime<Utc>,
}

/// Filters for a ranked memory query.
#[derive(Debug, Clone)]
pub struct MemoryQuery {
    /// Restrict to one category (all when `None`)
    pub category: Option<MemoryCategory>,
    /// Keep memories sharing at least one of these tags (no filter when empty)
    pub tags: Vec<String>,
    /// Importance floor (0.0 - 1.0)
    pub min_importance: f64,
    /// Maximum number of results
    pub limit: usize,
}

impl Default for MemoryQuery {
    fn default() -> Self {
        Self {
            category: None,
            tags: Vec::new(),
            min_importance: 0.0,
            limit: 10,
        }
    }
}

impl MemoryQuery {
    pub fn category(mut self, category: MemoryCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn min_importance(mut self, min_importance: f64) -> Self {
        self.min_importance = min_importance;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// Memory store statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryStats {
    pub total_memories: usize,
    pub by_category: BTreeMap<String, usize>,
    pub experiment_signatures: usize,
    pub max_memories: usize,
    pub prune_after_days: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn memory_at(importance: f64, created_at: DateTime<Utc>) -> Memory {
        Memory {
            id: "m".into(),
            category: MemoryCategory::General,
            content: "content".into(),
            importance,
            tags: vec!["a".into()],
            data: MemoryData::new(),
            created_at,
            last_accessed: created_at,
            access_count: 0,
        }
    }

    #[test]
    fn test_category_round_trip_names() {
        for category in MemoryCategory::ALL {
            assert_eq!(category.as_str().parse::<MemoryCategory>().unwrap(), category);
            assert_eq!(
                serde_json::to_value(category).unwrap(),
                serde_json::Value::String(category.to_string())
            );
        }
    }

    #[test]
    fn test_unknown_category_is_invalid_argument() {
        let err = "successes".parse::<MemoryCategory>().unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_score_decay_shape() {
        let now = Utc::now();
        assert_eq!(memory_at(0.9, now).score(now), 0.9);
        assert!((memory_at(0.9, now - Duration::days(2)).score(now) - 0.3).abs() < 1e-12);
        // Partial days do not count
        assert_eq!(memory_at(0.8, now - Duration::hours(47)).score(now), 0.4);
        // Future timestamps behave like "created today"
        assert_eq!(memory_at(0.5, now + Duration::days(3)).score(now), 0.5);
    }

    #[test]
    fn test_mark_accessed_moves_both_fields() {
        let now = Utc::now();
        let mut memory = memory_at(0.5, now - Duration::days(1));
        memory.mark_accessed(now);
        assert_eq!(memory.access_count, 1);
        assert_eq!(memory.last_accessed, now);
    }

    #[test]
    fn test_query_defaults() {
        let query = MemoryQuery::default();
        assert!(query.category.is_none());
        assert!(query.tags.is_empty());
        assert_eq!(query.min_importance, 0.0);
        assert_eq!(query.limit, 10);
    }
}
