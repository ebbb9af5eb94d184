//! In-process learning memory store.

use chrono::{DateTime, TimeDelta, Utc};
use serde_json::json;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

use super::types::{
    ExperimentFingerprint, Memory, MemoryCategory, MemoryData, MemoryQuery, MemoryStats,
};
use crate::config::{CapacityPolicy, MemoryConfig};
use crate::error::{Error, Result};
use crate::utils::{fingerprint, full_fingerprint, Clock, SystemClock};

/// Importance assigned when the caller passes a non-finite value.
const DEFAULT_IMPORTANCE: f64 = 0.5;

/// Protocol fingerprint used when an experiment has no protocol.
const NO_PROTOCOL: &str = "none";

/// Minimum shared tokens for `search_similar` to report a memory.
const MIN_KEYWORD_OVERLAP: usize = 2;

/// Categorized store of agent experience.
///
/// Holds memories per category and an index of experiment fingerprints used
/// to detect repeated experiments. Not synchronized: share it behind a
/// `Mutex` when several agents use one instance.
pub struct LearningMemoryStore {
    config: MemoryConfig,
    clock: Arc<dyn Clock>,
    memories: BTreeMap<MemoryCategory, Vec<Memory>>,
    experiments: HashMap<String, ExperimentFingerprint>,
}

impl LearningMemoryStore {
    /// Create a store reading wall-clock time.
    pub fn new(config: MemoryConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a store with an explicit time source.
    pub fn with_clock(config: MemoryConfig, clock: Arc<dyn Clock>) -> Self {
        info!(
            max_memories = config.max_memories,
            prune_after_days = config.prune_after_days,
            "Learning memory store initialized"
        );

        Self {
            config,
            clock,
            memories: MemoryCategory::ALL
                .iter()
                .map(|c| (*c, Vec::new()))
                .collect(),
            experiments: HashMap::new(),
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────
    // Adding memories
    // ─────────────────────────────────────────────────────────────────────

    /// Store a memory and return its id.
    ///
    /// Importance is clamped into [0, 1]. Pruning runs after every add.
    pub fn add_memory(
        &mut self,
        category: MemoryCategory,
        content: impl Into<String>,
        importance: f64,
        tags: Vec<String>,
        data: MemoryData,
    ) -> String {
        let content = content.into();
        let now = self.clock.now();
        let id = fingerprint(&format!("{}:{}:{}", category, content, now.to_rfc3339()));

        let memory = Memory {
            id: id.clone(),
            category,
            content,
            importance: normalize_importance(importance),
            tags: dedup_tags(tags),
            data,
            created_at: now,
            last_accessed: now,
            access_count: 0,
        };

        self.memories.entry(category).or_default().push(memory);
        self.prune();

        debug!("Added memory {} to {}", id, category);
        id
    }

    /// Record an approach that worked.
    ///
    /// Importance is `min(success_rate * 0.8, 0.9)`.
    pub fn add_success_pattern(
        &mut self,
        pattern: &str,
        success_rate: f64,
        tags: Vec<String>,
    ) -> String {
        let mut data = MemoryData::new();
        data.insert("success_rate".into(), json!(success_rate));

        self.add_memory(
            MemoryCategory::SuccessPattern,
            pattern,
            (success_rate * 0.8).min(0.9),
            tags_or(tags, &["success"]),
            data,
        )
    }

    /// Record a failure together with the lesson learned from it.
    pub fn add_failure_pattern(&mut self, failure: &str, lesson: &str, tags: Vec<String>) -> String {
        let mut data = MemoryData::new();
        data.insert("failure".into(), json!(failure));
        data.insert("lesson".into(), json!(lesson));

        self.add_memory(
            MemoryCategory::FailurePattern,
            format!("Failure: {}\nLesson: {}", failure, lesson),
            0.7,
            tags_or(tags, &["failure"]),
            data,
        )
    }

    /// Record a direction that should not be explored again.
    pub fn add_dead_end(&mut self, dead_end: &str, reason: &str, tags: Vec<String>) -> String {
        let mut data = MemoryData::new();
        data.insert("dead_end".into(), json!(dead_end));
        data.insert("reason".into(), json!(reason));

        self.add_memory(
            MemoryCategory::DeadEnd,
            format!("Dead End: {}\nReason: {}", dead_end, reason),
            0.9,
            tags_or(tags, &["dead_end", "avoid"]),
            data,
        )
    }

    /// Record an insight, tagged with its source.
    pub fn add_insight(&mut self, insight: &str, source: &str, related_items: Vec<String>) -> String {
        let mut data = MemoryData::new();
        data.insert("source".into(), json!(source));
        data.insert("related_items".into(), json!(related_items));

        self.add_memory(
            MemoryCategory::Insight,
            insight,
            0.95,
            vec!["insight".to_string(), source.to_string()],
            data,
        )
    }

    // ─────────────────────────────────────────────────────────────────────
    // Retrieval
    // ─────────────────────────────────────────────────────────────────────

    /// Ranked retrieval by recency-decayed importance.
    ///
    /// Only the returned memories are marked as accessed.
    pub fn query_memory(&mut self, query: &MemoryQuery) -> Result<Vec<Memory>> {
        if !(0.0..=1.0).contains(&query.min_importance) {
            return Err(Error::invalid_argument(
                "min_importance",
                format!("{} is outside [0, 1]", query.min_importance),
            ));
        }

        let now = self.clock.now();

        let mut ranked: Vec<(MemoryCategory, usize, f64)> = self
            .memories
            .iter()
            .filter(|(category, _)| query.category.is_none_or(|c| c == **category))
            .flat_map(|(category, list)| {
                list.iter()
                    .enumerate()
                    .filter(|(_, m)| m.importance >= query.min_importance)
                    .filter(|(_, m)| query.tags.is_empty() || m.has_any_tag(&query.tags))
                    .map(move |(i, m)| (*category, i, m.score(now)))
            })
            .collect();

        // Stable sort keeps scan order among equal scores
        ranked.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(Ordering::Equal));
        ranked.truncate(query.limit);

        let mut results = Vec::with_capacity(ranked.len());
        for (category, index, _) in ranked {
            if let Some(memory) = self
                .memories
                .get_mut(&category)
                .and_then(|list| list.get_mut(index))
            {
                memory.mark_accessed(now);
                results.push(memory.clone());
            }
        }

        Ok(results)
    }

    /// Keyword search by shared lowercase tokens.
    ///
    /// A memory's tokens are its whitespace-split content plus its tags.
    /// Memories sharing fewer than two tokens with the query are skipped.
    /// Does not mark access.
    pub fn search_similar(
        &self,
        query: &str,
        category: Option<MemoryCategory>,
        limit: usize,
    ) -> Vec<Memory> {
        let keywords = tokenize(query);

        let mut similar: Vec<(&Memory, usize)> = self
            .iter_memories(category)
            .filter_map(|memory| {
                let mut tokens = tokenize(&memory.content);
                tokens.extend(memory.tags.iter().map(|t| t.to_lowercase()));
                let overlap = keywords.intersection(&tokens).count();
                (overlap >= MIN_KEYWORD_OVERLAP).then_some((memory, overlap))
            })
            .collect();

        similar.sort_by(|a, b| b.1.cmp(&a.1));

        similar
            .into_iter()
            .take(limit)
            .map(|(memory, _)| memory.clone())
            .collect()
    }

    /// Look up a memory by id without marking access.
    pub fn get(&self, id: &str) -> Option<&Memory> {
        self.iter_memories(None).find(|m| m.id == id)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Experiment deduplication
    // ─────────────────────────────────────────────────────────────────────

    /// Record an experiment and return its combined fingerprint.
    ///
    /// Re-recording the same experiment overwrites the earlier entry.
    pub fn record_experiment(&mut self, hypothesis: &str, protocol: Option<&str>) -> String {
        let signature = experiment_fingerprint(hypothesis, protocol, self.clock.now());
        let combined = signature.combined_fingerprint.clone();

        self.experiments.insert(combined.clone(), signature);
        debug!("Recorded experiment {}", combined);

        combined
    }

    /// Check whether an identical experiment was recorded.
    ///
    /// Matching is exact on the fingerprinted text.
    pub fn is_duplicate_experiment(
        &self,
        hypothesis: &str,
        protocol: Option<&str>,
    ) -> (bool, Option<String>) {
        let combined = combined_fingerprint(hypothesis, protocol);

        if self.experiments.contains_key(&combined) {
            (true, Some(format!("Duplicate of experiment {}", combined)))
        } else {
            (false, None)
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Maintenance
    // ─────────────────────────────────────────────────────────────────────

    /// Drop memories that are both low-importance and stale.
    ///
    /// A memory survives if its importance meets `min_importance_to_keep`
    /// or it was created within `prune_after_days`. Under the hard-cap
    /// policy the lowest-scored memories are then trimmed down to
    /// `max_memories`. Returns the number of memories removed.
    pub fn prune(&mut self) -> usize {
        let now = self.clock.now();
        // A window reaching past the representable range keeps everything
        let cutoff = TimeDelta::try_days(self.config.prune_after_days)
            .and_then(|window| now.checked_sub_signed(window));
        let floor = self.config.min_importance_to_keep;

        let mut removed = 0;
        for (category, list) in self.memories.iter_mut() {
            let original_count = list.len();
            list.retain(|m| {
                m.importance >= floor || cutoff.is_none_or(|cutoff| m.created_at > cutoff)
            });

            let pruned_count = original_count - list.len();
            if pruned_count > 0 {
                debug!("Pruned {} memories from {}", pruned_count, category);
            }
            removed += pruned_count;
        }

        if self.config.capacity_policy == CapacityPolicy::HardCap {
            removed += self.enforce_hard_cap(now);
        }

        removed
    }

    fn enforce_hard_cap(&mut self, now: DateTime<Utc>) -> usize {
        let total = self.len();
        let max = self.config.max_memories;
        if total <= max {
            return 0;
        }

        let mut ranked: Vec<(MemoryCategory, usize, f64, DateTime<Utc>)> = self
            .memories
            .iter()
            .flat_map(|(category, list)| {
                list.iter()
                    .enumerate()
                    .map(move |(i, m)| (*category, i, m.score(now), m.created_at))
            })
            .collect();

        // Highest score first; newer wins a tie
        ranked.sort_by(|a, b| {
            b.2.partial_cmp(&a.2)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.3.cmp(&a.3))
        });

        let keep: HashSet<(MemoryCategory, usize)> =
            ranked.into_iter().take(max).map(|(c, i, _, _)| (c, i)).collect();

        for (category, list) in self.memories.iter_mut() {
            let mut index = 0;
            list.retain(|_| {
                let kept = keep.contains(&(*category, index));
                index += 1;
                kept
            });
        }

        let trimmed = total - max;
        debug!("Trimmed {} memories over the cap of {}", trimmed, max);
        trimmed
    }

    /// Remove every memory in one category.
    pub fn clear_category(&mut self, category: MemoryCategory) {
        if let Some(list) = self.memories.get_mut(&category) {
            list.clear();
        }
        info!("Cleared all memories in category {}", category);
    }

    /// Remove all memories and experiment fingerprints.
    pub fn clear_all(&mut self) {
        for list in self.memories.values_mut() {
            list.clear();
        }
        self.experiments.clear();
        info!("Cleared all memories");
    }

    /// Total number of stored memories.
    pub fn len(&self) -> usize {
        self.memories.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get memory statistics.
    pub fn get_stats(&self) -> MemoryStats {
        MemoryStats {
            total_memories: self.len(),
            by_category: self
                .memories
                .iter()
                .map(|(category, list)| (category.to_string(), list.len()))
                .collect(),
            experiment_signatures: self.experiments.len(),
            max_memories: self.config.max_memories,
            prune_after_days: self.config.prune_after_days,
        }
    }

    fn iter_memories(&self, category: Option<MemoryCategory>) -> impl Iterator<Item = &Memory> {
        self.memories
            .iter()
            .filter(move |(c, _)| category.is_none_or(|wanted| wanted == **c))
            .flat_map(|(_, list)| list.iter())
    }
}

impl Default for LearningMemoryStore {
    fn default() -> Self {
        Self::new(MemoryConfig::default())
    }
}

fn normalize_importance(importance: f64) -> f64 {
    if importance.is_finite() {
        importance.clamp(0.0, 1.0)
    } else {
        DEFAULT_IMPORTANCE
    }
}

fn dedup_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.into_iter().filter(|t| seen.insert(t.clone())).collect()
}

fn tags_or(tags: Vec<String>, defaults: &[&str]) -> Vec<String> {
    if tags.is_empty() {
        defaults.iter().map(|t| t.to_string()).collect()
    } else {
        tags
    }
}

fn tokenize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn protocol_fingerprint(protocol: Option<&str>) -> String {
    match protocol {
        Some(p) if !p.is_empty() => fingerprint(p),
        _ => NO_PROTOCOL.to_string(),
    }
}

fn combined_fingerprint(hypothesis: &str, protocol: Option<&str>) -> String {
    full_fingerprint(&format!(
        "{}:{}",
        fingerprint(hypothesis),
        protocol_fingerprint(protocol)
    ))
}

fn experiment_fingerprint(
    hypothesis: &str,
    protocol: Option<&str>,
    created_at: chrono::DateTime<chrono::Utc>,
) -> ExperimentFingerprint {
    let hypothesis_fingerprint = fingerprint(hypothesis);
    let protocol_fingerprint = protocol_fingerprint(protocol);
    let combined_fingerprint =
        full_fingerprint(&format!("{}:{}", hypothesis_fingerprint, protocol_fingerprint));

    ExperimentFingerprint {
        hypothesis_fingerprint,
        protocol_fingerprint,
        combined_fingerprint,
        created_at,
    }
}
