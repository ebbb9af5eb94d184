//! Guided walkthrough of the learning memory store.
//!
//! Seeds an in-memory store with sample research experience and exercises
//! ranked queries, keyword search, experiment deduplication and stats.

use anyhow::Result;
use colored::Colorize;
use evomem_core::learning::{LearningMemoryStore, Memory, MemoryCategory, MemoryQuery};

use crate::config::Config;

/// Ids of the sample memories, by kind.
struct Seeded {
    success: Vec<String>,
    failure: Vec<String>,
    dead_end: Vec<String>,
    insight: Vec<String>,
}

fn tags(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn seed(store: &mut LearningMemoryStore) -> Seeded {
    let success = vec![
        store.add_success_pattern(
            "Split hard problems with divide and conquer",
            0.9,
            tags(&["algorithm", "problem_solving", "divide_conquer"]),
        ),
        store.add_success_pattern(
            "Cache repeated computations",
            0.85,
            tags(&["optimization", "cache", "performance"]),
        ),
        store.add_success_pattern(
            "Use a vector database for semantic search",
            0.95,
            tags(&["search", "vector_db", "semantic"]),
        ),
    ];

    let failure = vec![
        store.add_failure_pattern(
            "Brute-force enumeration over a large dataset",
            "Ran out of memory; stream or batch the data instead",
            tags(&["performance", "mistake", "memory"]),
        ),
        store.add_failure_pattern(
            "Calling the LLM API inside a tight loop",
            "Hit rate limits and cost spiked; batch requests or cache responses",
            tags(&["api", "cost", "rate_limit"]),
        ),
    ];

    let dead_end = vec![
        store.add_dead_end(
            "Fitting a nonlinear relationship with a linear model",
            "Repeated experiments performed poorly; use a nonlinear model",
            tags(&["modeling", "linear", "avoid"]),
        ),
        store.add_dead_end(
            "Predicting from a single feature",
            "Accuracy stayed below 50%; needs feature engineering",
            tags(&["feature", "prediction", "avoid"]),
        ),
    ];

    let insight = vec![
        store.add_insight(
            "Depth matters more than width at equal parameter count",
            "literature_review",
            tags(&["deep_learning", "architecture", "neural_network"]),
        ),
        store.add_insight(
            "Attention improves sequence models on long inputs",
            "experiment",
            tags(&["attention", "transformer", "sequence"]),
        ),
        store.add_insight(
            "Data quality beats data quantity",
            "research",
            tags(&["data", "quality", "dataset"]),
        ),
    ];

    Seeded {
        success,
        failure,
        dead_end,
        insight,
    }
}

fn section(title: &str) {
    println!();
    println!("{}", "─".repeat(70).dimmed());
    println!("  {}", title.cyan().bold());
    println!("{}", "─".repeat(70).dimmed());
}

fn print_memory(index: usize, memory: &Memory) {
    println!("  [{}] {}", index, memory.content.replace('\n', " / ").bold());
    println!(
        "      importance {:.2}, accessed {}, tags: {}",
        memory.importance,
        memory.access_count,
        if memory.tags.is_empty() {
            "none".to_string()
        } else {
            memory.tags.join(", ")
        }
    );
}

fn print_brief(index: usize, memory: &Memory) {
    println!(
        "  [{}] {} ({}, importance {:.2})",
        index,
        memory.content.replace('\n', " / "),
        memory.category,
        memory.importance
    );
}

/// Execute demo command.
pub fn execute(config: &Config) -> Result<()> {
    let mut store = LearningMemoryStore::new(config.core.memory.clone());

    section("Stage 1: Recording experience");
    let seeded = seed(&mut store);
    println!("  {} {} success patterns", "✓".green(), seeded.success.len());
    println!("  {} {} failure patterns", "✓".green(), seeded.failure.len());
    println!("  {} {} dead ends", "✓".green(), seeded.dead_end.len());
    println!("  {} {} insights", "✓".green(), seeded.insight.len());

    section("Stage 2: Memories by category");
    for category in MemoryCategory::ALL {
        let memories = store.query_memory(&MemoryQuery::default().category(category))?;
        if memories.is_empty() {
            continue;
        }
        println!("{}", category.to_string().yellow());
        for (i, memory) in memories.iter().enumerate() {
            print_memory(i + 1, memory);
        }
    }

    section("Stage 3: Retrieval");
    for query in ["optimize performance cache", "neural network deep learning"] {
        println!("Keyword search: {}", query.italic());
        for (i, memory) in store.search_similar(query, None, 5).iter().enumerate() {
            print_brief(i + 1, memory);
        }
    }
    println!("High-importance memories (>= 0.9):");
    let important = store.query_memory(&MemoryQuery::default().min_importance(0.9))?;
    for (i, memory) in important.iter().enumerate() {
        print_brief(i + 1, memory);
    }

    section("Stage 4: Experiment deduplication");
    let first = store.record_experiment(
        "BERT for text classification",
        Some("fine-tuning with learning rate 2e-5"),
    );
    println!("  Recorded {}", first[..16].dimmed());
    let second = store.record_experiment(
        "GPT for text generation",
        Some("few-shot with 5 examples"),
    );
    println!("  Recorded {}", second[..16].dimmed());

    let checks = [
        ("BERT for text classification", "fine-tuning with learning rate 2e-5"),
        ("RoBERTa for text classification", "fine-tuning with learning rate 1e-5"),
    ];
    for (hypothesis, protocol) in checks {
        let (duplicate, reason) = store.is_duplicate_experiment(hypothesis, Some(protocol));
        if duplicate {
            println!("  {} {}: {}", "✗".red(), hypothesis, reason.unwrap_or_default());
        } else {
            println!("  {} {}: new experiment", "✓".green(), hypothesis);
        }
    }

    section("Stage 5: Avoiding repeated mistakes");
    let warnings: Vec<Memory> = store
        .search_similar("large dataset memory", None, 3)
        .into_iter()
        .filter(|m| m.category == MemoryCategory::FailurePattern)
        .collect();
    if warnings.is_empty() {
        println!("  No related failures");
    }
    for memory in &warnings {
        let lesson = memory
            .data
            .get("lesson")
            .and_then(|v| v.as_str())
            .unwrap_or("N/A");
        println!("  {} Known failure, lesson: {}", "!".yellow(), lesson);
    }

    let related = store.query_memory(
        &MemoryQuery::default()
            .tags(["performance", "optimization"])
            .limit(5),
    )?;
    println!("Related performance experience:");
    for memory in &related {
        let marker = match memory.category {
            MemoryCategory::SuccessPattern => "✓".green(),
            _ => "✗".red(),
        };
        println!("  {} {}", marker, memory.content.replace('\n', " / "));
    }

    section("Stage 6: Statistics");
    let stats = store.get_stats();
    println!("  Total memories:        {}", stats.total_memories);
    println!("  Capacity:              {}", stats.max_memories);
    println!("  Experiment signatures: {}", stats.experiment_signatures);
    println!("  Prune after:           {} days", stats.prune_after_days);
    for (category, count) in &stats.by_category {
        println!("    {}: {}", category, count);
    }

    section("Stage 7: Access tracking");
    let insights = MemoryQuery::default().category(MemoryCategory::Insight);
    for _ in 0..3 {
        store.query_memory(&insights.clone().limit(1))?;
    }
    let mut accessed = store.query_memory(&insights)?;
    accessed.sort_by(|a, b| b.access_count.cmp(&a.access_count));
    for memory in accessed.iter().take(3) {
        println!(
            "  {} (accessed {}, last {})",
            memory.content,
            memory.access_count,
            memory.last_accessed.format("%H:%M:%S")
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use evomem_core::MemoryConfig;

    #[test]
    fn test_seed_populates_every_kind() {
        let mut store = LearningMemoryStore::new(MemoryConfig::default());
        let seeded = seed(&mut store);

        assert_eq!(seeded.success.len(), 3);
        assert_eq!(seeded.failure.len(), 2);
        assert_eq!(seeded.dead_end.len(), 2);
        assert_eq!(seeded.insight.len(), 3);
        assert_eq!(store.len(), 10);
    }

    #[test]
    fn test_seeded_searches_find_expected_memories() {
        let mut store = LearningMemoryStore::new(MemoryConfig::default());
        seed(&mut store);

        let cache = store.search_similar("optimize performance cache", None, 5);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache[0].content, "Cache repeated computations");

        let failures = store.search_similar("large dataset memory", None, 3);
        assert!(failures
            .iter()
            .any(|m| m.category == MemoryCategory::FailurePattern));
    }

    #[test]
    fn test_demo_runs() {
        execute(&Config::default()).unwrap();
    }
}
