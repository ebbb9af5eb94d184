//! Learning memory: what the agent tried, what worked, what failed.
//!
//! Memories are grouped by category and ranked by recency-decayed importance:
//!
//! ```text
//! score = importance / (days_since_created + 1)
//! ```
//!
//! The store also keeps an index of experiment fingerprints so an agent can
//! check whether a hypothesis/protocol pair was already run.
//!
//! ## Usage
//!
//! ```
//! use evomem_core::config::MemoryConfig;
//! use evomem_core::learning::{LearningMemoryStore, MemoryQuery};
//!
//! let mut store = LearningMemoryStore::new(MemoryConfig::default());
//! store.add_dead_end("linear fit", "relationship is nonlinear", vec![]);
//!
//! let top = store.query_memory(&MemoryQuery::default().min_importance(0.9)).unwrap();
//! assert_eq!(top.len(), 1);
//!
//! store.record_experiment("BERT for classification", Some("lr=2e-5"));
//! assert!(store.is_duplicate_experiment("BERT for classification", Some("lr=2e-5")).0);
//! ```

mod store;
mod types;

pub use store::LearningMemoryStore;
pub use types::{
    ExperimentFingerprint, Memory, MemoryCategory, MemoryData, MemoryQuery, MemoryStats,
};
