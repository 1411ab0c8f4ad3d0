// Production-quality lints
#![warn(
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
// Deny truly dangerous patterns
#![deny(clippy::mem_forget)]
// Allow common patterns in library code
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! # fireclass: staged fire-safety classification
//!
//! Classifies a building project by evaluating externally authored decision
//! tables against its attributes, one stage at a time:
//!
//! ```text
//! use category ──► risk class ──► relevant annex (optional) ──► fire class
//! ```
//!
//! ## Core Concept
//!
//! A **decision table** maps input conditions to outputs. Each rule cell
//! holds a small condition language:
//!
//! | Cell             | Meaning                                    |
//! |------------------|--------------------------------------------|
//! | *(empty)*        | field unconstrained                        |
//! | `<= 100`         | numeric comparison                         |
//! | `2, 3, 4`        | numeric set                                |
//! | `"office"`       | case-insensitive text equality             |
//! | `"1a", "1b"`     | option list, quote-aware, alias-normalized |
//!
//! Beyond matching, the engine reasons about partial input:
//!
//! - **Near-miss diagnostics**: which missing fields would most likely
//!   produce a match ([`diagnose_missing_inputs`])
//! - **Candidates**: which outputs are still reachable
//!   ([`enumerate_candidates`])
//! - **Suggestions**: what would have to change to reach a strictly lower
//!   (better) output ([`suggest_better`])
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fireclass::{evaluate_complete, Context, EngineConfig, ModelLoader, Stage};
//! use std::sync::Arc;
//!
//! let config = EngineConfig::default();
//! let loader = ModelLoader::new("model.json", Arc::new(config.aliases.clone()));
//! let snapshot = loader.snapshot()?;
//!
//! let context = Context::new()
//!     .with("bygningstype", "kontor")
//!     .with("etagehoejde", 9.5);
//!
//! let result = evaluate_complete(&snapshot.model, &config, &context);
//! if let Some(fire_class) = result.value(Stage::FireClass) {
//!     tracing::info!(%fire_class, "classified");
//! }
//! # Ok::<(), fireclass::Error>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                                                              │
//! │  ModelLoader ──► Arc<ModelSnapshot> ──► DecisionModel        │
//! │                                             │                │
//! │  Flow (stages from EngineConfig)            │                │
//! │       │                                     ▼                │
//! │       ├──► evaluate(table, context) ──► MatchResult          │
//! │       │         └──► matches(value, condition)               │
//! │       │                                                      │
//! │       └──► on miss:                                          │
//! │             ├──► diagnose_missing_inputs ──► FieldHint       │
//! │             ├──► enumerate_candidates ──► Candidate          │
//! │             └──► suggest_better ──► Suggestion               │
//! │                                                              │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Tables are compiled once (every condition parsed up front) and never
//! mutated afterwards. Evaluation is synchronous and side-effect free; only
//! the loader touches the filesystem.

// Data model
pub mod alias;
pub mod condition;
pub mod error;
pub mod table;
pub mod util;
pub mod value;

// Evaluation
pub mod candidates;
pub mod diagnose;
pub mod evaluate;
pub mod matcher;
pub mod optimize;

// Orchestration
pub mod explain;
pub mod flow;
pub mod requirements;

// Configuration and loading
pub mod config;
pub mod loader;

// Re-exports
pub use alias::{AliasEntry, AliasTable};
pub use candidates::{enumerate_candidates, Candidate};
pub use condition::{CompareOp, Condition, ConditionExpr};
pub use config::{
    ConfigIssue, DiagnosticsConfig, EngineConfig, InputAlias, Severity, StageConfig, ValueKind,
};
pub use diagnose::{diagnose_missing_inputs, FieldHint};
pub use error::{Error, Result};
pub use evaluate::{evaluate, evaluate_all, evaluate_first, Evaluation, MatchResult};
pub use explain::{explain, Explanation, StageExplanation};
pub use flow::{
    evaluate_basic, evaluate_complete, normalize_inputs, Flow, FlowResult, Stage, StageResult,
    StageStatus, StageValue,
};
pub use loader::{ModelLoader, ModelSnapshot};
pub use matcher::{matches, matches_field};
pub use optimize::{
    suggest_better, Direction, NumericAdjustment, RequiredField, ScoreWeights, SuggestOptions,
    Suggestion,
};
pub use requirements::{evaluate_requirements, RequirementsResult};
pub use table::{
    Column, DecisionModel, DecisionTable, HitPolicy, Rule, TableDocument,
};
pub use value::{Context, Value};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
