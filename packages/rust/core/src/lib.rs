//! Batch orchestration and post assembly for autopress.
//!
//! This crate ties the input rows, the text generator and the CMS client
//! together into one end-to-end run ([`pipeline::run_batch`]).

pub mod assembler;
pub mod instruction;
pub mod pipeline;

pub use assembler::{FALLBACK_CATEGORY, PostAssembler, split_article, split_names};
pub use instruction::{TITLE_RULES, decorate_instruction, load_system_instruction};
pub use pipeline::{
    BatchConfig, FailureStage, ItemOutcome, PostJob, ProgressReporter, RunReport, SilentProgress,
    run_batch,
};
