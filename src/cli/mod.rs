//! CLI command implementations.
//!
//! Each submodule implements one `vacmem` command. Commands write their
//! human-facing output to stdout; logs go to stderr.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `retrieve` | Run two-stage retrieval for a single query |
//! | `answer` | Retrieve and synthesize answers for a questions file |
//! | `evaluate` | Judge a results file and write the accuracy report |
//! | `categories` | Print the question category labels |
//!
//! # Example Usage
//!
//! ```bash
//! # Inspect retrieval for one query
//! vacmem retrieve "Does Alice like pizza?" --final-limit 5
//!
//! # Answer a question set, then judge it
//! vacmem answer data/questions.json -o results/run.json
//! vacmem evaluate results/run.json --concurrency 4
//! ```
//!
//! # Service Factory
//!
//! The `factory` submodule builds the retrieval stack, answer generator and
//! judge from configuration. All configuration errors surface there, before
//! any question is processed.

mod answer;
mod categories;
mod evaluate;
mod factory;
mod retrieve;

pub use answer::{ANSWERS_SUFFIX, cmd_answer, default_answers_path};
pub use categories::{cmd_categories, write_categories};
pub use evaluate::{cmd_evaluate, write_summary};
pub use factory::{
    build_generator, build_judge, build_orchestrator, build_synthesizer, install_cancel_flag,
};
pub use retrieve::{RetrieveArgs, RetrieveOutputFormat, cmd_retrieve};
