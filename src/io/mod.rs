//! File I/O for pipeline inputs and evaluation artifacts.
//!
//! - [`load_question_records`] and [`load_results_records`]: questions and results files
//! - [`ReportArtifact`]: the judged report document
//! - [`write_json_atomic`]: temp file + rename for every artifact written

mod artifact;
mod report;
mod results;

pub use artifact::write_json_atomic;
pub use report::{
    CategoryBreakdown, JUDGE_PROMPT_NAME, JUDGED_SUFFIX, NamedCategoryBreakdown, ReportArtifact,
    default_output_path, describe_filter,
};
pub use results::{
    load_question_records, load_results_records, parse_question_records, parse_results_records,
};
