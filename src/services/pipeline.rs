//! Question-answering pipeline: retrieve, then synthesize, per question.

use super::{AnswerSynthesizer, RetrievalOrchestrator};
use crate::config::RetrievalConfig;
use crate::models::{ProcessedQuestion, ProcessedResults, QuestionRecord};
use crate::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::instrument;

/// Runs every question through retrieval and synthesis, in input order.
///
/// `cancel` is checked between questions; a raised flag stops the run with
/// [`Error::Cancelled`].
///
/// # Errors
///
/// Returns an error if the memory store cannot be read or the run is
/// cancelled.
#[instrument(name = "pipeline.process", skip_all, fields(questions = questions.len()))]
pub fn process_questions(
    orchestrator: &RetrievalOrchestrator,
    synthesizer: &AnswerSynthesizer,
    questions: &[QuestionRecord],
    limits: RetrievalConfig,
    cancel: Option<&AtomicBool>,
) -> Result<ProcessedResults> {
    let mut results = ProcessedResults::default();

    for (position, record) in questions.iter().enumerate() {
        if cancel.is_some_and(|flag| flag.load(Ordering::SeqCst)) {
            tracing::warn!(
                processed = position,
                total = questions.len(),
                "Pipeline cancelled"
            );
            return Err(Error::Cancelled);
        }

        let retrieved = orchestrator.retrieve(
            &record.question,
            limits.coverage_limit,
            limits.final_limit,
        )?;
        let generated_answer = synthesizer.synthesize(&record.question, &retrieved);

        results.push(ProcessedQuestion {
            question: record.question.clone(),
            ground_truth: record.ground_truth.clone(),
            category: record.category,
            generated_answer,
            retrieved_memories: retrieved.len(),
        });
        metrics::counter!("pipeline_questions_total").increment(1);
    }

    tracing::info!(processed = results.questions_processed, "Pipeline complete");
    Ok(results)
}
