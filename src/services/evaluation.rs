//! Judge-based evaluation: run the judge over a results file and aggregate.

use super::JudgeClient;
use crate::models::{
    CategoryId, CategoryStats, EvaluationReport, JudgeFailure, JudgeOutcome, JudgedItem,
    QuestionRecord, ratio,
};
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;
use tracing::instrument;

/// Folds judge outcomes into an [`EvaluationReport`].
#[derive(Debug, Clone, Copy, Default)]
pub struct EvaluationAggregator;

impl EvaluationAggregator {
    /// Aggregates outcomes, keeping their order.
    ///
    /// Failed judge calls are listed separately and never counted towards
    /// accuracy. Category buckets exist only for categories that were judged.
    #[must_use]
    pub fn aggregate(outcomes: impl IntoIterator<Item = JudgeOutcome>) -> EvaluationReport {
        let mut categories: BTreeMap<CategoryId, CategoryStats> = BTreeMap::new();
        let mut items = Vec::new();
        let mut failures = Vec::new();

        for outcome in outcomes {
            match outcome {
                JudgeOutcome::Judged { record, verdict } => {
                    let stats = categories
                        .entry(record.category)
                        .or_insert_with(|| CategoryStats {
                            category_id: record.category,
                            ..CategoryStats::default()
                        });
                    stats.total += 1;
                    if verdict.is_correct() {
                        stats.correct += 1;
                    }
                    items.push(JudgedItem::new(record, verdict));
                },
                JudgeOutcome::Failed { record, error } => failures.push(JudgeFailure {
                    question: record.question,
                    category: record.category,
                    error,
                }),
            }
        }

        let total = items.len();
        let correct = items.iter().filter(|item| item.judge_score == 1).count();

        EvaluationReport {
            accuracy: ratio(correct, total),
            correct,
            total,
            categories,
            items,
            failures,
        }
    }
}

/// Splits records into those in `categories` and the number skipped.
#[must_use]
pub fn select_categories(
    records: Vec<QuestionRecord>,
    categories: &[CategoryId],
) -> (Vec<QuestionRecord>, usize) {
    let before = records.len();
    let selected: Vec<_> = records
        .into_iter()
        .filter(|r| categories.contains(&r.category))
        .collect();
    let skipped = before - selected.len();
    (selected, skipped)
}

/// Result of an evaluation run.
#[derive(Debug, Clone)]
pub struct EvaluationRun {
    /// Aggregated report over the judged questions.
    pub report: EvaluationReport,
    /// Questions left out by the category filter.
    pub skipped: usize,
}

/// Judges a batch of questions, sequentially or with a bounded worker pool.
///
/// Retry state is local to each question. Outcomes are put back in input
/// order before aggregation, whatever order the workers finish in.
pub struct EvaluationRunner {
    judge: JudgeClient,
    categories: Vec<CategoryId>,
    concurrency: usize,
    cancel: Arc<AtomicBool>,
}

impl EvaluationRunner {
    /// Creates a sequential runner judging categories 1 to 4.
    #[must_use]
    pub fn new(judge: JudgeClient) -> Self {
        Self {
            judge,
            categories: (1..=4).map(CategoryId).collect(),
            concurrency: 1,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Sets the judged categories.
    #[must_use]
    pub fn with_categories(mut self, categories: Vec<CategoryId>) -> Self {
        self.categories = categories;
        self
    }

    /// Sets the number of worker threads (at least 1).
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Shares a flag that stops the run before the next question starts.
    #[must_use]
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    /// The judge in use.
    #[must_use]
    pub const fn judge(&self) -> &JudgeClient {
        &self.judge
    }

    /// Judged categories.
    #[must_use]
    pub fn categories(&self) -> &[CategoryId] {
        &self.categories
    }

    /// Filters, judges and aggregates `records`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] if the cancel flag was raised before every
    /// selected question was judged.
    #[instrument(
        name = "evaluation.run",
        skip_all,
        fields(records = records.len(), concurrency = self.concurrency)
    )]
    pub fn run(&self, records: Vec<QuestionRecord>) -> Result<EvaluationRun> {
        let (selected, skipped) = select_categories(records, &self.categories);
        tracing::info!(selected = selected.len(), skipped, "Judging questions");

        let start = Instant::now();
        let slots = if self.concurrency > 1 && selected.len() > 1 {
            self.judge_parallel(&selected)
        } else {
            self.judge_sequential(&selected)
        };

        let finished = slots.iter().filter(|slot| slot.is_some()).count();
        if finished < selected.len() && self.is_cancelled() {
            tracing::warn!(finished, total = selected.len(), "Evaluation cancelled");
            return Err(Error::Cancelled);
        }

        let outcomes = slots.into_iter().zip(selected).map(|(slot, record)| {
            slot.unwrap_or_else(|| JudgeOutcome::Failed {
                record,
                error: "judge worker terminated unexpectedly".to_string(),
            })
        });
        let report = EvaluationAggregator::aggregate(outcomes);

        metrics::histogram!("evaluation_duration_ms")
            .record(start.elapsed().as_secs_f64() * 1000.0);
        tracing::info!(
            correct = report.correct,
            total = report.total,
            failures = report.failures.len(),
            "Evaluation complete"
        );

        Ok(EvaluationRun { report, skipped })
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    fn judge_one(&self, record: &QuestionRecord) -> JudgeOutcome {
        match self
            .judge
            .judge(&record.question, &record.ground_truth, &record.generated_answer)
        {
            Ok(verdict) => JudgeOutcome::Judged {
                record: record.clone(),
                verdict,
            },
            Err(e) => JudgeOutcome::Failed {
                record: record.clone(),
                error: e.to_string(),
            },
        }
    }

    fn judge_sequential(&self, records: &[QuestionRecord]) -> Vec<Option<JudgeOutcome>> {
        let mut slots: Vec<Option<JudgeOutcome>> = Vec::with_capacity(records.len());
        for (position, record) in records.iter().enumerate() {
            if self.is_cancelled() {
                break;
            }
            slots.push(Some(self.judge_one(record)));
            tracing::debug!(done = position + 1, total = records.len(), "Judged question");
        }
        slots.resize_with(records.len(), || None);
        slots
    }

    fn judge_parallel(&self, records: &[QuestionRecord]) -> Vec<Option<JudgeOutcome>> {
        let workers = self.concurrency.min(records.len());
        let next = AtomicUsize::new(0);
        let mut slots: Vec<Option<JudgeOutcome>> = Vec::new();
        slots.resize_with(records.len(), || None);

        std::thread::scope(|s| {
            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    s.spawn(|| {
                        let mut done = Vec::new();
                        while !self.is_cancelled() {
                            let position = next.fetch_add(1, Ordering::SeqCst);
                            let Some(record) = records.get(position) else {
                                break;
                            };
                            done.push((position, self.judge_one(record)));
                        }
                        done
                    })
                })
                .collect();

            for handle in handles {
                match handle.join() {
                    Ok(done) => {
                        for (position, outcome) in done {
                            if let Some(slot) = slots.get_mut(position) {
                                *slot = Some(outcome);
                            }
                        }
                    },
                    Err(_) => tracing::error!("Judge worker panicked"),
                }
            }
        });

        slots
    }
}
