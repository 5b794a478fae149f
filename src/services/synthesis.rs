//! Answer synthesis from retrieved memories.

use crate::config::SynthesisConfig;
use crate::llm::LlmProvider;
use crate::models::RetrievedMemory;
use std::sync::Arc;
use tracing::instrument;

/// Answer returned when retrieval found nothing.
pub const NO_INFORMATION_ANSWER: &str = "No relevant information found.";

/// Builds answers from retrieved memories.
///
/// With a generator attached, the question and the (bounded) context are sent
/// to it. Without one, or when generation fails, the answer is an extractive
/// summary echoing the start of the context.
pub struct AnswerSynthesizer {
    config: SynthesisConfig,
    generator: Option<Arc<dyn LlmProvider>>,
}

impl AnswerSynthesizer {
    /// Creates an extractive synthesizer.
    #[must_use]
    pub const fn new(config: SynthesisConfig) -> Self {
        Self {
            config,
            generator: None,
        }
    }

    /// Attaches an answer generator.
    #[must_use]
    pub fn with_generator(mut self, generator: Arc<dyn LlmProvider>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Returns true when answers come from a generator.
    #[must_use]
    pub const fn is_generative(&self) -> bool {
        self.generator.is_some()
    }

    /// Renders memories as `- {content}` lines.
    #[must_use]
    pub fn build_context(retrieved: &[RetrievedMemory]) -> String {
        retrieved
            .iter()
            .map(|m| format!("- {}", m.content))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Produces an answer for `question`.
    #[instrument(name = "synthesis.synthesize", skip_all, fields(memories = retrieved.len()))]
    pub fn synthesize(&self, question: &str, retrieved: &[RetrievedMemory]) -> String {
        if retrieved.is_empty() {
            return NO_INFORMATION_ANSWER.to_string();
        }

        let context = Self::build_context(retrieved);

        if let Some(generator) = &self.generator {
            let prompt = generation_prompt(
                question,
                truncate_chars(&context, self.config.context_char_limit),
            );
            match generator.complete(&prompt) {
                Ok(answer) => {
                    metrics::counter!("synthesis_answers_total", "mode" => "generated")
                        .increment(1);
                    return answer.trim().to_string();
                },
                Err(e) => {
                    tracing::warn!(
                        provider = generator.name(),
                        error = %e,
                        "Answer generation failed, using extractive summary"
                    );
                    metrics::counter!("synthesis_generation_failures_total").increment(1);
                },
            }
        }

        metrics::counter!("synthesis_answers_total", "mode" => "extractive").increment(1);
        format!(
            "Based on {} memories: {}...",
            retrieved.len(),
            truncate_chars(&context, self.config.summary_prefix_chars)
        )
    }
}

impl Default for AnswerSynthesizer {
    fn default() -> Self {
        Self::new(SynthesisConfig::default())
    }
}

fn generation_prompt(question: &str, context: &str) -> String {
    format!(
        "Based on the following information, answer the question:\n\n\
         Question: {question}\n\n\
         Information:\n{context}\n\n\
         Answer:"
    )
}

/// Returns at most `max_chars` Unicode scalar values of `text`.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    text.char_indices()
        .nth(max_chars)
        .map_or(text, |(byte_index, _)| &text[..byte_index])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MemoryId;
    use crate::{Error, Result};
    use std::sync::Mutex;

    fn retrieved(contents: &[&str]) -> Vec<RetrievedMemory> {
        contents
            .iter()
            .zip(1_i64..)
            .map(|(c, id)| RetrievedMemory {
                id: MemoryId::new(id),
                content: (*c).to_string(),
                score: 0.0,
            })
            .collect()
    }

    /// Records prompts and replies with a canned answer or error.
    struct ScriptedGenerator {
        reply: Option<String>,
        prompts: Mutex<Vec<String>>,
    }

    impl LlmProvider for ScriptedGenerator {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn complete(&self, prompt: &str) -> Result<String> {
            if let Ok(mut prompts) = self.prompts.lock() {
                prompts.push(prompt.to_string());
            }
            self.reply
                .clone()
                .ok_or_else(|| Error::operation("complete", "service unavailable"))
        }
    }

    #[test]
    fn test_empty_retrieval_returns_sentinel() {
        let answer = AnswerSynthesizer::default().synthesize("Where?", &[]);
        assert_eq!(answer, "No relevant information found.");
    }

    #[test]
    fn test_context_lines() {
        let context = AnswerSynthesizer::build_context(&retrieved(&["a", "b"]));
        assert_eq!(context, "- a\n- b");
    }

    #[test]
    fn test_extractive_summary() {
        let answer =
            AnswerSynthesizer::default().synthesize("Q", &retrieved(&["Alice likes pizza"]));
        assert_eq!(answer, "Based on 1 memories: - Alice likes pizza...");
    }

    #[test]
    fn test_extractive_summary_truncates_by_chars() {
        let long = "é".repeat(300);
        let answer = AnswerSynthesizer::default().synthesize("Q", &retrieved(&[&long]));
        let prefix: String = format!("- {long}").chars().take(200).collect();
        assert_eq!(answer, format!("Based on 1 memories: {prefix}..."));
    }

    #[test]
    fn test_generator_receives_prompt() {
        let generator = Arc::new(ScriptedGenerator {
            reply: Some(" Hawaii \n".to_string()),
            prompts: Mutex::new(Vec::new()),
        });
        let synthesizer = AnswerSynthesizer::default().with_generator(generator.clone());
        assert!(synthesizer.is_generative());

        let answer = synthesizer.synthesize("Where did Melanie go?", &retrieved(&["Hawaii trip"]));
        assert_eq!(answer, "Hawaii");

        let prompts = generator.prompts.lock().expect("lock");
        assert_eq!(
            prompts[0],
            "Based on the following information, answer the question:\n\n\
             Question: Where did Melanie go?\n\n\
             Information:\n- Hawaii trip\n\n\
             Answer:"
        );
    }

    #[test]
    fn test_generation_context_is_bounded() {
        let generator = Arc::new(ScriptedGenerator {
            reply: Some("ok".to_string()),
            prompts: Mutex::new(Vec::new()),
        });
        let config = SynthesisConfig {
            context_char_limit: 5,
            ..SynthesisConfig::default()
        };
        let synthesizer = AnswerSynthesizer::new(config).with_generator(generator.clone());
        synthesizer.synthesize("Q", &retrieved(&["abcdefgh"]));

        let prompts = generator.prompts.lock().expect("lock");
        assert!(prompts[0].contains("Information:\n- abc\n\nAnswer:"));
    }

    #[test]
    fn test_generation_failure_falls_back() {
        let generator = Arc::new(ScriptedGenerator {
            reply: None,
            prompts: Mutex::new(Vec::new()),
        });
        let synthesizer = AnswerSynthesizer::default().with_generator(generator);
        let answer = synthesizer.synthesize("Q", &retrieved(&["x"]));
        assert_eq!(answer, "Based on 1 memories: - x...");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 10), "hi");
        assert_eq!(truncate_chars("hi", 0), "");
    }
}
