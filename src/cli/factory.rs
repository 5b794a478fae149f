//! Service factory functions for CLI commands.
//!
//! Builds the retrieval stack, answer generator and judge from configuration.
//! Every configuration problem surfaces here, before any question is touched.

use crate::config::VacConfig;
use crate::embedding::default_embedder;
use crate::llm::{LlmHttpConfig, LlmProvider, OpenAiClient};
use crate::services::{AnswerSynthesizer, JudgeClient, RetrievalOrchestrator, VectorReranker};
use crate::storage::SqliteMemoryStore;
use crate::{Error, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Builds the retrieval orchestrator over the configured artifacts.
///
/// # Errors
///
/// Returns [`Error::Configuration`] if the database cannot be opened, the
/// index is required but unreadable, or the index does not match the
/// configured or embedder dimensionality.
pub fn build_orchestrator(config: &VacConfig) -> Result<RetrievalOrchestrator> {
    let storage = &config.storage;
    let store = SqliteMemoryStore::open(&storage.db_path)?;

    let reranker = if storage.require_vector_index {
        VectorReranker::load_required(
            &storage.index_path,
            &storage.idmap_path,
            storage.embedding_dimensions,
        )?
    } else {
        VectorReranker::load(
            &storage.index_path,
            &storage.idmap_path,
            storage.embedding_dimensions,
        )?
    };

    RetrievalOrchestrator::new(Arc::new(store), reranker, default_embedder())
}

/// Builds the `OpenAI` answer generator.
///
/// # Errors
///
/// Returns [`Error::Configuration`] if no API key is configured.
pub fn build_generator(config: &VacConfig) -> Result<Arc<dyn LlmProvider>> {
    let judge = &config.judge;
    let api_key = judge.api_key.clone().ok_or_else(|| {
        Error::Configuration("answer generation needs OPENAI_API_KEY".to_string())
    })?;

    let client = OpenAiClient::new()
        .with_api_key(api_key)
        .with_endpoint(judge.endpoint.clone())
        .with_model(judge.model.clone())
        .with_temperature(0.0)
        .with_max_tokens(config.synthesis.max_tokens)
        .with_http_config(LlmHttpConfig::from_config(judge));
    Ok(Arc::new(client))
}

/// Builds the answer synthesizer, generative when `generate` is set.
///
/// # Errors
///
/// Returns [`Error::Configuration`] if generation is requested without an
/// API key.
pub fn build_synthesizer(config: &VacConfig, generate: bool) -> Result<AnswerSynthesizer> {
    let synthesizer = AnswerSynthesizer::new(config.synthesis);
    if generate {
        Ok(synthesizer.with_generator(build_generator(config)?))
    } else {
        Ok(synthesizer)
    }
}

/// Builds the judge client.
///
/// # Errors
///
/// Returns [`Error::Configuration`] if no API key is configured.
pub fn build_judge(config: &VacConfig) -> Result<JudgeClient> {
    JudgeClient::from_config(&config.judge)
}

/// Installs a Ctrl-C handler that raises the returned flag.
///
/// A second handler cannot be installed in the same process; in that case
/// the flag simply never rises.
#[must_use]
pub fn install_cancel_flag() -> Arc<AtomicBool> {
    let flag = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&flag);
    if let Err(e) = ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::SeqCst);
        tracing::warn!("Interrupt received, stopping after the current question");
    }) {
        tracing::warn!(error = %e, "Could not install Ctrl-C handler");
    }
    flag
}
