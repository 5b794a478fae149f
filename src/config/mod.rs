//! Configuration management.
//!
//! Precedence, lowest first: built-in defaults, the TOML config file, then
//! `VACMEM_*` environment variables. A `.env` file in the working directory is
//! loaded first so `OPENAI_API_KEY` can live next to the data.

use crate::models::CategoryId;
use crate::observability::LogFormat;
use crate::{Error, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration for vacmem.
#[derive(Debug, Clone, Default)]
pub struct VacConfig {
    /// Storage artifact locations.
    pub storage: StorageConfig,
    /// Retrieval limits.
    pub retrieval: RetrievalConfig,
    /// Answer synthesis settings.
    pub synthesis: SynthesisConfig,
    /// Judge client settings.
    pub judge: JudgeConfig,
    /// Logging and metrics.
    pub observability: ObservabilitySettings,
}

/// Storage artifact locations.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// `SQLite` database holding the `memories` table.
    pub db_path: PathBuf,
    /// Vector index artifact.
    pub index_path: PathBuf,
    /// Id-map artifact (JSON array of memory ids).
    pub idmap_path: PathBuf,
    /// Embedding dimensionality the index was built with.
    pub embedding_dimensions: usize,
    /// Fail at startup instead of degrading when the index cannot be loaded.
    pub require_vector_index: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("data/memories.db"),
            index_path: PathBuf::from("data/memories.index.json"),
            idmap_path: PathBuf::from("data/memories.idmap.json"),
            embedding_dimensions: crate::embedding::DEFAULT_DIMENSIONS,
            require_vector_index: false,
        }
    }
}

/// Retrieval limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrievalConfig {
    /// Candidates kept by the coverage filter.
    pub coverage_limit: usize,
    /// Memories returned to the caller.
    pub final_limit: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            coverage_limit: 50,
            final_limit: 15,
        }
    }
}

/// Answer synthesis settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynthesisConfig {
    /// Maximum characters of context sent to the generator.
    pub context_char_limit: usize,
    /// Characters of context echoed by the extractive summary.
    pub summary_prefix_chars: usize,
    /// Completion token limit for generation.
    pub max_tokens: u32,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            context_char_limit: 4000,
            summary_prefix_chars: 200,
            max_tokens: 150,
        }
    }
}

/// Judge client settings.
#[derive(Debug, Clone)]
pub struct JudgeConfig {
    /// OpenAI-compatible API base URL.
    pub endpoint: String,
    /// Judge model.
    pub model: String,
    /// API key.
    pub api_key: Option<SecretString>,
    /// Per-attempt request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// Total attempts per question.
    pub max_attempts: u32,
    /// One backoff unit in milliseconds.
    pub backoff_unit_ms: u64,
    /// Worker threads judging questions in parallel.
    pub concurrency: usize,
    /// Categories that are judged; others are skipped.
    pub categories: Vec<CategoryId>,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            endpoint: crate::llm::OpenAiClient::DEFAULT_ENDPOINT.to_string(),
            model: crate::llm::OpenAiClient::DEFAULT_MODEL.to_string(),
            api_key: None,
            timeout_ms: 30_000,
            connect_timeout_ms: 3_000,
            max_attempts: 4,
            backoff_unit_ms: 1_000,
            concurrency: 1,
            categories: (1..=4).map(CategoryId).collect(),
        }
    }
}

/// Logging and metrics settings.
#[derive(Debug, Clone, Default)]
pub struct ObservabilitySettings {
    /// Log output format.
    pub log_format: LogFormat,
    /// Optional log file; stderr when unset.
    pub log_file: Option<PathBuf>,
    /// `EnvFilter` directive overriding the default level.
    pub log_filter: Option<String>,
    /// Install the Prometheus recorder.
    pub metrics_enabled: bool,
    /// Port for the Prometheus HTTP listener.
    pub metrics_port: Option<u16>,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Storage section.
    pub storage: Option<ConfigFileStorage>,
    /// Retrieval section.
    pub retrieval: Option<ConfigFileRetrieval>,
    /// Synthesis section.
    pub synthesis: Option<ConfigFileSynthesis>,
    /// Judge section.
    pub judge: Option<ConfigFileJudge>,
    /// Observability section.
    pub observability: Option<ConfigFileObservability>,
}

/// Storage section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileStorage {
    /// Database path.
    pub db_path: Option<String>,
    /// Vector index path.
    pub index_path: Option<String>,
    /// Id-map path.
    pub idmap_path: Option<String>,
    /// Embedding dimensions.
    pub embedding_dimensions: Option<usize>,
    /// Require the vector index.
    pub require_vector_index: Option<bool>,
}

/// Retrieval section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileRetrieval {
    /// Coverage filter limit.
    pub coverage_limit: Option<usize>,
    /// Final result limit.
    pub final_limit: Option<usize>,
}

/// Synthesis section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileSynthesis {
    /// Context character limit.
    pub context_char_limit: Option<usize>,
    /// Summary prefix length.
    pub summary_prefix_chars: Option<usize>,
    /// Generation token limit.
    pub max_tokens: Option<u32>,
}

/// Judge section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileJudge {
    /// API base URL.
    pub endpoint: Option<String>,
    /// Model name.
    pub model: Option<String>,
    /// API key.
    pub api_key: Option<String>,
    /// Request timeout.
    pub timeout_ms: Option<u64>,
    /// Connect timeout.
    pub connect_timeout_ms: Option<u64>,
    /// Attempts per question.
    pub max_attempts: Option<u32>,
    /// Backoff unit.
    pub backoff_unit_ms: Option<u64>,
    /// Worker threads.
    pub concurrency: Option<usize>,
    /// Judged categories.
    pub categories: Option<Vec<i64>>,
}

/// Observability section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileObservability {
    /// `pretty` or `json`.
    pub log_format: Option<String>,
    /// Log file path.
    pub log_file: Option<String>,
    /// Filter directive.
    pub log_filter: Option<String>,
    /// Metrics toggle.
    pub metrics_enabled: Option<bool>,
    /// Metrics port.
    pub metrics_port: Option<u16>,
}

impl VacConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the full configuration: `.env`, config file, environment.
    ///
    /// An explicit `path` must exist and parse; without one the default
    /// locations are tried and silently skipped when absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the file cannot be read or parsed,
    /// or if the resulting values are invalid.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(env_path) => tracing::debug!(path = %env_path.display(), "Loaded .env file"),
            Err(e) if e.not_found() => {},
            Err(e) => tracing::warn!(error = %e, "Ignoring unreadable .env file"),
        }

        let config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::load_default()?,
        };
        let config = config.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("cannot read config file {}: {e}", path.display()))
        })?;
        Self::from_toml(&contents)
            .map_err(|e| Error::Configuration(format!("{}: {e}", path.display())))
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the text is not valid config TOML.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(contents)
            .map_err(|e| Error::Configuration(format!("invalid config file: {e}")))?;
        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from the default location.
    ///
    /// Checks `./vacmem.toml`, then the platform config dir
    /// (`~/.config/vacmem/config.toml` on Linux). Returns defaults when
    /// neither exists.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed.
    pub fn load_default() -> Result<Self> {
        let local = PathBuf::from("vacmem.toml");
        if local.exists() {
            return Self::load_from_file(&local);
        }

        if let Some(dirs) = directories::ProjectDirs::from("", "", "vacmem") {
            let platform_config = dirs.config_dir().join("config.toml");
            if platform_config.exists() {
                return Self::load_from_file(&platform_config);
            }
        }

        Ok(Self::default())
    }

    /// Converts a `ConfigFile` to `VacConfig`.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(storage) = file.storage {
            if let Some(v) = storage.db_path {
                config.storage.db_path = PathBuf::from(v);
            }
            if let Some(v) = storage.index_path {
                config.storage.index_path = PathBuf::from(v);
            }
            if let Some(v) = storage.idmap_path {
                config.storage.idmap_path = PathBuf::from(v);
            }
            if let Some(v) = storage.embedding_dimensions {
                config.storage.embedding_dimensions = v;
            }
            if let Some(v) = storage.require_vector_index {
                config.storage.require_vector_index = v;
            }
        }
        if let Some(retrieval) = file.retrieval {
            if let Some(v) = retrieval.coverage_limit {
                config.retrieval.coverage_limit = v;
            }
            if let Some(v) = retrieval.final_limit {
                config.retrieval.final_limit = v;
            }
        }
        if let Some(synthesis) = file.synthesis {
            if let Some(v) = synthesis.context_char_limit {
                config.synthesis.context_char_limit = v;
            }
            if let Some(v) = synthesis.summary_prefix_chars {
                config.synthesis.summary_prefix_chars = v;
            }
            if let Some(v) = synthesis.max_tokens {
                config.synthesis.max_tokens = v;
            }
        }
        if let Some(judge) = file.judge {
            if let Some(v) = judge.endpoint {
                config.judge.endpoint = v;
            }
            if let Some(v) = judge.model {
                config.judge.model = v;
            }
            config.judge.api_key = judge
                .api_key
                .filter(|k| !k.trim().is_empty())
                .map(SecretString::from);
            if let Some(v) = judge.timeout_ms {
                config.judge.timeout_ms = v;
            }
            if let Some(v) = judge.connect_timeout_ms {
                config.judge.connect_timeout_ms = v;
            }
            if let Some(v) = judge.max_attempts {
                config.judge.max_attempts = v;
            }
            if let Some(v) = judge.backoff_unit_ms {
                config.judge.backoff_unit_ms = v;
            }
            if let Some(v) = judge.concurrency {
                config.judge.concurrency = v;
            }
            if let Some(v) = judge.categories {
                config.judge.categories = v.into_iter().map(CategoryId).collect();
            }
        }
        if let Some(obs) = file.observability {
            if let Some(v) = obs.log_format {
                config.observability.log_format = LogFormat::parse(&v);
            }
            config.observability.log_file = obs.log_file.map(PathBuf::from);
            config.observability.log_filter = obs.log_filter;
            if let Some(v) = obs.metrics_enabled {
                config.observability.metrics_enabled = v;
            }
            config.observability.metrics_port = obs.metrics_port;
        }

        config
    }

    /// Applies environment variable overrides from the process environment.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_env_overrides_from(|key| std::env::var(key).ok())
    }

    /// Applies environment variable overrides using `lookup` to read values.
    ///
    /// Unparseable values are ignored with a warning.
    #[must_use]
    pub fn with_env_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(v) = get("VACMEM_DB_PATH") {
            self.storage.db_path = PathBuf::from(v);
        }
        if let Some(v) = get("VACMEM_INDEX_PATH") {
            self.storage.index_path = PathBuf::from(v);
        }
        if let Some(v) = get("VACMEM_IDMAP_PATH") {
            self.storage.idmap_path = PathBuf::from(v);
        }
        apply_parsed(&get, "VACMEM_EMBEDDING_DIMENSIONS", &mut self.storage.embedding_dimensions);
        if let Some(v) = get("VACMEM_REQUIRE_VECTOR_INDEX") {
            self.storage.require_vector_index = parse_bool(&v);
        }
        apply_parsed(&get, "VACMEM_COVERAGE_LIMIT", &mut self.retrieval.coverage_limit);
        apply_parsed(&get, "VACMEM_FINAL_LIMIT", &mut self.retrieval.final_limit);
        if let Some(v) = get("VACMEM_JUDGE_ENDPOINT") {
            self.judge.endpoint = v;
        }
        if let Some(v) = get("VACMEM_JUDGE_MODEL") {
            self.judge.model = v;
        }
        if let Some(v) = get("VACMEM_OPENAI_API_KEY").or_else(|| get("OPENAI_API_KEY")) {
            self.judge.api_key = Some(SecretString::from(v));
        }
        apply_parsed(&get, "VACMEM_JUDGE_TIMEOUT_MS", &mut self.judge.timeout_ms);
        apply_parsed(&get, "VACMEM_JUDGE_MAX_ATTEMPTS", &mut self.judge.max_attempts);
        apply_parsed(&get, "VACMEM_JUDGE_BACKOFF_MS", &mut self.judge.backoff_unit_ms);
        apply_parsed(&get, "VACMEM_JUDGE_CONCURRENCY", &mut self.judge.concurrency);
        if let Some(v) = get("VACMEM_LOG_FORMAT") {
            self.observability.log_format = LogFormat::parse(&v);
        }
        if let Some(v) = get("VACMEM_LOG_FILE") {
            self.observability.log_file = Some(PathBuf::from(v));
        }
        if let Some(v) = get("VACMEM_LOG") {
            self.observability.log_filter = Some(v);
        }
        if let Some(v) = get("VACMEM_METRICS_ENABLED") {
            self.observability.metrics_enabled = parse_bool(&v);
        }
        if let Some(v) = get("VACMEM_METRICS_PORT") {
            match v.parse::<u16>() {
                Ok(port) => self.observability.metrics_port = Some(port),
                Err(_) => tracing::warn!(value = %v, "Ignoring invalid VACMEM_METRICS_PORT"),
            }
        }

        self
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] naming the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            (self.retrieval.coverage_limit == 0, "retrieval.coverage_limit must be > 0"),
            (self.retrieval.final_limit == 0, "retrieval.final_limit must be > 0"),
            (self.storage.embedding_dimensions == 0, "storage.embedding_dimensions must be > 0"),
            (self.judge.max_attempts == 0, "judge.max_attempts must be >= 1"),
            (self.judge.concurrency == 0, "judge.concurrency must be >= 1"),
            (self.judge.model.trim().is_empty(), "judge.model must not be empty"),
        ];
        match checks.iter().find(|(failed, _)| *failed) {
            Some((_, message)) => Err(Error::Configuration((*message).to_string())),
            None => Ok(()),
        }
    }

    /// Sets the database path.
    #[must_use]
    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage.db_path = path.into();
        self
    }
}

fn apply_parsed<T, G>(get: &G, key: &str, target: &mut T)
where
    T: std::str::FromStr,
    G: Fn(&str) -> Option<String>,
{
    if let Some(v) = get(key) {
        match v.parse::<T>() {
            Ok(parsed) => *target = parsed,
            Err(_) => tracing::warn!(key, value = %v, "Ignoring invalid environment override"),
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = VacConfig::default();
        assert_eq!(config.retrieval.coverage_limit, 50);
        assert_eq!(config.retrieval.final_limit, 15);
        assert_eq!(config.synthesis.context_char_limit, 4000);
        assert_eq!(config.synthesis.summary_prefix_chars, 200);
        assert_eq!(config.synthesis.max_tokens, 150);
        assert_eq!(config.judge.model, "gpt-4o-mini");
        assert_eq!(config.judge.max_attempts, 4);
        assert_eq!(config.judge.timeout_ms, 30_000);
        assert_eq!(config.storage.embedding_dimensions, 1024);
        assert_eq!(
            config.judge.categories,
            vec![CategoryId(1), CategoryId(2), CategoryId(3), CategoryId(4)]
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_sections() {
        let config = VacConfig::from_toml(
            r#"
            [storage]
            db_path = "/tmp/m.db"
            require_vector_index = true

            [retrieval]
            coverage_limit = 20
            final_limit = 5

            [judge]
            model = "gpt-4o"
            concurrency = 4
            categories = [1, 2]

            [observability]
            log_format = "json"
            metrics_enabled = true
            "#,
        )
        .expect("parse");

        assert_eq!(config.storage.db_path, PathBuf::from("/tmp/m.db"));
        assert!(config.storage.require_vector_index);
        assert_eq!(config.retrieval.coverage_limit, 20);
        assert_eq!(config.retrieval.final_limit, 5);
        assert_eq!(config.judge.model, "gpt-4o");
        assert_eq!(config.judge.concurrency, 4);
        assert_eq!(config.judge.categories, vec![CategoryId(1), CategoryId(2)]);
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert!(config.observability.metrics_enabled);
    }

    #[test]
    fn test_unknown_section_rejected() {
        assert!(matches!(
            VacConfig::from_toml("[storge]\ndb_path = \"x\""),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let config = VacConfig::default().with_env_overrides_from(env(&[
            ("VACMEM_FINAL_LIMIT", "7"),
            ("VACMEM_JUDGE_MODEL", "gpt-4o"),
            ("OPENAI_API_KEY", "sk-test"),
            ("VACMEM_REQUIRE_VECTOR_INDEX", "yes"),
            ("VACMEM_COVERAGE_LIMIT", "not-a-number"),
        ]));

        assert_eq!(config.retrieval.final_limit, 7);
        assert_eq!(config.retrieval.coverage_limit, 50);
        assert_eq!(config.judge.model, "gpt-4o");
        assert!(config.storage.require_vector_index);
        assert_eq!(
            config.judge.api_key.as_ref().map(|k| k.expose_secret()),
            Some("sk-test")
        );
    }

    #[test]
    fn test_prefixed_key_wins() {
        let config = VacConfig::default().with_env_overrides_from(env(&[
            ("VACMEM_OPENAI_API_KEY", "sk-prefixed"),
            ("OPENAI_API_KEY", "sk-plain"),
        ]));
        assert_eq!(
            config.judge.api_key.as_ref().map(|k| k.expose_secret()),
            Some("sk-prefixed")
        );
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        let mut config = VacConfig::default();
        config.retrieval.final_limit = 0;
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));

        let mut config = VacConfig::default();
        config.judge.concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_missing_file_is_configuration_error() {
        let dir = TempDir::new().expect("tempdir");
        let result = VacConfig::load_from_file(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(Error::Configuration(_))));
    }
}
