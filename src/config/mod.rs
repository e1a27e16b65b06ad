//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `RAG_*` environment variables.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::constants::{
    DEFAULT_MAX_CONTEXT_CHARS, DEFAULT_MAX_NEW_TOKENS, DEFAULT_MAX_REQUEST_CONTEXT_CHARS,
    DEFAULT_MAX_REQUEST_TOP_K, DEFAULT_TEMPERATURE, DEFAULT_TOP_K, DEFAULT_TOP_P,
};
use crate::embedding::DevicePreference;
use crate::generation::SamplingConfig;
use crate::retrieval::RetrievalDefaults;

/// Server configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `RAG_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port. Default: `8000`.
    pub port: u16,

    /// IP address to bind to. Default: `127.0.0.1`.
    pub bind_addr: IpAddr,

    /// Sentence-embedding model directory (`config.json`, `model.safetensors`, `tokenizer.json`).
    /// Unset runs the embedder in stub mode.
    pub embedding_model_path: Option<PathBuf>,

    /// Seq2seq generator model directory (T5 family). Unset runs the generator in stub mode.
    pub generator_model_path: Option<PathBuf>,

    /// Persisted nearest-neighbor index. Default: `./corpus.index`.
    pub index_path: PathBuf,

    /// CSV file holding the passages, row order matching the index. Default: `./processed_dataset.csv`.
    pub corpus_path: PathBuf,

    /// CSV column holding the passage text. Default: `processed_sentence`.
    pub corpus_column: String,

    /// Retrieval defaults and request-parameter limits.
    pub retrieval: RetrievalDefaults,

    /// Decoding parameters for the generator.
    pub sampling: SamplingConfig,

    /// Compute device preference for both models. Default: `auto`.
    pub device: DevicePreference,
}

/// Default CSV column name used when `RAG_CORPUS_COLUMN` is not set.
pub const DEFAULT_CORPUS_COLUMN: &str = "processed_sentence";

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8000,
            bind_addr: IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
            embedding_model_path: None,
            generator_model_path: None,
            index_path: PathBuf::from("./corpus.index"),
            corpus_path: PathBuf::from("./processed_dataset.csv"),
            corpus_column: DEFAULT_CORPUS_COLUMN.to_string(),
            retrieval: RetrievalDefaults::default(),
            sampling: SamplingConfig::default(),
            device: DevicePreference::default(),
        }
    }
}

impl Config {
    const ENV_PORT: &'static str = "RAG_PORT";
    const ENV_BIND_ADDR: &'static str = "RAG_BIND_ADDR";
    const ENV_EMBEDDING_MODEL_PATH: &'static str = "RAG_EMBEDDING_MODEL_PATH";
    const ENV_GENERATOR_MODEL_PATH: &'static str = "RAG_GENERATOR_MODEL_PATH";
    const ENV_INDEX_PATH: &'static str = "RAG_INDEX_PATH";
    const ENV_CORPUS_PATH: &'static str = "RAG_CORPUS_PATH";
    const ENV_CORPUS_COLUMN: &'static str = "RAG_CORPUS_COLUMN";
    const ENV_TOP_K: &'static str = "RAG_TOP_K";
    const ENV_MAX_CONTEXT_CHARS: &'static str = "RAG_MAX_CONTEXT_CHARS";
    const ENV_HONOR_REQUEST_PARAMS: &'static str = "RAG_HONOR_REQUEST_PARAMS";
    const ENV_MAX_REQUEST_TOP_K: &'static str = "RAG_MAX_REQUEST_TOP_K";
    const ENV_MAX_REQUEST_CONTEXT_CHARS: &'static str = "RAG_MAX_REQUEST_CONTEXT_CHARS";
    const ENV_TEMPERATURE: &'static str = "RAG_TEMPERATURE";
    const ENV_TOP_P: &'static str = "RAG_TOP_P";
    const ENV_MAX_NEW_TOKENS: &'static str = "RAG_MAX_NEW_TOKENS";
    const ENV_SEED: &'static str = "RAG_SEED";
    const ENV_DEVICE: &'static str = "RAG_DEVICE";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = Self::parse_port_from_env(defaults.port)?;
        let bind_addr = Self::parse_bind_addr_from_env(defaults.bind_addr)?;

        let retrieval = RetrievalDefaults {
            top_k: Self::parse_from_env(Self::ENV_TOP_K, DEFAULT_TOP_K)?,
            max_context_chars: Self::parse_from_env(
                Self::ENV_MAX_CONTEXT_CHARS,
                DEFAULT_MAX_CONTEXT_CHARS,
            )?,
            honor_request_params: Self::parse_bool_from_env(
                Self::ENV_HONOR_REQUEST_PARAMS,
                defaults.retrieval.honor_request_params,
            )?,
            max_request_top_k: Self::parse_from_env(
                Self::ENV_MAX_REQUEST_TOP_K,
                DEFAULT_MAX_REQUEST_TOP_K,
            )?,
            max_request_context_chars: Self::parse_from_env(
                Self::ENV_MAX_REQUEST_CONTEXT_CHARS,
                DEFAULT_MAX_REQUEST_CONTEXT_CHARS,
            )?,
        };

        let sampling = SamplingConfig {
            temperature: Self::parse_from_env(Self::ENV_TEMPERATURE, DEFAULT_TEMPERATURE)?,
            top_p: Self::parse_from_env(Self::ENV_TOP_P, DEFAULT_TOP_P)?,
            max_new_tokens: Self::parse_from_env(Self::ENV_MAX_NEW_TOKENS, DEFAULT_MAX_NEW_TOKENS)?,
            seed: Self::parse_optional_from_env(Self::ENV_SEED)?,
        };

        Ok(Self {
            port,
            bind_addr,
            embedding_model_path: Self::parse_optional_path_from_env(
                Self::ENV_EMBEDDING_MODEL_PATH,
            ),
            generator_model_path: Self::parse_optional_path_from_env(
                Self::ENV_GENERATOR_MODEL_PATH,
            ),
            index_path: Self::parse_path_from_env(Self::ENV_INDEX_PATH, defaults.index_path),
            corpus_path: Self::parse_path_from_env(Self::ENV_CORPUS_PATH, defaults.corpus_path),
            corpus_column: Self::parse_string_from_env(
                Self::ENV_CORPUS_COLUMN,
                defaults.corpus_column,
            ),
            retrieval,
            sampling,
            device: Self::parse_from_env(Self::ENV_DEVICE, defaults.device)?,
        })
    }

    /// Validates artifact paths and numeric ranges.
    ///
    /// Does not open any artifact; loading happens in [`crate::pipeline::RagPipeline::load`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::require_file(&self.index_path)?;
        Self::require_file(&self.corpus_path)?;

        for path in [&self.embedding_model_path, &self.generator_model_path]
            .into_iter()
            .flatten()
        {
            Self::require_dir(path)?;
        }

        if self.corpus_column.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                name: Self::ENV_CORPUS_COLUMN,
                value: self.corpus_column.clone(),
                reason: "column name cannot be empty".to_string(),
            });
        }

        self.retrieval
            .validate()
            .map_err(|reason| ConfigError::OutOfRange {
                name: "retrieval",
                reason,
            })?;

        self.sampling
            .validate()
            .map_err(|reason| ConfigError::OutOfRange {
                name: "sampling",
                reason,
            })?;

        Ok(())
    }

    /// Returns `"{bind_addr}:{port}"` (useful for logging/binding).
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    fn require_file(path: &Path) -> Result<(), ConfigError> {
        if !path.exists() {
            return Err(ConfigError::PathNotFound {
                path: path.to_path_buf(),
            });
        }
        if !path.is_file() {
            return Err(ConfigError::NotAFile {
                path: path.to_path_buf(),
            });
        }
        Ok(())
    }

    fn require_dir(path: &Path) -> Result<(), ConfigError> {
        if !path.exists() {
            return Err(ConfigError::PathNotFound {
                path: path.to_path_buf(),
            });
        }
        if !path.is_dir() {
            return Err(ConfigError::NotADirectory {
                path: path.to_path_buf(),
            });
        }
        Ok(())
    }

    fn parse_port_from_env(default: u16) -> Result<u16, ConfigError> {
        match env::var(Self::ENV_PORT) {
            Ok(value) => {
                let port: u16 = value.parse().map_err(|e| ConfigError::PortParseError {
                    value: value.clone(),
                    source: e,
                })?;

                if port == 0 {
                    return Err(ConfigError::InvalidPort { value });
                }

                Ok(port)
            }
            Err(_) => Ok(default),
        }
    }

    fn parse_bind_addr_from_env(default: IpAddr) -> Result<IpAddr, ConfigError> {
        match env::var(Self::ENV_BIND_ADDR) {
            Ok(value) => value
                .parse()
                .map_err(|e| ConfigError::InvalidBindAddr { value, source: e }),
            Err(_) => Ok(default),
        }
    }

    fn parse_path_from_env(var_name: &str, default: PathBuf) -> PathBuf {
        env::var(var_name).map(PathBuf::from).unwrap_or(default)
    }

    fn parse_optional_path_from_env(var_name: &str) -> Option<PathBuf> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }

    fn parse_string_from_env(var_name: &str, default: String) -> String {
        env::var(var_name).unwrap_or(default)
    }

    fn parse_from_env<T>(var_name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        Ok(Self::parse_optional_from_env(var_name)?.unwrap_or(default))
    }

    fn parse_optional_from_env<T>(var_name: &'static str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let Some(value) = env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
        else {
            return Ok(None);
        };

        value
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                name: var_name,
                reason: e.to_string(),
                value,
            })
    }

    fn parse_bool_from_env(var_name: &'static str, default: bool) -> Result<bool, ConfigError> {
        let Ok(value) = env::var(var_name) else {
            return Ok(default);
        };

        match value.trim().to_ascii_lowercase().as_str() {
            "" => Ok(default),
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                name: var_name,
                value,
                reason: "expected a boolean (true/false)".to_string(),
            }),
        }
    }
}
