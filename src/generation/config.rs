use std::path::PathBuf;

use candle_transformers::generation::{LogitsProcessor, Sampling};

use crate::constants::{
    DEFAULT_MAX_NEW_TOKENS, DEFAULT_TEMPERATURE, DEFAULT_TOP_P, GENERATOR_MAX_INPUT_TOKENS,
};
use crate::embedding::DevicePreference;
use crate::generation::error::GenerationError;

/// Decoding parameters.
///
/// `temperature <= 0` selects greedy decoding. `top_p == 1` samples from the
/// full distribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingConfig {
    pub temperature: f64,
    pub top_p: f64,
    pub max_new_tokens: usize,
    /// Fixed RNG seed. `None` draws a fresh seed for every call.
    pub seed: Option<u64>,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
            max_new_tokens: DEFAULT_MAX_NEW_TOKENS,
            seed: None,
        }
    }
}

impl SamplingConfig {
    /// Deterministic argmax decoding.
    pub fn greedy() -> Self {
        Self {
            temperature: 0.0,
            ..Default::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn is_greedy(&self) -> bool {
        self.temperature <= 0.0
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.temperature.is_finite() || self.temperature < 0.0 {
            return Err(format!(
                "temperature must be a finite value >= 0, got {}",
                self.temperature
            ));
        }
        if !(self.top_p > 0.0 && self.top_p <= 1.0) {
            return Err(format!("top_p must be in (0, 1], got {}", self.top_p));
        }
        if self.max_new_tokens == 0 {
            return Err("max_new_tokens must be at least 1".to_string());
        }
        Ok(())
    }

    pub fn sampling(&self) -> Sampling {
        if self.is_greedy() {
            Sampling::ArgMax
        } else if self.top_p < 1.0 {
            Sampling::TopP {
                p: self.top_p,
                temperature: self.temperature,
            }
        } else {
            Sampling::All {
                temperature: self.temperature,
            }
        }
    }

    /// Builds a fresh processor for one generation call.
    pub fn logits_processor(&self) -> LogitsProcessor {
        let seed = self.seed.unwrap_or_else(rand::random);
        LogitsProcessor::from_sampling(seed, self.sampling())
    }
}

/// Configuration for [`T5Generator`](super::T5Generator).
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Model directory holding `config.json`, `model.safetensors` and `tokenizer.json`.
    pub model_dir: PathBuf,
    /// Prompt tokens beyond this are truncated before encoding.
    pub max_input_tokens: usize,
    pub sampling: SamplingConfig,
    pub device: DevicePreference,
    /// If true, run the extractive stub (no model files required).
    pub testing_stub: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::new(),
            max_input_tokens: GENERATOR_MAX_INPUT_TOKENS,
            sampling: SamplingConfig::default(),
            device: DevicePreference::default(),
            testing_stub: false,
        }
    }
}

impl GeneratorConfig {
    pub fn new<P: Into<PathBuf>>(model_dir: P) -> Self {
        Self {
            model_dir: model_dir.into(),
            ..Default::default()
        }
    }

    pub fn stub() -> Self {
        Self {
            testing_stub: true,
            ..Default::default()
        }
    }

    /// `None` selects stub mode.
    pub fn from_optional(model_dir: Option<PathBuf>, device: DevicePreference) -> Self {
        let config = match model_dir {
            Some(dir) => Self::new(dir),
            None => Self::stub(),
        };
        config.with_device(device)
    }

    pub fn with_device(mut self, device: DevicePreference) -> Self {
        self.device = device;
        self
    }

    pub fn with_sampling(mut self, sampling: SamplingConfig) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn validate(&self) -> Result<(), GenerationError> {
        self.sampling
            .validate()
            .map_err(|reason| GenerationError::InvalidConfig { reason })?;

        if self.testing_stub {
            return Ok(());
        }

        if self.max_input_tokens == 0 {
            return Err(GenerationError::InvalidConfig {
                reason: "max_input_tokens must be at least 1".to_string(),
            });
        }

        if self.model_dir.as_os_str().is_empty() {
            return Err(GenerationError::InvalidConfig {
                reason: "model_dir is empty and stub mode is disabled".to_string(),
            });
        }

        if !self.model_dir.exists() {
            return Err(GenerationError::ModelNotFound {
                path: self.model_dir.clone(),
            });
        }

        Ok(())
    }
}
