use std::path::Path;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::t5::{Config, T5ForConditionalGeneration};
use parking_lot::Mutex;
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use crate::embedding::select_device;
use crate::embedding::utils::{load_tokenizer, missing_model_file};
use crate::generation::config::GeneratorConfig;
use crate::generation::error::GenerationError;
use crate::generation::prompt::Prompt;
use crate::generation::TextGenerator;

enum GeneratorBackend {
    Model {
        // Decoding mutates the KV cache.
        model: Mutex<T5ForConditionalGeneration>,
        tokenizer: Tokenizer,
        config: Config,
        device: Device,
    },
    Stub,
}

/// Seq2seq answer generator over a T5-family checkpoint.
pub struct T5Generator {
    backend: GeneratorBackend,
    config: GeneratorConfig,
}

impl std::fmt::Debug for T5Generator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("T5Generator")
            .field(
                "backend",
                &match &self.backend {
                    GeneratorBackend::Model { device, .. } => format!("Model({:?})", device),
                    GeneratorBackend::Stub => "Stub".to_string(),
                },
            )
            .field("sampling", &self.config.sampling)
            .finish()
    }
}

impl T5Generator {
    pub fn load(config: GeneratorConfig) -> Result<Self, GenerationError> {
        config.validate()?;

        if config.testing_stub {
            warn!("Generator running in STUB mode (first context sentence)");
            return Ok(Self {
                backend: GeneratorBackend::Stub,
                config,
            });
        }

        if let Some(missing) = missing_model_file(&config.model_dir) {
            return Err(GenerationError::ModelNotFound {
                path: config.model_dir.join(missing),
            });
        }

        let device = select_device(config.device);
        debug!(?device, "Selected compute device for generator");

        let tokenizer =
            load_tokenizer(&config.model_dir, config.max_input_tokens).map_err(|source| {
                GenerationError::TokenizerLoadFailed {
                    model_dir: config.model_dir.clone(),
                    source,
                }
            })?;

        let (model, model_config) = load_t5(&config.model_dir, &device).map_err(|e| {
            GenerationError::ModelLoadFailed {
                model_dir: config.model_dir.clone(),
                reason: e.to_string(),
            }
        })?;

        info!(
            model_dir = %config.model_dir.display(),
            vocab_size = model_config.vocab_size,
            temperature = config.sampling.temperature,
            top_p = config.sampling.top_p,
            max_new_tokens = config.sampling.max_new_tokens,
            "Generator model loaded"
        );

        Ok(Self {
            backend: GeneratorBackend::Model {
                model: Mutex::new(model),
                tokenizer,
                config: model_config,
                device,
            },
            config,
        })
    }

    pub fn stub() -> Result<Self, GenerationError> {
        Self::load(GeneratorConfig::stub())
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    fn generate_with_model(
        &self,
        prompt: &Prompt,
        model: &Mutex<T5ForConditionalGeneration>,
        tokenizer: &Tokenizer,
        model_config: &Config,
        device: &Device,
    ) -> Result<String, GenerationError> {
        let sampling = &self.config.sampling;

        let encoding = tokenizer.encode(prompt.text(), true).map_err(|e| {
            GenerationError::TokenizationFailed {
                reason: e.to_string(),
            }
        })?;
        let input_ids = Tensor::new(encoding.get_ids(), device)?.unsqueeze(0)?;

        let start_token = model_config
            .decoder_start_token_id
            .unwrap_or(model_config.pad_token_id) as u32;
        let eos_token = model_config.eos_token_id as u32;

        let mut processor = sampling.logits_processor();
        let mut output: Vec<u32> = Vec::with_capacity(sampling.max_new_tokens);

        let mut model = model.lock();
        model.clear_kv_cache();
        let encoder_output = model.encode(&input_ids)?;

        // With the KV cache on, each step feeds only the newest token.
        let mut next_input = start_token;
        for _ in 0..sampling.max_new_tokens {
            let decoder_ids = Tensor::new(&[next_input], device)?.unsqueeze(0)?;
            let logits = model.decode(&decoder_ids, &encoder_output)?.squeeze(0)?;
            let token = processor.sample(&logits)?;
            if token == eos_token {
                break;
            }
            output.push(token);
            next_input = token;
        }
        model.clear_kv_cache();
        drop(model);

        let answer = tokenizer
            .decode(&output, true)
            .map_err(|e| GenerationError::TokenizationFailed {
                reason: e.to_string(),
            })?;

        debug!(
            prompt_tokens = encoding.get_ids().len(),
            generated_tokens = output.len(),
            "Generated answer"
        );

        Ok(answer.trim().to_string())
    }
}

impl TextGenerator for T5Generator {
    fn generate(&self, prompt: &Prompt) -> Result<String, GenerationError> {
        match &self.backend {
            GeneratorBackend::Model {
                model,
                tokenizer,
                config,
                device,
            } => self.generate_with_model(prompt, model, tokenizer, config, device),
            GeneratorBackend::Stub => Ok(first_sentence(prompt.context()).to_string()),
        }
    }

    fn is_stub(&self) -> bool {
        matches!(self.backend, GeneratorBackend::Stub)
    }
}

fn load_t5(
    model_dir: &Path,
    device: &Device,
) -> candle_core::Result<(T5ForConditionalGeneration, Config)> {
    let config_content = std::fs::read_to_string(model_dir.join("config.json"))?;
    let mut config: Config = serde_json::from_str(&config_content)
        .map_err(|e| candle_core::Error::Msg(format!("Failed to parse config: {}", e)))?;
    config.use_cache = true;

    let weights_path = model_dir.join("model.safetensors");
    let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, device)? };
    let model = T5ForConditionalGeneration::load(vb, &config)?;

    Ok((model, config))
}

/// Leading sentence of `text`, ending at the first `.`, `!` or `?` that is
/// followed by whitespace or the end of input. Whole text when none is found.
pub fn first_sentence(text: &str) -> &str {
    let text = text.trim();
    let mut chars = text.char_indices().peekable();
    while let Some((idx, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') {
            match chars.peek() {
                None => return text,
                Some((_, next)) if next.is_whitespace() => return &text[..idx + c.len_utf8()],
                _ => {}
            }
        }
    }
    text
}
