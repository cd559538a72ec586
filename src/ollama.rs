use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use ollama_rs::generation::completion::request::GenerationRequest;
use ollama_rs::generation::options::GenerationOptions;
use ollama_rs::Ollama;
use url::Url;

use crate::model::{GenerationProfile, ModelClient};
use crate::profile;

const DEFAULT_PORT: u16 = 11434;

/// Client for a local Ollama server.
pub struct OllamaClient {
  ollama: Ollama,
  host:   String
}

impl OllamaClient {
  /// Parses `host` (`http://localhost:11434` style) into the host and
  /// port pair the client expects.
  pub fn new(host: &str) -> Result<Self> {
    let url = Url::parse(host).with_context(|| format!("Invalid Ollama host: {}", host))?;
    let hostname = url
      .host_str()
      .with_context(|| format!("Ollama host has no hostname: {}", host))?;
    let base = format!("{}://{}", url.scheme(), hostname);
    let port = url.port_or_known_default().unwrap_or(DEFAULT_PORT);

    log::debug!("Using Ollama at {}:{}", base, port);
    Ok(Self { ollama: Ollama::new(base, port), host: host.to_string() })
  }

  fn request(&self, model: &str, prompt: &str, profile: &GenerationProfile) -> GenerationRequest {
    let options = GenerationOptions::default()
      .temperature(profile.temperature)
      .top_p(profile.top_p)
      .repeat_penalty(profile.repeat_penalty)
      .num_predict(profile.max_tokens as _)
      .num_ctx(profile.context_window as _)
      .stop(profile.stop.clone());

    GenerationRequest::new(model.to_string(), prompt.to_string()).options(options)
  }

  /// Streams the completion, handing each chunk to `on_chunk` as it
  /// arrives, and returns the full text.
  pub async fn stream<F>(&self, model: &str, prompt: &str, profile: &GenerationProfile, mut on_chunk: F) -> Result<String>
  where
    F: FnMut(&str)
  {
    profile!("Ollama streaming call");
    let mut stream = self
      .ollama
      .generate_stream(self.request(model, prompt, profile))
      .await
      .map_err(|e| anyhow!("Ollama request to {} failed: {}", self.host, e))?;

    let mut text = String::new();
    while let Some(chunk) = stream.next().await {
      let responses = chunk.map_err(|_| anyhow!("Ollama stream from {} was interrupted", self.host))?;
      for response in responses {
        on_chunk(&response.response);
        text.push_str(&response.response);
      }
    }

    Ok(text)
  }
}

#[async_trait]
impl ModelClient for OllamaClient {
  async fn generate(&self, model: &str, prompt: &str, profile: &GenerationProfile) -> Result<String> {
    profile!("Ollama generate call");
    let response = self
      .ollama
      .generate(self.request(model, prompt, profile))
      .await
      .map_err(|e| anyhow!("Ollama request to {} failed: {}", self.host, e))?;

    if response.response.trim().is_empty() {
      bail!("Ollama returned an empty completion for {}", model);
    }

    Ok(response.response)
  }

  async fn is_available(&self, model: &str) -> bool {
    match self.ollama.list_local_models().await {
      Ok(models) => {
        models
          .iter()
          .any(|local| local.name == model || local.name == format!("{}:latest", model))
      }
      Err(e) => {
        log::debug!("Could not list models on {}: {}", self.host, e);
        false
      }
    }
  }

  fn name(&self) -> &str {
    "ollama"
  }
}
