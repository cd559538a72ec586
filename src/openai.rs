use anyhow::{anyhow, Context, Result};
use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::{
  ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest, CreateChatCompletionRequestArgs, Stop
};
use async_openai::Client;
use async_trait::async_trait;
use colored::*;

use crate::model::{GenerationProfile, ModelClient};
use crate::profile;

/// The chat completion API accepts at most this many stop sequences.
const MAX_STOP_SEQUENCES: usize = 4;

/// Client for the OpenAI chat completion API.
pub struct OpenAIClient {
  client: Client<OpenAIConfig>
}

impl OpenAIClient {
  pub fn new(api_key: String) -> Self {
    let config = OpenAIConfig::new().with_api_key(api_key);
    Self { client: Client::with_config(config) }
  }
}

fn describe(err: OpenAIError) -> String {
  match err {
    OpenAIError::ApiError(e) =>
      format!(
        "{} {}\n    {}\n\nSuggested Actions:\n    1. {}\n    2. {}",
        "ERROR:".bold().bright_red(),
        "OpenAI API error:".bright_white(),
        e.message.dimmed(),
        "Ensure your OpenAI API key is valid".yellow(),
        "Check your account credits".yellow()
      ),
    OpenAIError::Reqwest(e) =>
      format!(
        "{} {}\n    {}\n\nSuggested Actions:\n    1. {}",
        "ERROR:".bold().bright_red(),
        "Network error:".bright_white(),
        e.to_string().dimmed(),
        "Check your internet connection".yellow()
      ),
    other =>
      format!("{} {}\n    {}", "ERROR:".bold().bright_red(), "Unexpected error:".bright_white(), other.to_string().dimmed()),
  }
}

/// Single user message request carrying every sampling knob of `profile`.
fn chat_request(model: &str, prompt: &str, profile: &GenerationProfile) -> Result<CreateChatCompletionRequest> {
  let mut args = CreateChatCompletionRequestArgs::default();
  args
    .model(model)
    .max_tokens(profile.max_tokens)
    .temperature(profile.temperature)
    .top_p(profile.top_p)
    .messages([ChatCompletionRequestUserMessageArgs::default()
      .content(prompt)
      .build()?
      .into()]);

  if !profile.stop.is_empty() {
    let stops = profile.stop.iter().take(MAX_STOP_SEQUENCES).cloned().collect();
    args.stop(Stop::StringArray(stops));
  }

  Ok(args.build()?)
}

#[async_trait]
impl ModelClient for OpenAIClient {
  async fn generate(&self, model: &str, prompt: &str, profile: &GenerationProfile) -> Result<String> {
    profile!("OpenAI API call");
    let request = chat_request(model, prompt, profile)?;

    let response = self
      .client
      .chat()
      .create(request)
      .await
      .map_err(|e| anyhow!(describe(e)))?;

    response
      .choices
      .first()
      .context("No choices returned")?
      .message
      .content
      .clone()
      .context("No content returned")
  }

  fn name(&self) -> &str {
    "openai"
  }
}
