//! An OpenAI-chat-completions-shaped [`CompletionClient`], the concrete
//! collaborator the orchestrator's `CompletionClient` port expects.
//! Request shaping, error classification, and the retry-with-backoff loop
//! are grounded on the LLM client in `sql-query-analyzer` — the one
//! example in the pack that actually calls an LLM API — narrowed from its
//! three-provider dispatch to a single OpenAI-compatible endpoint (the
//! same shape Ollama and most self-hosted gateways also speak), since the
//! provider SDK and its auth are an external collaborator this spec only
//! names an interface for (§1).

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::sleep;

use nlq_core::ports::{CompletionClient, CompletionError, GenerationOptions, PromptSection};

/// Retry policy for transient transport failures, mirroring the shape of
/// `sql-query-analyzer`'s `RetryConfig` (initial delay, exponential
/// backoff, capped maximum).
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub backoff_factor: f64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay_ms: 500,
            backoff_factor: 2.0,
            max_delay_ms: 8_000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpCompletionClient {
    endpoint: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
    retry: RetryConfig,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    temperature: f32,
    max_tokens: u32,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

impl HttpCompletionClient {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_retry_config(endpoint, api_key, model, RetryConfig::default())
    }

    pub fn with_retry_config(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        retry: RetryConfig,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
            client,
            retry,
        }
    }

    async fn call_once(&self, prompt: &str, options: GenerationOptions) -> Result<String, CompletionError> {
        let request = ChatRequest {
            model: self.model.clone(),
            temperature: options.temperature,
            max_tokens: options.max_output_tokens,
            messages: vec![ChatMessage { role: "user", content: prompt.to_string() }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|err| CompletionError::Transport(err.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(CompletionError::Provider(format!("{status}: {text}")));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|err| CompletionError::Provider(format!("could not parse response body: {err}")))?;
        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| CompletionError::Provider("empty choices array".to_string()))
    }

    fn is_retryable(error: &CompletionError) -> bool {
        match error {
            CompletionError::Transport(_) => true,
            CompletionError::Provider(message) => {
                let lower = message.to_ascii_lowercase();
                lower.contains("429") || lower.contains("500") || lower.contains("502") || lower.contains("503") || lower.contains("504")
            }
        }
    }
}

#[async_trait::async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn complete(
        &self,
        prompt_sections: &[PromptSection],
        generation_options: GenerationOptions,
    ) -> Result<String, CompletionError> {
        let prompt = render_sections(prompt_sections);

        let mut delay = self.retry.initial_delay_ms;
        let mut last_error = None;
        for attempt in 0..=self.retry.max_retries {
            if attempt > 0 {
                sleep(Duration::from_millis(delay)).await;
                delay = ((delay as f64 * self.retry.backoff_factor) as u64).min(self.retry.max_delay_ms);
            }
            match self.call_once(&prompt, generation_options).await {
                Ok(text) => return Ok(text),
                Err(err) if Self::is_retryable(&err) => last_error = Some(err),
                Err(err) => return Err(err),
            }
        }
        Err(last_error.unwrap_or_else(|| CompletionError::Provider("all retry attempts failed".to_string())))
    }
}

fn render_sections(sections: &[PromptSection]) -> String {
    sections
        .iter()
        .map(|section| format!("### {}\n{}", section.title, section.body))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_sections_with_titled_headers() {
        let sections = vec![
            PromptSection::new("Question", "how many orders shipped last week?"),
            PromptSection::new("Schema", "public.orders(id, shipped_at)"),
        ];
        let rendered = render_sections(&sections);
        assert!(rendered.starts_with("### Question"));
        assert!(rendered.contains("### Schema"));
    }

    #[test]
    fn classifies_server_errors_as_retryable() {
        assert!(HttpCompletionClient::is_retryable(&CompletionError::Provider("503: service unavailable".to_string())));
        assert!(!HttpCompletionClient::is_retryable(&CompletionError::Provider("400: bad request".to_string())));
        assert!(HttpCompletionClient::is_retryable(&CompletionError::Transport("connection reset".to_string())));
    }
}
