use super::logging::{debug_payload_enabled, emit_debug_payload};
use crate::config::{Config, GenerationOptions};
use crate::models::supports_thinking;
use crate::types::{Content, CountTokensResponse, FunctionDeclaration};
use crate::util::is_local_endpoint_url;
use anyhow::anyhow;
use anyhow::Result;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde_json::json;
use serde_json::Value;
use std::pin::Pin;
#[cfg(test)]
use std::sync::Arc;

pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

pub const SYSTEM_PROMPT: &str = "You are a helpful AI coding assistant integrated into a CLI tool.\n\
You have access to file system tools and a shell to help users with their coding tasks.\n\
Be concise but thorough in your responses, and always aim to provide practical solutions.\n\
Use tools for filesystem facts instead of guessing; never claim a file was read, written, or searched unless the tool call succeeded.\n\
Paths are relative to the working directory.\n\
Prefer search_file and glob for targeted lookups before reading whole files.\n\
For edit_file, use a focused old_str snippet; use write_file when rewriting an entire file.\n\
If a tool call is rejected by the user, do not retry it unchanged; explain or ask how to proceed.";

/// Everything one streaming generation call needs besides the model name.
pub struct GenerateRequest<'a> {
    pub contents: &'a [Content],
    pub tools: &'a [FunctionDeclaration],
    pub options: &'a GenerationOptions,
}

#[cfg(test)]
pub trait MockStreamProducer: Send + Sync {
    fn create_mock_stream(&self, contents: &[Content]) -> Result<ByteStream>;
    fn count_tokens(&self, contents: &[Content]) -> Result<u64>;
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    api_url: String,
    #[cfg(test)]
    mock_stream_producer: Option<Arc<dyn MockStreamProducer>>,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            http: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            #[cfg(test)]
            mock_stream_producer: None,
        })
    }

    #[cfg(test)]
    pub fn new_mock(mock_producer: Arc<dyn MockStreamProducer>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: None,
            api_url: "http://localhost:8000/v1beta".to_string(),
            mock_stream_producer: Some(mock_producer),
        }
    }

    pub fn is_local_endpoint(&self) -> bool {
        is_local_endpoint_url(&self.api_url)
    }

    pub async fn stream_generate_content(
        &self,
        model: &str,
        request: &GenerateRequest<'_>,
    ) -> Result<ByteStream> {
        #[cfg(test)]
        {
            if let Some(producer) = &self.mock_stream_producer {
                return producer.create_mock_stream(request.contents);
            }
        }

        let request_url = format!(
            "{}/models/{model}:streamGenerateContent?alt=sse",
            self.api_url
        );
        let payload = build_generate_payload(model, request);

        if debug_payload_enabled() {
            emit_debug_payload(&request_url, &payload);
        }

        let response = self
            .post(&request_url)
            .json(&payload)
            .send()
            .await
            .map_err(|error| map_api_request_error(error, &request_url))?;
        let response = ensure_success(response, &request_url).await?;

        let request_url_for_stream = request_url.clone();
        let stream = response.bytes_stream().map(move |item| {
            item.map_err(|error| map_api_request_error(error, &request_url_for_stream))
        });
        Ok(Box::pin(stream))
    }

    pub async fn count_tokens(&self, model: &str, contents: &[Content]) -> Result<u64> {
        #[cfg(test)]
        {
            if let Some(producer) = &self.mock_stream_producer {
                return producer.count_tokens(contents);
            }
        }

        let request_url = format!("{}/models/{model}:countTokens", self.api_url);
        let response = self
            .post(&request_url)
            .json(&json!({ "contents": contents }))
            .send()
            .await
            .map_err(|error| map_api_request_error(error, &request_url))?;
        let response = ensure_success(response, &request_url).await?;
        let counted: CountTokensResponse = response
            .json()
            .await
            .map_err(|error| map_api_request_error(error, &request_url))?;
        Ok(counted.total_tokens)
    }

    fn post(&self, url: &str) -> reqwest::RequestBuilder {
        let request = self
            .http
            .post(url)
            .header("content-type", "application/json");
        match &self.api_key {
            Some(api_key) => request.header("x-goog-api-key", api_key),
            None => request,
        }
    }
}

pub fn build_generate_payload(model: &str, request: &GenerateRequest<'_>) -> Value {
    let options = request.options;
    let mut generation_config = json!({
        "maxOutputTokens": options.max_output_tokens,
        "temperature": options.temperature,
        "topK": options.top_k,
        "topP": options.top_p,
    });
    if options.thinking && supports_thinking(model) {
        generation_config["thinkingConfig"] = json!({
            "includeThoughts": true,
            "thinkingBudget": options.thinking_budget,
        });
    }

    let mut payload = json!({
        "contents": request.contents,
        "systemInstruction": {
            "role": "user",
            "parts": [{ "text": SYSTEM_PROMPT }],
        },
        "generationConfig": generation_config,
    });
    if !request.tools.is_empty() {
        payload["tools"] = json!([{ "functionDeclarations": request.tools }]);
    }
    payload
}

async fn ensure_success(
    response: reqwest::Response,
    request_url: &str,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let detail = extract_error_message(&body).unwrap_or(body);
    Err(anyhow!(
        "API endpoint '{}' returned HTTP {}: {}",
        request_url,
        status,
        detail.trim()
    ))
}

fn extract_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .pointer("/error/message")
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
}

fn map_api_request_error(error: reqwest::Error, request_url: &str) -> anyhow::Error {
    if error.is_connect() && is_local_endpoint_url(request_url) {
        return anyhow!(
            "cannot reach local API endpoint '{}': {}. Start your local server or update GOOGLE_API_URL.",
            request_url,
            error
        );
    }
    if error.is_connect() {
        return anyhow!("cannot reach API endpoint '{}': {}", request_url, error);
    }
    if error.is_timeout() {
        return anyhow!("API request to '{}' timed out: {}", request_url, error);
    }
    if let Some(status) = error.status() {
        return anyhow!(
            "API endpoint '{}' returned HTTP {}: {}",
            request_url,
            status,
            error
        );
    }
    anyhow!("API request to '{}' failed: {}", request_url, error)
}
