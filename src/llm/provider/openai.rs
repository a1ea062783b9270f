use async_openai::{
    Client,
    config::OpenAIConfig,
    error::OpenAIError,
    types::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs},
};
use futures::future::BoxFuture;

use super::super::{CompletionClient, CompletionError, CompletionOptions};

/// Chat completion client for OpenAI and OpenAI-compatible gateways.
pub struct OpenAI {
    client: Client<OpenAIConfig>,
}

impl OpenAI {
    pub fn new(api_key: impl Into<String>) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);
        Self {
            client: Client::with_config(config),
        }
    }

    /// Point the client at an OpenAI-compatible base URL.
    pub fn from_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let config = OpenAIConfig::new()
            .with_api_base(base_url)
            .with_api_key(api_key);
        Self {
            client: Client::with_config(config),
        }
    }
}

impl CompletionClient for OpenAI {
    fn complete(
        &self,
        prompt: String,
        options: CompletionOptions,
    ) -> BoxFuture<'static, Result<String, CompletionError>> {
        let client = self.client.clone();
        Box::pin(async move {
            let message = ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(map_error)?;
            let request = CreateChatCompletionRequestArgs::default()
                .model(&options.model)
                .temperature(options.temperature as f32)
                .max_tokens(options.max_tokens)
                .messages([message.into()])
                .build()
                .map_err(map_error)?;

            let response = client.chat().create(request).await.map_err(map_error)?;
            response
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.message.content)
                .ok_or_else(|| {
                    CompletionError::Provider("completion contained no choices".to_owned())
                })
        })
    }
}

fn map_error(error: OpenAIError) -> CompletionError {
    if let OpenAIError::ApiError(api) = &error {
        let throttled = api.message.to_ascii_lowercase().contains("rate limit")
            || api
                .r#type
                .as_deref()
                .is_some_and(|t| t.contains("rate_limit"));
        if throttled {
            return CompletionError::RateLimited { retry_after: None };
        }
    }
    CompletionError::Provider(error.to_string())
}
