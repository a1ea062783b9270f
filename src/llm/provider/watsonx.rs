use std::time::Duration;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use super::super::{CompletionClient, CompletionError, CompletionOptions};

/// Default watsonx.ai generation model.
pub const DEFAULT_MODEL: &str = "meta-llama/llama-3-3-70b-instruct";

const GENERATION_PATH: &str = "/ml/v1/text/generation?version=2024-05-01";

// Scoped per request, so pipeline retries each get a fresh budget.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// IBM watsonx.ai text generation client.
///
/// The caller supplies a ready bearer token and project id; credential
/// acquisition is outside this crate.
pub struct WatsonX {
    http: reqwest::Client,
    base_url: String,
    bearer_token: String,
    project_id: String,
}

impl WatsonX {
    pub fn new(
        base_url: impl Into<String>,
        bearer_token: impl Into<String>,
        project_id: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            bearer_token: bearer_token.into(),
            project_id: project_id.into(),
        }
    }
}

#[derive(Serialize)]
struct GenerationRequest<'a> {
    model_id: &'a str,
    input: &'a str,
    parameters: GenerationParameters,
    project_id: &'a str,
}

#[derive(Serialize)]
struct GenerationParameters {
    decoding_method: &'static str,
    max_new_tokens: u32,
    temperature: f64,
}

#[derive(Deserialize)]
struct GenerationResponse {
    #[serde(default)]
    results: Vec<GenerationChoice>,
}

#[derive(Deserialize)]
struct GenerationChoice {
    generated_text: String,
}

impl CompletionClient for WatsonX {
    fn complete(
        &self,
        prompt: String,
        options: CompletionOptions,
    ) -> BoxFuture<'static, Result<String, CompletionError>> {
        let http = self.http.clone();
        let url = format!("{}{}", self.base_url, GENERATION_PATH);
        let token = self.bearer_token.clone();
        let project_id = self.project_id.clone();

        Box::pin(async move {
            let request = GenerationRequest {
                model_id: &options.model,
                input: &prompt,
                parameters: GenerationParameters {
                    decoding_method: "greedy",
                    max_new_tokens: options.max_tokens,
                    temperature: options.temperature,
                },
                project_id: &project_id,
            };

            let response = http
                .post(&url)
                .timeout(REQUEST_TIMEOUT)
                .bearer_auth(&token)
                .json(&request)
                .send()
                .await
                .map_err(|e| CompletionError::Provider(e.to_string()))?;

            if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
                let retry_after = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|value| value.to_str().ok())
                    .and_then(|value| value.parse::<u64>().ok())
                    .map(Duration::from_secs);
                return Err(CompletionError::RateLimited { retry_after });
            }
            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(CompletionError::Provider(format!(
                    "watsonx replied {status}: {body}"
                )));
            }

            let payload: GenerationResponse = response
                .json()
                .await
                .map_err(|e| CompletionError::Provider(e.to_string()))?;
            payload
                .results
                .into_iter()
                .next()
                .map(|choice| choice.generated_text)
                .ok_or_else(|| {
                    CompletionError::Provider("generation contained no results".to_owned())
                })
        })
    }
}
