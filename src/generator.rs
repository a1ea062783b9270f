use std::time::Duration;

use chrono::Local;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::config::{Framework, ProcessType, WorkflowConfig};
use crate::llm::{CompletionClient, CompletionError, CompletionOptions};
use crate::parser::{self, ParseError};
use crate::process;
use crate::prompt;
use crate::render;

const DEFAULT_MAX_ATTEMPTS: u32 = 2;
const DEFAULT_MAX_BACKOFFS: u32 = 3;
const DEFAULT_BASE_BACKOFF: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("completion failed: {0}")]
    Completion(#[from] CompletionError),
    #[error("failed to parse completion: {0}")]
    Parse(#[from] ParseError),
    #[error("failed to serialize configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// What the caller wants back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Code,
    Json,
    Both,
}

/// One generation request.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub description: String,
    pub framework: Framework,
    /// Explicit topology; `None` resolves it via [`process::select`].
    pub process: Option<ProcessType>,
    pub format: OutputFormat,
}

impl GenerateRequest {
    pub fn new(description: impl Into<String>, framework: Framework) -> Self {
        Self {
            description: description.into(),
            framework,
            process: None,
            format: OutputFormat::default(),
        }
    }

    pub fn process(mut self, process: ProcessType) -> Self {
        self.process = Some(process);
        self
    }

    pub fn format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }
}

/// The complete generation artifact. Never partial: every field the requested
/// output format implies is present.
#[derive(Debug, Serialize)]
pub struct Generation {
    pub id: Uuid,
    pub timestamp: i64,
    pub attempts: u32,
    pub config: WorkflowConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_json: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Sequences the pipeline: prompt, completion, parse/validate, process
/// selection, rendering. Owns the retry policy on malformed completions and
/// the backoff policy on throttled providers.
///
/// Holds no per-request state, so one generator can serve concurrent
/// `generate` calls without locking.
pub struct Generator<C> {
    client: C,
    options: CompletionOptions,
    max_attempts: u32,
    max_backoffs: u32,
    base_backoff: Duration,
}

impl<C> Generator<C>
where
    C: CompletionClient,
{
    pub fn new(client: C) -> Self {
        Self {
            client,
            options: CompletionOptions::default(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            max_backoffs: DEFAULT_MAX_BACKOFFS,
            base_backoff: DEFAULT_BASE_BACKOFF,
        }
    }

    pub fn completion_options(mut self, options: CompletionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn backoff(mut self, max_backoffs: u32, base: Duration) -> Self {
        self.max_backoffs = max_backoffs;
        self.base_backoff = base;
        self
    }

    /// Run the whole pipeline for one request.
    pub async fn generate(&self, request: GenerateRequest) -> Result<Generation, GenerateError> {
        let mut correction: Option<String> = None;
        let mut attempts = 0;

        let draft = loop {
            attempts += 1;
            let prompt = prompt::build(
                &request.description,
                request.framework,
                request.process,
                correction.as_deref(),
            );
            let completion = self.complete_with_backoff(prompt).await?;

            match parser::parse(&completion, request.framework) {
                Ok(draft) => break draft,
                Err(failure) if attempts < self.max_attempts => {
                    tracing::warn!(
                        "attempt {attempts} rejected ({failure}); re-prompting with corrective guidance"
                    );
                    correction = Some(failure.to_string());
                }
                Err(failure) => return Err(failure.into()),
            }
        };

        let process = process::select(&draft, request.process);
        let config = draft.into_config(request.framework, process);

        let config_json = match request.format {
            OutputFormat::Json | OutputFormat::Both => Some(config.to_pretty_json()?),
            OutputFormat::Code => None,
        };
        let code = match request.format {
            OutputFormat::Code | OutputFormat::Both => Some(render::render(&config)),
            OutputFormat::Json => None,
        };

        tracing::info!(
            "generated {} workflow ({} process, {attempts} attempt(s))",
            request.framework,
            process
        );

        Ok(Generation {
            id: Uuid::new_v4(),
            timestamp: Local::now().timestamp(),
            attempts,
            config,
            config_json,
            code,
        })
    }

    // Retry the same prompt with bounded exponential backoff while the
    // provider is throttling; every other completion outcome passes through.
    async fn complete_with_backoff(&self, prompt: String) -> Result<String, CompletionError> {
        let mut delay = self.base_backoff;
        let mut backoffs = 0;
        loop {
            match self
                .client
                .complete(prompt.clone(), self.options.clone())
                .await
            {
                Err(CompletionError::RateLimited { retry_after })
                    if backoffs < self.max_backoffs =>
                {
                    backoffs += 1;
                    let wait = retry_after.unwrap_or(delay);
                    tracing::warn!(
                        "rate limited; backing off {}ms (retry {backoffs}/{})",
                        wait.as_millis(),
                        self.max_backoffs
                    );
                    tokio::time::sleep(wait).await;
                    delay *= 2;
                }
                other => return other,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::BoxFuture;
    use mockall::mock;

    mock! {
        Client {}

        impl CompletionClient for Client {
            fn complete(
                &self,
                prompt: String,
                options: CompletionOptions,
            ) -> BoxFuture<'static, Result<String, CompletionError>>;
        }
    }

    const VALID_COMPLETION: &str = r#"Here is the configuration:
{
    "process": "hierarchical",
    "agents": [
        {"name": "lead", "role": "Team Lead", "goal": "coordinate work", "isManager": true},
        {"name": "writer", "role": "Writer", "goal": "write the report"}
    ],
    "tasks": [
        {"name": "plan", "description": "plan the work", "expectedOutput": "a plan", "assignedAgent": "lead"},
        {"name": "write", "description": "write the report", "expectedOutput": "report", "assignedAgent": "writer", "dependsOn": ["plan"]}
    ]
}
Hope this helps!"#;

    const DANGLING_COMPLETION: &str = r#"{
    "agents": [{"name": "lead", "role": "Team Lead", "goal": "g"}],
    "tasks": [{"name": "t", "description": "d", "expectedOutput": "o", "assignedAgent": "ghost"}]
}"#;

    fn ok(completion: &'static str) -> BoxFuture<'static, Result<String, CompletionError>> {
        Box::pin(async move { Ok(completion.to_owned()) })
    }

    #[tokio::test]
    async fn renders_code_and_json_on_the_first_attempt() {
        let mut client = MockClient::new();
        client
            .expect_complete()
            .times(1)
            .returning(|_, _| ok(VALID_COMPLETION));

        let generator = Generator::new(client);
        let request = GenerateRequest::new("Build a reporting crew", Framework::CrewAi)
            .format(OutputFormat::Both);
        let generation = generator.generate(request).await.unwrap();

        assert_eq!(generation.attempts, 1);
        assert_eq!(generation.config.process_type, ProcessType::Hierarchical);
        assert!(generation.code.as_deref().unwrap().contains("crew = Crew("));
        assert!(
            generation
                .config_json
                .as_deref()
                .unwrap()
                .contains("\"targetFramework\": \"crewai\"")
        );
    }

    #[tokio::test]
    async fn flat_research_crew_without_hint_resolves_to_sequential() {
        // No "process" key in the completion and no explicit choice: the
        // heuristic sees a flat two-agent team and stays sequential.
        let completion: &'static str = r#"{
            "agents": [
                {"name": "paper_finder", "role": "Paper Finder", "goal": "find relevant papers"},
                {"name": "summarizer", "role": "Summarizer", "goal": "summarize the papers"}
            ],
            "tasks": [
                {"name": "find_papers", "description": "Find relevant papers", "expectedOutput": "paper list", "assignedAgent": "paper_finder"},
                {"name": "summarize_papers", "description": "Summarize the papers found", "expectedOutput": "summaries", "assignedAgent": "summarizer", "dependsOn": ["find_papers"]}
            ]
        }"#;
        let mut client = MockClient::new();
        client
            .expect_complete()
            .times(1)
            .returning(move |_, _| ok(completion));

        let generator = Generator::new(client);
        let request = GenerateRequest::new(
            "Build a two-agent research assistant that finds papers and summarizes them",
            Framework::CrewAi,
        );
        let generation = generator.generate(request).await.unwrap();

        assert_eq!(generation.config.agents.len(), 2);
        assert_eq!(generation.config.process_type, ProcessType::Sequential);
        let code = generation.code.as_deref().unwrap();
        assert!(code.contains("agent_paper_finder = Agent("));
        assert!(code.contains("agent_summarizer = Agent("));
        assert!(code.contains("process=Process.sequential"));
    }

    #[tokio::test]
    async fn explicit_process_overrides_the_model_recommendation() {
        let mut client = MockClient::new();
        client
            .expect_complete()
            .times(1)
            .returning(|_, _| ok(VALID_COMPLETION));

        let generator = Generator::new(client);
        let request = GenerateRequest::new("Build a reporting crew", Framework::CrewAi)
            .process(ProcessType::Sequential);
        let generation = generator.generate(request).await.unwrap();

        // The completion recommends hierarchical; the explicit choice wins.
        assert_eq!(generation.config.process_type, ProcessType::Sequential);
        assert!(
            generation
                .code
                .as_deref()
                .unwrap()
                .contains("process=Process.sequential")
        );
    }

    #[tokio::test]
    async fn malformed_completion_triggers_one_corrective_reprompt() {
        let mut client = MockClient::new();
        let mut seq = mockall::Sequence::new();
        client
            .expect_complete()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|prompt, _| !prompt.contains("previous reply was rejected"))
            .returning(|_, _| ok("I cannot produce JSON right now."));
        client
            .expect_complete()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|prompt, _| prompt.contains("previous reply was rejected"))
            .returning(|_, _| ok(VALID_COMPLETION));

        let generator = Generator::new(client);
        let request = GenerateRequest::new("Build a reporting crew", Framework::CrewAi);
        let generation = generator.generate(request).await.unwrap();

        assert_eq!(generation.attempts, 2);
        assert!(generation.code.is_some());
    }

    #[tokio::test]
    async fn validation_failure_exhausts_retries_and_surfaces_the_report() {
        let mut client = MockClient::new();
        client
            .expect_complete()
            .times(2)
            .returning(|_, _| ok(DANGLING_COMPLETION));

        let generator = Generator::new(client);
        let request = GenerateRequest::new("Build a reporting crew", Framework::CrewAi);
        let error = generator.generate(request).await.unwrap_err();

        match error {
            GenerateError::Parse(ParseError::Validation(report)) => {
                assert!(report.to_string().contains("ghost"));
            }
            other => panic!("expected a validation failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn rate_limiting_backs_off_and_retries_the_same_prompt() {
        let mut client = MockClient::new();
        let mut seq = mockall::Sequence::new();
        client
            .expect_complete()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| {
                Box::pin(async {
                    Err(CompletionError::RateLimited {
                        retry_after: Some(Duration::from_millis(1)),
                    })
                })
            });
        client
            .expect_complete()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|prompt, _| !prompt.contains("previous reply was rejected"))
            .returning(|_, _| ok(VALID_COMPLETION));

        let generator = Generator::new(client).backoff(3, Duration::from_millis(1));
        let request = GenerateRequest::new("Build a reporting crew", Framework::CrewAi);
        let generation = generator.generate(request).await.unwrap();

        // Backoff retries are not corrective re-prompts.
        assert_eq!(generation.attempts, 1);
    }

    #[tokio::test]
    async fn provider_error_is_terminal() {
        let mut client = MockClient::new();
        client.expect_complete().times(1).returning(|_, _| {
            Box::pin(async { Err(CompletionError::Provider("connection refused".to_owned())) })
        });

        let generator = Generator::new(client);
        let request = GenerateRequest::new("Build a reporting crew", Framework::CrewAi);
        let error = generator.generate(request).await.unwrap_err();

        assert!(matches!(
            error,
            GenerateError::Completion(CompletionError::Provider(_))
        ));
    }
}
