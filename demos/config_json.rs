use std::env;

use agentforge::config::Framework;
use agentforge::generator::{GenerateRequest, Generator, OutputFormat};
use agentforge::llm::CompletionOptions;
use agentforge::llm::provider::watsonx::{self, WatsonX};
use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_line_number(true)
        .with_file(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // WATSONX_TOKEN=xxxxxxxxxxxxxxxxxxxxxx (a ready bearer token)
    // WATSONX_PROJECT_ID=xxxxxxxxxxxxxxxx
    let base_url = env::var("WATSONX_URL")
        .unwrap_or_else(|_| "https://eu-de.ml.cloud.ibm.com".to_owned());
    let token = env::var("WATSONX_TOKEN")?;
    let project_id = env::var("WATSONX_PROJECT_ID")?;
    let client = WatsonX::new(base_url, token, project_id);

    let generator = Generator::new(client).completion_options(CompletionOptions {
        model: watsonx::DEFAULT_MODEL.to_owned(),
        ..CompletionOptions::default()
    });

    let request = GenerateRequest::new(
        "Plan a product launch with research, copywriting and a final review step",
        Framework::LangGraph,
    )
    .format(OutputFormat::Json);

    let generation = generator.generate(request).await?;
    println!("{}", generation.config_json.unwrap_or_default());
    Ok(())
}
