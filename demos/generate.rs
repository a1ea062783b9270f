use std::env;

use agentforge::config::Framework;
use agentforge::generator::{GenerateRequest, Generator, OutputFormat};
use agentforge::llm::provider::openai::OpenAI;
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

    // OPENAI_API_KEY=sk-xxxxxxxxxxxxxxxxxxxxx
    // For OpenAI-compatible gateways use OpenAI::from_url(base_url, api_key).
    let api_key = env::var("OPENAI_API_KEY")?;
    let client = OpenAI::new(api_key);

    let generator = Generator::new(client);
    let request = GenerateRequest::new(
        "Build a two-agent research assistant that finds papers and summarizes them",
        Framework::CrewAi,
    )
    .format(OutputFormat::Code);

    let generation = generator.generate(request).await?;
    println!("{}", generation.code.unwrap_or_default());
    Ok(())
}
