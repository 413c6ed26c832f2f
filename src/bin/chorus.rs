use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{debug, error};

use chorus::{CanonicalRequest, ClientConfig, FailoverClient};

/// Send one prompt through the provider failover chain
#[derive(Debug, Parser)]
#[command(name = "chorus", version, about)]
struct Cli
{   /// Prompt text
    prompt: String

  , /// Optional system instruction
    #[arg(short, long)]
    system: Option<String>

  , /// JSON provider config; defaults to the OpenAI -> Ollama -> Gemini
    /// chain built from environment variables
    #[arg(short, long)]
    config: Option<PathBuf>

  , /// Ask for JSON output and pretty-print the parsed document
    #[arg(long)]
    json: bool

  , #[arg(long, default_value_t = chorus::request::DEFAULT_TEMPERATURE)]
    temperature: f32

  , #[arg(long, default_value_t = chorus::request::DEFAULT_MAX_TOKENS)]
    max_tokens: u32

  , /// Label used in log lines
    #[arg(long, default_value = "CLI")]
    context: String
}

#[tokio::main]
async fn main() -> ExitCode
{   env_logger::Builder::from_env(
      env_logger::Env::default().default_filter_or("info")
    ).init();

    let cli = Cli::parse();
    match run(cli).await
    {   Ok(()) => ExitCode::SUCCESS
      , Err(e) => {
          error!("{}", e);
          eprintln!("{}", e.user_message());
          ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), chorus::Error>
{   let config = match &cli.config
    {   Some(path) => ClientConfig::from_json_file(path)?
      , None => ClientConfig::from_env()
    };
    let chain = config.chain()?;
    let client = FailoverClient::from_config(&config)?;
    debug!("Chain: {:?}", chain.names());

    let request = match cli.system
    {   Some(system) => CanonicalRequest::with_system(system, cli.prompt)
      , None => CanonicalRequest::from_prompt(cli.prompt)
    }
    .temperature(cli.temperature)
    .max_tokens(cli.max_tokens);

    if cli.json
    {   let value: serde_json::Value = client
          .execute_json(&request, &chain, &cli.context)
          .await?;
        let pretty = serde_json::to_string_pretty(&value)
          .map_err(|e| chorus::Error::Other(e.to_string()))?;
        println!("{}", pretty);
    } else
    {   let response = client
          .execute(&request, &chain, &cli.context)
          .await?;
        debug!("Answered by {} ({})", response.provider, response.model);
        println!("{}", response.content);
    }
    Ok(())
}
