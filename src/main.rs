//! Threadrun CLI binary entry point.

use std::sync::Arc;

use clap::Parser;
use tokio::io::BufReader;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use threadrun::assistant::setup_assistant;
use threadrun::cli::{ChatArgs, Cli, Commands};
use threadrun::config::ThreadrunConfig;
use threadrun::error::ThreadrunError;
use threadrun::service::{ConversationService, OpenAiAssistantsService};
use threadrun::session::Session;
use threadrun::tools::builtin::python_interpreter_tool;
use threadrun::tools::ToolRegistry;

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Chat(args) => handle_chat(args).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        eprintln!("Suggested action: {:?}", e.recovery_suggestion());
        std::process::exit(1);
    }
}

/// Logs go to stderr so streamed replies on stdout stay clean.
fn init_tracing() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

async fn handle_chat(args: ChatArgs) -> Result<(), ThreadrunError> {
    let mut config = ThreadrunConfig::load()?;
    args.apply_to(&mut config);

    let service: Arc<dyn ConversationService> = Arc::new(OpenAiAssistantsService::from_config(&config)?);
    let registry = Arc::new(
        ToolRegistry::builder()
            .register(python_interpreter_tool())
            .build()?,
    );

    let assistant = setup_assistant(service.clone(), &config.assistant, &registry).await?;
    let session = Session::start(service, &assistant, registry, &config.runs).await?;

    session
        .converse(BufReader::new(tokio::io::stdin()), &mut std::io::stdout())
        .await
}
