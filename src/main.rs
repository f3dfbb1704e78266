// ABOUTME: Entry point for the switchyard binary.
// ABOUTME: Parses CLI arguments, initializes tracing, and starts the HTTP server or a terminal chat.

use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use switchyard_agent::{ChatSession, StreamedAnswer, blueprint, create_model_client};
use switchyard_core::{AppKind, RunEvent};
use switchyard_server::{AppState, SwitchyardConfig, create_router, spawn_idle_sweeper};

#[derive(Parser)]
#[command(name = "switchyard")]
#[command(version)]
#[command(about = "Multi-agent chat router with tool calls and handoffs")]
struct Cli {
    /// LLM provider (gemini or openai); overrides SWITCHYARD_PROVIDER
    #[arg(long, global = true)]
    provider: Option<String>,

    /// Model name; overrides SWITCHYARD_MODEL
    #[arg(long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API and chat page
    Serve {
        /// Address to listen on; overrides SWITCHYARD_BIND
        #[arg(long)]
        bind: Option<SocketAddr>,
    },

    /// Chat with one app in the terminal
    Chat {
        /// game-master, travel-designer, or career-mentor
        #[arg(long, default_value = "game-master")]
        app: AppKind,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("switchyard=debug,tower_http=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = SwitchyardConfig::from_env()?;
    if let Some(provider) = cli.provider {
        config.provider = provider.to_ascii_lowercase();
    }
    if cli.model.is_some() {
        config.model = cli.model;
    }

    match cli.command {
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                config.bind = bind;
            }
            config.validate()?;
            serve(config).await
        }
        Commands::Chat { app } => {
            config.validate()?;
            chat(config, app).await
        }
    }
}

async fn serve(config: SwitchyardConfig) -> Result<()> {
    let state = Arc::new(AppState::from_config(&config)?);
    if let Some(idle) = config.session_idle() {
        spawn_idle_sweeper(Arc::clone(&state), idle);
    }
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    tracing::info!(bind = %config.bind, "switchyard listening");

    axum::serve(listener, router).await?;
    Ok(())
}

async fn chat(config: SwitchyardConfig, app: AppKind) -> Result<()> {
    let client = create_model_client(&config.provider, config.model.as_deref())?;
    let blueprint = blueprint(app, Arc::clone(&client));
    let runner = Arc::new(blueprint.runner(client, config.run_config()));
    let mut session = ChatSession::start(&blueprint, runner);

    println!("{}\n{}\n", app.title(), blueprint.welcome);
    println!("Type a message, or 'exit' to quit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let content = line.trim();
        if content.is_empty() {
            continue;
        }
        if matches!(content, "exit" | "quit") {
            break;
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let printer = tokio::spawn(print_events(rx));
        let outcome = session.handle_message(content, Some(&tx)).await;
        drop(tx);

        let answer = printer.await.unwrap_or_default();
        if !answer.text().is_empty() {
            println!();
        }
        if let Some(text) = answer.unshown(&outcome) {
            println!("{text}");
        }
        if let Some(agent) = outcome.agent() {
            println!("  ({agent})");
        }
        println!();
    }

    Ok(())
}

/// Print progress to stderr and answer text to stdout as it streams. Text from
/// a step that ends in a tool call or handoff is left on its own line.
async fn print_events(mut rx: mpsc::UnboundedReceiver<RunEvent>) -> StreamedAnswer {
    let mut answer = StreamedAnswer::new();
    while let Some(event) = rx.recv().await {
        if answer.apply(&event) {
            println!();
        }
        match event {
            RunEvent::TextDelta { delta } => {
                print!("{delta}");
                let _ = std::io::stdout().flush();
            }
            RunEvent::Handoff { from, to } => eprintln!("[{from} -> {to}]"),
            RunEvent::ToolCalled { tool, .. } => eprintln!("[tool: {tool}]"),
            _ => {}
        }
    }
    answer
}
