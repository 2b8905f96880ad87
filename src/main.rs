//! Baton CLI binary entry point.

use std::io::Write;
use std::sync::Arc;

use futures::StreamExt;

use baton::agent::AgentDirectory;
use baton::cli::{AgentsArgs, Cli, Commands, RunArgs};
use baton::config::BatonConfig;
use baton::engine::{Orchestrator, RunRequest, Runner, StreamEvent};
use baton::tools::Dispatcher;
use baton::transport::OpenAiTransport;
use baton::types::Message;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("baton=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse_args();
    let config = match &cli.config {
        Some(path) => BatonConfig::from_file(path),
        None => BatonConfig::load(),
    };

    let result = match config {
        Ok(config) => match cli.command {
            Commands::Run(args) => handle_run(&config, args).await,
            Commands::Agents(args) => handle_agents(args),
        },
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn handle_run(config: &BatonConfig, args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let directory = AgentDirectory::from_toml_file(&args.agents)?;
    let agent = match args.agent {
        Some(name) => name,
        None => directory
            .names()
            .next()
            .map(str::to_string)
            .ok_or("agent file defines no agents")?,
    };

    let transport = OpenAiTransport::from_config(config)?;
    let dispatcher = Dispatcher::handoffs_only(Arc::new(directory));
    let orchestrator = Orchestrator::from_config(config, Arc::new(transport), Arc::new(dispatcher));

    let mut request = RunRequest::new(agent, vec![Message::user(args.prompt)])
        .with_execute_tools(!args.no_tools);
    if let Some(model) = args.model {
        request = request.with_model_override(model);
    }
    if let Some(max_turns) = args.max_turns {
        request = request.with_max_turns(max_turns);
    }

    let mut handle = orchestrator.start(request).await?;
    while let Some(event) = handle.next().await {
        match event?.event {
            StreamEvent::TurnStart { agent, .. } => eprintln!("[{agent}]"),
            StreamEvent::TextDelta { text } => {
                print!("{text}");
                let _ = std::io::stdout().flush();
            }
            StreamEvent::TurnEnd { .. } => println!(),
            StreamEvent::ToolResult {
                tool_name, content, ..
            } => {
                eprintln!("  {tool_name} -> {}", truncate(&content, 200));
            }
            StreamEvent::Handoff { from, to } => eprintln!("  handoff {from} -> {to}"),
            StreamEvent::Response { response } => {
                eprintln!("finished with {}", response.agent.name);
                for (key, value) in response.context_variables.iter() {
                    eprintln!("  {key} = {value}");
                }
            }
            StreamEvent::ToolCallDeltas { .. } => {}
        }
    }

    Ok(())
}

fn handle_agents(args: AgentsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let directory = AgentDirectory::from_toml_file(&args.agents)?;
    for name in directory.names() {
        let Some(agent) = directory.effective(name) else {
            continue;
        };
        println!("{} ({})", agent.name, agent.model);
        for tool in &agent.tools {
            println!("  {} - {}", tool.name, tool.description);
        }
    }
    Ok(())
}

fn truncate(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
