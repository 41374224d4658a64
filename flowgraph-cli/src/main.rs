//! Car-description workflow binary: run the graph, answer prompts, resume.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use flowgraph::{FileSaver, Message, Role, RunError, RunStatus, Runner, StateUpdate};
use flowgraph_cli::demo::{build_car_workflow, initial_car_state, mock_models};

#[derive(Parser, Debug)]
#[command(name = "flowgraph")]
#[command(about = "Car-description workflow — a supervisor delegates to colour and speed agents")]
struct Args {
    /// User message (also accepted as the first positional argument)
    #[arg(short, long, value_name = "TEXT")]
    message: Option<String>,

    /// Step budget for the run
    #[arg(long, default_value_t = 15)]
    budget: i64,

    /// Use the deterministic built-in models instead of the OpenAI API
    #[arg(long, default_value_t = !cfg!(feature = "openai"))]
    mock: bool,

    /// Persist run checkpoints under this directory (resumable across restarts)
    #[arg(long, value_name = "DIR")]
    state_dir: Option<PathBuf>,

    /// Positional: user message (when -m/--message is not used)
    #[arg(trailing_var_arg = true)]
    rest: Vec<String>,
}

fn get_message(args: &Args) -> String {
    if let Some(ref m) = args.message {
        return m.clone();
    }
    if args.rest.is_empty() {
        return "Describe the car.".to_string();
    }
    args.rest.join(" ").trim().to_string()
}

fn build_models(args: &Args) -> flowgraph_cli::demo::CarModels {
    #[cfg(feature = "openai")]
    if !args.mock {
        let _ = dotenv::dotenv();
        let config = flowgraph_cli::config::ModelConfig::from_env();
        return flowgraph_cli::demo::openai_models(&config);
    }
    let _ = args;
    mock_models()
}

fn read_reply(prompt: &str) -> io::Result<String> {
    print!("{} ", prompt);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn print_transcript(messages: &[Message]) {
    for m in messages {
        let who = match (&m.role, m.name.as_deref()) {
            (Role::System, _) => "System".to_string(),
            (Role::User, _) => "User".to_string(),
            (Role::Assistant, Some(name)) => name.to_string(),
            (Role::Assistant, None) => "Assistant".to_string(),
            (Role::Tool, Some(name)) => format!("Tool:{}", name),
            (Role::Tool, None) => "Tool".to_string(),
        };
        if !m.content.is_empty() {
            println!("[{}] {}", who, m.content);
        }
        for call in &m.tool_calls {
            println!("[{}] -> {}({})", who, call.name, call.arguments);
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    let input = get_message(&args);

    println!("User: {}", input);
    println!("---");

    let graph = build_car_workflow(build_models(&args))?;
    let mut runner = match &args.state_dir {
        Some(dir) => Runner::with_checkpointer(Arc::new(FileSaver::new(dir)?)),
        None => Runner::new(),
    };
    runner.register_graph("car", Arc::new(graph));

    let initial: StateUpdate = initial_car_state(&input, args.budget);
    let mut handle = runner.run("car", initial).await?;

    // Answer every question the workflow raises, resuming each time.
    loop {
        match handle.status {
            RunStatus::AwaitingInput { ref prompt } => {
                let reply = read_reply(prompt)?;
                handle = runner.resume(&handle.run_id, reply).await?;
            }
            RunStatus::Completed => break,
            RunStatus::Failed(ref error) => {
                let state = runner.get_state(&handle.run_id).await?;
                print_transcript(state.messages("messages"));
                match error {
                    RunError::BudgetExhausted { steps } => {
                        eprintln!("error: step budget exhausted after {} steps", steps)
                    }
                    other => eprintln!("error: {}", other),
                }
                std::process::exit(1);
            }
            RunStatus::Pending | RunStatus::Running => {
                eprintln!("error: run settled in a transient status");
                std::process::exit(1);
            }
        }
    }

    let state = runner.get_state(&handle.run_id).await?;
    print_transcript(state.messages("messages"));
    println!("---");
    println!("FINAL: {}", state.text("fullSentence"));
    Ok(())
}
