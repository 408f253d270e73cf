//! Plan-driven data-analysis workflow runner.
//!
//! Manages a workspace (`.analyst/`) holding the config, the persisted
//! session (plan, logs, transcript), and tool reference documents. Each
//! `ask` routes the request, acts on the plan, and persists the session.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use analyst::agents::CommandGenerator;
use analyst::controller::RetryExhaustion;
use analyst::exit_codes;
use analyst::io::config::{AnalystConfig, load_config, write_config};
use analyst::io::lookup::DocLibrary;
use analyst::io::prompt::PromptEngine;
use analyst::io::sandbox::SandboxRunner;
use analyst::io::session::{Session, load_session, write_session};
use analyst::workflow::Workflow;

const CONFIG_PATH: &str = ".analyst/config.toml";
const SESSION_PATH: &str = ".analyst/session.json";

#[derive(Parser)]
#[command(
    name = "analyst",
    version,
    about = "Plan-driven data-analysis workflow runner"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create `.analyst/config.toml` and the docs directory if missing.
    Init {
        /// Overwrite an existing config with the defaults.
        #[arg(short, long)]
        force: bool,
    },
    /// Route one request through the workflow and print the reply.
    Ask {
        /// The request text.
        message: String,
    },
    /// Print the current plan.
    Plan,
    /// Discard the persisted session (plan, logs, transcript).
    Reset,
}

fn main() {
    analyst::logging::init();
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        let code = if err.downcast_ref::<RetryExhaustion>().is_some() {
            exit_codes::EXHAUSTED
        } else {
            exit_codes::INVALID
        };
        std::process::exit(code);
    }
    std::process::exit(exit_codes::OK);
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Init { force } => cmd_init(force),
        Command::Ask { message } => cmd_ask(&message),
        Command::Plan => cmd_plan(),
        Command::Reset => cmd_reset(),
    }
}

fn cmd_init(force: bool) -> Result<()> {
    let config_path = Path::new(CONFIG_PATH);
    let cfg = AnalystConfig::default();
    if force || !config_path.exists() {
        write_config(config_path, &cfg).context("write default config")?;
    }
    let session_path = Path::new(SESSION_PATH);
    if force || !session_path.exists() {
        write_session(session_path, &Session::default()).context("write empty session")?;
    }
    fs::create_dir_all(&cfg.docs_dir)
        .with_context(|| format!("create docs directory {}", cfg.docs_dir))?;
    Ok(())
}

fn cmd_ask(message: &str) -> Result<()> {
    let cfg = load_config(Path::new(CONFIG_PATH))?;
    let session_path = PathBuf::from(SESSION_PATH);
    let mut session = load_session(&session_path)?;

    let generator = CommandGenerator::new(
        cfg.generator_command.clone(),
        Duration::from_secs(cfg.generator_timeout_secs),
        cfg.output_limit_bytes,
    );
    let runner = SandboxRunner::new(
        cfg.interpreter.clone(),
        Duration::from_secs(cfg.task_timeout_secs),
        cfg.output_limit_bytes,
    );
    let engine = PromptEngine::new();
    let docs = DocLibrary::new(&cfg.docs_dir);
    let workflow = Workflow {
        generator: &generator,
        engine: &engine,
        runner: &runner,
        docs: &docs,
        tools: &cfg.tools,
        max_iterations: cfg.max_iterations,
    };

    // Persist whatever the request changed even when it ends in an abort, so
    // the revised plan and the run-lifetime replanned flag survive.
    let result = workflow.handle_request(&mut session, message);
    write_session(&session_path, &session)?;
    let reply = result?;

    println!("{}", reply.text());
    Ok(())
}

fn cmd_plan() -> Result<()> {
    let session = load_session(Path::new(SESSION_PATH))?;
    if session.plan.is_empty() {
        println!("no plan yet");
    } else {
        println!("{}", session.plan.render());
    }
    Ok(())
}

fn cmd_reset() -> Result<()> {
    let session_path = Path::new(SESSION_PATH);
    if session_path.exists() {
        fs::remove_file(session_path)
            .with_context(|| format!("remove {}", session_path.display()))?;
    }
    Ok(())
}
