//! SpecGen - CLI entry point
//!
//! Generates specifications and manages the saved history.

use std::fs;
use std::path::Path;
use std::time::Duration;

use clap::{CommandFactory, FromArgMatches};
use colored::Colorize;
use eyre::{Context, Result, bail};
use tracing::{debug, info, warn};

use specgen::cli::{
    Cli, Command, GenerateArgs, HistoryCommand, TEMPLATES, default_markdown_path, generate_after_help, get_log_path,
};
use specgen::config::Config;
use specgen::error::PipelineError;
use specgen::llm::create_client;
use specgen::pipeline::SpecPipeline;
use specgen::prompts::PromptLoader;
use specgen::render;
use specstore::{NewSpec, SpecStore, derive_title};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Logging isn't initialized yet, so nothing here can be traced
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level).map(|s| s.to_uppercase()) {
        None => tracing::Level::INFO,
        Some(s) => match s.as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cmd = Cli::command().after_help(generate_after_help());
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(provider = %config.llm.provider, "SpecGen loaded config");

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Generate(args) => cmd_generate(&config, &args).await,
        Command::Templates => cmd_templates(),
        Command::History { command } => cmd_history(&config, command),
    }
}

/// Print a classified failure and exit non-zero
fn fail(err: &PipelineError) -> ! {
    warn!(%err, "Generation failed");
    eprint!("{}", render::error_report(err));
    std::process::exit(1);
}

async fn cmd_generate(config: &Config, args: &GenerateArgs) -> Result<()> {
    debug!(?args, "cmd_generate: called");
    let goal = args.read_goal()?;
    if goal.trim().is_empty() {
        fail(&PipelineError::InvalidInput("Feature goal must not be empty".to_string()));
    }
    let context = args.feature_context();

    // Credentials are checked before any network call
    let resolved = config.llm.resolve().unwrap_or_else(|e| fail(&e));
    let llm = create_client(&resolved).context("Failed to create LLM client")?;

    let prompts_root = match &config.pipeline.prompts_root {
        Some(root) => root.clone(),
        None => std::env::current_dir().context("Failed to read current directory")?,
    };
    let pipeline =
        SpecPipeline::new(llm, PromptLoader::new(&prompts_root)).with_output_mode(config.pipeline.output_mode);

    println!(
        "{} {} ({}, {} mode)",
        "Generating specification with".bright_cyan(),
        resolved.model,
        resolved.provider,
        pipeline.effective_output_mode()
    );

    let deadline = Duration::from_secs(args.timeout);
    let run = match tokio::time::timeout(deadline, pipeline.run(&goal, &context)).await {
        Ok(Ok(run)) => run,
        Ok(Err(e)) => fail(&e),
        Err(_) => {
            warn!(timeout_secs = args.timeout, "Generation timed out");
            bail!("Generation timed out after {}s", args.timeout);
        }
    };

    println!();
    print!("{}", render::run_report(&run, &context));
    println!();

    let record = &run.record;
    let json = record.to_json_pretty().context("Failed to serialize specification")?;

    let md_path = args
        .output
        .clone()
        .unwrap_or_else(|| default_markdown_path(&chrono::Local::now()));
    write_output(&md_path, &record.detailed_spec_markdown)?;
    println!("{} Markdown written to {}", "\u{2713}".green(), md_path.display());

    if let Some(json_path) = &args.json {
        write_output(json_path, &json)?;
        println!("{} JSON written to {}", "\u{2713}".green(), json_path.display());
    }

    if args.save {
        let store = open_store(&config.storage.db_path)?;
        let spec = NewSpec::new(
            derive_title(&record.feature_goal),
            &record.feature_goal,
            json,
            &record.detailed_spec_markdown,
        );
        let id = store.save(&spec)?;
        println!(
            "{} Saved to history as #{} ({})",
            "\u{2713}".green(),
            id,
            store.path().display()
        );
    }

    Ok(())
}

fn write_output(path: &Path, contents: &str) -> Result<()> {
    debug!(?path, "write_output: called");
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).context(format!("Failed to create directory {}", parent.display()))?;
    }
    fs::write(path, contents).context(format!("Failed to write {}", path.display()))
}

fn cmd_templates() -> Result<()> {
    debug!("cmd_templates: called");
    println!("Example feature goals:");
    println!();
    for (label, goal) in TEMPLATES {
        println!("  {}", label.bold());
        println!("    {}", goal);
        println!();
    }
    println!("Run one with: sg generate \"<goal>\"");
    Ok(())
}

fn cmd_history(config: &Config, command: HistoryCommand) -> Result<()> {
    debug!(?command, "cmd_history: called");
    let store = open_store(&config.storage.db_path)?;

    match command {
        HistoryCommand::List => {
            let specs = store.list()?;
            if specs.is_empty() {
                println!("No saved specifications in {}", store.path().display());
                return Ok(());
            }
            for spec in specs {
                println!("{:>5}  {}  {}", format!("#{}", spec.id).cyan(), spec.created_at.dimmed(), spec.title);
            }
        }
        HistoryCommand::Show { id, json } => {
            let Some(spec) = store.get(id)? else {
                bail!("No specification with id {}", id);
            };
            if json {
                let value = spec.json_value()?;
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                println!("{}", spec.markdown_output);
            }
        }
        HistoryCommand::Delete { id } => {
            if !store.delete(id)? {
                bail!("No specification with id {}", id);
            }
            println!("{} Deleted specification #{}", "\u{2713}".green(), id);
        }
    }

    Ok(())
}

fn open_store(path: &Path) -> Result<SpecStore> {
    SpecStore::open(path).context(format!("Failed to open history at {}", path.display()))
}
