//! CLI command definitions and subcommands

use std::path::PathBuf;

use chrono::{DateTime, TimeZone};
use clap::{Args, Parser, Subcommand};
use eyre::{Context, Result, bail};
use tracing::debug;

use crate::config::Provider;
use crate::domain::{FeatureContext, Industry, TeamSize};

/// SpecGen - feature goals to validated software specifications
#[derive(Parser)]
#[command(
    name = "sg",
    about = "Turn a feature goal into a validated software specification",
    version = env!("CARGO_PKG_VERSION"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a specification from a feature goal
    Generate(GenerateArgs),

    /// List example feature goals
    Templates,

    /// Manage saved specifications
    History {
        #[command(subcommand)]
        command: HistoryCommand,
    },
}

/// Saved specification subcommands
#[derive(Debug, Subcommand)]
pub enum HistoryCommand {
    /// List saved specifications, newest first
    List,

    /// Show one saved specification
    Show {
        /// Specification ID
        id: i64,

        /// Print the JSON record instead of the markdown
        #[arg(long)]
        json: bool,
    },

    /// Delete a saved specification
    Delete {
        /// Specification ID
        id: i64,
    },
}

/// Arguments for `sg generate`
#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Feature goal text
    #[arg(value_name = "GOAL", required_unless_present = "file", conflicts_with = "file")]
    pub goal: Option<String>,

    /// Read the feature goal from a file
    #[arg(short, long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Target industry (General, Healthcare, Finance, E-commerce, Education, SaaS, Government, Entertainment)
    #[arg(long, default_value_t = Industry::General)]
    pub industry: Industry,

    /// Team size (Solo, 2-5, 6-20, 21-50, 51+)
    #[arg(long, default_value_t = TeamSize::Solo)]
    pub team_size: TeamSize,

    /// Include security requirements (default)
    #[arg(long, overrides_with = "no_security")]
    pub security: bool,

    /// Leave out security requirements
    #[arg(long, overrides_with = "security")]
    pub no_security: bool,

    /// Include WCAG 2.1 AA accessibility requirements
    #[arg(long)]
    pub accessibility: bool,

    /// Include a testing strategy (default)
    #[arg(long, overrides_with = "no_testing")]
    pub testing: bool,

    /// Leave out the testing strategy
    #[arg(long, overrides_with = "testing")]
    pub no_testing: bool,

    /// Include deployment and scalability considerations
    #[arg(long)]
    pub deployment: bool,

    /// Include cost estimation (default)
    #[arg(long, overrides_with = "no_cost")]
    pub cost: bool,

    /// Leave out cost estimation
    #[arg(long, overrides_with = "cost")]
    pub no_cost: bool,

    /// Include RESTful API endpoint specifications
    #[arg(long)]
    pub api: bool,

    /// Markdown output path (default: SpecGen_Specification_<timestamp>.md)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Also write the JSON record to this path
    #[arg(long, value_name = "PATH")]
    pub json: Option<PathBuf>,

    /// Save the result to the history database
    #[arg(long)]
    pub save: bool,

    /// Give up on the whole run after this many seconds
    #[arg(long, value_name = "SECS", default_value_t = 300)]
    pub timeout: u64,
}

impl GenerateArgs {
    /// Context flags selected on the command line
    pub fn feature_context(&self) -> FeatureContext {
        debug!("GenerateArgs::feature_context: called");
        FeatureContext {
            industry: self.industry,
            team_size: self.team_size,
            include_security: !self.no_security,
            include_accessibility: self.accessibility,
            include_testing: !self.no_testing,
            include_deployment: self.deployment,
            include_cost: !self.no_cost,
            include_api: self.api,
        }
    }

    /// The goal text, from the argument or the file
    pub fn read_goal(&self) -> Result<String> {
        debug!(?self.file, "GenerateArgs::read_goal: called");
        let goal = match (&self.goal, &self.file) {
            (Some(goal), _) => goal.clone(),
            (None, Some(path)) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read goal file {}", path.display()))?,
            (None, None) => bail!("Provide a feature goal or --file"),
        };
        Ok(goal)
    }
}

/// Built-in example goals: (label, goal)
pub const TEMPLATES: [(&str, &str); 6] = [
    (
        "Social media feature",
        "Build a social feed with infinite scroll, post creation, likes, comments, and real-time notifications",
    ),
    (
        "E-commerce checkout",
        "Create a secure checkout system with multiple payment methods, address validation, and order tracking",
    ),
    (
        "Analytics dashboard",
        "Develop a real-time analytics dashboard with customizable widgets, charts, and data export capabilities",
    ),
    (
        "Authentication system",
        "Build a secure authentication system with OAuth, two-factor authentication, and password recovery",
    ),
    (
        "Chat application",
        "Create a real-time chat system with typing indicators, read receipts, and file sharing",
    ),
    (
        "Learning platform",
        "Develop an online learning platform with course management, progress tracking, and assessments",
    ),
];

/// Markdown file name used when `--output` is not given
pub fn default_markdown_path<Tz: TimeZone>(now: &DateTime<Tz>) -> PathBuf
where
    Tz::Offset: std::fmt::Display,
{
    PathBuf::from(format!("SpecGen_Specification_{}.md", now.format("%Y%m%d_%H%M%S")))
}

/// Path of the log file written by the binary
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("specgen")
        .join("logs")
        .join("specgen.log")
}

/// Help footer listing which provider credentials are present
pub fn generate_after_help() -> String {
    debug!("generate_after_help: called");
    let mut help = String::from("Provider credentials:\n");

    for provider in [Provider::Gemini, Provider::Anthropic, Provider::OpenAI] {
        let env = provider.default_api_key_env();
        let present = std::env::var(env).map(|v| !v.trim().is_empty()).unwrap_or(false);
        let icon = if present { "\u{2705}" } else { "\u{274C}" };
        help.push_str(&format!("  {} {:<10} {}\n", icon, provider.to_string(), env));
    }

    help.push_str(&format!("\nLogs: {}\n", get_log_path().display()));
    help
}
