use clap::{Args, Parser, Subcommand, value_parser};
use maestro_agent::AgentType;
use maestro_core::{MAX_TIMEOUT_SECONDS, Priority, TaskKind};
use std::path::PathBuf;

/// Command-line arguments for the maestro CLI
#[derive(Debug, Parser)]
#[command(
    name = "maestro",
    version,
    about = "Route tasks across specialized LLM agents"
)]
pub struct Cli {
    /// Configuration file [default: ~/.maestro/config.toml]
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Use canned mock backends instead of hosted providers
    #[arg(long, global = true)]
    pub offline: bool,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Route a task to one agent, or run it through a chain of agents
    Run(RunArgs),
    /// Ask the decision backend to plan a multi-agent workflow
    Plan(PlanArgs),
    /// Show how the model router ranks backends for a request
    Route(RouteArgs),
    /// List registered agents with their capabilities
    Agents,
    /// Check every configured backend
    Health,
    /// Print the effective configuration
    Config,
}

/// Task description shared by `run` and `plan`
#[derive(Debug, Args)]
pub struct TaskArgs {
    /// Request text
    pub input: String,

    /// Kind of work
    #[arg(long, default_value = "chat")]
    pub kind: TaskKind,

    /// Speed, quality, cost or balanced
    #[arg(long, default_value = "balanced")]
    pub priority: Priority,

    /// Workflow phase passed to agents
    #[arg(long)]
    pub phase: Option<String>,

    /// Per-step deadline in seconds
    #[arg(
        long,
        value_name = "SECONDS",
        value_parser = value_parser!(u64).range(1..=MAX_TIMEOUT_SECONDS)
    )]
    pub timeout: Option<u64>,
}

/// Arguments for `run`
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Task to run
    #[command(flatten)]
    pub task: TaskArgs,

    /// Comma-separated agents to run in order
    #[arg(long, value_delimiter = ',', conflicts_with = "auto_chain")]
    pub chain: Vec<AgentType>,

    /// Pick a chain from recorded patterns and input keywords
    #[arg(long)]
    pub auto_chain: bool,

    /// Ask the decision backend which agent to use
    #[arg(long)]
    pub dynamic: bool,
}

/// Arguments for `plan`
#[derive(Debug, Args)]
pub struct PlanArgs {
    /// Task to plan
    #[command(flatten)]
    pub task: TaskArgs,

    /// Run every planned step after printing the plan
    #[arg(long)]
    pub execute: bool,
}

/// Arguments for `route`
#[derive(Debug, Args)]
pub struct RouteArgs {
    /// Kind of work
    #[arg(long, default_value = "chat")]
    pub task: TaskKind,

    /// Speed, quality, cost or balanced
    #[arg(long, default_value = "balanced")]
    pub priority: Priority,

    /// Estimated input size in tokens
    #[arg(long, default_value_t = 0)]
    pub input_tokens: usize,

    /// Require structured function calls
    #[arg(long)]
    pub functions: bool,

    /// Require embedding support
    #[arg(long)]
    pub embedding: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chain() {
        let cli = Cli::try_parse_from([
            "maestro",
            "run",
            "build it",
            "--kind",
            "code",
            "--chain",
            "analysis,development",
            "--offline",
        ])
        .unwrap();

        assert!(cli.offline);
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.task.kind, TaskKind::Code);
        assert_eq!(args.chain, vec![AgentType::Analysis, AgentType::Development]);
        assert!(!args.auto_chain);
    }

    #[test]
    fn test_rejects_unknown_agent_and_conflicts() {
        assert!(Cli::try_parse_from(["maestro", "run", "x", "--chain", "wizard"]).is_err());
        assert!(
            Cli::try_parse_from(["maestro", "run", "x", "--chain", "quality", "--auto-chain"])
                .is_err()
        );
    }

    #[test]
    fn test_timeout_is_bounded() {
        let cli = Cli::try_parse_from(["maestro", "run", "x", "--timeout", "30"]).unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.task.timeout, Some(30));

        let huge = u64::MAX.to_string();
        assert!(Cli::try_parse_from(["maestro", "run", "x", "--timeout", huge.as_str()]).is_err());
        assert!(Cli::try_parse_from(["maestro", "run", "x", "--timeout", "0"]).is_err());
    }

    #[test]
    fn test_route_defaults() {
        let cli = Cli::try_parse_from(["maestro", "route", "--task", "code"]).unwrap();
        let Command::Route(args) = cli.command else {
            panic!("expected route");
        };
        assert_eq!(args.task, TaskKind::Code);
        assert_eq!(args.priority, Priority::Balanced);
        assert_eq!(args.input_tokens, 0);
        assert!(!args.functions);
    }
}
