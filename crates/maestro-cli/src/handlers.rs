//! Command handlers for CLI operations
#![allow(clippy::print_stdout, reason = "Command output goes to stdout")]

use anyhow::{Result, bail};
use maestro_agent::{
    AgentResult, AgentType, ChainExecution, ExecutionContext, Task, TaskContext,
};
use maestro_routing::SelectOptions;
use serde::Serialize;
use std::time::Duration;
use tokio::signal;
use tracing::warn;

use crate::cli::{Cli, Command, PlanArgs, RouteArgs, RunArgs, TaskArgs};
use crate::runtime::{Runtime, load_config};

/// Runs the parsed command.
///
/// # Errors
/// Returns an error if configuration, runtime setup or the command fails.
pub async fn dispatch(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    if matches!(cli.command, Command::Config) {
        print!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    let mut runtime = Runtime::build(config, cli.offline)?;
    match cli.command {
        Command::Run(args) => handle_run(&mut runtime, args, cli.json).await,
        Command::Plan(args) => handle_plan(&runtime, args, cli.json).await,
        Command::Route(args) => handle_route(&runtime, &args, cli.json),
        Command::Agents => handle_agents(&runtime, cli.json),
        Command::Health => handle_health(&runtime, cli.json).await,
        Command::Config => Ok(()),
    }
}

fn build_task(args: &TaskArgs) -> Task {
    let mut context = TaskContext::new();
    if let Some(phase) = &args.phase {
        context = context.with_phase(phase.clone());
    }
    let task = Task::new(args.kind, args.input.clone())
        .with_priority(args.priority)
        .with_context(context);
    match args.timeout {
        Some(seconds) => task.with_timeout(Duration::from_secs(seconds)),
        None => task,
    }
}

/// Context cancelled by Ctrl-C.
fn interruptible_context() -> ExecutionContext {
    let ctx = ExecutionContext::new();
    let token = ctx.token().clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling in-flight work");
            token.cancel();
        }
    });
    ctx
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_result(label: &str, result: &AgentResult) {
    let status = if result.success { "ok" } else { "failed" };
    println!(
        "[{label}] {status} confidence={:.1} time={}ms",
        result.confidence(),
        result.execution_ms
    );
    if let Some(error) = &result.error {
        println!("  error: {error}");
    }
    if let Some(next) = result.next_agent {
        println!("  suggested next agent: {next}");
    }
    if !result.output.is_empty() {
        println!("{}", result.output);
    }
}

fn print_chain(execution: &ChainExecution) {
    for result in &execution.results {
        let agent = result.data.get("agent").and_then(|value| value.as_str()).unwrap_or("?");
        let step = result.data.get("chain_step").and_then(serde_json::Value::as_u64).unwrap_or(0);
        print_result(&format!("{step}. {agent}"), result);
        println!();
    }
    for skipped in &execution.skipped {
        println!("skipped unregistered agent: {skipped}");
    }
    println!(
        "chain {} {} in {}ms, mean confidence {:.1}{}",
        execution.id,
        if execution.success { "succeeded" } else { "failed" },
        execution.total_ms,
        execution.confidence(),
        if execution.cancelled { " (cancelled)" } else { "" }
    );
}

async fn handle_run(runtime: &mut Runtime, args: RunArgs, json: bool) -> Result<()> {
    if args.dynamic {
        runtime.use_dynamic_routing();
    }
    let task = build_task(&args.task);
    let ctx = interruptible_context();

    let chain: Vec<AgentType> = if args.auto_chain {
        runtime.orchestrator.suggest_chain(&task)
    } else {
        args.chain
    };

    if chain.is_empty() {
        let result = runtime.orchestrator.execute(&ctx, &task).await?;
        if json {
            return print_json(&result);
        }
        let routed = result
            .data
            .get("orchestration")
            .and_then(|orchestration| orchestration.get("routed_to"))
            .and_then(|agent| agent.as_str())
            .unwrap_or("?")
            .to_owned();
        print_result(&routed, &result);
        if !result.success {
            bail!("task failed");
        }
        return Ok(());
    }

    let execution = runtime.orchestrator.execute_chain(&ctx, &task, &chain).await;
    if json {
        print_json(&execution)?;
    } else {
        print_chain(&execution);
    }
    if execution.cancelled {
        bail!("chain cancelled");
    }
    if !execution.success {
        bail!("chain failed");
    }
    Ok(())
}

async fn handle_plan(runtime: &Runtime, args: PlanArgs, json: bool) -> Result<()> {
    let task = build_task(&args.task);
    let ctx = interruptible_context();
    let plan = runtime.orchestrator.plan_workflow(&ctx, &task).await?;

    if json && !args.execute {
        return print_json(&plan);
    }
    if !json {
        for step in &plan {
            let agent = step
                .assigned_agent()
                .map_or_else(|| "?".to_owned(), |agent| agent.to_string());
            let description = step
                .parameters
                .get("description")
                .and_then(|value| value.as_str())
                .unwrap_or_default();
            println!("{agent}: {description}");
        }
    }
    if !args.execute {
        return Ok(());
    }

    let mut results = Vec::with_capacity(plan.len());
    for step in &plan {
        if ctx.is_cancelled() {
            bail!("plan cancelled");
        }
        let result = runtime.orchestrator.execute(&ctx, step).await?;
        if !json {
            println!();
            print_result(&step.input, &result);
        }
        results.push(result);
    }
    if json {
        print_json(&results)?;
    }
    Ok(())
}

fn handle_route(runtime: &Runtime, args: &RouteArgs, json: bool) -> Result<()> {
    let options = SelectOptions::new(args.task)
        .with_priority(args.priority)
        .with_input_tokens(args.input_tokens)
        .with_function_calls(args.functions)
        .with_embedding(args.embedding);
    let candidates = runtime.router.select(&options)?;

    if json {
        return print_json(&candidates);
    }
    for (rank, candidate) in candidates.iter().enumerate() {
        println!(
            "{}. {} ({}) score={:.3}{} {}",
            rank + 1,
            candidate.model.name,
            candidate.model.provider,
            candidate.score,
            if candidate.boosted { " boosted" } else { "" },
            candidate.why
        );
    }
    Ok(())
}

#[derive(Serialize)]
struct AgentSummary {
    agent_type: AgentType,
    description: String,
    capabilities: Vec<String>,
}

fn handle_agents(runtime: &Runtime, json: bool) -> Result<()> {
    let summaries: Vec<AgentSummary> = runtime
        .orchestrator
        .registry()
        .descriptors()
        .into_iter()
        .map(|descriptor| AgentSummary {
            agent_type: descriptor.agent_type,
            description: descriptor.description,
            capabilities: descriptor
                .capabilities
                .into_iter()
                .map(|capability| capability.name)
                .collect(),
        })
        .collect();

    if json {
        return print_json(&summaries);
    }
    for summary in &summaries {
        println!("{:<14} {}", summary.agent_type.as_str(), summary.description);
        println!("{:<14} [{}]", "", summary.capabilities.join(", "));
    }
    Ok(())
}

async fn handle_health(runtime: &Runtime, json: bool) -> Result<()> {
    let health = runtime.providers.health_check_all().await;
    if json {
        return print_json(&health);
    }
    for (provider, healthy) in &health {
        println!("{provider}: {}", if *healthy { "healthy" } else { "unavailable" });
    }
    let catalog = runtime.router.catalog();
    for model in catalog.models() {
        let served = runtime.providers.get(&model.provider).is_some();
        println!(
            "  {} via {}{}",
            model.name,
            model.provider,
            if served { "" } else { " (no provider configured)" }
        );
    }
    if health.values().any(|healthy| !healthy) {
        bail!("one or more providers are unavailable");
    }
    Ok(())
}
