use anyhow::{Context, Result};
use campaign_pipeline::cli::commands::{OutreachCommand, RunCommand, ValidateCommand};
use campaign_pipeline::cli::output::*;
use campaign_pipeline::cli::{Cli, Command};
use campaign_pipeline::{
    AgentClientConfig, AgentExecutor, CampaignConfig, CommandAgentClient, DeploymentSink,
    ExecutionEngine, ExecutionEvent, MarketingPipeline, MarkdownFileSink, OutreachPipeline,
    PipelineContext, RunReport, Unit,
};
use std::sync::Arc;
use tracing::{error, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    let config = load_config(cli.config.as_deref())?;

    let ok = match &cli.command {
        Command::Run(cmd) => run_campaign(cmd, config).await?,
        Command::Outreach(cmd) => run_outreach(cmd, config).await?,
        Command::Validate(cmd) => validate_config(cmd, &config)?,
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

fn load_config(path: Option<&str>) -> Result<CampaignConfig> {
    match path {
        Some(path) => CampaignConfig::from_file(path)
            .with_context(|| format!("Failed to load campaign config from {}", path)),
        None => Ok(CampaignConfig::default()),
    }
}

fn executor_for(config: &CampaignConfig) -> Arc<dyn AgentExecutor> {
    Arc::new(CommandAgentClient::new(AgentClientConfig::from(
        config.agent.clone(),
    )))
}

async fn run_campaign(cmd: &RunCommand, mut config: CampaignConfig) -> Result<bool> {
    let brief = match (&cmd.brief, &cmd.brief_file) {
        (Some(brief), _) => brief.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read brief from {}", path))?,
        (None, None) => anyhow::bail!("Provide a brief with --brief or --brief-file"),
    };

    for (key, value) in &cmd.defaults {
        println!(
            "{} Default override: {} = {}",
            INFO,
            style(key).cyan(),
            style(value).dim()
        );
        config.set_default(key.clone(), value.clone());
    }
    config.validate()?;

    let pipeline = MarketingPipeline::from_config(&config, executor_for(&config))
        .build()
        .context("Failed to assemble the marketing pipeline")?;

    let mut ctx = PipelineContext::builder()
        .with_input("brief", brief)
        .with_defaults(config.defaults.clone())
        .build();

    let report = execute(&pipeline, &mut ctx).await;
    print_report(&report, &ctx, cmd.json)?;

    if report.is_success() && !cmd.no_deploy {
        let output = cmd.output.clone().unwrap_or_else(|| config.output.clone());
        let location = MarkdownFileSink::new(output).deploy(&ctx).await?;
        println!("{} Deployed to {}", CHECK, style(location).bold());
    }

    Ok(report.is_success())
}

async fn run_outreach(cmd: &OutreachCommand, config: CampaignConfig) -> Result<bool> {
    let pipeline = OutreachPipeline::from_config(&config, executor_for(&config))
        .build()
        .context("Failed to assemble the outreach pipeline")?;

    let mut ctx = PipelineContext::builder()
        .with_input("company_url", cmd.company_url.clone())
        .with_defaults(config.defaults.clone())
        .build();

    let report = execute(&pipeline, &mut ctx).await;
    print_report(&report, &ctx, cmd.json)?;

    if let Some(email) = ctx.get_output("email_drafter_agent") {
        println!("\n{}", serde_json::to_string_pretty(email)?);
    }

    Ok(report.is_success())
}

/// Run with console progress and Ctrl-C cancellation
async fn execute(pipeline: &dyn Unit, ctx: &mut PipelineContext) -> RunReport {
    let engine = ExecutionEngine::new();

    let spinner = create_spinner();
    let progress = spinner.clone();
    engine.add_event_handler(move |event| {
        if let ExecutionEvent::UnitStarted { unit } = event {
            progress.set_message(unit.clone());
        }
        progress.println(format_execution_event(event));
    });

    let cancellation = engine.cancellation();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received; no further units will start");
            cancellation.cancel();
        }
    });

    let report = engine.execute(pipeline, ctx).await;
    spinner.finish_and_clear();
    report
}

fn print_report(report: &RunReport, ctx: &PipelineContext, json: bool) -> Result<()> {
    println!("\n{}", format_run_state(&report.state));

    if let Some(failure) = &report.failure {
        error!("{}", failure.message);
        println!("{}", format_failure(failure));
    }

    if json {
        println!("{}", serde_json::to_string_pretty(ctx)?);
    }
    Ok(())
}

fn validate_config(cmd: &ValidateCommand, config: &CampaignConfig) -> Result<bool> {
    println!("{} Validating campaign...", INFO);

    let executor = executor_for(config);
    let marketing = MarketingPipeline::from_config(config, executor.clone()).build();
    let outreach = OutreachPipeline::from_config(config, executor).build();

    match (marketing, outreach) {
        (Ok(pipeline), Ok(_)) => {
            println!("{} Campaign configuration is valid!", CHECK);
            println!("  Name: {}", style(pipeline.name()).bold());
            println!("  Units: {}", style(pipeline.units().len()).cyan());
            println!("  Reviewers: {}", style(config.reviewers).cyan());
            println!("  Max iterations: {}", style(config.max_iterations).cyan());
            println!("  Agent command: {}", style(&config.agent.command).dim());

            if cmd.json {
                println!("\n{}", serde_json::to_string_pretty(config)?);
            }
            Ok(true)
        }
        (Err(e), _) | (_, Err(e)) => {
            println!("{} Validation failed:", CROSS);
            println!("  {}", style(e).red());
            Ok(false)
        }
    }
}
