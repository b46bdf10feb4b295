use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use hubwatch_parsehub::{
    handler_fn, ParseHub, ParseHubApi, ProjectRunParams, Run, TrackerConfig, WatchState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "hubwatch")]
#[command(version)]
#[command(about = "Start ParseHub runs and wait for their results")]
struct Args {
    /// ParseHub API key
    #[arg(long, env = "PARSEHUB_API_KEY", hide_env_values = true)]
    api_key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// List every project in the account
    Projects,

    /// Show one project
    Project { token: String },

    /// Start a run, wait for it to finish and print its data
    Run {
        /// Project token
        project: String,

        /// Override the project's start URL
        #[arg(long)]
        start_url: Option<String>,

        /// Override the project's start template
        #[arg(long)]
        start_template: Option<String>,

        /// Override the start value with a JSON object
        #[arg(long)]
        start_value: Option<String>,

        /// Ask ParseHub to email when the run finishes
        #[arg(long)]
        send_email: bool,

        /// Return after submitting instead of waiting for the result
        #[arg(long)]
        detach: bool,
    },

    /// Show a run's status
    Status { run: String },

    /// Print a run's extracted data
    Data { run: String },

    /// Cancel a run
    Cancel { run: String },

    /// Delete a run and its data
    Delete { run: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hubwatch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = TrackerConfig::from_env();
    let api = ParseHubApi::from_config(args.api_key, &config)?;

    // Watch tasks log through the same subscriber as the rest of the CLI.
    let hub = ParseHub::builder(Arc::new(api))
        .config(config)
        .log_sink(tracing::dispatcher::get_default(|d| d.clone()))
        .build();

    match args.command {
        Commands::Projects => {
            for project in hub.list_projects().await? {
                print_json(project.response())?;
            }
        }
        Commands::Project { token } => {
            let project = hub.get_project(&token).await?;
            print_json(project.response())?;
        }
        Commands::Run {
            project,
            start_url,
            start_template,
            start_value,
            send_email,
            detach,
        } => {
            let mut params = ProjectRunParams::new().with_send_email(send_email);
            if let Some(url) = start_url {
                params = params.with_start_url(url);
            }
            if let Some(template) = start_template {
                params = params.with_start_template(template);
            }
            if let Some(raw) = start_value {
                let value = serde_json::from_str(&raw).context("--start-value is not valid JSON")?;
                params = params.with_start_value_override(value);
            }

            if detach {
                let run = hub.run_project(&project, &params, None).await?;
                print_status(&run)?;
            } else {
                run_and_wait(&hub, &project, &params).await?;
            }
        }
        Commands::Status { run } => {
            let run = hub.get_run(&run).await?;
            print_status(&run)?;
        }
        Commands::Data { run } => {
            let data: serde_json::Value = hub.load_run_data(&run).await?;
            print_json(&data)?;
        }
        Commands::Cancel { run } => {
            let run = hub.cancel_run(&run).await?;
            print_status(&run)?;
        }
        Commands::Delete { run } => {
            let response = hub.delete_run(&run).await?;
            print_json(&response)?;
        }
    }

    Ok(())
}

async fn run_and_wait(
    hub: &ParseHub,
    project: &str,
    params: &ProjectRunParams,
) -> anyhow::Result<()> {
    let loader = hub.clone();
    let handler = handler_fn(move |run: Arc<Run>| {
        let hub = loader.clone();
        async move {
            let data: serde_json::Value = hub.load_run_data(run.token()).await?;
            print_json(&data)?;
            Ok(())
        }
    });

    let run = hub.run_project(project, params, Some(handler)).await?;
    tracing::info!(run_token = %run.token(), "Waiting for run to finish");

    let settled = tokio::select! {
        state = run.wait_until_settled() => state,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!(run_token = %run.token(), "Interrupted, leaving run on ParseHub");
            WatchState::Idle
        }
    };
    hub.shutdown().await;

    match settled {
        WatchState::Completed if hub.registry().contains(run.token()).await => {
            anyhow::bail!("run {} finished but its data could not be loaded", run.token())
        }
        WatchState::Completed => Ok(()),
        WatchState::Abandoned => anyhow::bail!("lost track of run {}", run.token()),
        WatchState::Idle | WatchState::Watching => Ok(()),
    }
}

fn print_status(run: &Run) -> anyhow::Result<()> {
    match run.status() {
        Some(status) => print_json(status.as_ref()),
        None => {
            println!("{}", run.token());
            Ok(())
        }
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
