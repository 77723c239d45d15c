//! fanout CLI: bulk artifact deletion and evaluation load runs.

use clap::{Parser, Subcommand, ValueEnum};
use fanout_rs::config::Config;
use fanout_rs::dispatch::{Dispatcher, LineFileSource, RangeSource};
use fanout_rs::model::DispatchReport;
use fanout_rs::ops::evaluate::DEFAULT_EVALUATE_URL;
use fanout_rs::ops::{BulkEvaluateRequest, DeleteArtifact, EvaluateBulk, Transport, build_client};
use fanout_rs::telemetry::{TelemetryConfig, init_telemetry};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fanout", about = "Fan outbound calls out over a bounded worker pool")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Delete every artifact digest listed in a file
    Delete {
        /// File with one digest per line
        #[arg(long, default_value = "digests.txt")]
        file: PathBuf,
        /// Registry root URL
        #[arg(long)]
        registry_url: String,
        /// Registry project name
        #[arg(long)]
        project: String,
        /// Repository within the project
        #[arg(long)]
        repository: String,
        /// Number of concurrent workers
        #[arg(long, default_value_t = 10)]
        concurrency: usize,
    },
    /// Fire bulk evaluation requests at the flag service
    Load {
        /// Evaluation endpoint
        #[arg(long, default_value = DEFAULT_EVALUATE_URL)]
        url: String,
        /// Total number of requests
        #[arg(long, default_value_t = 10_000)]
        total: u64,
        /// Number of concurrent workers
        #[arg(long, default_value_t = 50)]
        concurrency: usize,
        /// Connection handling
        #[arg(long, value_enum, default_value_t = TransportArg::Pooled)]
        transport: TransportArg,
        /// JSON request body (defaults to a built-in sample)
        #[arg(long)]
        payload: Option<PathBuf>,
        /// Generate new entry ids for every request
        #[arg(long)]
        fresh_ids: bool,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TransportArg {
    Pooled,
    NonPooled,
    /// Run non-pooled, then pooled, and print both timings
    Compare,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::from_env()?;

    let guard = init_telemetry(TelemetryConfig {
        endpoint: config.otel_endpoint.clone(),
        service_name: "fanout".to_string(),
        log_level: config.log_level.clone(),
    })?;

    match cli.command {
        Command::Delete {
            file,
            registry_url,
            project,
            repository,
            concurrency,
        } => {
            cmd_delete(
                &config,
                file,
                &registry_url,
                &project,
                &repository,
                concurrency,
            )
            .await?
        }
        Command::Load {
            url,
            total,
            concurrency,
            transport,
            payload,
            fresh_ids,
        } => {
            let payload = match payload {
                Some(path) => BulkEvaluateRequest::from_file(&path)?,
                None => BulkEvaluateRequest::sample(),
            };
            let transports: &[Transport] = match transport {
                TransportArg::Pooled => &[Transport::Pooled],
                TransportArg::NonPooled => &[Transport::NonPooled],
                TransportArg::Compare => &[Transport::NonPooled, Transport::Pooled],
            };
            for &transport in transports {
                cmd_load(
                    &config,
                    &url,
                    total,
                    concurrency,
                    transport,
                    payload.clone(),
                    fresh_ids,
                )
                .await?;
            }
        }
    }

    guard.force_flush();
    Ok(())
}

async fn cmd_delete(
    config: &Config,
    file: PathBuf,
    registry_url: &str,
    project: &str,
    repository: &str,
    concurrency: usize,
) -> anyhow::Result<()> {
    let client = build_client(Transport::Pooled, config.request_timeout)?;
    let operation = DeleteArtifact::new(
        client,
        registry_url,
        project,
        repository,
        &config.auth_token,
    )?;

    let report = Dispatcher::new(operation, concurrency)?
        .run(LineFileSource::new(file))
        .await;
    print_report(&report);
    Ok(())
}

async fn cmd_load(
    config: &Config,
    url: &str,
    total: u64,
    concurrency: usize,
    transport: Transport,
    payload: BulkEvaluateRequest,
    fresh_ids: bool,
) -> anyhow::Result<()> {
    let client = build_client(transport, config.request_timeout)?;
    let operation =
        EvaluateBulk::new(client, url, &config.auth_token, payload)?.fresh_ids(fresh_ids);

    let report = Dispatcher::new(operation, concurrency)?
        .run(RangeSource::new(total))
        .await;
    print_report(&report);
    println!(
        "total time taken ({}): {:.2}s",
        transport.as_str(),
        report.elapsed.as_secs_f64()
    );
    Ok(())
}

fn print_report(report: &DispatchReport) {
    if let Some(ref err) = report.source_error {
        println!("work source stopped early after {} item(s): {err}", report.produced);
    }
    println!("total error count: {}", report.failed);
}
