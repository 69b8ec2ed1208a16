use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use chrono::Local;
use log::LevelFilter;
use publisher_core::{RunOutcome, RunReport};
use publisher_engine::{FixedTopic, PublishEngine, PublisherConfig};
use publisher_logging::{pipeline_info, pipeline_warn};

use super::{logging, schedule};
use crate::cli::{Cli, Commands};

pub async fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let log_path = logging::initialize(level, Path::new(logging::LOG_DIR), Local::now().date_naive())?;
    log::debug!("logging to {}", log_path.display());

    let mut config = PublisherConfig::from_env().context("reading configuration")?;
    if let Some(dir) = executable_dir() {
        config = config.with_assets_near(&dir);
    }

    match cli.command() {
        Commands::Run { topic } => run_once(&config, topic).await,
        Commands::Schedule => run_daily(&config).await,
        Commands::Check => Ok(check(&config, &log_path)),
    }
}

fn executable_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
}

/// Relative paths resolve against the working directory; show where that lands.
fn display_absolute(path: &Path) -> String {
    std::path::absolute(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}

fn build_engine(config: &PublisherConfig, topic: Option<String>) -> anyhow::Result<PublishEngine> {
    let engine = PublishEngine::from_config(config).context("building HTTP client")?;
    Ok(match topic {
        Some(topic) => engine.with_topics(Arc::new(FixedTopic(topic))),
        None => engine,
    })
}

async fn run_once(config: &PublisherConfig, topic: Option<String>) -> anyhow::Result<ExitCode> {
    warn_if_publish_requested(config);
    let report = build_engine(config, topic)?.run().await;
    summarize(&report);
    Ok(ExitCode::from(report.exit_code()))
}

/// Runs forever, one pipeline per day; a run always completes before the next wait starts.
async fn run_daily(config: &PublisherConfig) -> anyhow::Result<ExitCode> {
    warn_if_publish_requested(config);
    let engine = build_engine(config, None)?;
    loop {
        let now = Local::now();
        let next = schedule::next_run(&now, config.publish_time);
        log::info!("next run scheduled at {}", next.to_rfc3339());
        tokio::select! {
            _ = tokio::time::sleep(schedule::wait_until(&now, &next)) => {}
            _ = tokio::signal::ctrl_c() => {
                log::info!("interrupted; scheduler stopped");
                return Ok(ExitCode::SUCCESS);
            }
        }
        let report = engine.run().await;
        summarize(&report);
    }
}

fn check(config: &PublisherConfig, log_path: &Path) -> ExitCode {
    let credentials = &config.credentials;
    let cover = config.fallback_image.is_file();
    let status = |ok: bool| if ok { "configured" } else { "missing" };

    println!("model API key     : {}", status(credentials.has_model_api()));
    println!("platform app      : {}", status(credentials.has_platform()));
    println!(
        "fallback cover    : {} ({})",
        if cover { "present" } else { "missing" },
        display_absolute(&config.fallback_image)
    );
    println!("drafts directory  : {}", display_absolute(&config.drafts_dir));
    println!("log file          : {}", display_absolute(log_path));
    println!("chat / image model: {} / {}", config.chat_model, config.image_model);
    println!(
        "next scheduled run: {}",
        schedule::next_run(&Local::now(), config.publish_time).to_rfc3339()
    );

    if credentials.has_platform() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn warn_if_publish_requested(config: &PublisherConfig) {
    if !config.save_to_draft {
        pipeline_warn!("SAVE_TO_DRAFT=false: direct publication is not supported; filing a draft");
    }
}

fn summarize(report: &RunReport) {
    pipeline_info!(
        "summary: topic={:?} title={:?} cover_tier={:?} media_id={:?}",
        report.topic,
        report.title,
        report.image_tier,
        report.media_id.as_ref().map(|id| id.0.as_str())
    );
    for (tier, error) in &report.image_failures {
        pipeline_info!("  {} tier failed: {}", tier, error);
    }
    match &report.outcome {
        Some(RunOutcome::Published { draft_id }) => pipeline_info!("result: draft {}", draft_id),
        Some(RunOutcome::ArchivedLocally { path, .. }) => {
            pipeline_warn!("result: archived locally at {}", path.display())
        }
        Some(RunOutcome::Failed { stage, reason }) => {
            pipeline_warn!("result: failed at {:?} ({})", stage, reason)
        }
        None => pipeline_warn!("result: run ended without an outcome"),
    }
}
