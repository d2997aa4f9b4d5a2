use std::process::ExitCode;

use anyhow::{Context, Result};
use fleet_config::{AppConfig, LogConfig, OutputFormat};
use fleet_dispatch::app::{exit_code, failure_summary, Application, EXIT_ERROR};
use fleet_dispatch::cli::{build_cli, parse_command, parse_global};
use fleet_dispatcher::DispatchOutcome;
use fleet_domain::DispatchError;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            if let Some(err) = e.downcast_ref::<DispatchError>() {
                eprintln!("{}", err.user_message());
            }
            eprintln!("错误: {e:#}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}

async fn run() -> Result<u8> {
    let matches = build_cli().get_matches();
    let options = parse_global(&matches)?;

    // 加载配置，命令行参数优先
    let mut config = AppConfig::load(options.config.as_deref()).context("加载配置失败")?;
    if let Some(level) = options.log_level {
        config.logging.level = level;
    }
    if let Some(format) = options.log_format {
        config.logging.format = format;
    }

    init_logging(&config.logging)?;

    let command = parse_command(&matches).context("解析派发参数失败")?;
    info!("派发任务: {:?}", command);

    let app = Application::new(config, &options, &command).await?;

    let result = tokio::select! {
        result = app.run(&command) => Some(result),
        _ = signal::ctrl_c() => {
            warn!("收到Ctrl+C信号，放弃等待");
            None
        }
    };

    app.shutdown().await;

    let outcome = match result {
        Some(result) => result.context("派发失败")?,
        None => return Ok(EXIT_ERROR),
    };

    report(&outcome)?;
    Ok(exit_code(&outcome))
}

fn report(outcome: &DispatchOutcome) -> Result<()> {
    match outcome {
        DispatchOutcome::Succeeded { response, .. } => {
            println!("收到响应:\n{}", serde_json::to_string_pretty(response)?);
        }
        DispatchOutcome::Cancelled(reason) => {
            error!(kind = ?reason.kind, "任务已取消: {reason}");
        }
        DispatchOutcome::TimedOut { request_id, .. } => {
            error!(request_id = %request_id, "未收到响应");
        }
    }
    if let Some(summary) = failure_summary(outcome) {
        println!("{summary}");
    }
    Ok(())
}

/// 初始化日志系统；RUST_LOG 优先于配置的级别
fn init_logging(config: &LogConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.to_string()));

    let registry = tracing_subscriber::registry().with(env_filter);
    let layer = tracing_subscriber::fmt::layer()
        .with_target(config.include_target)
        .with_writer(std::io::stderr);

    match config.format {
        OutputFormat::Json => registry
            .with(layer.json())
            .try_init()
            .context("初始化JSON日志格式失败")?,
        OutputFormat::Pretty => registry
            .with(layer.pretty())
            .try_init()
            .context("初始化Pretty日志格式失败")?,
        OutputFormat::Text => registry
            .with(layer)
            .try_init()
            .context("初始化文本日志格式失败")?,
    }

    Ok(())
}
