use std::path::PathBuf;

use clap::Parser;
use kisan_gateway::{AppError, config::LoggingConfig, load_config, start_server};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// 命令行参数
#[derive(Parser, Debug)]
#[command(
    name = "kisan-gateway",
    version,
    about = "Resilient AI gateway for the Farmers Corner Kashmir dashboard"
)]
struct Cli {
    /// 配置文件路径
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,
    /// 覆盖监听地址
    #[arg(long)]
    host: Option<String>,
    /// 覆盖监听端口
    #[arg(long)]
    port: Option<u16>,
}

/// 主函数 - 农业网关服务的入口点
///
/// 负责解析命令行、加载配置、初始化日志系统并启动HTTP服务器
#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();

    // 加载配置文件和环境变量配置（日志格式取决于配置，所以先加载）
    let mut config = load_config(&cli.config)
        .map_err(|e| AppError::ConfigError(format!("加载配置失败: {}", e)))?;

    // 命令行参数覆盖监听地址和端口
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    // 初始化结构化日志系统
    init_tracing(&config.logging)?;

    tracing::info!(
        host = %config.server.host,
        port = %config.server.port,
        provider = %config.chat.provider,
        "Configuration loaded successfully"
    );

    // 启动HTTP服务器，监听指定地址和端口
    start_server(config).await?;

    Ok(())
}

/// 初始化结构化日志系统
///
/// 配置tracing和tracing-subscriber，支持：
/// - 结构化JSON日志输出（也可配置pretty/compact格式）
/// - RUST_LOG环境变量优先于配置文件中的日志级别
/// - 请求ID传播和追踪
fn init_tracing(logging: &LoggingConfig) -> Result<(), AppError> {
    // 从环境变量获取日志级别，默认使用配置中的级别
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "kisan_gateway={},tower_http=debug",
            logging.level
        ))
    });

    let registry = tracing_subscriber::registry().with(env_filter);

    // 按配置选择日志格式
    let result = match logging.format.as_str() {
        "json" => registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .json(),
            )
            .try_init(),
        "pretty" => registry.with(fmt::layer().pretty()).try_init(),
        _ => registry.with(fmt::layer().compact()).try_init(),
    };

    result.map_err(|e| AppError::ConfigError(format!("Failed to initialize tracing: {}", e)))
}
